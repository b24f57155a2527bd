use std::collections::HashSet;
use log::debug;

use super::calendar::MonthKey;
use super::slot_utils::ShiftTemplate;
use super::token::{Token, TokenClock};
use super::types::{ContainerId, ContainerMap, SlotKey};

/// In-flight drag gesture
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging { source: ContainerId, item: Token },
}

/// What a drop does to the container map
#[derive(Debug, Clone, PartialEq)]
pub enum DropAction {
    /// Released outside any usable container, or the dragged item went stale
    Ignore,
    /// Dropped back where it came from
    NoOp,
    /// The target day already has this person in another shift
    RejectDuplicate { day: u32, name: String, existing: SlotKey },
    /// Slot item dragged back to a pool
    Remove { source: SlotKey, item: Token },
    /// Pool item copied into a slot with a fresh stamp
    CloneInto { target: SlotKey, item: Token },
    /// Slot item moved to another slot unchanged
    Move { source: SlotKey, target: SlotKey, item: Token },
}

impl DropAction {
    pub fn mutates(&self) -> bool {
        matches!(self, DropAction::Remove { .. } | DropAction::CloneInto { .. } | DropAction::Move { .. })
    }
}

/// Finds a slot on `day` (other than `exclude`) already holding someone named `name`
pub fn find_same_day_duplicate(
    containers: &ContainerMap,
    day: u32,
    name: &str,
    exclude: Option<SlotKey>,
) -> Option<SlotKey> {
    containers
        .slots_for_day(day)
        .filter(|(key, _)| Some(*key) != exclude)
        .find(|(_, tokens)| tokens.iter().any(|t| t.display_name() == name))
        .map(|(key, _)| key)
}

/// Lists every (day, name) that appears in more than one shift of that day
pub fn same_day_duplicates(containers: &ContainerMap) -> Vec<(u32, String)> {
    let mut seen: HashSet<(u32, String)> = HashSet::new();
    let mut duplicates = Vec::new();
    for (key, tokens) in containers.slots() {
        let names: HashSet<&str> = tokens.iter().map(|t| t.display_name()).collect();
        for name in names {
            if !seen.insert((key.day, name.to_string())) {
                duplicates.push((key.day, name.to_string()));
            }
        }
    }
    duplicates
}

/// Decides the outcome of dropping `item` (taken from `source`) on `target`.
/// Pure: the map is only read.
pub fn resolve_drop(
    source: &ContainerId,
    item: &Token,
    target: Option<&ContainerId>,
    containers: &ContainerMap,
    month: &MonthKey,
    template: &ShiftTemplate,
) -> DropAction {
    let target = match target {
        Some(target) => target,
        None => return DropAction::Ignore,
    };

    match target {
        ContainerId::Other(_) => DropAction::Ignore,
        ContainerId::Pool(_) => {
            if source == target {
                return DropAction::NoOp;
            }
            match source {
                // pool entries are master records and are never consumed
                ContainerId::Pool(_) => DropAction::NoOp,
                ContainerId::Slot(key) if containers.contains_token(source, item) => {
                    DropAction::Remove { source: *key, item: item.clone() }
                }
                _ => DropAction::Ignore,
            }
        }
        ContainerId::Slot(target_key) => {
            if source == target {
                return DropAction::NoOp;
            }
            if !template.is_valid_slot(month, *target_key) {
                return DropAction::Ignore;
            }

            let name = item.display_name();
            let exclude = source.as_slot();
            if let Some(existing) = find_same_day_duplicate(containers, target_key.day, name, exclude) {
                return DropAction::RejectDuplicate {
                    day: target_key.day,
                    name: name.to_string(),
                    existing,
                };
            }

            match source {
                ContainerId::Pool(_) => DropAction::CloneInto { target: *target_key, item: item.without_stamp() },
                ContainerId::Slot(source_key) if containers.contains_token(source, item) => DropAction::Move {
                    source: *source_key,
                    target: *target_key,
                    item: item.clone(),
                },
                _ => DropAction::Ignore,
            }
        }
    }
}

/// Applies a resolved drop. Returns whether the map changed.
pub fn apply_drop(action: &DropAction, containers: &mut ContainerMap, clock: &mut TokenClock) -> bool {
    match action {
        DropAction::Remove { source, item } => containers.remove_token(&ContainerId::Slot(*source), item),
        DropAction::CloneInto { target, item } => {
            containers.push(ContainerId::Slot(*target), item.clone_stamped(clock));
            true
        }
        DropAction::Move { source, target, item } => {
            if containers.remove_token(&ContainerId::Slot(*source), item) {
                containers.push(ContainerId::Slot(*target), item.clone());
                true
            } else {
                false
            }
        }
        DropAction::Ignore | DropAction::NoOp | DropAction::RejectDuplicate { .. } => false,
    }
}

/// Drag state machine: Idle -> Dragging -> (drop resolution) -> Idle
#[derive(Debug, Clone, Default)]
pub struct DragEngine {
    state: DragState,
}

impl DragEngine {
    pub fn new() -> Self {
        DragEngine::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging { .. })
    }

    /// Begins a drag. A drag that was never ended is replaced.
    pub fn start_drag(&mut self, item: Token, source: ContainerId) {
        self.state = DragState::Dragging { source, item };
    }

    /// Ends the drag on `target` (None when released outside any container),
    /// applies the result and returns to Idle.
    pub fn end_drag(
        &mut self,
        target: Option<&ContainerId>,
        containers: &mut ContainerMap,
        month: &MonthKey,
        template: &ShiftTemplate,
        clock: &mut TokenClock,
    ) -> DropAction {
        let action = match std::mem::take(&mut self.state) {
            DragState::Idle => DropAction::Ignore,
            DragState::Dragging { source, item } => {
                resolve_drop(&source, &item, target, containers, month, template)
            }
        };

        if !apply_drop(&action, containers, clock) && action.mutates() {
            debug!("Drop {:?} no longer applies; ignoring", action);
            return DropAction::Ignore;
        }
        action
    }
}
