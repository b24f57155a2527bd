use std::collections::BTreeMap;
use std::fmt;
use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};

use super::token::Token;

pub const SALESPEOPLE_LIST: &str = "salespeople-list";
pub const SPECIAL_LABELS_LIST: &str = "special-labels-list";

/// Sales staff category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffType {
    New,
    Used,
}

impl StaffType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffType::New => "new",
            StaffType::Used => "used",
        }
    }

    pub fn parse(value: &str) -> Option<StaffType> {
        match value.trim().to_lowercase().as_str() {
            "new" => Some(StaffType::New),
            "used" => Some(StaffType::Used),
            _ => None,
        }
    }
}

/// A (day, shift index) cell, persisted as `"{day}-{shift}"`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotKey {
    pub day: u32,
    pub shift: u32,
}

impl SlotKey {
    pub fn new(day: u32, shift: u32) -> Self {
        SlotKey { day, shift }
    }

    /// Accepts only the canonical `"{day}-{shift}"` spelling
    pub fn parse(raw: &str) -> Option<SlotKey> {
        let (day, shift) = raw.split_once('-')?;
        let day: u32 = day.parse().ok()?;
        let shift: u32 = shift.parse().ok()?;
        if day == 0 || day > 31 {
            return None;
        }
        let key = SlotKey { day, shift };
        if key.to_string() != raw {
            return None;
        }
        Some(key)
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.day, self.shift)
    }
}

/// The two catalog containers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PoolId {
    Salespeople,
    SpecialLabels,
}

impl PoolId {
    pub fn as_str(&self) -> &'static str {
        match self {
            PoolId::Salespeople => SALESPEOPLE_LIST,
            PoolId::SpecialLabels => SPECIAL_LABELS_LIST,
        }
    }
}

/// Key of the container map.
///
/// Pool ids form the catalog region, slot keys the schedule region. Anything
/// else found in stored data is kept as `Other` and ignored by the engines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContainerId {
    Pool(PoolId),
    Slot(SlotKey),
    Other(String),
}

impl ContainerId {
    pub fn parse(raw: &str) -> ContainerId {
        match raw {
            SALESPEOPLE_LIST => ContainerId::Pool(PoolId::Salespeople),
            SPECIAL_LABELS_LIST => ContainerId::Pool(PoolId::SpecialLabels),
            _ => match SlotKey::parse(raw) {
                Some(key) => ContainerId::Slot(key),
                None => ContainerId::Other(raw.to_string()),
            },
        }
    }

    pub fn slot(day: u32, shift: u32) -> ContainerId {
        ContainerId::Slot(SlotKey::new(day, shift))
    }

    pub fn is_pool(&self) -> bool {
        matches!(self, ContainerId::Pool(_))
    }

    pub fn as_slot(&self) -> Option<SlotKey> {
        match self {
            ContainerId::Slot(key) => Some(*key),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerId::Pool(pool) => f.write_str(pool.as_str()),
            ContainerId::Slot(key) => write!(f, "{}", key),
            ContainerId::Other(raw) => f.write_str(raw),
        }
    }
}

impl From<String> for ContainerId {
    fn from(raw: String) -> Self {
        ContainerId::parse(&raw)
    }
}

impl From<ContainerId> for String {
    fn from(id: ContainerId) -> Self {
        id.to_string()
    }
}

impl From<SlotKey> for ContainerId {
    fn from(key: SlotKey) -> Self {
        ContainerId::Slot(key)
    }
}

impl From<PoolId> for ContainerId {
    fn from(pool: PoolId) -> Self {
        ContainerId::Pool(pool)
    }
}

/// Container id -> ordered tokens. Order within a list is display order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerMap {
    containers: BTreeMap<ContainerId, Vec<Token>>,
}

impl ContainerMap {
    pub fn new() -> Self {
        ContainerMap::default()
    }

    pub fn get(&self, id: &ContainerId) -> &[Token] {
        self.containers.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn slot(&self, day: u32, shift: u32) -> &[Token] {
        self.get(&ContainerId::slot(day, shift))
    }

    pub fn pool(&self, pool: PoolId) -> &[Token] {
        self.get(&ContainerId::Pool(pool))
    }

    pub fn set(&mut self, id: ContainerId, tokens: Vec<Token>) {
        self.containers.insert(id, tokens);
    }

    pub fn push(&mut self, id: ContainerId, token: Token) {
        self.containers.entry(id).or_default().push(token);
    }

    /// Removes the first exact match (base id and stamp). Returns whether anything was removed.
    pub fn remove_token(&mut self, id: &ContainerId, token: &Token) -> bool {
        if let Some(tokens) = self.containers.get_mut(id) {
            if let Some(pos) = tokens.iter().position(|t| t == token) {
                tokens.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn contains_token(&self, id: &ContainerId, token: &Token) -> bool {
        self.get(id).iter().any(|t| t == token)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ContainerId, &Vec<Token>)> {
        self.containers.iter()
    }

    /// Schedule region: every slot key with its tokens
    pub fn slots(&self) -> impl Iterator<Item = (SlotKey, &Vec<Token>)> {
        self.containers
            .iter()
            .filter_map(|(id, tokens)| id.as_slot().map(|key| (key, tokens)))
    }

    pub fn slots_for_day(&self, day: u32) -> impl Iterator<Item = (SlotKey, &Vec<Token>)> {
        self.slots().filter(move |(key, _)| key.day == day)
    }

    /// Catalog region: the pool containers
    pub fn catalog(&self) -> impl Iterator<Item = (PoolId, &Vec<Token>)> {
        self.containers.iter().filter_map(|(id, tokens)| match id {
            ContainerId::Pool(pool) => Some((*pool, tokens)),
            _ => None,
        })
    }

    /// Writes every key of `partial` over this map (full replace per key, not append)
    pub fn merge(&mut self, partial: ContainerMap) {
        for (id, tokens) in partial.containers {
            self.containers.insert(id, tokens);
        }
    }

    pub fn retain<F>(&mut self, mut keep: F)
    where
        F: FnMut(&ContainerId, &[Token]) -> bool,
    {
        self.containers.retain(|id, tokens| keep(id, tokens));
    }

    pub fn keys(&self) -> impl Iterator<Item = &ContainerId> {
        self.containers.keys()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }
}

impl FromIterator<(ContainerId, Vec<Token>)> for ContainerMap {
    fn from_iter<I: IntoIterator<Item = (ContainerId, Vec<Token>)>>(iter: I) -> Self {
        ContainerMap { containers: iter.into_iter().collect() }
    }
}

/// Persisted monthly schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub month: u32,
    pub year: i32,
    pub containers: ContainerMap,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
    #[serde(default)]
    pub published: bool,
}

/// Staff directory record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesStaff {
    pub name: String,
    #[serde(rename = "type")]
    pub staff_type: StaffType,
    #[serde(default)]
    pub display_name: String,
}

impl SalesStaff {
    /// Name shown on the pool token; falls back to `name`
    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            self.name.trim()
        } else {
            self.display_name.trim()
        }
    }
}
