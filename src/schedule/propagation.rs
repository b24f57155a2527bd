//! Copy propagation: bulk copies of one day's or one week's slots.
//!
//! Every function here is pure. Copies come back as a partial container map of
//! the keys they write; callers merge it with per-key replacement.

use serde::{Serialize, Deserialize};

use crate::error::{Result, SchedulerError};
use super::calendar::{MonthKey, WEEKDAY_NAMES};
use super::token::TokenClock;
use super::types::{ContainerId, ContainerMap};

/// Later days of the month falling on the same weekday as `day`
pub fn future_same_weekdays(month: &MonthKey, day: u32) -> Vec<u32> {
    (day + 7..=month.days_in_month()).step_by(7).collect()
}

/// Seven-day windows after the week containing `day`, each starting on a Sunday
/// and cut off at month end
pub fn future_weeks(month: &MonthKey, day: u32) -> Vec<Vec<u32>> {
    let last = month.days_in_month() as i32;
    let mut weeks = Vec::new();
    let mut start = month.week_start(day) + 7;
    while start <= last {
        let week: Vec<u32> = (start..start + 7)
            .take_while(|d| *d <= last)
            .map(|d| d as u32)
            .collect();
        weeks.push(week);
        start += 7;
    }
    weeks
}

/// Copies every slot of `source_day` onto each target day, same shift index,
/// with fresh stamps. Reads from `previous_month` instead of `containers` when given.
pub fn copy_from_day(
    containers: &ContainerMap,
    source_day: u32,
    target_days: &[u32],
    previous_month: Option<&ContainerMap>,
    clock: &mut TokenClock,
) -> ContainerMap {
    let source = previous_month.unwrap_or(containers);
    let mut partial = ContainerMap::new();
    for (key, tokens) in source.slots_for_day(source_day) {
        for &target in target_days {
            let cloned = tokens.iter().map(|t| t.clone_stamped(clock)).collect();
            partial.set(ContainerId::slot(target, key.shift), cloned);
        }
    }
    partial
}

/// Copies the week `[source_week_start, source_week_start + 7)` onto each target
/// week, keeping each slot's offset from the week start and its shift index.
pub fn copy_week(
    containers: &ContainerMap,
    source_week_start: i32,
    target_weeks: &[Vec<u32>],
    clock: &mut TokenClock,
) -> ContainerMap {
    let mut partial = ContainerMap::new();
    for (key, tokens) in containers.slots() {
        let offset = key.day as i32 - source_week_start;
        if !(0..7).contains(&offset) {
            continue;
        }
        for week in target_weeks {
            // truncated final week may not reach this offset
            if let Some(&target_day) = week.get(offset as usize) {
                let cloned = tokens.iter().map(|t| t.clone_stamped(clock)).collect();
                partial.set(ContainerId::slot(target_day, key.shift), cloned);
            }
        }
    }
    partial
}

/// Where a "copy from earlier" command reads its slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "month", rename_all = "camelCase")]
pub enum DaySource {
    Current { day: u32 },
    Previous { day: u32 },
}

/// The same weekday one week earlier. For the first seven days that is the
/// matching weekday in the last week of the previous month.
pub fn previous_week_source(month: &MonthKey, day: u32) -> Result<DaySource> {
    if day > 7 {
        return Ok(DaySource::Current { day: day - 7 });
    }
    let previous = month.previous()?;
    let weekday = month.weekday_of(day as i32);
    let mut candidate = previous.days_in_month();
    while previous.weekday_of(candidate as i32) != weekday {
        candidate -= 1;
    }
    Ok(DaySource::Previous { day: candidate })
}

/// The day before; for the 1st, the last day of the previous month
pub fn previous_day_source(month: &MonthKey, day: u32) -> Result<DaySource> {
    if day > 1 {
        return Ok(DaySource::Current { day: day - 1 });
    }
    Ok(DaySource::Previous { day: month.previous()?.days_in_month() })
}

/// Entries of the copy menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CopyCommand {
    /// This day onto every later day with the same weekday
    ToFutureWeekdays { day: u32 },
    /// The previous day onto this day
    FromPreviousDay { day: u32 },
    /// The same weekday of the previous week onto this day
    FromPreviousWeek { day: u32 },
    /// The week containing this day onto every later week
    WeekToFutureWeeks { day: u32 },
}

impl CopyCommand {
    pub fn day(&self) -> u32 {
        match self {
            CopyCommand::ToFutureWeekdays { day }
            | CopyCommand::FromPreviousDay { day }
            | CopyCommand::FromPreviousWeek { day }
            | CopyCommand::WeekToFutureWeeks { day } => *day,
        }
    }

    /// Where the command reads from, for the commands that copy into `day`
    pub fn source(&self, month: &MonthKey) -> Result<Option<DaySource>> {
        match self {
            CopyCommand::FromPreviousDay { day } => previous_day_source(month, *day).map(Some),
            CopyCommand::FromPreviousWeek { day } => previous_week_source(month, *day).map(Some),
            _ => Ok(None),
        }
    }

    /// Whether planning this command needs the previous month's slots
    pub fn reads_previous_month(&self, month: &MonthKey) -> Result<bool> {
        Ok(matches!(self.source(month)?, Some(DaySource::Previous { .. })))
    }
}

/// A planned copy, waiting for the user to confirm `prompt`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopyPlan {
    pub command: CopyCommand,
    pub month: MonthKey,
    pub target_days: Vec<u32>,
    pub prompt: String,
    pub partial: ContainerMap,
}

impl CopyPlan {
    pub fn is_empty(&self) -> bool {
        self.partial.is_empty()
    }
}

fn day_label(month: &MonthKey, day: i32) -> String {
    format!("{} {}", WEEKDAY_NAMES[month.weekday_of(day) as usize], day)
}

fn join_days(days: &[u32]) -> String {
    days.iter().map(|d| d.to_string()).collect::<Vec<_>>().join(", ")
}

/// Plans `command` against the working map. `previous_month` holds the previous
/// month's slots when the command reads from there (an absent schedule is empty).
pub fn plan_copy(
    command: CopyCommand,
    month: &MonthKey,
    containers: &ContainerMap,
    previous_month: Option<&ContainerMap>,
    clock: &mut TokenClock,
) -> Result<CopyPlan> {
    let day = command.day();
    if !month.contains_day(day) {
        return Err(SchedulerError::InvalidDay(day));
    }
    let empty = ContainerMap::new();

    let (target_days, prompt, partial) = match command {
        CopyCommand::ToFutureWeekdays { day } => {
            let targets = future_same_weekdays(month, day);
            let prompt = format!(
                "Copy {} to every following {} ({})?",
                day_label(month, day as i32),
                WEEKDAY_NAMES[month.weekday_of(day as i32) as usize],
                join_days(&targets),
            );
            let partial = copy_from_day(containers, day, &targets, None, clock);
            (targets, prompt, partial)
        }
        CopyCommand::FromPreviousDay { .. } | CopyCommand::FromPreviousWeek { .. } => {
            let targets = vec![day];
            let (prompt, partial) = match command.source(month)? {
                Some(DaySource::Previous { day: source_day }) => {
                    let previous = month.previous()?;
                    let prompt = format!(
                        "Copy {} {} into {} {}?",
                        day_label(&previous, source_day as i32),
                        previous.label(),
                        day_label(month, day as i32),
                        month.label(),
                    );
                    let source = previous_month.unwrap_or(&empty);
                    (prompt, copy_from_day(containers, source_day, &targets, Some(source), clock))
                }
                Some(DaySource::Current { day: source_day }) => {
                    let prompt = format!(
                        "Copy {} into {}?",
                        day_label(month, source_day as i32),
                        day_label(month, day as i32),
                    );
                    (prompt, copy_from_day(containers, source_day, &targets, None, clock))
                }
                None => (String::new(), ContainerMap::new()),
            };
            (targets, prompt, partial)
        }
        CopyCommand::WeekToFutureWeeks { day } => {
            let start = month.week_start(day);
            let weeks = future_weeks(month, day);
            let first_day = start.max(1);
            let last_day = (start + 6).min(month.days_in_month() as i32);
            let starts: Vec<u32> = weeks.iter().filter_map(|w| w.first().copied()).collect();
            let prompt = format!(
                "Copy the week of {}–{} to the weeks starting {}?",
                first_day,
                last_day,
                join_days(&starts),
            );
            let partial = copy_week(containers, start, &weeks, clock);
            (weeks.concat(), prompt, partial)
        }
    };

    Ok(CopyPlan {
        command,
        month: *month,
        target_days,
        prompt,
        partial,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::token::Token;
    use crate::schedule::types::PoolId;

    fn november_2023() -> MonthKey {
        // 30 days, starts on a Wednesday
        MonthKey::new(11, 2023).unwrap()
    }

    #[test]
    fn future_same_weekdays_in_a_wednesday_month() {
        assert_eq!(future_same_weekdays(&november_2023(), 3), vec![10, 17, 24]);
        assert!(future_same_weekdays(&november_2023(), 30).is_empty());
    }

    #[test]
    fn future_weeks_align_on_sundays_and_truncate() {
        let weeks = future_weeks(&november_2023(), 3);
        assert_eq!(weeks.len(), 4);
        assert_eq!(weeks[0], vec![5, 6, 7, 8, 9, 10, 11]);
        assert_eq!(weeks[3], vec![26, 27, 28, 29, 30]);
    }

    #[test]
    fn copy_from_day_overwrites_instead_of_merging() {
        let mut containers = ContainerMap::new();
        containers.set(ContainerId::slot(3, 0), vec![Token::parse("new:Gio::1"), Token::parse("used:Ana::2")]);
        containers.set(ContainerId::slot(10, 0), vec![Token::parse("used:Old::3")]);
        let mut clock = TokenClock::starting_at(100);

        for _ in 0..2 {
            let partial = copy_from_day(&containers, 3, &[10], None, &mut clock);
            containers.merge(partial);
        }

        let names: Vec<&str> = containers.slot(10, 0).iter().map(|t| t.display_name()).collect();
        assert_eq!(names, vec!["Gio", "Ana"]);
        assert_ne!(containers.slot(10, 0)[0], containers.slot(3, 0)[0]);
    }

    #[test]
    fn copy_from_day_leaves_source_untouched_and_skips_pools() {
        let mut containers = ContainerMap::new();
        containers.set(ContainerId::Pool(PoolId::Salespeople), vec![Token::parse("new:Gio")]);
        containers.set(ContainerId::slot(3, 2), vec![Token::parse("new:Gio::1")]);
        let before = containers.clone();
        let mut clock = TokenClock::starting_at(1);

        let partial = copy_from_day(&containers, 3, &[10, 17], None, &mut clock);
        assert_eq!(containers, before);
        let keys: Vec<String> = partial.keys().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["10-2", "17-2"]);
    }

    #[test]
    fn copy_week_keeps_day_offsets() {
        let month = november_2023();
        let mut containers = ContainerMap::new();
        // week of Sunday 5: the Tuesday is the 7th
        containers.set(ContainerId::slot(7, 1), vec![Token::parse("used:Ana::1")]);
        containers.set(ContainerId::slot(12, 1), vec![Token::parse("used:Out::1")]);
        let mut clock = TokenClock::starting_at(1);

        let weeks = future_weeks(&month, 7);
        let partial = copy_week(&containers, month.week_start(7), &weeks, &mut clock);

        for week in &weeks {
            let target = week[2];
            assert_eq!(partial.slot(target, 1)[0].display_name(), "Ana");
        }
        assert!(partial.slot(17, 1).is_empty());
    }

    #[test]
    fn copy_week_skips_offsets_past_month_end() {
        let month = november_2023();
        let mut containers = ContainerMap::new();
        // Saturday 18 sits at offset 6; the last week ends on Thursday 30
        containers.set(ContainerId::slot(18, 0), vec![Token::parse("new:Gio::1")]);
        let mut clock = TokenClock::starting_at(1);

        let weeks = future_weeks(&month, 18);
        let partial = copy_week(&containers, month.week_start(18), &weeks, &mut clock);
        assert_eq!(partial.slot(25, 0).len(), 1);
        assert_eq!(partial.len(), 1);
    }

    #[test]
    fn copy_week_reads_days_before_the_first_of_the_month() {
        let month = november_2023();
        let mut containers = ContainerMap::new();
        containers.set(ContainerId::slot(1, 0), vec![Token::parse("new:Gio::1")]);
        let mut clock = TokenClock::starting_at(1);

        // week starts on "day -2" (Sunday 29 October); Wednesday 1 is offset 3
        let partial = copy_week(&containers, month.week_start(1), &future_weeks(&month, 1), &mut clock);
        assert_eq!(partial.slot(8, 0).len(), 1);
        assert_eq!(partial.slot(29, 0).len(), 1);
    }

    #[test]
    fn previous_week_crosses_into_last_week_of_previous_month() {
        let month = november_2023();
        // Wednesday 1 November -> Wednesday 25 October
        assert_eq!(previous_week_source(&month, 1).unwrap(), DaySource::Previous { day: 25 });
        assert_eq!(previous_week_source(&month, 8).unwrap(), DaySource::Current { day: 1 });
        // Tuesday 7 November -> Tuesday 31 October
        assert_eq!(previous_week_source(&month, 7).unwrap(), DaySource::Previous { day: 31 });
    }

    #[test]
    fn previous_day_of_the_first_is_last_day_of_previous_month() {
        let march = MonthKey::new(3, 2024).unwrap();
        assert_eq!(previous_day_source(&march, 1).unwrap(), DaySource::Previous { day: 29 });
        assert_eq!(previous_day_source(&march, 9).unwrap(), DaySource::Current { day: 8 });
    }

    #[test]
    fn plan_from_previous_week_uses_previous_month_map() {
        let month = november_2023();
        let mut october = ContainerMap::new();
        october.set(ContainerId::slot(25, 3), vec![Token::parse("new:Gio::1")]);
        let mut clock = TokenClock::starting_at(1);

        let command = CopyCommand::FromPreviousWeek { day: 1 };
        assert!(command.reads_previous_month(&month).unwrap());
        let plan = plan_copy(command, &month, &ContainerMap::new(), Some(&october), &mut clock).unwrap();

        assert_eq!(plan.target_days, vec![1]);
        assert_eq!(plan.partial.slot(1, 3).len(), 1);
        assert!(plan.prompt.contains("Wednesday 25 October 2023"));
        assert!(plan.prompt.contains("Wednesday 1 November 2023"));
    }

    #[test]
    fn plan_week_prompt_names_the_weeks() {
        let month = november_2023();
        let mut clock = TokenClock::starting_at(1);
        let plan = plan_copy(CopyCommand::WeekToFutureWeeks { day: 3 }, &month, &ContainerMap::new(), None, &mut clock).unwrap();
        assert_eq!(plan.prompt, "Copy the week of 1–4 to the weeks starting 5, 12, 19, 26?");
        assert!(plan.is_empty());
    }

    #[test]
    fn plan_rejects_days_outside_the_month() {
        let mut clock = TokenClock::starting_at(1);
        let result = plan_copy(CopyCommand::ToFutureWeekdays { day: 31 }, &november_2023(), &ContainerMap::new(), None, &mut clock);
        assert!(matches!(result, Err(SchedulerError::InvalidDay(31))));
    }
}
