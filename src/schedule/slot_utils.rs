use serde::{Serialize, Deserialize};

use super::calendar::MonthKey;
use super::types::SlotKey;

/// Shift windows per weekday. Mon–Sat share one list, Sunday has its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftTemplate {
    pub weekday: Vec<String>,
    pub sunday: Vec<String>,
}

impl Default for ShiftTemplate {
    fn default() -> Self {
        ShiftTemplate {
            weekday: vec![
                "8:30-5:30".to_string(),
                "9:00-6:00".to_string(),
                "11:00-8:00".to_string(),
                "Off".to_string(),
            ],
            sunday: vec!["11:00-6:00".to_string(), "Off".to_string()],
        }
    }
}

impl ShiftTemplate {
    /// Windows for a weekday number (0 = Sunday)
    pub fn windows_for_weekday(&self, weekday: u32) -> &[String] {
        if weekday == 0 {
            &self.sunday
        } else {
            &self.weekday
        }
    }

    pub fn windows_for_day(&self, month: &MonthKey, day: u32) -> &[String] {
        self.windows_for_weekday(month.weekday_of(day as i32))
    }

    /// Converts a slot back to its window label for display
    pub fn slot_to_window(&self, month: &MonthKey, key: SlotKey) -> Option<&str> {
        self.windows_for_day(month, key.day)
            .get(key.shift as usize)
            .map(|s| s.as_str())
    }

    /// Whether the slot names a real day of the month and a shift that day has
    pub fn is_valid_slot(&self, month: &MonthKey, key: SlotKey) -> bool {
        month.contains_day(key.day) && self.slot_to_window(month, key).is_some()
    }

    /// All slot keys of the month in day, then shift order
    pub fn month_slots(&self, month: &MonthKey) -> Vec<SlotKey> {
        let mut slots = Vec::new();
        for day in 1..=month.days_in_month() {
            let count = self.windows_for_day(month, day).len() as u32;
            for shift in 0..count {
                slots.push(SlotKey::new(day, shift));
            }
        }
        slots
    }
}
