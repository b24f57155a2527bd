use std::fs::File;
use std::io::Write;

use crate::error::Result;
use crate::schedule::calendar::WEEKDAY_NAMES;
use crate::schedule::{ContainerMap, MonthKey, ShiftTemplate, SlotKey};

/// Formats a slot's assignments as display names, or [EMPTY]
pub fn format_slot(containers: &ContainerMap, key: SlotKey) -> String {
    let names: Vec<&str> = containers
        .slot(key.day, key.shift)
        .iter()
        .map(|t| t.display_name())
        .collect();
    if names.is_empty() {
        "[EMPTY]".to_string()
    } else {
        names.join(", ")
    }
}

/// Renders the month as text: one block per day, one line per shift window
pub fn render_month(month: &MonthKey, containers: &ContainerMap, template: &ShiftTemplate) -> String {
    let mut out = String::new();
    out.push_str(&format!("** {} **\n", month.label()));

    for day in 1..=month.days_in_month() {
        let weekday = month.weekday_of(day as i32) as usize;
        out.push_str(&format!("\n{} {}\n", WEEKDAY_NAMES[weekday], day));
        for (shift, window) in template.windows_for_day(month, day).iter().enumerate() {
            let key = SlotKey::new(day, shift as u32);
            out.push_str(&format!("  {:<12} {}\n", window, format_slot(containers, key)));
        }
    }
    out
}

/// Writes a month schedule to a file
pub fn write_schedule_to_file(
    month: &MonthKey,
    containers: &ContainerMap,
    template: &ShiftTemplate,
    filename: &str,
) -> Result<()> {
    let mut file = File::create(filename)?;
    file.write_all(render_month(month, containers, template).as_bytes())?;
    Ok(())
}

/// Prints a month schedule with a short summary
pub fn print_month_schedule(month: &MonthKey, containers: &ContainerMap, template: &ShiftTemplate, published: bool) {
    let assigned: usize = containers.slots().map(|(_, tokens)| tokens.len()).sum();
    println!("\n=== {} Schedule ({}) ===", month.label(), if published { "published" } else { "draft" });
    println!("Total assignments: {}", assigned);
    print!("{}", render_month(month, containers, template));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{ContainerId, Token};

    #[test]
    fn renders_names_without_prefixes_or_stamps() {
        let month = MonthKey::new(3, 2024).unwrap();
        let mut containers = ContainerMap::new();
        containers.set(ContainerId::slot(5, 0), vec![Token::parse("new:Gio::1"), Token::parse("special:Closed")]);

        let text = render_month(&month, &containers, &ShiftTemplate::default());
        assert!(text.starts_with("** March 2024 **"));
        assert!(text.contains("Tuesday 5\n  8:30-5:30    Gio, Closed\n"));
        assert!(text.contains("Sunday 3\n  11:00-6:00   [EMPTY]\n  Off          [EMPTY]\n\n"));
    }
}
