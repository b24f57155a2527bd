use csv::ReaderBuilder;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use log::warn;

use crate::error::Result;
use crate::schedule::{SalesStaff, StaffType};

/// Parses a staff type from directory spellings ("New", "new cars", "USED", ...)
fn parse_staff_type(value: &str) -> Option<StaffType> {
    let lower = value.trim().to_lowercase();
    if lower.starts_with("new") {
        Some(StaffType::New)
    } else if lower.starts_with("used") || lower.starts_with("pre-owned") {
        Some(StaffType::Used)
    } else {
        StaffType::parse(&lower)
    }
}

/// Loads the sales staff directory from a CSV file
pub async fn load_staff_directory<P: AsRef<Path>>(csv_path: P) -> Result<Vec<SalesStaff>> {
    let bytes = tokio::fs::read(csv_path).await?;
    read_staff_directory(bytes.as_slice())
}

/// Reads staff records from CSV. Columns are found by header name; rows
/// without a name or with an unknown type are skipped. A later row for the
/// same name replaces an earlier one.
pub fn read_staff_directory<R: Read>(input: R) -> Result<Vec<SalesStaff>> {
    let mut reader = ReaderBuilder::new().flexible(true).trim(csv::Trim::All).from_reader(input);
    let headers = reader.headers()?.clone();

    let find = |needle: &str| headers.iter().position(|h| h.to_lowercase().replace(['_', ' '], "") == needle);
    let name_col = find("name").unwrap_or(0);
    let type_col = find("type").unwrap_or(1);
    let display_col = find("displayname");

    let mut order: Vec<String> = Vec::new();
    let mut by_name: HashMap<String, SalesStaff> = HashMap::new();

    for (line, result) in reader.records().enumerate() {
        let record = result?;
        let name = record.get(name_col).unwrap_or("").to_string();
        if name.is_empty() {
            continue;
        }
        let staff_type = match parse_staff_type(record.get(type_col).unwrap_or("")) {
            Some(staff_type) => staff_type,
            None => {
                warn!("Skipping staff row {} ({}): unknown type", line + 2, name);
                continue;
            }
        };
        let display_name = display_col
            .and_then(|col| record.get(col))
            .unwrap_or("")
            .to_string();

        if !by_name.contains_key(&name) {
            order.push(name.clone());
        }
        by_name.insert(name.clone(), SalesStaff { name, staff_type, display_name });
    }

    Ok(order.into_iter().filter_map(|name| by_name.remove(&name)).collect())
}
