use crate::models::{Level, Record};

/// True when `record` passes both the search term and the level filter.
///
/// The search is a case-insensitive substring test over the department,
/// agency and sub-agency names. The term is matched as typed, surrounding
/// spaces included; a blank term matches everything.
pub fn matches(record: &Record, search: &str, level: Option<&Level>) -> bool {
    if let Some(l) = level {
        if &record.level != l {
            return false;
        }
    }
    if search.trim().is_empty() {
        return true;
    }
    let term = search.to_lowercase();
    [
        &record.department_name,
        &record.agency_name,
        &record.sub_agency_name,
    ]
    .iter()
    .any(|name| name.to_lowercase().contains(&term))
}

/// Order-preserving filter over the full dataset.
pub fn filter(records: &[Record], search: &str, level: Option<&Level>) -> Vec<Record> {
    records
        .iter()
        .filter(|r| matches(r, search, level))
        .cloned()
        .collect()
}
