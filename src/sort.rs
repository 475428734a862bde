use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::BudgetError;
use crate::hierarchy::Departments;
use crate::models::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Senate,
    House,
    Increase,
    Decrease,
    Net,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Senate,
        SortKey::House,
        SortKey::Increase,
        SortKey::Decrease,
        SortKey::Net,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Senate => "Senate",
            Self::House => "House",
            Self::Increase => "Increase",
            Self::Decrease => "Decrease",
            Self::Net => "Net",
        }
    }

    pub fn value(&self, record: &Record) -> f64 {
        match self {
            Self::Senate => record.senate,
            Self::House => record.house,
            Self::Increase => record.increase,
            Self::Decrease => record.decrease,
            Self::Net => record.net,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SortKey {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|k| k.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BudgetError::UnknownSortKey(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }

    pub fn arrow(&self) -> &'static str {
        match self {
            Self::Asc => "\u{2191}",
            Self::Desc => "\u{2193}",
        }
    }
}

/// Direction a column starts in when first chosen: largest first.
pub const DEFAULT_DIRECTION: SortDirection = SortDirection::Desc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(key: SortKey) -> Self {
        Self {
            key,
            direction: DEFAULT_DIRECTION,
        }
    }

    /// Column click: the same key flips direction, a new key starts over at
    /// the default direction.
    pub fn click(previous: Option<SortState>, key: SortKey) -> SortState {
        match previous {
            Some(s) if s.key == key => SortState {
                key,
                direction: s.direction.flip(),
            },
            _ => SortState::new(key),
        }
    }
}

fn compare(a: &Record, b: &Record, key: SortKey, direction: SortDirection) -> Ordering {
    let (x, y) = (key.value(a), key.value(b));
    let ord = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    match direction {
        SortDirection::Asc => ord,
        SortDirection::Desc => ord.reverse(),
    }
}

/// Reorder departments by one amount column. Agencies and sub-agencies keep
/// their order.
pub fn sort_departments(departments: &mut Departments, key: SortKey, direction: SortDirection) {
    departments.sort_by(|a, b| compare(&a.record, &b.record, key, direction));
}

/// Same ordering over a flat list of rows.
pub fn sort_records(records: &mut [Record], key: SortKey, direction: SortDirection) {
    records.sort_by(|a, b| compare(a, b, key, direction));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::build;
    use crate::models::fixtures::{agency, dept};

    fn sample() -> Vec<Record> {
        vec![
            dept("01", "A", 300.0),
            agency("01", "01Z", "Z", 1.0),
            agency("01", "01Y", "Y", 99.0),
            dept("02", "B", 100.0),
            dept("03", "C", 200.0),
        ]
    }

    fn keys(d: &Departments) -> Vec<String> {
        d.keys().map(String::from).collect()
    }

    #[test]
    fn test_sort_desc_then_asc_reverses() {
        let mut tree = build(&sample());
        sort_departments(&mut tree.departments, SortKey::Senate, SortDirection::Desc);
        let desc = keys(&tree.departments);
        assert_eq!(desc, vec!["01", "03", "02"]);
        sort_departments(&mut tree.departments, SortKey::Senate, SortDirection::Asc);
        let mut asc = keys(&tree.departments);
        asc.reverse();
        assert_eq!(asc, desc);
        assert_eq!(tree.departments.len(), 3);
    }

    #[test]
    fn test_sort_leaves_agencies_untouched() {
        let mut tree = build(&sample());
        sort_departments(&mut tree.departments, SortKey::Senate, SortDirection::Asc);
        let agencies: Vec<&str> = tree.departments.get("01").unwrap().agencies.keys().collect();
        assert_eq!(agencies, vec!["01Z", "01Y"]);
    }

    #[test]
    fn test_sort_keeps_key_lookup_valid() {
        let mut tree = build(&sample());
        sort_departments(&mut tree.departments, SortKey::Senate, SortDirection::Asc);
        assert_eq!(tree.departments.get("03").unwrap().record.department_name, "C");
    }

    #[test]
    fn test_placeholders_sort_as_zero() {
        let records = vec![dept("01", "A", -5.0), agency("09", "09A", "Orphan", 50.0)];
        let mut tree = build(&records);
        sort_departments(&mut tree.departments, SortKey::Senate, SortDirection::Desc);
        assert_eq!(keys(&tree.departments), vec!["09", "01"]);
    }

    #[test]
    fn test_click_toggles_and_resets() {
        let s = SortState::click(None, SortKey::Net);
        assert_eq!(s.direction, SortDirection::Desc);
        let s = SortState::click(Some(s), SortKey::Net);
        assert_eq!(s.direction, SortDirection::Asc);
        let s = SortState::click(Some(s), SortKey::House);
        assert_eq!(s, SortState { key: SortKey::House, direction: SortDirection::Desc });
    }

    #[test]
    fn test_sort_key_from_str() {
        assert_eq!("senate".parse::<SortKey>().unwrap(), SortKey::Senate);
        assert_eq!(" NET ".parse::<SortKey>().unwrap(), SortKey::Net);
        assert!("total".parse::<SortKey>().is_err());
    }

    #[test]
    fn test_sort_records_flat() {
        let mut records = sample();
        sort_records(&mut records, SortKey::Senate, SortDirection::Desc);
        let senate: Vec<f64> = records.iter().map(|r| r.senate).collect();
        assert_eq!(senate, vec![300.0, 200.0, 100.0, 99.0, 1.0]);
    }
}
