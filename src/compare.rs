//! Year-over-year comparison of two datasets.
//!
//! Different years format their codes differently ("01.A" vs "01A"), so rows
//! are joined on codes with punctuation and whitespace stripped.

use std::collections::{HashMap, HashSet};

use crate::models::{Level, Record};

/// Strip periods and whitespace so codes from differently formatted files
/// can be joined.
pub fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| *c != '.' && !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinKey {
    pub level: Level,
    pub department: String,
    pub agency: String,
    pub sub_agency: String,
}

impl JoinKey {
    pub fn of(record: &Record) -> Self {
        // Summary rows carry no codes; their name is the identity.
        let department = if record.level == Level::Summary {
            record.department_name.clone()
        } else {
            normalize_code(&record.department_code)
        };
        Self {
            level: record.level.clone(),
            department,
            agency: normalize_code(&record.agency_code),
            sub_agency: normalize_code(&record.sub_agency_code),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub old: Record,
    pub new: Record,
}

impl Change {
    pub fn senate_delta(&self) -> f64 {
        self.new.senate - self.old.senate
    }

    pub fn house_delta(&self) -> f64 {
        self.new.house - self.old.house
    }

    pub fn pct_change(&self) -> Option<f64> {
        (self.old.senate != 0.0).then(|| self.senate_delta() / self.old.senate.abs() * 100.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Comparison {
    pub added: Vec<Record>,
    pub removed: Vec<Record>,
    pub changed: Vec<Change>,
    pub unchanged: usize,
}

impl Comparison {
    /// Changes ordered by absolute Senate movement, largest first.
    pub fn largest_changes(&self, limit: usize) -> Vec<&Change> {
        let mut out: Vec<&Change> = self.changed.iter().collect();
        out.sort_by(|a, b| {
            b.senate_delta()
                .abs()
                .partial_cmp(&a.senate_delta().abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        out.truncate(limit);
        out
    }
}

fn amounts_equal(a: &Record, b: &Record) -> bool {
    a.house == b.house
        && a.senate == b.senate
        && a.increase == b.increase
        && a.decrease == b.decrease
        && a.net == b.net
}

/// Compare `old` against `new`. When a key repeats within one file, its first
/// row is used.
pub fn compare(old: &[Record], new: &[Record]) -> Comparison {
    let mut old_index: HashMap<JoinKey, &Record> = HashMap::new();
    for r in old {
        old_index.entry(JoinKey::of(r)).or_insert(r);
    }
    let mut new_keys: HashSet<JoinKey> = HashSet::new();
    let mut result = Comparison::default();

    for r in new {
        let key = JoinKey::of(r);
        if !new_keys.insert(key.clone()) {
            continue;
        }
        match old_index.get(&key) {
            None => result.added.push(r.clone()),
            Some(prev) if amounts_equal(prev, r) => result.unchanged += 1,
            Some(prev) => result.changed.push(Change {
                old: (*prev).clone(),
                new: r.clone(),
            }),
        }
    }

    let mut seen_removed: HashSet<JoinKey> = HashSet::new();
    for r in old {
        let key = JoinKey::of(r);
        if !new_keys.contains(&key) && seen_removed.insert(key) {
            result.removed.push(r.clone());
        }
    }
    result
}
