//! Groups flat budget rows into a Department → Agency → Sub-Agency tree.
//!
//! Rows arrive in file order and may skip intermediate levels. Missing
//! parents are synthesized as placeholders so every child has somewhere to
//! live; a real row arriving later takes over its placeholder's slot.

use std::collections::HashMap;

use tracing::debug;

use crate::models::{Level, Record};

/// Keyed container that remembers first-insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderedNodes<N> {
    nodes: Vec<(String, N)>,
    index: HashMap<String, usize>,
}

impl<N> OrderedNodes<N> {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get the node for `key`, creating it with `make` on first sight.
    /// Returns the node and whether it was created.
    pub fn get_or_insert_with(&mut self, key: &str, make: impl FnOnce() -> N) -> (&mut N, bool) {
        let (i, created) = match self.index.get(key) {
            Some(&i) => (i, false),
            None => {
                self.nodes.push((key.to_string(), make()));
                let i = self.nodes.len() - 1;
                self.index.insert(key.to_string(), i);
                (i, true)
            }
        };
        (&mut self.nodes[i].1, created)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.nodes.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &N> {
        self.nodes.iter().map(|(_, n)| n)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &N)> {
        self.nodes.iter().map(|(k, n)| (k.as_str(), n))
    }

    /// Stable reorder of the entries. Keys keep pointing at their nodes.
    pub fn sort_by(&mut self, mut compare: impl FnMut(&N, &N) -> std::cmp::Ordering) {
        self.nodes.sort_by(|a, b| compare(&a.1, &b.1));
        self.reindex();
    }

    fn reindex(&mut self) {
        self.index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, (k, _))| (k.clone(), i))
            .collect();
    }
}

impl<N> Default for OrderedNodes<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgencyNode {
    pub record: Record,
    pub placeholder: bool,
    pub sub_agencies: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeptNode {
    pub record: Record,
    pub placeholder: bool,
    pub agencies: OrderedNodes<AgencyNode>,
}

pub type Departments = OrderedNodes<DeptNode>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hierarchy {
    pub summary: Vec<Record>,
    pub departments: Departments,
}

impl Hierarchy {
    pub fn agency_count(&self) -> usize {
        self.departments.values().map(|d| d.agencies.len()).sum()
    }
}

/// Stand-in department for a child whose department row is missing: the
/// child's department fields, promoted to the department level, deeper
/// fields blank and no amounts.
pub fn placeholder_department(child: &Record) -> Record {
    let level = if child.level == Level::SpfAgency {
        Level::SpecialPurposeFund
    } else {
        Level::Department
    };
    Record {
        level,
        department_code: child.department_code.clone(),
        department_name: child.department_name.clone(),
        ..Record::default()
    }
}

/// Stand-in agency for a sub-agency whose agency row is missing.
pub fn placeholder_agency(child: &Record) -> Record {
    Record {
        level: Level::Agency,
        department_code: child.department_code.clone(),
        department_name: child.department_name.clone(),
        agency_code: child.agency_code.clone(),
        agency_name: child.agency_name.clone(),
        ..Record::default()
    }
}

fn department_entry<'a>(departments: &'a mut Departments, record: &Record) -> &'a mut DeptNode {
    departments
        .get_or_insert_with(&record.department_code, || DeptNode {
            record: placeholder_department(record),
            placeholder: true,
            agencies: OrderedNodes::new(),
        })
        .0
}

/// Build the tree in a single pass over `records`.
pub fn build(records: &[Record]) -> Hierarchy {
    let mut summary = Vec::new();
    let mut departments = Departments::new();

    for record in records {
        match &record.level {
            Level::Summary => summary.push(record.clone()),
            Level::Department | Level::SpecialPurposeFund => {
                let (node, created) = departments.get_or_insert_with(&record.department_code, || DeptNode {
                    record: record.clone(),
                    placeholder: false,
                    agencies: OrderedNodes::new(),
                });
                if !created && node.placeholder {
                    node.record = record.clone();
                    node.placeholder = false;
                }
            }
            Level::Agency | Level::SpfAgency => {
                let dept = department_entry(&mut departments, record);
                let (node, created) = dept.agencies.get_or_insert_with(&record.agency_code, || AgencyNode {
                    record: record.clone(),
                    placeholder: false,
                    sub_agencies: Vec::new(),
                });
                if !created && node.placeholder {
                    node.record = record.clone();
                    node.placeholder = false;
                }
            }
            Level::SubAgency => {
                let dept = department_entry(&mut departments, record);
                let (agency, _) = dept.agencies.get_or_insert_with(&record.agency_code, || AgencyNode {
                    record: placeholder_agency(record),
                    placeholder: true,
                    sub_agencies: Vec::new(),
                });
                agency.sub_agencies.push(record.clone());
            }
            Level::Unknown(tag) => {
                debug!("Skipping row with unknown level {tag:?} ({})", record.department_name);
            }
        }
    }

    Hierarchy {
        summary,
        departments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{agency, dept, row, sub_agency};

    impl<N> OrderedNodes<N> {
        pub(crate) fn get(&self, key: &str) -> Option<&N> {
            self.index.get(key).map(|&i| &self.nodes[i].1)
        }
    }

    #[test]
    fn test_department_agency_scenario() {
        let records = vec![
            Record {
                house: 90.0,
                net: 10.0,
                increase: 15.0,
                decrease: -5.0,
                ..dept("01", "Foo", 100.0)
            },
            Record {
                house: 35.0,
                net: 5.0,
                increase: 5.0,
                ..agency("01", "01A", "Bar", 40.0)
            },
        ];
        let tree = build(&records);
        assert!(tree.summary.is_empty());
        assert_eq!(tree.departments.len(), 1);
        let d = tree.departments.get("01").unwrap();
        assert!(!d.placeholder);
        assert_eq!(d.record.department_name, "Foo");
        assert_eq!(d.agencies.len(), 1);
        let a = d.agencies.get("01A").unwrap();
        assert_eq!(a.record.agency_name, "Bar");
        assert!(a.sub_agencies.is_empty());
    }

    #[test]
    fn test_lone_sub_agency_synthesizes_both_parents() {
        let records = vec![sub_agency("07", "07B", "07B1", "Field Office")];
        let tree = build(&records);
        assert_eq!(tree.departments.len(), 1);
        let d = tree.departments.get("07").unwrap();
        assert!(d.placeholder);
        assert_eq!(d.record.level, Level::Department);
        assert_eq!(d.record.department_name, "Dept");
        assert_eq!(d.record.agency_code, "");
        assert_eq!(d.agencies.len(), 1);
        let a = d.agencies.get("07B").unwrap();
        assert!(a.placeholder);
        assert_eq!(a.record.level, Level::Agency);
        assert_eq!(a.record.agency_name, "Agency");
        assert_eq!(a.record.sub_agency_code, "");
        assert_eq!(a.sub_agencies, records);
    }

    #[test]
    fn test_first_department_occurrence_wins() {
        let records = vec![dept("01", "First", 1.0), dept("01", "Second", 2.0)];
        let tree = build(&records);
        assert_eq!(tree.departments.len(), 1);
        assert_eq!(tree.departments.get("01").unwrap().record.department_name, "First");
    }

    #[test]
    fn test_late_department_row_replaces_placeholder_in_place() {
        let records = vec![
            agency("01", "01A", "Bar", 5.0),
            dept("02", "Other", 1.0),
            dept("01", "Real", 9.0),
        ];
        let tree = build(&records);
        let keys: Vec<&str> = tree.departments.keys().collect();
        assert_eq!(keys, vec!["01", "02"]);
        let d = tree.departments.get("01").unwrap();
        assert!(!d.placeholder);
        assert_eq!(d.record.department_name, "Real");
        assert_eq!(d.agencies.len(), 1);
    }

    #[test]
    fn test_first_real_row_wins_over_placeholder_and_later_rows() {
        let records = vec![
            sub_agency("01", "01A", "X", "Clinic"),
            agency("01", "01B", "Other", 1.0),
            agency("01", "01A", "Real", 5.0),
            agency("01", "01A", "Late", 7.0),
            dept("01", "Health", 9.0),
            dept("01", "Health Again", 3.0),
        ];
        let tree = build(&records);
        let d = tree.departments.get("01").unwrap();
        assert_eq!(d.record.department_name, "Health");
        assert_eq!(d.record.senate, 9.0);
        let keys: Vec<&str> = d.agencies.keys().collect();
        assert_eq!(keys, vec!["01A", "01B"]);
        let a = d.agencies.get("01A").unwrap();
        assert!(!a.placeholder);
        assert_eq!(a.record.agency_name, "Real");
        assert_eq!(a.record.senate, 5.0);
        assert_eq!(a.sub_agencies.len(), 1);
    }

    #[test]
    fn test_sub_agencies_append_with_duplicates() {
        let s = sub_agency("01", "01A", "X", "Dup");
        let records = vec![agency("01", "01A", "Bar", 0.0), s.clone(), s.clone()];
        let tree = build(&records);
        let a = tree.departments.get("01").unwrap().agencies.get("01A").unwrap();
        assert_eq!(a.sub_agencies.len(), 2);
    }

    #[test]
    fn test_summary_split_and_unknown_dropped() {
        let records = vec![
            row(Level::Summary, ("", "TOTAL_NEW_APPROPRIATIONS"), ("", ""), ("", "")),
            row(Level::Unknown("Bureau".into()), ("09", "Mystery"), ("", ""), ("", "")),
            dept("01", "Foo", 1.0),
        ];
        let tree = build(&records);
        assert_eq!(tree.summary.len(), 1);
        assert_eq!(tree.departments.len(), 1);
        assert!(tree.departments.get("09").is_none());
    }

    #[test]
    fn test_spf_agency_nests_under_fund() {
        let fund = row(Level::SpecialPurposeFund, ("SPF1", "Calamity Fund"), ("", ""), ("", ""));
        let spf_agency = row(Level::SpfAgency, ("SPF1", "Calamity Fund"), ("A1", "NDRRMC"), ("", ""));
        let orphan = row(Level::SpfAgency, ("SPF2", "Pension Fund"), ("B1", "GSIS"), ("", ""));
        let tree = build(&[fund, spf_agency, orphan]);
        assert_eq!(tree.departments.get("SPF1").unwrap().agencies.len(), 1);
        let synthesized = tree.departments.get("SPF2").unwrap();
        assert!(synthesized.placeholder);
        assert_eq!(synthesized.record.level, Level::SpecialPurposeFund);
    }

    #[test]
    fn test_build_is_idempotent() {
        let records = vec![
            sub_agency("03", "03A", "03A1", "S"),
            dept("01", "Foo", 1.0),
            agency("01", "01B", "B", 1.0),
            agency("01", "01A", "A", 1.0),
        ];
        let first = build(&records);
        let second = build(&records);
        assert_eq!(first, second);
        let keys: Vec<&str> = first.departments.keys().collect();
        assert_eq!(keys, vec!["03", "01"]);
        let agency_keys: Vec<&str> = first.departments.get("01").unwrap().agencies.keys().collect();
        assert_eq!(agency_keys, vec!["01B", "01A"]);
    }

    #[test]
    fn test_placeholder_functions_blank_deeper_fields() {
        let child = Record {
            senate: 50.0,
            ..sub_agency("01", "01A", "01A1", "Deep")
        };
        let d = placeholder_department(&child);
        assert_eq!(d.level, Level::Department);
        assert_eq!(d.agency_name, "");
        assert_eq!(d.sub_agency_name, "");
        assert_eq!(d.senate, 0.0);
        let a = placeholder_agency(&child);
        assert_eq!(a.agency_code, "01A");
        assert_eq!(a.sub_agency_code, "");
    }
}
