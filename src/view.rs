//! View state and the pure derivation of what the table shows.
//!
//! The browser owns a `ViewState` and replaces it on every key press; the
//! functions here recompute the filtered rows, the tree and the visible row
//! list from the immutable dataset plus that state.

use std::collections::HashSet;

use crate::filter;
use crate::hierarchy::{self, Hierarchy};
use crate::models::{Level, Record};
use crate::sort::{self, SortKey, SortState};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeKey {
    Department(String),
    Agency(String, String),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ViewState {
    pub search: String,
    pub level: Option<Level>,
    pub sort: Option<SortState>,
    pub expanded: HashSet<NodeKey>,
}

impl ViewState {
    pub fn with_search(self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..self
        }
    }

    pub fn with_level(self, level: Option<Level>) -> Self {
        Self { level, ..self }
    }

    pub fn with_sort(self, sort: Option<SortState>) -> Self {
        Self { sort, ..self }
    }

    pub fn click_sort(self, key: SortKey) -> Self {
        let sort = Some(SortState::click(self.sort, key));
        Self { sort, ..self }
    }

    pub fn toggle(mut self, key: NodeKey) -> Self {
        if !self.expanded.remove(&key) {
            self.expanded.insert(key);
        }
        self
    }

    pub fn collapse_all(self) -> Self {
        Self {
            expanded: HashSet::new(),
            ..self
        }
    }

    /// Expand every node of `tree`.
    pub fn expand_all(mut self, tree: &Hierarchy) -> Self {
        for (code, dept) in tree.departments.iter() {
            self.expanded.insert(NodeKey::Department(code.to_string()));
            for agency_code in dept.agencies.keys() {
                self.expanded
                    .insert(NodeKey::Agency(code.to_string(), agency_code.to_string()));
            }
        }
        self
    }

    pub fn is_expanded(&self, key: &NodeKey) -> bool {
        self.expanded.contains(key)
    }

    /// Level cycle used by the browser: all → Summary → … → SPF Agency → all.
    pub fn next_level(&self) -> Option<Level> {
        match &self.level {
            None => Some(Level::KNOWN[0].clone()),
            Some(current) => {
                let pos = Level::KNOWN.iter().position(|l| l == current)?;
                Level::KNOWN.get(pos + 1).cloned()
            }
        }
    }

    pub fn describe(&self) -> String {
        let mut parts = Vec::new();
        if !self.search.trim().is_empty() {
            parts.push(format!("search \"{}\"", self.search.trim()));
        }
        if let Some(level) = &self.level {
            parts.push(format!("level {level}"));
        }
        if let Some(s) = &self.sort {
            parts.push(format!("sort {} {}", s.key, s.direction.arrow()));
        }
        parts.join(", ")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VisibleRow {
    pub depth: usize,
    pub record: Record,
    pub key: Option<NodeKey>,
    pub expandable: bool,
    pub expanded: bool,
    pub placeholder: bool,
}

impl VisibleRow {
    fn leaf(depth: usize, record: &Record) -> Self {
        Self {
            depth,
            record: record.clone(),
            key: None,
            expandable: false,
            expanded: false,
            placeholder: false,
        }
    }
}

/// Everything the table view needs for one state.
#[derive(Debug, Clone)]
pub struct Derived {
    pub filtered: Vec<Record>,
    pub tree: Hierarchy,
    pub rows: Vec<VisibleRow>,
}

pub fn derive(records: &[Record], state: &ViewState) -> Derived {
    let filtered = filter::filter(records, &state.search, state.level.as_ref());
    let tree = build_tree(&filtered, state.sort);
    let rows = visible_rows(&tree, state);
    Derived {
        filtered,
        tree,
        rows,
    }
}

pub fn build_tree(records: &[Record], sort: Option<SortState>) -> Hierarchy {
    let mut tree = hierarchy::build(records);
    if let Some(s) = sort {
        sort::sort_departments(&mut tree.departments, s.key, s.direction);
    }
    tree
}

/// Flatten the tree into display order, descending only into expanded nodes.
pub fn visible_rows(tree: &Hierarchy, state: &ViewState) -> Vec<VisibleRow> {
    let mut rows: Vec<VisibleRow> = tree.summary.iter().map(|r| VisibleRow::leaf(0, r)).collect();

    for (code, dept) in tree.departments.iter() {
        let dept_key = NodeKey::Department(code.to_string());
        let dept_open = state.is_expanded(&dept_key);
        rows.push(VisibleRow {
            depth: 0,
            record: dept.record.clone(),
            expandable: !dept.agencies.is_empty(),
            expanded: dept_open,
            placeholder: dept.placeholder,
            key: Some(dept_key),
        });
        if !dept_open {
            continue;
        }
        for (agency_code, agency) in dept.agencies.iter() {
            let agency_key = NodeKey::Agency(code.to_string(), agency_code.to_string());
            let agency_open = state.is_expanded(&agency_key);
            rows.push(VisibleRow {
                depth: 1,
                record: agency.record.clone(),
                expandable: !agency.sub_agencies.is_empty(),
                expanded: agency_open,
                placeholder: agency.placeholder,
                key: Some(agency_key),
            });
            if agency_open {
                rows.extend(agency.sub_agencies.iter().map(|s| VisibleRow::leaf(2, s)));
            }
        }
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{agency, dept, row, sub_agency};

    fn sample() -> Vec<Record> {
        vec![
            row(Level::Summary, ("", "TOTAL_NEW_APPROPRIATIONS"), ("", ""), ("", "")),
            dept("01", "Health", 100.0),
            agency("01", "01A", "Hospitals", 60.0),
            sub_agency("01", "01A", "01A1", "Regional Hospital"),
            dept("02", "Education", 300.0),
        ]
    }

    #[test]
    fn test_collapsed_shows_summary_and_departments() {
        let d = derive(&sample(), &ViewState::default());
        let names: Vec<&str> = d.rows.iter().map(|r| r.record.display_name()).collect();
        assert_eq!(names, vec!["TOTAL_NEW_APPROPRIATIONS", "Health", "Education"]);
        assert!(d.rows[1].expandable);
        assert!(!d.rows[2].expandable);
    }

    #[test]
    fn test_expand_reveals_children_in_order() {
        let state = ViewState::default()
            .toggle(NodeKey::Department("01".into()))
            .toggle(NodeKey::Agency("01".into(), "01A".into()));
        let d = derive(&sample(), &state);
        let depths: Vec<usize> = d.rows.iter().map(|r| r.depth).collect();
        assert_eq!(depths, vec![0, 0, 1, 2, 0]);
        assert_eq!(d.rows[3].record.sub_agency_name, "Regional Hospital");
    }

    #[test]
    fn test_toggle_twice_collapses() {
        let key = NodeKey::Department("01".into());
        let state = ViewState::default().toggle(key.clone()).toggle(key.clone());
        assert!(!state.is_expanded(&key));
    }

    #[test]
    fn test_expand_all_and_sort() {
        let records = sample();
        let tree = hierarchy::build(&records);
        let state = ViewState::default()
            .expand_all(&tree)
            .click_sort(SortKey::Senate);
        let d = derive(&records, &state);
        assert_eq!(d.rows.len(), 5);
        assert_eq!(d.rows[1].record.department_name, "Education");
        assert_eq!(d.rows[2].record.department_name, "Health");
    }

    #[test]
    fn test_search_narrows_tree_with_placeholders() {
        let state = ViewState::default().with_search("regional");
        let state = state.toggle(NodeKey::Department("01".into()));
        let d = derive(&sample(), &state);
        assert_eq!(d.filtered.len(), 1);
        assert!(d.rows[0].placeholder);
        assert_eq!(d.rows[1].depth, 1);
        assert!(d.rows[1].placeholder);
    }

    #[test]
    fn test_next_level_cycles_back_to_all() {
        let mut state = ViewState::default();
        let mut seen = Vec::new();
        loop {
            let next = state.next_level();
            match &next {
                Some(l) => seen.push(l.clone()),
                None => break,
            }
            state = state.with_level(next);
        }
        assert_eq!(seen, Level::KNOWN.to_vec());
    }

    #[test]
    fn test_describe() {
        let state = ViewState::default()
            .with_search("hea")
            .with_level(Some(Level::Agency))
            .click_sort(SortKey::Net);
        assert_eq!(state.describe(), "search \"hea\", level Agency, sort Net \u{2193}");
    }
}
