use crate::fmt::truncate;
use crate::models::{Level, Record};
use crate::sort::SortKey;

// ---------------------------------------------------------------------------
// Headline totals
// ---------------------------------------------------------------------------

/// Where the totals came from.
#[derive(Debug, Clone, PartialEq)]
pub enum TotalsBasis {
    SummaryRow,
    Computed(Level),
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub house: f64,
    pub senate: f64,
    pub increase: f64,
    pub decrease: f64,
    pub net: f64,
    pub basis: TotalsBasis,
}

impl Totals {
    fn zero(basis: TotalsBasis) -> Self {
        Self {
            house: 0.0,
            senate: 0.0,
            increase: 0.0,
            decrease: 0.0,
            net: 0.0,
            basis,
        }
    }
}

/// Summation order when no grand-total row exists. Only one level is summed
/// so parent and child rows of the same allocation are not double counted.
const FALLBACK_LEVELS: [Level; 4] = [
    Level::SubAgency,
    Level::Agency,
    Level::Department,
    Level::SpecialPurposeFund,
];

pub fn totals(records: &[Record]) -> Totals {
    if let Some(row) = records.iter().find(|r| r.is_total_row()) {
        return Totals {
            house: row.house,
            senate: row.senate,
            increase: row.increase,
            decrease: row.decrease,
            net: row.net,
            basis: TotalsBasis::SummaryRow,
        };
    }

    let Some(level) = FALLBACK_LEVELS
        .iter()
        .find(|l| records.iter().any(|r| &r.level == *l))
    else {
        return Totals::zero(TotalsBasis::Empty);
    };

    let mut t = Totals::zero(TotalsBasis::Computed(level.clone()));
    for r in records.iter().filter(|r| &r.level == level) {
        t.house += r.house;
        t.senate += r.senate;
        t.increase += r.increase;
        t.decrease += r.decrease;
        t.net += r.net;
    }
    t
}

/// Row counts per level, in level order. Unknown tags are counted together.
pub fn level_counts(records: &[Record]) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Level::KNOWN
        .iter()
        .map(|l| (l.as_str().to_string(), records.iter().filter(|r| &r.level == l).count()))
        .filter(|(_, n)| *n > 0)
        .collect();
    let unknown = records
        .iter()
        .filter(|r| matches!(r.level, Level::Unknown(_)))
        .count();
    if unknown > 0 {
        counts.push(("(unknown)".to_string(), unknown));
    }
    counts
}

// ---------------------------------------------------------------------------
// Chart slices
// ---------------------------------------------------------------------------

pub const OTHERS_LABEL: &str = "Others";

#[derive(Debug, Clone, PartialEq)]
pub struct Slice {
    pub label: String,
    pub value: f64,
}

/// Decrease is stored negative; charts show its magnitude.
pub fn chart_value(record: &Record, key: SortKey) -> f64 {
    match key {
        SortKey::Decrease => record.decrease.abs(),
        _ => key.value(record),
    }
}

/// Largest `n` rows of `level` by `key`, the rest folded into one slice.
pub fn top_slices(
    records: &[Record],
    level: &Level,
    key: SortKey,
    n: usize,
    label_width: usize,
) -> Vec<Slice> {
    let mut rows: Vec<(&Record, f64)> = records
        .iter()
        .filter(|r| &r.level == level)
        .map(|r| (r, chart_value(r, key)))
        .collect();
    rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    let rest: f64 = rows.iter().skip(n).map(|(_, v)| v).sum();
    let mut slices: Vec<Slice> = rows
        .iter()
        .take(n)
        .map(|(r, v)| Slice {
            label: truncate(r.display_name(), label_width),
            value: *v,
        })
        .collect();
    if rows.len() > n && rest != 0.0 {
        slices.push(Slice {
            label: OTHERS_LABEL.to_string(),
            value: rest,
        });
    }
    slices
}

// ---------------------------------------------------------------------------
// Net check
// ---------------------------------------------------------------------------

pub const DEFAULT_NET_TOLERANCE: f64 = 0.5;

pub struct NetDiscrepancy<'a> {
    pub record: &'a Record,
    pub expected: f64,
    pub difference: f64,
}

/// Rows whose Net column disagrees with Senate minus House.
pub fn net_discrepancies(records: &[Record], tolerance: f64) -> Vec<NetDiscrepancy<'_>> {
    records
        .iter()
        .filter_map(|r| {
            let expected = r.senate - r.house;
            let difference = r.net - expected;
            (difference.abs() > tolerance).then_some(NetDiscrepancy {
                record: r,
                expected,
                difference,
            })
        })
        .collect()
}
