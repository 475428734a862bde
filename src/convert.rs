//! Flattens a committee-report JSON document into budget CSV rows.
//!
//! The report nests agencies under departments and sub-agencies under
//! agencies; each node carries a code, a name and the five amount fields.
//! Every node becomes one row tagged with its level, with its ancestors'
//! codes and names repeated on it.

use serde_json::{Map, Value};

use crate::error::{BudgetError, Result};
use crate::loader::parse_amount;
use crate::models::{Level, Record};

pub const DEFAULT_UNIT: &str = "Thousand Pesos";

#[derive(Debug, Clone)]
pub struct FlatReport {
    pub report_key: String,
    pub unit: Option<String>,
    pub records: Vec<Record>,
}

fn text(node: &Value, key: &str) -> String {
    match node.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn num(node: &Value, key: &str) -> f64 {
    match node.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => parse_amount(s).unwrap_or(0.0),
        _ => 0.0,
    }
}

fn children<'a>(node: &'a Value, key: &str) -> &'a [Value] {
    node.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// A row with the amounts of `node` and the given identity fields.
fn row(level: Level, node: &Value, dept: (&str, &str), agency: (&str, &str), sub: (&str, &str)) -> Record {
    Record {
        level,
        department_code: dept.0.to_string(),
        department_name: dept.1.to_string(),
        agency_code: agency.0.to_string(),
        agency_name: agency.1.to_string(),
        sub_agency_code: sub.0.to_string(),
        sub_agency_name: sub.1.to_string(),
        house: num(node, "house"),
        increase: num(node, "increase"),
        decrease: num(node, "decrease"),
        net: num(node, "net"),
        senate: num(node, "senate"),
    }
}

fn pick_report<'a>(root: &'a Map<String, Value>, key: Option<&str>) -> Result<(&'a str, &'a Value)> {
    match key {
        Some(k) => root
            .get_key_value(k)
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| BudgetError::Other(format!("Report key {k:?} not found"))),
        None => root
            .iter()
            .find(|(_, v)| v.is_object())
            .map(|(k, v)| (k.as_str(), v))
            .ok_or_else(|| BudgetError::Other("No report object found in JSON".into())),
    }
}

/// Flatten the report held under `report_key` (or the first object-valued
/// key when none is given).
pub fn flatten_report(root: &Value, report_key: Option<&str>) -> Result<FlatReport> {
    let obj = root
        .as_object()
        .ok_or_else(|| BudgetError::Other("Expected a JSON object at the top level".into()))?;
    let (key, report) = pick_report(obj, report_key)?;
    let mut records = Vec::new();
    let none = ("", "");

    if let Some(summary) = report.get("summary").and_then(Value::as_object) {
        for (name, values) in summary {
            records.push(row(Level::Summary, values, ("", name.as_str()), none, none));
        }
    }

    for dept in children(report, "DEPARTMENTS") {
        let (dcode, dname) = (text(dept, "code"), text(dept, "name"));
        let d = (dcode.as_str(), dname.as_str());
        records.push(row(Level::Department, dept, d, none, none));

        for agency in children(dept, "agencies") {
            let (acode, aname) = (text(agency, "code"), text(agency, "name"));
            let a = (acode.as_str(), aname.as_str());
            records.push(row(Level::Agency, agency, d, a, none));

            for sub in children(agency, "sub_agencies") {
                let (scode, sname) = (text(sub, "code"), text(sub, "name"));
                records.push(row(Level::SubAgency, sub, d, a, (scode.as_str(), sname.as_str())));
            }
        }
    }

    for fund in children(report, "SPECIAL_PURPOSE_FUNDS") {
        let (fcode, fname) = (text(fund, "code"), text(fund, "name"));
        let f = (fcode.as_str(), fname.as_str());
        records.push(row(Level::SpecialPurposeFund, fund, f, none, none));

        for agency in children(fund, "agencies") {
            let (acode, aname) = (text(agency, "code"), text(agency, "name"));
            records.push(row(Level::SpfAgency, agency, f, (acode.as_str(), aname.as_str()), none));
        }
    }

    let unit = report
        .get("unit")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(FlatReport {
        report_key: key.to_string(),
        unit,
        records,
    })
}

pub fn flatten_str(json: &str, report_key: Option<&str>) -> Result<FlatReport> {
    let root: Value = serde_json::from_str(json)?;
    flatten_report(&root, report_key)
}
