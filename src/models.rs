use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::BudgetError;
use crate::loader::parse_amount;

/// Name of the Summary row that carries the grand totals.
pub const TOTAL_ROW_NAME: &str = "TOTAL_NEW_APPROPRIATIONS";

/// CSV column names, in file order.
pub const COLUMNS: [&str; 12] = [
    "Level",
    "Department_Code",
    "Department_Name",
    "Agency_Code",
    "Agency_Name",
    "Sub_Agency_Code",
    "Sub_Agency_Name",
    "House",
    "Increase",
    "Decrease",
    "Net",
    "Senate",
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Level {
    Summary,
    Department,
    Agency,
    SubAgency,
    SpecialPurposeFund,
    SpfAgency,
    /// A tag none of the views understand. Kept verbatim so it survives
    /// filtering and export.
    Unknown(String),
}

impl Level {
    pub const KNOWN: [Level; 6] = [
        Level::Summary,
        Level::Department,
        Level::Agency,
        Level::SubAgency,
        Level::SpecialPurposeFund,
        Level::SpfAgency,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::Summary => "Summary",
            Self::Department => "Department",
            Self::Agency => "Agency",
            Self::SubAgency => "Sub-Agency",
            Self::SpecialPurposeFund => "Special Purpose Fund",
            Self::SpfAgency => "SPF Agency",
            Self::Unknown(tag) => tag,
        }
    }

    /// Map a CSV tag to a level. Only exact tags are recognized; anything
    /// else becomes `Unknown`.
    pub fn from_tag(tag: &str) -> Level {
        Self::KNOWN
            .iter()
            .find(|l| l.as_str() == tag)
            .cloned()
            .unwrap_or_else(|| Level::Unknown(tag.to_string()))
    }

    /// The name field this level owns.
    pub fn own_name<'a>(&self, record: &'a Record) -> &'a str {
        match self {
            Self::SubAgency => &record.sub_agency_name,
            Self::Agency | Self::SpfAgency => &record.agency_name,
            _ => &record.department_name,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses user input (command-line flags). Accepts the CSV tags plus a few
/// shorthand spellings, case-insensitively.
impl FromStr for Level {
    type Err = BudgetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match key.as_str() {
            "summary" => Ok(Level::Summary),
            "department" | "dept" => Ok(Level::Department),
            "agency" => Ok(Level::Agency),
            "subagency" | "sub" => Ok(Level::SubAgency),
            "specialpurposefund" | "spf" => Ok(Level::SpecialPurposeFund),
            "spfagency" => Ok(Level::SpfAgency),
            _ => Err(BudgetError::UnknownLevel(s.to_string())),
        }
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::Unknown(String::new())
    }
}

impl Serialize for Level {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Level {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        Ok(Level::from_tag(tag.trim()))
    }
}

/// One row of the budget dataset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "Level", default)]
    pub level: Level,
    #[serde(rename = "Department_Code", default)]
    pub department_code: String,
    #[serde(rename = "Department_Name", default)]
    pub department_name: String,
    #[serde(rename = "Agency_Code", default)]
    pub agency_code: String,
    #[serde(rename = "Agency_Name", default)]
    pub agency_name: String,
    #[serde(rename = "Sub_Agency_Code", default)]
    pub sub_agency_code: String,
    #[serde(rename = "Sub_Agency_Name", default)]
    pub sub_agency_name: String,
    #[serde(rename = "House", default, deserialize_with = "de_amount", serialize_with = "ser_amount")]
    pub house: f64,
    #[serde(rename = "Increase", default, deserialize_with = "de_amount", serialize_with = "ser_amount")]
    pub increase: f64,
    #[serde(rename = "Decrease", default, deserialize_with = "de_amount", serialize_with = "ser_amount")]
    pub decrease: f64,
    #[serde(rename = "Net", default, deserialize_with = "de_amount", serialize_with = "ser_amount")]
    pub net: f64,
    #[serde(rename = "Senate", default, deserialize_with = "de_amount", serialize_with = "ser_amount")]
    pub senate: f64,
}

impl Record {
    /// The most specific name this row carries, regardless of level.
    pub fn display_name(&self) -> &str {
        match &self.level {
            Level::Unknown(_) => [&self.sub_agency_name, &self.agency_name, &self.department_name]
                .into_iter()
                .find(|n| !n.is_empty())
                .map(String::as_str)
                .unwrap_or(""),
            level => level.own_name(self),
        }
    }

    /// The code belonging to this row's own level.
    pub fn display_code(&self) -> &str {
        match self.level {
            Level::SubAgency => &self.sub_agency_code,
            Level::Agency | Level::SpfAgency => &self.agency_code,
            _ => &self.department_code,
        }
    }

    pub fn is_total_row(&self) -> bool {
        self.level == Level::Summary && self.department_name == TOTAL_ROW_NAME
    }
}

fn de_amount<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(0.0);
    };
    Ok(parse_amount(&raw).unwrap_or_else(|| {
        if !raw.trim().is_empty() {
            tracing::debug!("Non-numeric amount {raw:?} read as 0");
        }
        0.0
    }))
}

/// Whole amounts are written without a fractional part so exports look like
/// the source file.
fn ser_amount<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 9.0e15 {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}
