use std::fmt;
use std::io::Read;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::error::{BudgetError, Result};
use crate::models::Record;

static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[-+]?(\d{1,3}(,\d{3})+|\d+)?(\.\d+)?$").expect("valid regex"));

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a numeric-looking cell. Thousands separators and parenthesized
/// negatives are accepted; anything else is `None`.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return parse_amount(inner).map(|v| -v);
    }
    if s.is_empty() || s == "-" || s == "+" || s == "." || !NUMERIC.is_match(s) {
        return None;
    }
    s.replace(',', "").parse().ok()
}

// ---------------------------------------------------------------------------
// Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Path(PathBuf),
    Url(String),
}

impl Source {
    pub fn parse(raw: &str) -> Source {
        let trimmed = raw.trim();
        let lower = trimmed.to_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Source::Url(trimmed.to_string())
        } else {
            Source::Path(PathBuf::from(trimmed))
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Path(p) => write!(f, "{}", p.display()),
            Source::Url(u) => f.write_str(u),
        }
    }
}

/// Read the raw CSV text of a source.
pub fn fetch(source: &Source) -> Result<String> {
    match source {
        Source::Path(path) => Ok(std::fs::read_to_string(path)?),
        Source::Url(url) => {
            debug!("Fetching {url}");
            let response = reqwest::blocking::get(url)?;
            let status = response.status();
            if !status.is_success() {
                return Err(BudgetError::HttpStatus {
                    url: url.clone(),
                    status: status.as_u16(),
                });
            }
            Ok(response.text()?)
        }
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse CSV text with a header row into records, in file order.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<Record>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let mut records = Vec::new();
    for result in rdr.deserialize::<Record>() {
        records.push(result?);
    }
    Ok(records)
}

pub fn parse_csv_str(text: &str) -> Result<Vec<Record>> {
    parse_csv(text.as_bytes())
}

// ---------------------------------------------------------------------------
// Dataset loading
// ---------------------------------------------------------------------------

/// The loaded dataset. A failed load yields an empty dataset that remembers
/// why it is empty.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub source: Source,
    pub records: Vec<Record>,
    pub load_error: Option<String>,
}

impl Dataset {
    pub fn empty(source: Source, error: impl Into<String>) -> Self {
        Self {
            source,
            records: Vec::new(),
            load_error: Some(error.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

pub fn try_load(source: &Source) -> Result<Vec<Record>> {
    let text = fetch(source)?;
    parse_csv_str(&text)
}

/// Load a dataset, degrading to an empty one on any failure.
pub fn load_dataset(source: &Source) -> Dataset {
    match try_load(source) {
        Ok(records) => {
            info!("Loaded {} rows from {source}", records.len());
            Dataset {
                source: source.clone(),
                records,
                load_error: None,
            }
        }
        Err(e) => {
            warn!("Failed to load {source}: {e}");
            Dataset::empty(source.clone(), e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Background loading with stale-result guard
// ---------------------------------------------------------------------------

/// Loads on a worker thread. Only the most recently requested load can be
/// applied; results of superseded requests are dropped on arrival.
pub struct BackgroundLoad {
    generation: u64,
    pending: Option<(u64, Receiver<(u64, Dataset)>)>,
}

impl BackgroundLoad {
    pub fn new() -> Self {
        Self {
            generation: 0,
            pending: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a load, superseding any load already in flight.
    pub fn start(&mut self, source: Source) -> u64 {
        self.start_with(move || load_dataset(&source))
    }

    pub fn start_with<F>(&mut self, load: F) -> u64
    where
        F: FnOnce() -> Dataset + Send + 'static,
    {
        self.generation += 1;
        let generation = self.generation;
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            // The receiver is gone if the load was superseded or the view closed.
            let _ = tx.send((generation, load()));
        });
        self.pending = Some((generation, rx));
        generation
    }

    /// Cancel any in-flight load; its result will be discarded.
    pub fn cancel(&mut self) {
        if self.pending.take().is_some() {
            self.generation += 1;
        }
    }

    /// Non-blocking check for a finished load of the current generation.
    pub fn poll(&mut self) -> Option<Dataset> {
        let (expected, rx) = self.pending.as_ref()?;
        match rx.try_recv() {
            Ok((generation, dataset)) => {
                let expected = *expected;
                self.pending = None;
                self.accept(generation, expected, dataset)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                None
            }
        }
    }

    fn accept(&self, generation: u64, expected: u64, dataset: Dataset) -> Option<Dataset> {
        if generation != expected || generation != self.generation {
            debug!("Discarding stale load (generation {generation}, current {})", self.generation);
            return None;
        }
        Some(dataset)
    }
}

impl Default for BackgroundLoad {
    fn default() -> Self {
        Self::new()
    }
}
