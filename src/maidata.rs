use std::fs;
use std::path::Path;

use log::{debug, warn};
use thiserror::Error;

/// Number of fumen/level buckets a chart file can carry (`&inote_1`
/// through `&inote_7`).
pub const SLOTS: usize = 7;

const DIFFICULTY_NAMES: [&str; SLOTS] = [
    "EASY",
    "BASIC",
    "ADVANCED",
    "EXPERT",
    "MASTER",
    "Re:MASTER",
    "ORIGINAL",
];

/// Display name for a fumen slot.
pub fn difficulty_name(slot: usize) -> &'static str {
    DIFFICULTY_NAMES.get(slot).copied().unwrap_or("UNKNOWN")
}

#[derive(Debug, Error)]
pub enum MaidataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("{0} contains no chart records")]
    NoRecords(String),
}

/// Parsed contents of one `maidata.txt`: song metadata plus the raw fumen
/// text and level value for each difficulty slot.
#[derive(Debug, Default)]
pub struct MaidataFile {
    pub title: String,
    pub artist: String,
    pub designer: String,
    /// Audio offset in seconds (`&first`); every note time starts from it.
    pub first: f64,
    pub fumens: [String; SLOTS],
    pub levels: [Option<String>; SLOTS],
}

impl MaidataFile {
    pub fn load(path: &Path) -> Result<Self, MaidataError> {
        let text = fs::read_to_string(path).map_err(|source| MaidataError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text).ok_or_else(|| MaidataError::NoRecords(path.display().to_string()))
    }

    /// Parse chart file text. Records are `&key=value` lines; a value runs
    /// until the next record, so fumen bodies keep their newlines. Returns
    /// `None` when no records are present at all.
    pub fn parse(text: &str) -> Option<Self> {
        let mut file = Self::default();
        let mut records = 0usize;
        let mut key: Option<String> = None;
        let mut value = String::new();

        for line in text.lines() {
            let line = line.trim_start_matches('\u{feff}');
            if let Some(rest) = line.strip_prefix('&') {
                if let Some(k) = key.take() {
                    file.store(&k, value.trim());
                    records += 1;
                }
                value.clear();
                match rest.split_once('=') {
                    Some((k, v)) => {
                        key = Some(k.trim().to_string());
                        value.push_str(v);
                    }
                    None => warn!("skipping malformed record line '&{rest}'"),
                }
            } else if key.is_some() {
                value.push('\n');
                value.push_str(line);
            }
        }
        if let Some(k) = key.take() {
            file.store(&k, value.trim());
            records += 1;
        }
        (records > 0).then_some(file)
    }

    fn store(&mut self, key: &str, value: &str) {
        match key {
            "title" => self.title = value.to_string(),
            "artist" => self.artist = value.to_string(),
            "des" => self.designer = value.to_string(),
            "first" => match value.parse::<f64>() {
                Ok(v) => self.first = v,
                Err(_) => warn!("malformed &first value '{value}', keeping 0"),
            },
            _ => {
                if let Some(slot) = slot_index(key, "lv_") {
                    self.levels[slot] = Some(value.to_string());
                } else if let Some(slot) = slot_index(key, "inote_") {
                    self.fumens[slot] = value.to_string();
                } else {
                    debug!("ignoring unrecognized key '&{key}'");
                }
            }
        }
    }

    /// Slot indices in 1..=5 holding chart text, ascending. The pipeline
    /// exports BASIC through Re:MASTER and never touches slots 0 and 6.
    pub fn available_levels(&self) -> Vec<usize> {
        (1..=5).filter(|&slot| !self.fumens[slot].is_empty()).collect()
    }

    /// Level value string for a slot; missing values report "0".
    pub fn level_value(&self, slot: usize) -> &str {
        self.levels
            .get(slot)
            .and_then(|v| v.as_deref())
            .unwrap_or("0")
    }
}

/// `lv_3` / `inote_3` style keys are one-based; buckets are zero-based.
fn slot_index(key: &str, prefix: &str) -> Option<usize> {
    let n: usize = key.strip_prefix(prefix)?.parse().ok()?;
    (1..=SLOTS).contains(&n).then(|| n - 1)
}
