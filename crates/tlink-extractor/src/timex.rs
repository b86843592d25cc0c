//! Time-expression normalization
//!
//! Maps lower-cased time-expression text to a categorical index token
//! (`<timex-text>|<index>` per line in the resource file). The table is
//! loaded once, before any document is processed, and shared read-only.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use tlink_core::{ExtractorConfig, Result, TlinkError};

/// Index emitted for time expressions missing from the table
pub const DEFAULT_OOV_TOKEN: &str = "<timex_797>";

static LINE_BREAKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\r\n]+").expect("line break pattern is valid"));

/// Lower-case and replace each run of line breaks with one space
pub fn normalize_text(text: &str) -> String {
    LINE_BREAKS.replace_all(&text.to_lowercase(), " ").into_owned()
}

// ============================================================================
// Table
// ============================================================================

/// Immutable timex text -> index table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimexTable {
    entries: HashMap<String, String>,
    skipped: usize,
}

impl TimexTable {
    /// Parse table content. Lines without a `|` or with an empty index are skipped.
    pub fn parse(content: &str) -> Self {
        let mut table = Self::default();
        for line in content.lines() {
            table.add_line(line);
        }
        table
    }

    /// Read a table from any buffered reader
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut table = Self::default();
        for line in reader.lines() {
            table.add_line(&line?);
        }
        Ok(table)
    }

    /// Read a table from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            TlinkError::ResourceError(format!("cannot open {}: {}", path.display(), e))
        })?;

        Self::from_reader(BufReader::new(file))
    }

    fn add_line(&mut self, line: &str) {
        let line = line.trim();
        if line.is_empty() {
            return;
        }

        // The timex text itself may contain '|'
        match line.rsplit_once('|') {
            Some((timex, index)) if !index.is_empty() => {
                self.entries.insert(timex.to_string(), index.to_string());
            }
            _ => {
                tracing::debug!("Skipping malformed timex table line: {:?}", line);
                self.skipped += 1;
            }
        }
    }

    pub fn get(&self, timex: &str) -> Option<&str> {
        self.entries.get(timex).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of malformed lines dropped while loading
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<K, V> FromIterator<(K, V)> for TimexTable
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            skipped: 0,
        }
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Outcome of the one-time table initialization
#[derive(Debug)]
pub enum TableLoad {
    /// Table read successfully
    Loaded(TimexTable),
    /// Table could not be read; lookups will all fall back to the OOV token
    Degraded { table: TimexTable, error: TlinkError },
}

impl TableLoad {
    /// Load the table, degrading to an empty table on failure
    pub fn initialize(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match TimexTable::load(path) {
            Ok(table) => {
                tracing::info!(
                    "Loaded {} timex index entries from {} ({} malformed lines skipped)",
                    table.len(),
                    path.display(),
                    table.skipped()
                );
                Self::Loaded(table)
            }
            Err(error) => {
                tracing::warn!(
                    "Timex index table unavailable, every time expression maps to the OOV token: {}",
                    error
                );
                Self::Degraded {
                    table: TimexTable::default(),
                    error,
                }
            }
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }

    pub fn table(&self) -> &TimexTable {
        match self {
            Self::Loaded(table) | Self::Degraded { table, .. } => table,
        }
    }

    pub fn into_table(self) -> TimexTable {
        match self {
            Self::Loaded(table) | Self::Degraded { table, .. } => table,
        }
    }
}

// ============================================================================
// Normalizer
// ============================================================================

/// Shared, read-only timex normalizer
#[derive(Debug, Clone)]
pub struct TimexNormalizer {
    table: Arc<TimexTable>,
    oov_token: String,
}

impl TimexNormalizer {
    /// Create a normalizer over a loaded table
    pub fn new(table: impl Into<Arc<TimexTable>>) -> Self {
        Self {
            table: table.into(),
            oov_token: DEFAULT_OOV_TOKEN.to_string(),
        }
    }

    /// Initialize from configuration. The returned flag is true when the
    /// table failed to load and the normalizer is running all-OOV.
    pub fn from_config(config: &ExtractorConfig) -> (Self, bool) {
        let load = TableLoad::initialize(&config.timex_resource);
        let degraded = load.is_degraded();
        let normalizer = Self::new(load.into_table()).with_oov_token(config.oov_token.clone());
        (normalizer, degraded)
    }

    /// Set the out-of-vocabulary token
    pub fn with_oov_token(mut self, token: impl Into<String>) -> Self {
        self.oov_token = token.into();
        self
    }

    pub fn oov_token(&self) -> &str {
        &self.oov_token
    }

    pub fn table(&self) -> &TimexTable {
        &self.table
    }

    /// Map time-expression text to its index token
    pub fn normalize(&self, text: &str) -> &str {
        self.table
            .get(&normalize_text(text))
            .unwrap_or(self.oov_token.as_str())
    }
}

impl Default for TimexNormalizer {
    fn default() -> Self {
        Self::new(TimexTable::default())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_skips_malformed_lines() {
        let table = TimexTable::parse("today|\njan 1|T1\nno separator\n\n");

        assert_eq!(table.len(), 1);
        assert_eq!(table.skipped(), 2);
        assert_eq!(table.get("jan 1"), Some("T1"));
        assert_eq!(table.get("today"), None);
    }

    #[test]
    fn test_parse_splits_on_last_separator() {
        let table = TimexTable::parse("  1|2 weeks|<timex_12>  ");
        assert_eq!(table.get("1|2 weeks"), Some("<timex_12>"));
    }

    #[test]
    fn test_normalize_lookup_and_oov() {
        let normalizer = TimexNormalizer::new(TimexTable::parse("jan 1|T1"));

        assert_eq!(normalizer.normalize("JAN 1"), "T1");
        assert_eq!(normalizer.normalize("unknown"), DEFAULT_OOV_TOKEN);
    }

    #[test]
    fn test_normalize_collapses_line_breaks() {
        let normalizer =
            TimexNormalizer::new(TimexTable::from_iter([("two weeks ago", "<timex_3>")]));

        assert_eq!(normalizer.normalize("Two\r\nweeks\nago"), "<timex_3>");
        assert_eq!(normalize_text("A\n\n\nB\rC"), "a b c");
    }

    #[test]
    fn test_oov_independent_of_table() {
        let empty = TimexNormalizer::default();
        let full = TimexNormalizer::new(TimexTable::parse("today|<timex_1>\nnow|<timex_2>"))
            .with_oov_token("<unk>");

        assert_eq!(empty.normalize("some text never in table"), DEFAULT_OOV_TOKEN);
        assert_eq!(full.normalize("some text never in table"), "<unk>");
    }

    #[test]
    fn test_initialize_degrades_on_missing_file() {
        let load = TableLoad::initialize("/nonexistent/timex_idx.txt");

        assert!(load.is_degraded());
        assert!(load.table().is_empty());

        let normalizer = TimexNormalizer::new(load.into_table());
        assert_eq!(normalizer.normalize("today"), DEFAULT_OOV_TOKEN);
    }

    #[test]
    fn test_initialize_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "today|<timex_1>").unwrap();
        writeln!(file, "yesterday|<timex_2>").unwrap();

        let load = TableLoad::initialize(file.path());
        assert!(!load.is_degraded());
        assert_eq!(load.table().len(), 2);
    }

    #[test]
    fn test_from_config() {
        let config = ExtractorConfig {
            timex_resource: "/nonexistent/timex_idx.txt".into(),
            oov_token: "<oov>".to_string(),
            ..Default::default()
        };

        let (normalizer, degraded) = TimexNormalizer::from_config(&config);
        assert!(degraded);
        assert_eq!(normalizer.normalize("today"), "<oov>");
    }
}
