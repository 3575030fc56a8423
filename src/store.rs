use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::classify::PageType;

/// Header names tried in order when locating the URL column of the input
/// list; falls back to the first column.
const URL_COLUMNS: &[&str] = &["Address", "URL", "url", "address", "link", "Link"];

/// Checkpoint and report column order. Fixed: the dashboard consumes this
/// schema as-is.
pub const CSV_HEADERS: [&str; 8] = [
    "URL",
    "Page Type",
    "Compliance Level",
    "Vocabulary Complexity",
    "Grammatical Structures",
    "Overall Clarity",
    "Coherence",
    "Rationale",
];

/// A URL with its classification, ready for processing.
#[derive(Debug, Clone)]
pub struct UrlTask {
    pub url: String,
    pub page_type: PageType,
}

/// Final outcome for one URL. Never mutated; a rerun that re-scores a URL
/// produces a replacement. `error` is in-memory bookkeeping only; in the
/// durable schema a failure is encoded in the rationale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageResult {
    pub url: String,
    pub page_type: PageType,
    pub compliance_level: i64,
    pub vocabulary_complexity: i64,
    pub grammatical_structures: i64,
    pub overall_clarity: i64,
    pub coherence: i64,
    pub rationale: String,
    pub error: Option<String>,
}

impl PageResult {
    /// All-zero result carrying an error message, the shape every absorbed
    /// per-URL failure takes.
    pub fn error(url: &str, page_type: PageType, msg: &str) -> Self {
        Self {
            url: url.to_string(),
            page_type,
            compliance_level: 0,
            vocabulary_complexity: 0,
            grammatical_structures: 0,
            overall_clarity: 0,
            coherence: 0,
            rationale: format!("Error: {msg}"),
            error: Some(msg.to_string()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Durable progress state, injected into the orchestrator so tests can run
/// against an in-memory fake.
///
/// Contract: `append_log` must be durable the moment it returns (it is the
/// source of truth for skip-on-resume); `write_checkpoint` overwrites the
/// whole result table.
pub trait Store: Send {
    fn read_log(&self) -> Result<HashSet<String>>;
    fn append_log(&mut self, url: &str) -> Result<()>;
    fn read_checkpoint(&self) -> Result<Vec<PageResult>>;
    fn write_checkpoint(&mut self, results: &[PageResult]) -> Result<()>;
    fn write_report(&mut self, results: &[PageResult]) -> Result<()>;
}

/// File-backed store: newline-delimited URL log, CSV checkpoint and report.
pub struct FsStore {
    log_path: PathBuf,
    checkpoint_path: PathBuf,
    report_path: PathBuf,
}

impl FsStore {
    pub fn new(log_path: PathBuf, checkpoint_path: PathBuf, report_path: PathBuf) -> Self {
        Self {
            log_path,
            checkpoint_path,
            report_path,
        }
    }

    /// Fail early if the output directory cannot be written; a missing
    /// destination is a configuration error, not a per-URL one.
    pub fn ensure_writable(&self) -> Result<()> {
        for path in [&self.log_path, &self.checkpoint_path, &self.report_path] {
            if let Some(dir) = path.parent() {
                if !dir.as_os_str().is_empty() {
                    std::fs::create_dir_all(dir)
                        .with_context(|| format!("cannot create output dir {}", dir.display()))?;
                }
            }
        }
        Ok(())
    }
}

impl Store for FsStore {
    fn read_log(&self) -> Result<HashSet<String>> {
        if !self.log_path.exists() {
            return Ok(HashSet::new());
        }
        let content = std::fs::read_to_string(&self.log_path)
            .with_context(|| format!("cannot read log {}", self.log_path.display()))?;
        Ok(content
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }

    fn append_log(&mut self, url: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("cannot open log {}", self.log_path.display()))?;
        writeln!(file, "{url}")?;
        file.flush()?;
        Ok(())
    }

    fn read_checkpoint(&self) -> Result<Vec<PageResult>> {
        if !self.checkpoint_path.exists() {
            return Ok(Vec::new());
        }
        read_results_csv(&self.checkpoint_path)
    }

    fn write_checkpoint(&mut self, results: &[PageResult]) -> Result<()> {
        write_results_csv(&self.checkpoint_path, results)
    }

    fn write_report(&mut self, results: &[PageResult]) -> Result<()> {
        write_results_csv(&self.report_path, results)
    }
}

fn read_results_csv(path: &Path) -> Result<Vec<PageResult>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("cannot read {}", path.display()))?;

    let mut results = Vec::new();
    for record in reader.records() {
        let record = record?;
        let cell = |i: usize| record.get(i).unwrap_or("").to_string();
        let num = |i: usize| record.get(i).and_then(|v| v.parse().ok()).unwrap_or(0);
        let rationale = cell(7);
        let error = rationale
            .strip_prefix("Error: ")
            .map(|m| m.to_string());
        results.push(PageResult {
            url: cell(0),
            page_type: PageType::parse(record.get(1).unwrap_or("")),
            compliance_level: num(2),
            vocabulary_complexity: num(3),
            grammatical_structures: num(4),
            overall_clarity: num(5),
            coherence: num(6),
            rationale,
            error,
        });
    }
    Ok(results)
}

fn write_results_csv(path: &Path, results: &[PageResult]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("cannot write {}", path.display()))?;
    writer.write_record(CSV_HEADERS)?;
    for r in results {
        writer.write_record([
            r.url.as_str(),
            &r.page_type.to_string(),
            &r.compliance_level.to_string(),
            &r.vocabulary_complexity.to_string(),
            &r.grammatical_structures.to_string(),
            &r.overall_clarity.to_string(),
            &r.coherence.to_string(),
            r.rationale.as_str(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

/// Load the input URL list. The first row is a header; the URL column is
/// located by conventional names, falling back to the first column. Blank
/// cells are dropped.
pub fn load_url_list(path: &Path) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("cannot read URL list {}", path.display()))?;

    let headers = reader.headers()?.clone();
    let col = URL_COLUMNS
        .iter()
        .find_map(|name| headers.iter().position(|h| h == *name))
        .unwrap_or(0);

    let mut urls = Vec::new();
    for record in reader.records() {
        let record = record?;
        if let Some(url) = record.get(col) {
            let url = url.trim();
            if !url.is_empty() {
                urls.push(url.to_string());
            }
        }
    }
    Ok(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result(url: &str) -> PageResult {
        PageResult {
            url: url.to_string(),
            page_type: PageType::Product,
            compliance_level: 75,
            vocabulary_complexity: 8,
            grammatical_structures: 7,
            overall_clarity: 9,
            coherence: 6,
            rationale: "Vocabulary: fine; Grammar: fine".to_string(),
            error: None,
        }
    }

    #[test]
    fn log_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsStore::new(
            dir.path().join("log.txt"),
            dir.path().join("cp.csv"),
            dir.path().join("report.csv"),
        );
        assert!(store.read_log().unwrap().is_empty());

        store.append_log("https://bank.be/a").unwrap();
        store.append_log("https://bank.be/b").unwrap();

        let log = store.read_log().unwrap();
        assert_eq!(log.len(), 2);
        assert!(log.contains("https://bank.be/a"));
    }

    #[test]
    fn checkpoint_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsStore::new(
            dir.path().join("log.txt"),
            dir.path().join("cp.csv"),
            dir.path().join("report.csv"),
        );
        assert!(store.read_checkpoint().unwrap().is_empty());

        let results = vec![
            sample_result("https://bank.be/a"),
            PageResult::error("https://bank.be/b", PageType::Other, "No text extracted"),
        ];
        store.write_checkpoint(&results).unwrap();

        let read = store.read_checkpoint().unwrap();
        assert_eq!(read, results);
    }

    #[test]
    fn checkpoint_rewrite_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cp.csv");
        let mut store = FsStore::new(
            dir.path().join("log.txt"),
            path.clone(),
            dir.path().join("report.csv"),
        );

        let results = vec![sample_result("https://bank.be/a")];
        store.write_checkpoint(&results).unwrap();
        let first = std::fs::read(&path).unwrap();

        let reread = store.read_checkpoint().unwrap();
        store.write_checkpoint(&reread).unwrap();
        let second = std::fs::read(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rationale_with_commas_survives() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsStore::new(
            dir.path().join("log.txt"),
            dir.path().join("cp.csv"),
            dir.path().join("report.csv"),
        );
        let mut r = sample_result("https://bank.be/a");
        r.rationale = "Vocabulary: simple, common words; Grammar: \"clean\", active".to_string();
        store.write_checkpoint(std::slice::from_ref(&r)).unwrap();
        assert_eq!(store.read_checkpoint().unwrap()[0].rationale, r.rationale);
    }

    #[test]
    fn error_flag_reconstructed_from_rationale() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FsStore::new(
            dir.path().join("log.txt"),
            dir.path().join("cp.csv"),
            dir.path().join("report.csv"),
        );
        let r = PageResult::error("https://bank.be/b", PageType::Other, "grader down");
        store.write_checkpoint(std::slice::from_ref(&r)).unwrap();
        let read = store.read_checkpoint().unwrap();
        assert_eq!(read[0].error.as_deref(), Some("grader down"));
        assert!(read[0].is_error());
    }

    #[test]
    fn url_list_by_header_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.csv");
        std::fs::write(&path, "Id,Address\n1,https://bank.be/a\n2,https://bank.be/b\n3,\n")
            .unwrap();
        let urls = load_url_list(&path).unwrap();
        assert_eq!(urls, vec!["https://bank.be/a", "https://bank.be/b"]);
    }

    #[test]
    fn url_list_falls_back_to_first_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.csv");
        std::fs::write(&path, "Webpagina,Categorie\nhttps://bank.be/a,product\n").unwrap();
        let urls = load_url_list(&path).unwrap();
        assert_eq!(urls, vec!["https://bank.be/a"]);
    }

    #[test]
    fn url_list_prefers_earlier_header_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("urls.csv");
        std::fs::write(&path, "link,Address\nhttps://x/wrong,https://x/right\n").unwrap();
        // "Address" comes before "link" in the conventional-name order.
        let urls = load_url_list(&path).unwrap();
        assert_eq!(urls, vec!["https://x/right"]);
    }

    #[test]
    fn missing_url_list_is_fatal() {
        assert!(load_url_list(Path::new("/nonexistent/urls.csv")).is_err());
    }
}
