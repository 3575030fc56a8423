use std::path::PathBuf;
use std::time::Duration;

/// Pipeline tunables. Defaults match the sizing the scanner was profiled at:
/// a handful of Chrome instances and checkpoints every couple of dozen pages.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Parallel workers per batch; each worker owns one browser.
    pub workers: usize,
    /// URLs per batch; the checkpoint is rewritten after every batch.
    pub batch_size: usize,
    /// Hard ceiling on a single URL's fetch+clean+grade round trip.
    pub url_timeout: Duration,
    /// Max characters of cleaned text submitted to the grader.
    pub max_text_len: usize,
    /// Pause between batches to ease load on the target site and the grader.
    pub batch_pause: Duration,
    pub log_path: PathBuf,
    pub checkpoint_path: PathBuf,
    pub report_path: PathBuf,
}

impl PipelineConfig {
    /// Build a config with all durable files living under `out_dir`.
    pub fn with_out_dir(out_dir: &str) -> Self {
        let dir = PathBuf::from(out_dir);
        Self {
            workers: 4,
            batch_size: 20,
            url_timeout: Duration::from_secs(60),
            max_text_len: 10_000,
            batch_pause: Duration::from_secs(2),
            log_path: dir.join("processed_urls.log"),
            checkpoint_path: dir.join("checkpoint.csv"),
            report_path: dir.join("b2_compliance_report.csv"),
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::with_out_dir("data")
    }
}
