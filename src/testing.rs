//! Test doubles for the pipeline's injected boundaries: store, fetcher
//! and grader. They let the orchestrator run without a browser, a network
//! or a filesystem.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::classify::PageType;
use crate::fetch::{Fetcher, FetcherFactory};
use crate::grader::{GradeScores, Grader};
use crate::store::{PageResult, Store};

/// In-memory [`Store`]: the log is an ordered vec (append order matters in
/// assertions), checkpoint and report are plain snapshots.
#[derive(Default)]
pub struct MemStore {
    pub log: Vec<String>,
    pub checkpoint: Vec<PageResult>,
    pub report: Option<Vec<PageResult>>,
    pub checkpoint_writes: usize,
}

impl Store for MemStore {
    fn read_log(&self) -> Result<HashSet<String>> {
        Ok(self.log.iter().cloned().collect())
    }

    fn append_log(&mut self, url: &str) -> Result<()> {
        self.log.push(url.to_string());
        Ok(())
    }

    fn read_checkpoint(&self) -> Result<Vec<PageResult>> {
        Ok(self.checkpoint.clone())
    }

    fn write_checkpoint(&mut self, results: &[PageResult]) -> Result<()> {
        self.checkpoint = results.to_vec();
        self.checkpoint_writes += 1;
        Ok(())
    }

    fn write_report(&mut self, results: &[PageResult]) -> Result<()> {
        self.report = Some(results.to_vec());
        Ok(())
    }
}

/// Serves canned HTML by URL; unknown URLs fetch as empty, exactly like a
/// failed navigation.
pub struct StubFetcher {
    pages: Arc<HashMap<String, String>>,
}

impl Fetcher for StubFetcher {
    fn fetch(&mut self, url: &str) -> String {
        self.pages.get(url).cloned().unwrap_or_default()
    }
}

/// Factory for [`StubFetcher`]s; counts creations so tests can assert the
/// one-browser-per-worker lifecycle.
#[derive(Default)]
pub struct StubFetcherFactory {
    pages: Arc<HashMap<String, String>>,
    pub created: AtomicUsize,
}

impl StubFetcherFactory {
    pub fn with_pages(pages: HashMap<String, String>) -> Self {
        Self {
            pages: Arc::new(pages),
            created: AtomicUsize::new(0),
        }
    }

    pub fn created_count(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl FetcherFactory for StubFetcherFactory {
    type Fetcher = StubFetcher;

    fn create(&self) -> Result<StubFetcher> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(StubFetcher {
            pages: Arc::clone(&self.pages),
        })
    }
}

/// Deterministic grader: fixed scores, an optional failure trigger
/// (any text containing `fail_on` degrades like a service outage) and an
/// optional per-call delay for timeout tests.
pub struct StubGrader {
    pub scores: [i64; 4],
    pub rationale: String,
    pub fail_on: Option<String>,
    pub delay: Option<Duration>,
}

impl StubGrader {
    pub fn scoring(scores: [i64; 4]) -> Self {
        Self {
            scores,
            rationale: "Vocabulary: ok; Grammar: ok; Clarity: ok; Coherence: ok".to_string(),
            fail_on: None,
            delay: None,
        }
    }
}

#[async_trait]
impl Grader for StubGrader {
    async fn grade(&self, text: &str, _page_type: PageType) -> GradeScores {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(marker) = &self.fail_on {
            if text.contains(marker) {
                return GradeScores::error("grader service unavailable");
            }
        }
        GradeScores {
            vocabulary_complexity: self.scores[0],
            grammatical_structures: self.scores[1],
            overall_clarity: self.scores[2],
            coherence: self.scores[3],
            rationale: self.rationale.clone(),
        }
    }
}
