use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::time::timeout;
use tracing::{info, warn};

use crate::clean;
use crate::config::PipelineConfig;
use crate::extract;
use crate::fetch::{Fetcher, FetcherFactory};
use crate::grader::{self, Grader};
use crate::store::{PageResult, Store, UrlTask};

/// Run the crawl-extract-clean-grade pipeline over `tasks`, resuming from
/// whatever the store already holds. Returns the full accumulated result
/// list (checkpointed rows plus this run's).
///
/// Durability contract: a URL is appended to the processed log the moment
/// its result arrives (completion order); the checkpoint is rewritten only
/// at batch boundaries. A crash mid-batch therefore re-does at most one
/// batch on the next run.
pub async fn run<FF, G, S>(
    config: &PipelineConfig,
    tasks: &[UrlTask],
    factory: Arc<FF>,
    grader: Arc<G>,
    store: &mut S,
) -> Result<Vec<PageResult>>
where
    FF: FetcherFactory,
    G: Grader + 'static,
    S: Store,
{
    let processed: HashSet<String> = store.read_log()?;
    let mut results = store.read_checkpoint()?;
    if !results.is_empty() {
        println!("Resuming from checkpoint with {} existing scores", results.len());
    }

    let remaining: Vec<UrlTask> = tasks
        .iter()
        .filter(|t| !processed.contains(&t.url))
        .cloned()
        .collect();

    if remaining.is_empty() {
        println!("All {} URLs already processed.", tasks.len());
        return Ok(results);
    }

    println!(
        "Processing {} remaining URLs with {} workers (batches of {})",
        remaining.len(),
        config.workers,
        config.batch_size
    );

    let batches: Vec<&[UrlTask]> = remaining.chunks(config.batch_size).collect();
    let total_batches = batches.len();

    for (batch_no, batch) in batches.into_iter().enumerate() {
        println!("Batch {}/{} ({} URLs)", batch_no + 1, total_batches, batch.len());

        let batch_results = run_batch(config, batch, &factory, &grader, store, &mut results).await?;

        store.write_checkpoint(&results)?;
        info!(
            batch = batch_no + 1,
            ok = batch_results.ok,
            errors = batch_results.errors,
            total = results.len(),
            "checkpoint saved"
        );

        if batch_no + 1 < total_batches {
            tokio::time::sleep(config.batch_pause).await;
        }
    }

    Ok(results)
}

struct BatchOutcome {
    ok: usize,
    errors: usize,
}

/// Drain one batch through the worker pool. Each worker owns at most one
/// browser, created on its first URL and dropped when its share of the
/// batch ends; results stream back in completion order and are logged as
/// they arrive.
async fn run_batch<FF, G, S>(
    config: &PipelineConfig,
    batch: &[UrlTask],
    factory: &Arc<FF>,
    grader: &Arc<G>,
    store: &mut S,
    results: &mut Vec<PageResult>,
) -> Result<BatchOutcome>
where
    FF: FetcherFactory,
    G: Grader + 'static,
    S: Store,
{
    let pb = ProgressBar::new(batch.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")?
            .progress_chars("=> "),
    );

    // Fixed worker ownership: URL i goes to worker i % workers. One browser
    // per worker, not one per URL.
    let workers = config.workers.max(1);
    let mut slices: Vec<Vec<UrlTask>> = vec![Vec::new(); workers];
    for (i, task) in batch.iter().enumerate() {
        slices[i % workers].push(task.clone());
    }

    let (tx, mut rx) = tokio::sync::mpsc::channel::<PageResult>(workers * 2);

    for slice in slices.into_iter().filter(|s| !s.is_empty()) {
        let factory = Arc::clone(factory);
        let grader = Arc::clone(grader);
        let tx = tx.clone();
        let url_timeout = config.url_timeout;
        let max_text_len = config.max_text_len;

        tokio::spawn(async move {
            let mut fetcher: Option<FF::Fetcher> = None;
            for task in &slice {
                let outcome = timeout(
                    url_timeout,
                    process_one(&*factory, &mut fetcher, &*grader, task, max_text_len),
                )
                .await;
                let result = match outcome {
                    Ok(result) => result,
                    Err(_) => {
                        warn!(url = %task.url, "per-URL timeout hit");
                        PageResult::error(
                            &task.url,
                            task.page_type,
                            &format!("Timed out after {}s", url_timeout.as_secs()),
                        )
                    }
                };
                if tx.send(result).await.is_err() {
                    return;
                }
            }
            // Browser teardown at batch end, not per URL.
            drop(fetcher);
        });
    }
    drop(tx);

    let mut outcome = BatchOutcome { ok: 0, errors: 0 };
    while let Some(result) = rx.recv().await {
        if result.is_error() {
            outcome.errors += 1;
        } else {
            outcome.ok += 1;
        }
        // Log first only after the result exists; the log is the resume
        // source of truth, so it must never lead the computation.
        store.append_log(&result.url)?;
        results.push(result);
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(outcome)
}

/// One URL through the whole state machine: fetch → extract → clean →
/// grade. Every fault is absorbed into an error-shaped PageResult here;
/// nothing escapes to abort the batch.
async fn process_one<FF, G>(
    factory: &FF,
    fetcher: &mut Option<FF::Fetcher>,
    grader: &G,
    task: &UrlTask,
    max_text_len: usize,
) -> PageResult
where
    FF: FetcherFactory,
    G: Grader,
{
    // The browser API is blocking; hand the fetcher to a blocking thread
    // and take it back afterwards. If the per-URL timeout cancels us while
    // the fetch is in flight, the fetcher stays gone and the next URL
    // simply launches a fresh one.
    let mut f = match fetcher.take() {
        Some(f) => f,
        None => match factory.create() {
            Ok(f) => f,
            Err(e) => {
                return PageResult::error(
                    &task.url,
                    task.page_type,
                    &format!("browser launch failed: {e}"),
                );
            }
        },
    };
    let url = task.url.clone();
    let joined = tokio::task::spawn_blocking(move || {
        let html = f.fetch(&url);
        (f, html)
    })
    .await;

    let html = match joined {
        Ok((f, html)) => {
            *fetcher = Some(f);
            html
        }
        Err(e) => {
            return PageResult::error(&task.url, task.page_type, &format!("fetch panicked: {e}"));
        }
    };

    let text = extract::extract(&html, max_text_len);
    if text.is_empty() {
        return PageResult::error(&task.url, task.page_type, "No text extracted");
    }

    let cleaned = clean::clean(&text);
    if cleaned.is_empty() {
        return PageResult::error(&task.url, task.page_type, "No text extracted");
    }

    let scores = grader.grade(&cleaned, task.page_type).await;
    let compliance = grader::compliance_level(&scores);
    let error = scores.rationale.strip_prefix("Error: ").map(str::to_string);

    PageResult {
        url: task.url.clone(),
        page_type: task.page_type,
        compliance_level: compliance,
        vocabulary_complexity: scores.vocabulary_complexity,
        grammatical_structures: scores.grammatical_structures,
        overall_clarity: scores.overall_clarity,
        coherence: scores.coherence,
        rationale: scores.rationale,
        error,
    }
}
