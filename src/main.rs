use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};

use b2scan::classify::{self, ClassifierCache};
use b2scan::config::PipelineConfig;
use b2scan::fetch::ChromeFetcherFactory;
use b2scan::grader::LlmGrader;
use b2scan::pipeline;
use b2scan::report;
use b2scan::store::{self, FsStore, Store, UrlTask};

#[derive(Parser)]
#[command(name = "b2scan", about = "CEFR B2 plain-language compliance scanner for banking sites")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl, grade and checkpoint every URL in the input list (resumable)
    Run {
        /// CSV file with one URL per row
        input: PathBuf,
        /// Parallel workers (one browser each)
        #[arg(short, long, default_value_t = 4)]
        workers: usize,
        /// URLs per batch; the checkpoint is rewritten after each batch
        #[arg(short, long, default_value_t = 20)]
        batch_size: usize,
        /// Per-URL processing ceiling in seconds
        #[arg(long, default_value_t = 60)]
        url_timeout: u64,
        /// Max characters of cleaned text sent to the grader
        #[arg(long, default_value_t = 10_000)]
        max_text: usize,
        /// Directory holding the processed log, checkpoint and report
        #[arg(short, long, default_value = "data")]
        out_dir: String,
        /// Only consider the first N URLs of the list
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Print the compliance summary from an existing checkpoint
    Report {
        #[arg(short, long, default_value = "data")]
        out_dir: String,
    },
    /// Show processing progress counts
    Stats {
        #[arg(short, long, default_value = "data")]
        out_dir: String,
        /// Input list to compute remaining URLs against
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Classify a single URL and print its page type
    Classify { url: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            workers,
            batch_size,
            url_timeout,
            max_text,
            out_dir,
            limit,
        } => {
            let mut config = PipelineConfig::with_out_dir(&out_dir);
            config.workers = workers.max(1);
            config.batch_size = batch_size.max(1);
            config.url_timeout = Duration::from_secs(url_timeout);
            config.max_text_len = max_text;

            let urls = store::load_url_list(&input)?;
            println!("Loaded {} URLs from {}", urls.len(), input.display());

            let mut cache = ClassifierCache::new();
            let mut tasks: Vec<UrlTask> = urls
                .iter()
                .map(|url| UrlTask {
                    url: url.clone(),
                    page_type: cache.classify(url),
                })
                .collect();
            if let Some(n) = limit {
                tasks.truncate(n);
            }
            report::print_distribution(&tasks);

            let mut fs_store = FsStore::new(
                config.log_path.clone(),
                config.checkpoint_path.clone(),
                config.report_path.clone(),
            );
            fs_store.ensure_writable()?;

            let factory = Arc::new(ChromeFetcherFactory);
            let grader = Arc::new(LlmGrader::from_env()?);

            let results = pipeline::run(&config, &tasks, factory, grader, &mut fs_store).await?;

            match report::summarize(&results) {
                Some(summary) => report::print_summary(&summary),
                None => println!("No results to summarize."),
            }
            fs_store.write_report(&results)?;
            println!("\nResults saved to {}", config.report_path.display());
            Ok(())
        }
        Commands::Report { out_dir } => {
            let config = PipelineConfig::with_out_dir(&out_dir);
            let fs_store = FsStore::new(
                config.log_path,
                config.checkpoint_path,
                config.report_path,
            );
            let results = fs_store.read_checkpoint()?;
            match report::summarize(&results) {
                Some(summary) => report::print_summary(&summary),
                None => println!("No checkpointed results found."),
            }
            Ok(())
        }
        Commands::Stats { out_dir, input } => {
            let config = PipelineConfig::with_out_dir(&out_dir);
            let fs_store = FsStore::new(
                config.log_path,
                config.checkpoint_path,
                config.report_path,
            );
            let log = fs_store.read_log()?;
            let checkpoint = fs_store.read_checkpoint()?;
            let errors = checkpoint.iter().filter(|r| r.is_error()).count();
            println!("Processed: {}", log.len());
            println!("Scored:    {}", checkpoint.len());
            println!("Errors:    {}", errors);
            if let Some(input) = input {
                let urls = store::load_url_list(&input)?;
                let remaining = urls.iter().filter(|u| !log.contains(*u)).count();
                println!("Total:     {}", urls.len());
                println!("Remaining: {}", remaining);
            }
            Ok(())
        }
        Commands::Classify { url } => {
            println!("{}", classify::classify(&url));
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
