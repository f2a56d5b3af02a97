use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use scanmerge::{
    combine::{Operation, DEFAULT_THRESHOLD},
    conditions::{LoadMode, Separator},
    config::Config,
    error::InputError,
    fetch::HttpScreener,
    history::HistoryStore,
    pipeline::{self, IntersectScope, RunRequest},
    prompt::Prompter,
    report,
};
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    process::ExitCode,
    time::Duration,
};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SeparatorArg {
    Newline,
    Comma,
    Semicolon,
    Tab,
    Custom,
    Brackets,
}

/// Combine Chartink screener results across several scan conditions.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// intersect | union | all
    mode: String,

    /// File of scan clauses or screener URLs
    input: PathBuf,

    /// How conditions in the input file are separated (prompted if omitted)
    #[arg(long, value_enum)]
    separator: Option<SeparatorArg>,

    /// Separator string for `--separator custom`
    #[arg(long)]
    custom_separator: Option<String>,

    /// Minimum appearances for intersect (prompted if omitted)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    min_appearances: Option<u64>,

    /// Intersect across the last 7 days of runs
    #[arg(long, conflicts_with = "single_run")]
    history: bool,

    /// Intersect within this run only
    #[arg(long)]
    single_run: bool,

    /// History file location
    #[arg(long, env = "SCANMERGE_HISTORY_FILE")]
    history_file: Option<PathBuf>,

    /// Pause between screener requests, in milliseconds
    #[arg(long, env = "SCANMERGE_DELAY_MS", default_value_t = 1000,
          value_parser = clap::value_parser!(u64).range(1000..))]
    delay_ms: u64,

    /// Screener host, e.g. a local mirror
    #[arg(long, env = "SCANMERGE_BASE_URL")]
    base_url: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let operation: Operation = args.mode.parse()?;
    if !args.input.is_file() {
        return Err(InputError::FileNotFound(args.input.clone()).into());
    }

    let mut cfg = Config::default();
    if let Some(base) = &args.base_url {
        cfg = cfg.with_base_url(base);
    }
    if let Some(path) = &args.history_file {
        cfg.history_path = path.clone();
    }
    cfg.request_delay = Duration::from_millis(args.delay_ms);
    info!(history = %cfg.history_path.display(), delay = ?cfg.request_delay, "configuration");

    let request = {
        let stdin = io::stdin();
        let mut prompter = Prompter::new(stdin.lock(), io::stdout());
        build_request(&args, operation, &mut prompter).context("reading answers")?
    };

    let api = HttpScreener::new(&cfg).context("building HTTP client")?;
    let store = HistoryStore::new(&cfg.history_path).with_retention(cfg.retention_days);
    let summary = pipeline::execute(api, &store, &request, cfg.request_delay).await?;

    if !summary.skipped.is_empty() {
        warn!(skipped = summary.skipped.len(), "some conditions were skipped, see above");
    }
    if !summary.history_saved {
        warn!(path = %store.path().display(), "history was not updated");
    }
    info!(
        output = %summary.output.display(),
        rows = summary.rows,
        fetched = summary.fetched,
        "done"
    );
    Ok(())
}

/// Settle every choice, asking only for what the flags left open.
fn build_request<R: BufRead, W: Write>(
    args: &Args,
    operation: Operation,
    prompter: &mut Prompter<R, W>,
) -> Result<RunRequest> {
    let load_mode = match (args.separator, &args.custom_separator) {
        (Some(SeparatorArg::Newline), _) => LoadMode::Split(Separator::Newline),
        (Some(SeparatorArg::Comma), _) => LoadMode::Split(Separator::Comma),
        (Some(SeparatorArg::Semicolon), _) => LoadMode::Split(Separator::Semicolon),
        (Some(SeparatorArg::Tab), _) => LoadMode::Split(Separator::Tab),
        (Some(SeparatorArg::Brackets), _) => LoadMode::Brackets,
        (Some(SeparatorArg::Custom) | None, Some(sep)) => {
            LoadMode::Split(Separator::Custom(sep.clone()))
        }
        (Some(SeparatorArg::Custom), None) => {
            LoadMode::Split(Separator::Custom(prompter.custom_separator()?))
        }
        (None, None) => prompter.load_mode()?,
    };

    let (threshold, scope) = if operation == Operation::Intersect {
        let threshold = match args.min_appearances {
            Some(n) => n as usize,
            None => prompter.min_appearances()?,
        };
        let scope = if args.history {
            IntersectScope::History
        } else if args.single_run {
            IntersectScope::SingleRun
        } else {
            prompter.intersect_scope()?
        };
        (threshold, scope)
    } else {
        (DEFAULT_THRESHOLD, IntersectScope::SingleRun)
    };

    Ok(RunRequest {
        operation,
        output: report::output_path(&args.input, operation),
        input: args.input.clone(),
        load_mode,
        threshold,
        scope,
    })
}
