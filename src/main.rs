use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use strm_mirror::cli::{version_report, Args, PromptChooser};
use strm_mirror::core_mirror::WalkSummary;
use strm_mirror::core_runtime::logging::{init_logging, LoggingConfig};
use strm_mirror::core_service::bootstrap_desktop;
use strm_mirror::progress::{ProgressReporter, SpinnerLogger};

#[core_async::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if args.version {
        print!("{}", version_report());
        return ExitCode::SUCCESS;
    }

    match run(args).await {
        Ok(summary) => {
            println!("{summary}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<WalkSummary> {
    let spinner = args.live_updates() && std::io::stderr().is_terminal();
    let reporter = if spinner {
        ProgressReporter::new()
    } else {
        ProgressReporter::hidden()
    };
    init_tracing(&args, spinner.then_some(&reporter))?;

    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let config = args.mirror_config(&cwd)?;
    debug!(?config, "Configuration loaded");

    let token = args
        .token
        .as_deref()
        .context("An access token is required: pass --token or set STRM_ACCESS_TOKEN")?;
    let core = bootstrap_desktop(token)?;

    let root_id = core
        .resolve_root(args.source.as_deref(), &PromptChooser)
        .await?;

    let result = if config.live_updates {
        reporter.start();
        reporter
            .track(core.subscribe(), core.mirror(&root_id, &config))
            .await
    } else {
        core.mirror(&root_id, &config).await
    };
    reporter.finish();

    Ok(result?)
}

fn init_tracing(args: &Args, reporter: Option<&ProgressReporter>) -> Result<()> {
    let mut logging = LoggingConfig::default()
        .with_verbosity(args.verbose)
        .with_target(args.verbose > 0);

    if let Some(filter) = &args.log_filter {
        logging = logging.with_filter(filter.clone());
    }

    if let Some(reporter) = reporter {
        let sink = SpinnerLogger::new(reporter.bar().clone(), logging.level);
        logging = logging
            .with_logger_sink(Arc::new(sink))
            .with_console(false);
    }

    init_logging(logging).context("Failed to initialize logging")
}
