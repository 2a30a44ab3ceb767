use clap::{ArgAction, Parser};
use exn::ResultExt;
use futures::StreamExt;
use picname_config::{Config, Overrides};
use picname_library::batch::{self, BatchEvent, RunSummary};
use picname_library::collaborator::check_setup;
use picname_library::error::ErrorKind as LibraryErrorKind;
use picname_library::ContentNamer;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Renames images after what is in them: the text they contain, a
/// description of what they show and the date they refer to.
#[derive(Debug, Parser)]
#[command(name = "picname", version, about)]
struct Cli {
    /// Folder containing the images to rename
    #[arg(short, long)]
    source: Option<PathBuf>,
    /// Folder renamed images are moved into (created if missing)
    #[arg(short, long)]
    target: Option<PathBuf>,
    /// Maximum number of images renamed per minute
    #[arg(short, long)]
    rate_limit: Option<u32>,
    /// Maximum length of a generated name, excluding the extension
    #[arg(long)]
    max_length: Option<usize>,
    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Don't check that the collaborator programs are installed
    #[arg(long)]
    skip_setup: bool,
    /// Increase verbosity (-v=DEBUG, -vv=TRACE); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    // The local offset can only be read reliably while single-threaded.
    picname_storage::local_offset();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Could not start the async runtime");
            return ExitCode::FAILURE;
        },
    };
    runtime.block_on(run(cli))
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> ExitCode {
    let overrides = Overrides {
        source: cli.source,
        target: cli.target,
        rate_limit: cli.rate_limit,
        max_length: cli.max_length,
    };
    let config = match Config::load(cli.config.as_deref(), &overrides) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = ?e, "Could not load configuration");
            return ExitCode::FAILURE;
        },
    };

    if cli.skip_setup {
        tracing::debug!("Skipping collaborator setup check");
    } else if let Err(e) = check_setup(&config.collaborators).or_raise(|| LibraryErrorKind::Setup) {
        tracing::error!(error = ?e, "Collaborator setup check failed");
        return ExitCode::FAILURE;
    }

    if !config.source.is_dir() {
        tracing::error!(source = %config.source.display(), "Source folder does not exist");
        return ExitCode::FAILURE;
    }

    let namer = match ContentNamer::from_config(&config) {
        Ok(namer) => namer,
        Err(e) => {
            tracing::error!(error = ?e, "Could not set up image naming");
            return ExitCode::FAILURE;
        },
    };

    let mut events = std::pin::pin!(batch::batch(&config.source, &config.target, config.rate_limit, &namer));
    let mut interrupt = std::pin::pin!(tokio::signal::ctrl_c());
    let mut listening = true;
    loop {
        let event = tokio::select! {
            event = events.next() => event,
            signal = &mut interrupt, if listening => match signal {
                Ok(()) => {
                    tracing::warn!("Interrupted; images already renamed stay where they are");
                    return ExitCode::FAILURE;
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Could not listen for Ctrl-C");
                    listening = false;
                    continue;
                },
            },
        };
        match event {
            Some(Ok(BatchEvent::DiscoveryComplete(0))) => {
                tracing::warn!(source = %config.source.display(), "No images to rename");
            },
            Some(Ok(BatchEvent::Complete(summary))) => {
                report(&summary);
                return ExitCode::SUCCESS;
            },
            Some(Ok(_)) => {},
            Some(Err(e)) => {
                tracing::error!(error = ?e, "Batch run aborted");
                return ExitCode::FAILURE;
            },
            None => return ExitCode::FAILURE,
        }
    }
}

fn report(summary: &RunSummary) {
    for failure in &summary.failures {
        tracing::warn!(path = %failure.path.display(), reason = %failure.reason, "Not renamed");
    }
    tracing::info!(
        processed = summary.processed,
        total = summary.total,
        failed = summary.failures.len(),
        "Finished renaming images",
    );
}
