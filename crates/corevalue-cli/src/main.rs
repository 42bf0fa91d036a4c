#![forbid(unsafe_code)]

mod cmd;
mod output;
mod presenter;

use std::env;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use corevalue_core::ErrorCode;
use corevalue_core::config::load_config;
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "corevalue: find your core values by repeated comparison",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON output instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Output format (overrides `--json`, `FORMAT` and config).
    #[arg(long, global = true, value_enum)]
    format: Option<OutputMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Session",
        about = "Compare values and print the ranking",
        long_about = "Run an interactive comparison session: pick the value you prefer \
                      out of three, repeatedly. Progress is saved to a session file \
                      after every answer.",
        after_help = "EXAMPLES:\n    # Rank the only value set in this directory\n    cv rank\n\n    # Resume a session, names only\n    cv rank --session .2024-05-01-09:30.session --no-descr\n\n    # Reproducible order, transitive ranking\n    cv rank --seed 7 --mode transitive"
    )]
    Rank(cmd::rank::RankArgs),

    #[command(
        next_help_heading = "Read",
        about = "Rank a stored session",
        long_about = "Print the ranking of a stored session without asking anything.",
        after_help = "EXAMPLES:\n    # Degree ranking\n    cv report --session .2024-05-01-09:30.session\n\n    # Transitive ranking with cycles, as JSON\n    cv report --session .2024-05-01-09:30.session --mode transitive --json"
    )]
    Report(cmd::report::ReportArgs),

    #[command(
        next_help_heading = "Read",
        about = "List stored sessions",
        after_help = "EXAMPLES:\n    # List sessions in this directory\n    cv sessions\n\n    # Emit machine-readable output\n    cv sessions --json"
    )]
    Sessions(cmd::sessions::SessionsArgs),

    #[command(
        next_help_heading = "Read",
        about = "Export a session graph as Graphviz DOT",
        after_help = "EXAMPLES:\n    # Render with graphviz\n    cv export --session .2024-05-01-09:30.session | dot -Tsvg > prefs.svg"
    )]
    Export(cmd::export::ExportArgs),

    #[command(
        next_help_heading = "Maintenance",
        about = "Generate shell completion scripts",
        after_help = "EXAMPLES:\n    # Generate bash completions\n    cv completions bash\n\n    # Generate zsh completions\n    cv completions zsh"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("COREVALUE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "corevalue=debug,info"
        } else {
            "corevalue=info,warn"
        })
    });

    let format = env::var("COREVALUE_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: &Cli) -> (OutputMode, anyhow::Result<()>) {
    let workdir = match env::current_dir() {
        Ok(dir) => dir,
        Err(err) => {
            let output = resolve_output_mode(cli.format, cli.json, None);
            return (output, Err(err.into()));
        }
    };

    let config = match load_config(&workdir) {
        Ok(config) => config,
        Err(err) => {
            let output = resolve_output_mode(cli.format, cli.json, None);
            return (output, Err(err.context(ErrorCode::ConfigParseError)));
        }
    };
    let output = resolve_output_mode(cli.format, cli.json, config.output.as_deref());
    debug!(?output, workdir = %workdir.display(), "resolved output mode");

    let result = match &cli.command {
        Commands::Rank(args) => cmd::rank::run_rank(args, &config, output, &workdir),
        Commands::Report(args) => cmd::report::run_report(args, &config, output, &workdir),
        Commands::Sessions(args) => cmd::sessions::run_sessions(args, output, &workdir),
        Commands::Export(args) => cmd::export::run_export(args, &workdir),
        Commands::Completions(args) => {
            let mut command = Cli::command();
            cmd::completions::run_completions(args.shell, &mut command)
        }
    };
    (output, result)
}

fn to_cli_error(err: &anyhow::Error) -> CliError {
    let message = format!("{err:#}");
    match cmd::error_code(err).or_else(|| err.downcast_ref::<ErrorCode>().copied()) {
        Some(code) => CliError::from_code(message, code),
        None => CliError::new(message),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    let (output, result) = run(&cli);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            debug!(error = ?err, "command failed");
            if let Err(render_err) = render_error(output, &to_cli_error(&err)) {
                eprintln!("error: {err:#} ({render_err})");
            }
            ExitCode::FAILURE
        }
    }
}
