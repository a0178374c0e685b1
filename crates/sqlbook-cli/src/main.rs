//! sqlbook CLI - SQLite exercise runner and completion inspector

use sqlbook_cli::cli;
use sqlbook_cli::input;
use sqlbook_cli::output;

use anyhow::{Context, Result};
use clap::Parser;
use is_terminal::IsTerminal;
use sqlbook_core::{split_statements, CompletionRequest, CursorPosition, Seed};
use sqlbook_session::{EngineClient, SessionConfig, SessionError, SqlSession};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use cli::{Args, Command, CompleteArgs, OutputFormat, RunArgs, SchemaArgs};
use output::{
    format_details, format_objects, format_outcomes, format_suggestions, to_json, ObjectReport,
    StatementOutcome,
};

/// A statement failed, or the requested object does not exist.
const EXIT_FAILURE: u8 = 1;
/// Unusable input: missing files, bad configuration, engine start-up failure.
const EXIT_CONFIG_ERROR: u8 = 66;

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    let colored = !args.no_color && io::stdout().is_terminal();
    let outcome = match &args.command {
        Command::Run(run) => run_exercise(&args, run, colored),
        Command::Complete(complete) => run_complete(&args, complete, colored),
        Command::Schema(schema) => run_schema(&args, schema, colored),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(EXIT_FAILURE),
        Err(e) => {
            eprintln!("sqlbook: error: {e:#}");
            ExitCode::from(EXIT_CONFIG_ERROR)
        }
    }
}

/// Log to stderr, filtered by `SQLBOOK_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env("SQLBOOK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

/// Spawn an engine and open the configured session on it.
async fn open_session(config: &SessionConfig, seed: Option<Seed>) -> Result<SqlSession> {
    let handle = sqlbook_worker::spawn().context("Failed to start SQL engine")?;
    let client = EngineClient::connect(handle, config.request_timeout());
    let session = SqlSession::new(client, config);
    session
        .init(seed)
        .await
        .context("Failed to initialise exercise database")?;
    Ok(session)
}

/// Execute each statement in order, stopping at the first one that fails.
///
/// Returns whether every statement succeeded.
fn run_exercise(args: &Args, run: &RunArgs, colored: bool) -> Result<bool> {
    let mut config = input::load_config(args.config.as_deref(), args.timeout_ms)?;
    if let Some(limit) = run.limit {
        config.exec_row_limit = limit;
    }
    let script = input::read_sql(&run.file)?;
    let seed = run.seed.as_deref().map(input::read_seed).transpose()?;

    let outcomes = runtime()?.block_on(async {
        let session = open_session(&config, seed).await?;
        let mut outcomes = Vec::new();
        for statement in split_statements(&script) {
            match session.execute(&statement).await {
                Ok(result) => outcomes.push(StatementOutcome::ok(statement, result)),
                Err(SessionError::Engine(message)) => {
                    outcomes.push(StatementOutcome::failed(statement, message));
                    break;
                }
                Err(err) => return Err(err).context("Engine request failed"),
            }
        }
        Ok::<_, anyhow::Error>(outcomes)
    })?;

    let rendered = match run.format {
        OutputFormat::Table => format_outcomes(&outcomes, colored),
        OutputFormat::Json => to_json(&outcomes, run.compact)? + "\n",
    };
    print!("{rendered}");

    Ok(outcomes.iter().all(|outcome| outcome.error.is_none()))
}

/// Print the suggestions offered at a cursor, against the seeded catalog.
fn run_complete(args: &Args, complete: &CompleteArgs, colored: bool) -> Result<bool> {
    let config = input::load_config(args.config.as_deref(), args.timeout_ms)?;
    let text = input::read_sql(&complete.file)?;
    let seed = complete.seed.as_deref().map(input::read_seed).transpose()?;

    let list = runtime()?.block_on(async {
        let session = open_session(&config, seed).await?;
        let provider = session.completion_provider();
        let cursor = CursorPosition::new(complete.line, complete.column);
        let request = CompletionRequest::new(text, cursor);
        Ok::<_, anyhow::Error>(provider.provide_completion_items(&request))
    })?;

    let rendered = match complete.format {
        OutputFormat::Table => format_suggestions(&list, colored),
        OutputFormat::Json => to_json(&list, complete.compact)? + "\n",
    };
    print!("{rendered}");
    Ok(list.error.is_none())
}

/// List the seeded database's objects, or describe one and preview its rows.
fn run_schema(args: &Args, schema: &SchemaArgs, colored: bool) -> Result<bool> {
    let config = input::load_config(args.config.as_deref(), args.timeout_ms)?;
    let seed = schema.seed.as_deref().map(input::read_seed).transpose()?;

    let rendered = runtime()?.block_on(async {
        let session = open_session(&config, seed).await?;
        let Some(name) = schema.object.as_deref() else {
            let objects = session.objects().await.context("Failed to list objects")?;
            return Ok::<_, anyhow::Error>(Some(match schema.format {
                OutputFormat::Table => format_objects(&objects),
                OutputFormat::Json => to_json(&objects, schema.compact)? + "\n",
            }));
        };

        let details = match session.describe(name).await {
            Ok(details) => details,
            Err(err @ SessionError::UnknownObject(_)) => {
                eprintln!("sqlbook: {err}");
                return Ok(None);
            }
            Err(err) => return Err(err).context("Failed to describe object"),
        };
        let preview = session
            .preview(&details.name)
            .await
            .context("Failed to preview object")?;
        let report = ObjectReport { details, preview };
        Ok(Some(match schema.format {
            OutputFormat::Table => format_details(&report, colored),
            OutputFormat::Json => to_json(&report, schema.compact)? + "\n",
        }))
    })?;

    match rendered {
        Some(text) => {
            print!("{text}");
            Ok(true)
        }
        None => Ok(false),
    }
}
