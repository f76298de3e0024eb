//! # Scrivener
//!
//! Command-line front end for the Scrivener command interpreter.
//!
//! ## Quick Start
//!
//! ```bash
//! # Apply a command script to a file and print the result
//! cargo run -- run notes.txt --script edits.txt
//!
//! # Show the context block the assistant would see
//! cargo run -- context notes.txt --cursor 12
//!
//! # Ask the configured assistant to make a change
//! cargo run -- ask notes.txt "capitalize the first word"
//! ```
//!
//! The buffer is never written back: results go to stdout, logs and
//! traces to stderr.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use scrivener_assist::{
    AssistError, AssistReply, Assistant, ProcessTransport, ScriptedTransport, Transport,
};
use scrivener_core::{BufferState, Config, Session, TraceEntry};

/// Scrivener - apply AI-generated edit commands to text
#[derive(Parser, Debug)]
#[command(name = "scrivener")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file (defaults to the user config directory)
    #[arg(short, long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run a command script as one sequence and print the result
    Run {
        /// Text file to edit
        file: PathBuf,

        /// Command script, one command per line
        #[arg(short, long)]
        script: PathBuf,

        /// Initial cursor offset
        #[arg(long, default_value_t = 0)]
        cursor: usize,

        /// Print the trace to stderr
        #[arg(long)]
        trace: bool,

        /// Print the final state and the trace as JSON instead of the buffer
        #[arg(long)]
        json: bool,
    },

    /// Run a command script one line at a time
    Step {
        file: PathBuf,

        #[arg(short, long)]
        script: PathBuf,

        #[arg(long, default_value_t = 0)]
        cursor: usize,
    },

    /// Print the editor context for a file
    Context {
        file: PathBuf,

        #[arg(long, default_value_t = 0)]
        cursor: usize,
    },

    /// Send an instruction to the assistant and apply its commands
    Ask {
        file: PathBuf,

        /// What to change, in plain words
        instruction: String,

        #[arg(long, default_value_t = 0)]
        cursor: usize,

        /// Only list the commands the assistant returned
        #[arg(long)]
        dry_run: bool,

        /// Use this file as the assistant's reply instead of calling it
        #[arg(long, value_name = "FILE")]
        replay: Option<PathBuf>,
    },

    /// Print the default configuration as TOML
    DefaultConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // RUST_LOG, when set, refines the level picked by -v
    let filter = EnvFilter::builder()
        .with_default_directive(level_filter(args.verbose).into())
        .from_env_lossy();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(filter)
        .init();

    tracing::info!("Starting Scrivener v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load(),
    };

    match args.command {
        Cmd::Run {
            file,
            script,
            cursor,
            trace,
            json,
        } => {
            let mut session = open_session(&file, cursor, config)?;
            session.accept_reply(read_script(&script)?);
            let entries = session.run_pending();

            if json {
                let report = run_report(session.state(), &entries);
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                if trace {
                    print_trace(&entries);
                }
                print!("{}", session.state().content());
            }
        }

        Cmd::Step {
            file,
            script,
            cursor,
        } => {
            let mut session = open_session(&file, cursor, config)?;
            for line in read_script(&script)? {
                let id = session.enqueue(line);
                session.execute_line(id)?;
                if let Some(entry) = session.log().last() {
                    eprintln!("{entry}");
                }
            }
            print!("{}", session.state().content());
        }

        Cmd::Context { file, cursor } => {
            let session = open_session(&file, cursor, config)?;
            print!("{}", session.context());
        }

        Cmd::Ask {
            file,
            instruction,
            cursor,
            dry_run,
            replay,
        } => {
            let assist_config = config.assist.clone();
            let mut session = open_session(&file, cursor, config)?;

            let reply = match replay {
                Some(path) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read reply {}", path.display()))?;
                    let transport = ScriptedTransport::new([AssistReply::ok(text)]);
                    ask(&Assistant::new(transport, &assist_config), &mut session, &instruction).await
                }
                None => {
                    let transport = ProcessTransport::from_config(&assist_config)?;
                    ask(&Assistant::new(transport, &assist_config), &mut session, &instruction).await
                }
            };

            let lines = match reply {
                Ok(lines) => lines,
                Err(err) => {
                    session.record_assist_failure(err.to_string());
                    return Err(err).context("Assistant request failed");
                }
            };

            session.accept_reply(lines);
            if dry_run {
                for line in session.queue().pending() {
                    println!("{}", line.text());
                }
            } else {
                print_trace(&session.run_pending());
                print!("{}", session.state().content());
            }
        }

        Cmd::DefaultConfig => {
            print!("{}", toml::to_string_pretty(&Config::default())?);
        }
    }

    Ok(())
}

fn level_filter(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// The `run --json` document: committed state plus the per-line trace.
fn run_report(state: &BufferState, trace: &[TraceEntry]) -> serde_json::Value {
    serde_json::json!({
        "final_state": state,
        "trace": trace,
    })
}

/// Sends one instruction, cancelling it if the user hits Ctrl-C.
async fn ask<T: Transport>(
    assistant: &Assistant<T>,
    session: &mut Session,
    instruction: &str,
) -> Result<Vec<String>, AssistError> {
    let handle = assistant.ask(session, instruction);
    let canceller = handle.canceller();

    tokio::select! {
        result = handle.wait() => result,
        _ = tokio::signal::ctrl_c() => {
            canceller.abort();
            Err(AssistError::Cancelled)
        }
    }
}

fn open_session(file: &Path, cursor: usize, config: Config) -> anyhow::Result<Session> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let mut session = Session::with_config(text, config);
    session
        .set_cursor(cursor)
        .with_context(|| format!("Invalid cursor offset {cursor}"))?;
    Ok(session)
}

/// Reads a command script. Blank lines and `#` comments are skipped.
fn read_script(path: &Path) -> anyhow::Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    Ok(script_lines(&text))
}

fn script_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| {
            let trimmed = line.trim_start();
            !trimmed.is_empty() && !trimmed.starts_with('#')
        })
        .map(str::to_string)
        .collect()
}

fn print_trace(entries: &[TraceEntry]) {
    for entry in entries {
        let mark = if entry.outcome.success() { "✓" } else { "✗" };
        eprintln!("{mark} {}: {}", entry.text.trim(), entry.outcome.message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(["scrivener", "context", "notes.txt"]);
        assert_eq!(args.verbose, 0);
        assert!(matches!(
            args.command,
            Cmd::Context { cursor: 0, .. }
        ));
    }

    #[test]
    fn test_run_args() {
        let args = Args::parse_from([
            "scrivener", "-vv", "run", "a.txt", "--script", "s.txt", "--cursor", "4", "--trace",
        ]);
        assert_eq!(args.verbose, 2);
        match args.command {
            Cmd::Run {
                file,
                script,
                cursor,
                trace,
                json,
            } => {
                assert_eq!(file, PathBuf::from("a.txt"));
                assert_eq!(script, PathBuf::from("s.txt"));
                assert_eq!(cursor, 4);
                assert!(trace);
                assert!(!json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_filter(0), LevelFilter::WARN);
        assert_eq!(level_filter(1), LevelFilter::INFO);
        assert_eq!(level_filter(2), LevelFilter::DEBUG);
        assert_eq!(level_filter(7), LevelFilter::TRACE);

        let filter = EnvFilter::builder()
            .with_default_directive(level_filter(1).into())
            .parse_lossy("");
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::INFO));
    }

    #[test]
    fn test_run_report_has_state_and_trace() {
        let mut session = Session::new("hello world");
        session.accept_reply(["MOVE 50", "SELECT 0 5", "INSERT hi"]);
        let trace = session.run_pending();

        let report = run_report(session.state(), &trace);
        assert_eq!(report["final_state"]["content"], "hi world");
        assert_eq!(report["final_state"]["cursor"], 2);
        assert_eq!(report["trace"].as_array().unwrap().len(), 3);
        assert_eq!(report["trace"][0]["text"], "MOVE 50");
        assert_eq!(report["trace"][0]["outcome"]["success"], false);
        assert_eq!(report["trace"][0]["outcome"]["error"]["kind"], "PositionOutOfRange");
        assert_eq!(report["trace"][2]["outcome"]["success"], true);
    }

    #[test]
    fn test_script_lines_skip_comments() {
        let lines = script_lines("# header\nMOVE 0\n\n   \nINSERT \"  x\"\n  # note\nDELETE\n");
        assert_eq!(lines, vec!["MOVE 0", "INSERT \"  x\"", "DELETE"]);
    }

    #[test]
    fn test_open_session_rejects_bad_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("text.txt");
        std::fs::write(&path, "abc").unwrap();

        assert!(open_session(&path, 3, Config::default()).is_ok());
        assert!(open_session(&path, 4, Config::default()).is_err());
    }

    #[tokio::test]
    async fn test_replayed_reply_is_applied() {
        let transport = ScriptedTransport::new([AssistReply::ok("SELECT 0 5\nINSERT hi")]);
        let assistant = Assistant::new(transport, &Config::default().assist);
        let mut session = Session::new("hello world");

        let lines = ask(&assistant, &mut session, "shorten greeting").await.unwrap();
        session.accept_reply(lines);
        session.run_pending();
        assert_eq!(session.state().content().text(), "hi world");
    }
}
