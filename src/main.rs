//! Purpose: `bbtyped` CLI entry point.
//! Role: Binary crate root; parses args, builds the board client, runs commands.
//! Invariants: Command results are JSON on stdout (pretty on a TTY).
//! Invariants: Errors are JSON on stderr unless stderr is a terminal.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::ffi::OsString;
use std::io::{self, IsTerminal};

use clap::{CommandFactory, Parser, Subcommand, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use std::error::Error as StdError;
use tracing_subscriber::EnvFilter;

mod command_dispatch;

use bbtyped::api::{
    BoardClient, Error, ErrorKind, GatewayTransport, current_addr, to_exit_code,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err(err) => {
            emit_error(&err);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, Error> {
    let cli = match Cli::try_parse_from(std::env::args_os().collect::<Vec<OsString>>()) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    Error::new(ErrorKind::Io)
                        .with_message("failed to write help")
                        .with_source(io_err)
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(clap_error_summary(&err))
                    .with_hint("Try `bbtyped --help`."));
            }
        },
    };

    let session = Session {
        addr: cli.addr,
        token: cli.token,
    };

    command_dispatch::dispatch_command(cli.command, &session)
        .map_err(add_io_hint)
        .map_err(add_lookup_hint)
        .map_err(add_internal_hint)
}

/// Connection settings from the command line; the client is built on demand.
struct Session {
    addr: Option<String>,
    token: Option<String>,
}

impl Session {
    fn client(&self) -> Result<BoardClient<GatewayTransport>, Error> {
        let addr = self.addr.clone().unwrap_or_else(current_addr);
        let mut transport = GatewayTransport::new(addr)?;
        if let Some(token) = &self.token {
            transport = transport.with_token(token.clone());
        }
        Ok(BoardClient::new(transport))
    }
}

#[derive(Parser)]
#[command(
    name = "bbtyped",
    version,
    about = "Post and read typed values on a bulletin board",
    long_about = None,
    after_help = r#"EXAMPLES
  $ bbtyped post x run1 '[[1, 2, 3], [4, 5, 6]]'
  $ bbtyped read x --tag run1
  $ bbtyped read x --revision 0 --revision 1
  $ bbtyped status
  $ bbtyped board

NOTES
  - Values are JSON; complex numbers are written {"re": 1.0, "im": 2.0}
  - Address: --addr, else BB_GATEWAY_ADDR, else 127.0.0.1:7579
  - Logging: RUST_LOG (default: warn)"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(long, global = true, help = "Board gateway address (host:port or http(s) URL)")]
    addr: Option<String>,
    #[arg(long, global = true, help = "Bearer token sent with every request")]
    token: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Post a JSON value as a new revision")]
    Post {
        title: String,
        tag: String,
        #[arg(help = "JSON scalar, nested list, or {\"re\", \"im\"} object")]
        value: String,
    },
    #[command(about = "Read revisions of a bulletin (latest by default)")]
    Read {
        title: String,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long = "revision", value_name = "N")]
        revisions: Vec<u64>,
    },
    #[command(about = "Show board-wide counters")]
    Status,
    #[command(about = "List bulletins on the board")]
    Board,
    #[command(about = "List revisions of one bulletin")]
    Info {
        title: String,
        #[arg(long)]
        tag: Option<String>,
    },
    #[command(about = "Delete specific revisions of a bulletin")]
    Clear {
        title: String,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long = "revision", value_name = "N", required = true)]
        revisions: Vec<u64>,
    },
    #[command(about = "Remove a bulletin and all of its revisions")]
    Remove {
        title: String,
        #[arg(long)]
        tag: Option<String>,
    },
    #[command(about = "Rename a bulletin's title and/or tag")]
    Relabel {
        title: String,
        #[arg(long)]
        tag: Option<String>,
        #[arg(long)]
        to_title: Option<String>,
        #[arg(long)]
        to_tag: Option<String>,
    },
    #[command(about = "Move a bulletin into a persistent archive")]
    Archive {
        name: String,
        title: String,
        #[arg(long)]
        tag: Option<String>,
    },
    #[command(about = "Load or reload an archive")]
    Load { name: String },
    #[command(about = "List archives")]
    Archives,
    #[command(about = "Rename an archive (applied after reset)")]
    RenameArchive { from: String, to: String },
    #[command(about = "Delete an archive (applied after reset)")]
    DeleteArchive { name: String },
    #[command(about = "Dump all unarchived data into an archive")]
    Dump { name: String },
    #[command(about = "Restore data from an archive")]
    Restore { name: String },
    #[command(about = "Clear all temporary data on the board")]
    Reset,
    #[command(about = "Print the board's log")]
    Log,
    #[command(about = "Clear the board's log")]
    ClearLog,
    #[command(about = "Show the board's version")]
    ServerVersion,
    #[command(about = "Stop the board")]
    Terminate,
    #[command(about = "Show the client version")]
    Version,
    #[command(about = "Generate shell completions")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr)
        .try_init();
}

fn emit_json(value: Value) {
    let json = if io::stdout().is_terminal() {
        serde_json::to_string_pretty(&value)
    } else {
        serde_json::to_string(&value)
    }
    .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error) {
    if io::stderr().is_terminal() {
        eprintln!("{}", error_text(err));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::EmptyArray => "array size cannot be zero".to_string(),
        ErrorKind::UnsupportedType => "unsupported value type".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::NotUnique => "multiple bulletins match".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(title) = err.title() {
        inner.insert("title".to_string(), json!(title));
    }
    if let Some(tag) = err.tag() {
        inner.insert("tag".to_string(), json!(tag));
    }
    if let Some(revision) = err.revision() {
        inner.insert("revision".to_string(), json!(revision));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error) -> String {
    let mut lines = vec![format!("error: {}", error_message(err))];
    if let Some(hint) = err.hint() {
        lines.push(format!("hint: {hint}"));
    }
    if let Some(title) = err.title() {
        match err.tag() {
            Some(tag) => lines.push(format!("bulletin: {title} (tag: {tag})")),
            None => lines.push(format!("bulletin: {title}")),
        }
    }
    if let Some(revision) = err.revision() {
        lines.push(format!("revision: {revision}"));
    }
    if let Some(cause) = error_causes(err).first() {
        lines.push(format!("caused by: {cause}"));
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Permission => err.with_hint("The board rejected the request. Check --token."),
        ErrorKind::Io => err.with_hint("Check the gateway address (--addr or BB_GATEWAY_ADDR)."),
        _ => err,
    }
}

fn add_lookup_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::NotUnique || err.hint().is_some() {
        return err;
    }
    err.with_hint("Several tags share this title. Pass --tag to pick one.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint("Unexpected internal failure. Retry with RUST_LOG=debug to see board traffic.")
}

fn completion(shell: Shell) -> RunOutcome {
    let mut cmd = Cli::command();
    clap_complete::aot::generate(shell, &mut cmd, "bbtyped", &mut io::stdout());
    RunOutcome::ok()
}
