//! Purpose: `satchel` CLI entry point and command dispatch glue.
//! Role: Binary crate root; parses args, resolves the target document, emits output.
//! Invariants: `fetch` writes nothing but the document to stdout.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::time::Duration;

use clap::{
    CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod color_json;
mod command_dispatch;
mod payload;

use color_json::render_pretty;
use payload::{missing_payload_error, payload_from_arg, payload_from_file, payload_from_reader};
use satchel::api::{DocRef, Error, ErrorKind, RemoteDoc, RemoteStore, to_exit_code};

const BASE_URL_ENV: &str = "SATCHEL_BASE_URL";

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
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
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
                let message = clap_error_summary(&err);
                let hint = clap_error_hint(&err);
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(message)
                        .with_hint(hint),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;

    let result = command_dispatch::dispatch_command(cli);

    result
        .map_err(add_method_hint)
        .map_err(add_transport_hint)
        .map_err(add_decode_hint)
        .map_err(add_remote_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "satchel",
    version,
    about = "Fetch and save JSON documents over HTTP",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"A document is one JSON value at an HTTP URL. `fetch` GETs it, `save` PUTs it.

Mental model:
  - `fetch` downloads the document (read)
  - `save` uploads a new document body (write)
  - document names resolve against --base or $SATCHEL_BASE_URL
"#,
    after_help = r#"EXAMPLES
  $ export SATCHEL_BASE_URL=http://localhost:8080
  $ satchel fetch src/pages/data.json
  $ satchel save src/pages/data.json '{"a": 1}'
  $ jq '.count += 1' state.json | satchel save state.json

LEARN MORE
  $ satchel <command> --help
  https://github.com/sandover/satchel"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        value_name = "URL",
        help = "Base URL for document names (default: $SATCHEL_BASE_URL)"
    )]
    base: Option<String>,
    #[arg(
        long,
        value_name = "DUR",
        help = "Per-request timeout: number plus ms|s|m|h, bare number is seconds (default: none)"
    )]
    timeout: Option<String>,
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics and pretty JSON output: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        arg_required_else_help = true,
        about = "Fetch the document and print it",
        long_about = r#"GET the document and print the JSON body to stdout.

Pretty-prints on a terminal; emits a compact single line when piped."#,
        after_help = r#"EXAMPLES
  $ satchel fetch data.json
  $ satchel fetch http://localhost:8080/data.json
  $ satchel fetch data.json | jq '.items | length'

NOTES
  - DOC is a name resolved against --base, or a full http(s):// URL
  - Failures exit non-zero with a tagged error on stderr"#
    )]
    Fetch {
        #[arg(help = "Document ref: name (resolved against --base) or http(s):// URL")]
        doc: String,
    },
    #[command(
        arg_required_else_help = true,
        about = "Save a new document body",
        long_about = r#"PUT a JSON payload as the new document body.

Accepts inline JSON, file input (-f/--file), or JSON piped to stdin."#,
        after_help = r#"EXAMPLES
  $ satchel save data.json '{"a": 1}'
  $ satchel save data.json --file payload.json
  $ satchel fetch data.json | jq '.items += [4]' | satchel save data.json

NOTES
  - The payload must be a single JSON value
  - On success a confirmation is printed (JSON ack when piped)
  - Static file hosts usually accept GET but not PUT"#
    )]
    Save {
        #[arg(help = "Document ref: name (resolved against --base) or http(s):// URL")]
        doc: String,
        #[arg(help = "Inline JSON payload")]
        data: Option<String>,
        #[arg(
            short = 'f',
            long = "file",
            help = "Payload file path (use - for stdin)",
            conflicts_with = "data",
            value_hint = ValueHint::FilePath
        )]
        file: Option<String>,
    },
    #[command(about = "Print version information")]
    Version,
    #[command(
        about = "Generate shell completions",
        long_about = r#"Generate shell completion scripts.

Prints a completion script for the given shell to stdout.
Install the generated file in your shell's completion directory (or source it)
to enable tab completion."#,
        after_help = r#"EXAMPLES
  $ satchel completion bash > ~/.local/share/bash-completion/completions/satchel
  $ satchel completion zsh > ~/.zfunc/_satchel
  $ satchel completion fish > ~/.config/fish/completions/satchel.fish"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

fn open_doc(raw: &str, base: Option<&str>, timeout: Option<Duration>) -> Result<RemoteDoc, Error> {
    let doc_ref = DocRef::parse(raw)?;
    let store = match &doc_ref {
        DocRef::Url(url) => RemoteStore::for_origin(url)?,
        DocRef::Name(_) => {
            let Some(base) = base else {
                return Err(missing_base_error());
            };
            RemoteStore::new(base)?
        }
    };
    let store = match timeout {
        Some(timeout) => store.with_timeout(timeout),
        None => store,
    };
    store.open_doc(&doc_ref)
}

fn missing_base_error() -> Error {
    Error::new(ErrorKind::Usage)
        .with_message("no base url configured for a document name")
        .with_hint(format!(
            "Pass --base http://host:port or set ${BASE_URL_ENV}."
        ))
}

fn read_save_payload(data: Option<&str>, file: Option<&str>) -> Result<Value, Error> {
    if data.is_some() && file.is_some() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("multiple payload inputs provided")
            .with_hint("Use only one of DATA, --file, or stdin."));
    }
    if let Some(data) = data {
        return payload_from_arg(data);
    }
    if let Some(file) = file {
        return payload_from_file(file);
    }
    if io::stdin().is_terminal() {
        return Err(missing_payload_error());
    }
    payload_from_reader(io::stdin())
}

fn parse_duration(input: &str) -> Result<Duration, Error> {
    let invalid = || {
        Error::new(ErrorKind::Usage)
            .with_message("invalid duration")
            .with_hint("Use a number plus ms|s|m|h (e.g. 10s); a bare number means seconds.")
    };
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(invalid());
    }
    let split = trimmed.char_indices().find(|(_, ch)| !ch.is_ascii_digit());
    let (num_str, unit) = match split {
        Some((idx, _)) => trimmed.split_at(idx),
        None => (trimmed, "s"),
    };
    if num_str.is_empty() {
        return Err(invalid());
    }
    let value: u64 = num_str.parse().map_err(|_| invalid())?;
    let millis = match unit {
        "ms" => value,
        "s" => value.saturating_mul(1_000),
        "m" => value.saturating_mul(60_000),
        "h" => value.saturating_mul(3_600_000),
        _ => return Err(invalid()),
    };
    Ok(Duration::from_millis(millis))
}

fn emit_json(value: &Value, color_mode: ColorMode) {
    let is_tty = io::stdout().is_terminal();
    let use_color = color_mode.use_color(is_tty);
    let pretty = is_tty || use_color;
    let json = if pretty {
        if use_color {
            render_pretty(value, true)
        } else {
            serde_json::to_string_pretty(value)
                .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
        }
    } else {
        serde_json::to_string(value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    };
    println!("{json}");
}

fn emit_save_ack(doc: &RemoteDoc, payload: &Value, color_mode: ColorMode) {
    let bytes = serde_json::to_string(payload)
        .map(|encoded| encoded.len())
        .unwrap_or(0);
    if io::stdout().is_terminal() {
        println!("Saved {} ({bytes} bytes)", doc.url());
        return;
    }
    emit_json(
        &json!({ "saved": { "url": doc.url().as_str(), "bytes": bytes } }),
        color_mode,
    );
}

fn emit_version_output(color_mode: ColorMode) {
    if io::stdout().is_terminal() {
        println!("satchel {}", env!("CARGO_PKG_VERSION"));
    } else {
        emit_json(
            &json!({
                "name": "satchel",
                "version": env!("CARGO_PKG_VERSION"),
            }),
            color_mode,
        );
    }
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
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
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::Busy => "endpoint is busy".to_string(),
        ErrorKind::Remote => "remote failure".to_string(),
        ErrorKind::Decode => "undecodable response".to_string(),
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
    if let Some(url) = err.url() {
        inner.insert("url".to_string(), json!(url));
    }
    if let Some(status) = err.status() {
        inner.insert("status".to_string(), json!(status));
    }
    if let Some(path) = err.path() {
        inner.insert("path".to_string(), json!(path.display().to_string()));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(url) = err.url() {
        lines.push(format!(
            "{} {url}",
            colorize_label("url:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(status) = err.status() {
        lines.push(format!(
            "{} {status}",
            colorize_label("status:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(path) = err.path() {
        lines.push(format!(
            "{} {}",
            colorize_label("path:", use_color, AnsiColor::Yellow),
            path.display()
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
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

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `satchel --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "satchel") else {
        return "Try `satchel --help`.".to_string();
    };

    let mut parts = Vec::new();
    for token in tokens.iter().skip(pos + 1) {
        if token.starts_with('-') || token.starts_with('<') || token.starts_with('[') {
            break;
        }
        parts.push(*token);
    }

    if parts.is_empty() {
        return "Try `satchel --help`.".to_string();
    }

    format!("Try `satchel {} --help`.", parts.join(" "))
}

fn add_method_hint(err: Error) -> Error {
    if err.status() != Some(405) || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "The endpoint rejected the HTTP method. Static file hosts usually accept GET but not PUT.",
    )
}

fn add_transport_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Io => {
            err.with_hint("Network error. Check the host, port, and that the endpoint is up.")
        }
        ErrorKind::NotFound => err.with_hint("No document at that URL. Check the name and --base."),
        ErrorKind::Permission => {
            err.with_hint("The endpoint refused access. It may not accept unauthenticated requests.")
        }
        ErrorKind::Busy => err.with_hint("The endpoint is briefly unavailable. Try again shortly."),
        _ => err,
    }
}

fn add_decode_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Decode || err.hint().is_some() {
        return err;
    }
    err.with_hint("The endpoint did not return JSON. Confirm the URL points at a JSON document.")
}

fn add_remote_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Remote || err.hint().is_some() {
        return err;
    }
    err.with_hint("The server failed to handle the request. Check the endpoint's logs.")
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint(
        "Unexpected internal failure. Retry with RUST_BACKTRACE=1 and report if it persists.",
    )
}

#[cfg(test)]
mod tests {
    use super::{
        ColorMode, add_method_hint, add_transport_hint, error_json, error_text, open_doc,
        parse_duration, read_save_payload,
    };
    use satchel::api::{Error, ErrorKind};
    use std::time::Duration;

    #[test]
    fn parse_duration_accepts_ms_s_m() {
        assert_eq!(
            parse_duration("500ms").expect("ms"),
            Duration::from_millis(500)
        );
        assert_eq!(parse_duration("5s").expect("s"), Duration::from_secs(5));
        assert_eq!(parse_duration("1m").expect("m"), Duration::from_secs(60));
    }

    #[test]
    fn parse_duration_treats_bare_numbers_as_seconds() {
        assert_eq!(parse_duration("30").expect("bare"), Duration::from_secs(30));
    }

    #[test]
    fn parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("ms").is_err());
        assert!(parse_duration("10fortnights").is_err());
    }

    #[test]
    fn use_color_follows_mode_and_tty() {
        assert!(ColorMode::Auto.use_color(true));
        assert!(!ColorMode::Auto.use_color(false));
        assert!(ColorMode::Always.use_color(false));
        assert!(!ColorMode::Never.use_color(true));
    }

    #[test]
    fn open_doc_requires_a_base_for_names() {
        let err = open_doc("data.json", None, None).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(err.hint().expect("hint").contains("SATCHEL_BASE_URL"));
    }

    #[test]
    fn open_doc_resolves_names_and_urls() {
        let doc = open_doc("data.json", Some("http://localhost:8080"), None).expect("doc");
        assert_eq!(doc.url().as_str(), "http://localhost:8080/data.json");

        let doc = open_doc("http://localhost:9999/other.json", None, None).expect("doc");
        assert_eq!(doc.url().as_str(), "http://localhost:9999/other.json");
    }

    #[test]
    fn read_save_payload_rejects_double_input() {
        let err = read_save_payload(Some("{}"), Some("payload.json")).expect_err("err");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn error_json_carries_context_fields() {
        let err = Error::new(ErrorKind::NotFound)
            .with_message("document not found")
            .with_hint("check the name")
            .with_url("http://localhost:8080/data.json")
            .with_status(404);
        let value = error_json(&err);
        let inner = value.get("error").expect("error object");
        assert_eq!(
            inner.get("kind").and_then(|v| v.as_str()),
            Some("NotFound")
        );
        assert_eq!(
            inner.get("message").and_then(|v| v.as_str()),
            Some("document not found")
        );
        assert_eq!(
            inner.get("url").and_then(|v| v.as_str()),
            Some("http://localhost:8080/data.json")
        );
        assert_eq!(inner.get("status").and_then(|v| v.as_u64()), Some(404));
    }

    #[test]
    fn error_text_labels_message_and_hint() {
        let err = Error::new(ErrorKind::Io)
            .with_message("request failed")
            .with_hint("check the port");
        let text = error_text(&err, false);
        assert!(text.starts_with("error: request failed"));
        assert!(text.contains("hint: check the port"));
    }

    #[test]
    fn method_hint_applies_only_to_405() {
        let err = add_method_hint(Error::new(ErrorKind::Usage).with_status(405));
        assert!(err.hint().expect("hint").contains("GET but not PUT"));

        let err = add_method_hint(Error::new(ErrorKind::Usage).with_status(400));
        assert!(err.hint().is_none());
    }

    #[test]
    fn transport_hint_leaves_existing_hints_alone() {
        let err = Error::new(ErrorKind::Io).with_hint("already set");
        let err = add_transport_hint(err);
        assert_eq!(err.hint(), Some("already set"));
    }
}
