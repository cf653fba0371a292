//! Purpose: Hold top-level CLI command dispatch for `satchel`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Output envelopes and exit code semantics stay stable per command.
//! Invariants: Helpers in `main.rs` remain the source of command business logic.

use super::*;

pub(super) fn dispatch_command(cli: Cli) -> Result<RunOutcome, Error> {
    let base = cli.base.or_else(|| std::env::var(BASE_URL_ENV).ok());
    let timeout = cli.timeout.as_deref().map(parse_duration).transpose()?;
    let color_mode = cli.color;

    match cli.command {
        Command::Fetch { doc } => {
            let doc = open_doc(&doc, base.as_deref(), timeout)?;
            let value = doc.fetch()?;
            emit_json(&value, color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Save { doc, data, file } => {
            let doc = open_doc(&doc, base.as_deref(), timeout)?;
            let value = read_save_payload(data.as_deref(), file.as_deref())?;
            doc.save(&value)?;
            emit_save_ack(&doc, &value, color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Version => {
            emit_version_output(color_mode);
            Ok(RunOutcome::ok())
        }
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "satchel", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
    }
}
