//! Purpose: Hold top-level CLI command dispatch for `bbtyped`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Local commands (`version`, `completion`) never build a board client.
//! Invariants: Record output keeps the labels and field order of `api` records.

use super::*;
use bbtyped::api::Value as BoardValue;

pub(super) fn dispatch_command(command: Command, session: &Session) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => Ok(completion(shell)),
        Command::Version => {
            emit_json(json!({ "name": "bbtyped", "version": env!("CARGO_PKG_VERSION") }));
            Ok(RunOutcome::ok())
        }
        Command::Post { title, tag, value } => {
            let value = parse_value_arg(&value)?;
            session.client()?.post(&title, &tag, value)?;
            emit_json(json!({ "posted": { "title": title, "tag": tag } }));
            Ok(RunOutcome::ok())
        }
        Command::Read {
            title,
            tag,
            revisions,
        } => {
            let read = session
                .client()?
                .read(&title, tag.as_deref(), &revisions)?;
            emit_json(read.to_json());
            Ok(RunOutcome::ok())
        }
        Command::Status => {
            let status = session.client()?.status()?;
            emit_json(to_json(&status)?);
            Ok(RunOutcome::ok())
        }
        Command::Board => {
            let board = session.client()?.view_board()?;
            emit_json(to_json(&board)?);
            Ok(RunOutcome::ok())
        }
        Command::Info { title, tag } => {
            let info = session.client()?.get_info(&title, tag.as_deref())?;
            emit_json(to_json(&info)?);
            Ok(RunOutcome::ok())
        }
        Command::Clear {
            title,
            tag,
            revisions,
        } => {
            session
                .client()?
                .clear_revisions(&title, tag.as_deref(), &revisions)?;
            emit_json(json!({ "cleared": { "title": title, "revisions": revisions } }));
            Ok(RunOutcome::ok())
        }
        Command::Remove { title, tag } => {
            session.client()?.remove(&title, tag.as_deref())?;
            emit_json(json!({ "removed": { "title": title, "tag": tag } }));
            Ok(RunOutcome::ok())
        }
        Command::Relabel {
            title,
            tag,
            to_title,
            to_tag,
        } => {
            if to_title.is_none() && to_tag.is_none() {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message("relabel needs --to-title and/or --to-tag")
                    .with_hint("Use `bbtyped relabel <title> --to-title <new>`."));
            }
            session.client()?.relabel(
                &title,
                tag.as_deref(),
                to_title.as_deref(),
                to_tag.as_deref(),
            )?;
            emit_json(json!({ "relabeled": { "title": title, "to_title": to_title, "to_tag": to_tag } }));
            Ok(RunOutcome::ok())
        }
        Command::Archive { name, title, tag } => {
            session.client()?.archive(&name, &title, tag.as_deref())?;
            emit_json(json!({ "archived": { "archive": name, "title": title } }));
            Ok(RunOutcome::ok())
        }
        Command::Load { name } => {
            session.client()?.load(&name)?;
            emit_json(json!({ "loaded": name }));
            Ok(RunOutcome::ok())
        }
        Command::Archives => {
            let archives = session.client()?.list_archive()?;
            emit_json(json!({ "archives": archives }));
            Ok(RunOutcome::ok())
        }
        Command::RenameArchive { from, to } => {
            session.client()?.rename_archive(&from, &to)?;
            emit_json(json!({ "renamed": { "from": from, "to": to } }));
            Ok(RunOutcome::ok())
        }
        Command::DeleteArchive { name } => {
            session.client()?.delete_archive(&name)?;
            emit_json(json!({ "deleted": name }));
            Ok(RunOutcome::ok())
        }
        Command::Dump { name } => {
            session.client()?.dump(&name)?;
            emit_json(json!({ "dumped": name }));
            Ok(RunOutcome::ok())
        }
        Command::Restore { name } => {
            session.client()?.restore(&name)?;
            emit_json(json!({ "restored": name }));
            Ok(RunOutcome::ok())
        }
        Command::Reset => {
            session.client()?.reset()?;
            emit_json(json!({ "reset": true }));
            Ok(RunOutcome::ok())
        }
        Command::Log => {
            let log = session.client()?.log()?;
            print!("{log}");
            Ok(RunOutcome::ok())
        }
        Command::ClearLog => {
            session.client()?.clear_log()?;
            emit_json(json!({ "log_cleared": true }));
            Ok(RunOutcome::ok())
        }
        Command::ServerVersion => {
            let version = session.client()?.server_version()?;
            emit_json(json!({ "server_version": version }));
            Ok(RunOutcome::ok())
        }
        Command::Terminate => {
            session.client()?.terminate()?;
            emit_json(json!({ "terminated": true }));
            Ok(RunOutcome::ok())
        }
    }
}

fn parse_value_arg(raw: &str) -> Result<BoardValue, Error> {
    let json: Value = serde_json::from_str(raw).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message("value must be JSON")
            .with_hint("Quote strings as JSON, e.g. '\"text\"'.")
            .with_source(err)
    })?;
    BoardValue::from_json(&json)
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, Error> {
    serde_json::to_value(value).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("failed to encode output json")
            .with_source(err)
    })
}

#[cfg(test)]
mod tests {
    use super::parse_value_arg;
    use bbtyped::api::{ErrorKind, Value};

    #[test]
    fn value_arg_parses_nested_lists() {
        let value = parse_value_arg("[[1, 2], [3, 4]]").expect("value");
        assert_eq!(value, Value::from(vec![vec![1i64, 2], vec![3, 4]]));
    }

    #[test]
    fn bare_words_are_usage_errors() {
        let err = parse_value_arg("hello").expect_err("not json");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
