// SPDX-FileCopyrightText: 2026 Opsdeck Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `opsdeck chat` command implementation.
//!
//! Launches an interactive REPL with streaming output and readline history.
//! Domain records can be pulled through the persistence facade into an
//! analysis prompt with `/analyze <incidents|datasets|tickets>`.

use std::io::Write;
use std::sync::Arc;

use colored::Colorize;
use futures::StreamExt;
use rusqlite::types::Value;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::warn;

use opsdeck_assistant::{ConversationSession, resolve_system_prompt};
use opsdeck_auth::AccountDirectory;
use opsdeck_config::OpsdeckConfig;
use opsdeck_core::{OpsdeckError, SessionContext};
use opsdeck_openai::OpenAiBackend;
use opsdeck_storage::{Row, Store};

/// Runs the `opsdeck chat` interactive REPL.
///
/// With `--as <username>` the chat first authenticates and carries the
/// resulting identity in an explicit session context; `/analyze` requires it.
pub async fn run_chat(config: &OpsdeckConfig, login_as: Option<&str>) -> Result<(), OpsdeckError> {
    let store = Arc::new(Store::from_config(&config.storage));
    store.connect().await?;

    let context = match login_as {
        Some(username) => {
            let password = rpassword::prompt_password("Password: ")
                .map_err(|e| OpsdeckError::Internal(format!("failed to read password: {e}")))?;
            let directory = AccountDirectory::new(store.clone());
            match directory.authenticate(username, &password).await {
                Ok(identity) => SessionContext::authenticated(identity),
                Err(e) => {
                    eprintln!("{}", e.to_string().red());
                    store.close().await?;
                    return Ok(());
                }
            }
        }
        None => SessionContext::anonymous(),
    };

    let backend = Arc::new(OpenAiBackend::from_config(config)?);
    let system_prompt = resolve_system_prompt(&config.assistant).await;
    let mut session = ConversationSession::new(
        backend,
        config.openai.default_model.clone(),
        config.openai.max_tokens,
        system_prompt,
    );

    let mut rl = DefaultEditor::new()
        .map_err(|e| OpsdeckError::Internal(format!("failed to initialize readline: {e}")))?;

    println!("{}", "opsdeck chat".bold().green());
    if let Some(identity) = &context.identity {
        println!("logged in as {} ({})", identity.username, identity.role);
    }
    println!(
        "Type {} to clear the transcript, {} to analyze records, {} to exit.\n",
        "/reset".yellow(),
        "/analyze <incidents|datasets|tickets>".yellow(),
        "/quit".yellow()
    );

    let prompt = format!("{}> ", config.console.name.green());
    loop {
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed == "/quit" || trimmed == "/exit" {
                    break;
                }
                if trimmed.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(&line);

                if trimmed == "/reset" {
                    session.reset(None);
                    println!("{}", "transcript cleared".dimmed());
                    continue;
                }

                if let Some(kind) = trimmed.strip_prefix("/analyze ") {
                    if !context.is_authenticated() {
                        eprintln!("{}", "you must log in first (chat --as <user>)".yellow());
                        continue;
                    }
                    match build_analysis_prompt(&store, kind.trim()).await {
                        Ok(Some(analysis)) => stream_turn(&mut session, &analysis).await,
                        Ok(None) => println!("{}", format!("no {kind} records found").dimmed()),
                        Err(e) => {
                            warn!(error = %e, "analysis record fetch failed");
                            eprintln!("{}", "could not load records".red());
                        }
                    }
                    continue;
                }

                stream_turn(&mut session, trimmed).await;
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                break;
            }
            Err(e) => {
                eprintln!("{}: {e}", "error".red());
                break;
            }
        }
    }

    store.close().await?;
    println!("{}", "goodbye".dimmed());
    Ok(())
}

/// Sends one message and streams the reply to stdout.
///
/// Completion failures surface as one generic line; the failed turn is not
/// retried.
async fn stream_turn(session: &mut ConversationSession, input: &str) {
    match session.send_streaming(input).await {
        Ok(stream) => {
            let mut stream = std::pin::pin!(stream);
            let mut failed = false;
            while let Some(fragment) = stream.next().await {
                match fragment {
                    Ok(text) => {
                        print!("{text}");
                        let _ = std::io::stdout().flush();
                    }
                    Err(e) => {
                        warn!(error = %e, "completion stream failed");
                        failed = true;
                    }
                }
            }
            if failed {
                eprintln!("\n{}", "analysis unavailable, try again later".red());
            } else {
                println!();
            }
        }
        Err(e) => {
            warn!(error = %e, "completion request failed");
            eprintln!("{}", "analysis unavailable, try again later".red());
        }
    }
}

/// Fetches domain records through the facade and formats them into an
/// analysis prompt. Returns `None` when the table is empty.
async fn build_analysis_prompt(
    store: &Store,
    kind: &str,
) -> Result<Option<String>, OpsdeckError> {
    let (label, sql) = match kind {
        "incidents" => (
            "security incidents",
            "SELECT id, incident_type, severity, status, description FROM cyber_incidents ORDER BY id DESC",
        ),
        "datasets" => (
            "datasets",
            "SELECT id, dataset_name, file_size_mb, record_count, source FROM datasets_metadata",
        ),
        "tickets" => (
            "IT tickets",
            "SELECT id, subject, priority, status, assigned_to FROM it_tickets",
        ),
        other => {
            return Err(OpsdeckError::Internal(format!(
                "unknown record kind: {other}"
            )));
        }
    };

    let rows = store.query_many(sql, vec![]).await?;
    if rows.is_empty() {
        return Ok(None);
    }

    let mut prompt = format!(
        "Here are {} {label} from the operations database, one per line:\n",
        rows.len()
    );
    for row in &rows {
        prompt.push_str(&format_row(row));
        prompt.push('\n');
    }
    prompt.push_str("Summarize the notable patterns and risks, and suggest next actions.");
    Ok(Some(prompt))
}

/// Renders one facade row as a pipe-separated line.
fn format_row(row: &Row) -> String {
    row.iter()
        .map(|value| match value {
            Value::Null => "-".to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Real(r) => r.to_string(),
            Value::Text(s) => s.clone(),
            Value::Blob(_) => "<blob>".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" | ")
}
