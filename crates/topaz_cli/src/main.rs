//! Command-line front end for the Topaz note store.
//!
//! # Responsibility
//! - Stand in for the desktop UI: parse user input, call `NoteService`,
//!   print what it returns.
//! - Own free-text tag parsing; the core only receives tag name lists.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use topaz_core::{
    default_log_level, init_logging, NoteId, NoteRecord, NoteService, RepoError,
    SqliteNoteRepository,
};

const EXIT_NOT_FOUND: u8 = 2;

#[derive(Debug, Parser)]
#[command(name = "topaz", version, about = "Notes with tags, stored in SQLite")]
struct Cli {
    /// Note database file (created when missing)
    #[arg(long, env = "TOPAZ_DB", default_value = "notes.db", global = true)]
    db: PathBuf,

    /// Absolute directory for rolling log files; logging is off when unset
    #[arg(long, env = "TOPAZ_LOG_DIR", global = true)]
    log_dir: Option<String>,

    /// Log level: trace|debug|info|warn|error
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List every note with its tags
    List {
        #[arg(long)]
        json: bool,
    },
    /// Show notes with exactly this title, one row per tag
    Show {
        title: String,
        #[arg(long)]
        json: bool,
    },
    /// Create a note
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        body: String,
        /// Comma or whitespace separated tag names
        #[arg(long, default_value = "")]
        tags: String,
    },
    /// Edit a note; omitted fields keep their current value
    Edit {
        id: NoteId,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        body: Option<String>,
        /// Replaces the whole tag set; pass "" to clear it
        #[arg(long)]
        tags: Option<String>,
    },
    /// Delete a note
    Rm { id: NoteId },
    /// List tags with how many notes use them
    Tags {
        #[arg(long)]
        json: bool,
    },
    /// Delete tags no note uses any more
    PruneTags,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            match err.downcast_ref::<RepoError>() {
                Some(RepoError::NotFound(_)) => ExitCode::from(EXIT_NOT_FOUND),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("initializing logging")?;
    }

    let service = NoteService::open(&cli.db)
        .with_context(|| format!("opening note database `{}`", cli.db.display()))?;

    match cli.command {
        Command::List { json } => list_notes(&service, json),
        Command::Show { title, json } => show_title(&service, &title, json),
        Command::Add { title, body, tags } => {
            let id = service.create_note(&title, &body, &parse_tag_input(&tags))?;
            println!("{id}");
            Ok(())
        }
        Command::Edit {
            id,
            title,
            body,
            tags,
        } => {
            let current = service
                .get_note(id)?
                .ok_or(RepoError::NotFound(id))?;
            let tags = match tags {
                Some(raw) => parse_tag_input(&raw),
                None => current.tags,
            };
            service.update_note(
                id,
                title.as_deref().unwrap_or(&current.title),
                body.as_deref().unwrap_or(&current.body),
                &tags,
            )?;
            Ok(())
        }
        Command::Rm { id } => Ok(service.delete_note(id)?),
        Command::Tags { json } => {
            let tags = service.list_tags()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&tags)?);
            } else {
                for tag in tags {
                    println!("{}\t{}", tag.name, tag.note_count);
                }
            }
            Ok(())
        }
        Command::PruneTags => {
            let removed = service.prune_orphan_tags()?;
            println!("removed {removed} unused tag(s)");
            Ok(())
        }
    }
}

fn list_notes(service: &NoteService<SqliteNoteRepository>, json: bool) -> Result<()> {
    let notes: Vec<NoteRecord> = service.read_all_notes()?.into_values().collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&notes)?);
        return Ok(());
    }
    for note in notes {
        println!("{}\t{}\t[{}]", note.id, note.title, note.tags.join(", "));
    }
    Ok(())
}

fn show_title(service: &NoteService<SqliteNoteRepository>, title: &str, json: bool) -> Result<()> {
    let rows = service.read_notes_by_title(title)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }
    for row in rows {
        println!(
            "{}\t{}\t{}\t{}",
            row.note_id,
            row.title,
            row.tag.as_deref().unwrap_or("-"),
            row.body
        );
    }
    Ok(())
}

/// Splits free-text tag input on commas and whitespace, dropping empties.
fn parse_tag_input(raw: &str) -> Vec<String> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{parse_tag_input, Cli};
    use clap::CommandFactory;

    #[test]
    fn parse_tag_input_splits_on_commas_and_whitespace() {
        assert_eq!(
            parse_tag_input(" #history, #rust  work,,"),
            vec!["#history", "#rust", "work"]
        );
        assert!(parse_tag_input(" , ").is_empty());
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
