//! Line-oriented review loop over a [`TriageSession`]

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::Result;

use super::render::{render_details, render_row};
use crate::marker::MarkerOutcome;
use crate::models::{ArchiveMetadata, Category};
use crate::session::TriageSession;

const HELP: &str = "Commands: [k]eep  [s]kip  [p]rev  [d]elete  [m]ove <folder>  / <search>  [t]ype <category>  \
                    [i]nfo  [r]efresh  [?] help  [q]uit";

/// Run until the list is exhausted, the user quits or `input` reaches EOF
pub fn run_triage<R: BufRead, W: Write>(session: &mut TriageSession, mut input: R, mut out: W) -> Result<()> {
    writeln!(out, "{}", HELP)?;
    let mut shown: Option<(PathBuf, ArchiveMetadata)> = None;

    loop {
        let Some(record) = session.current().cloned() else {
            writeln!(out, "No more mods to review.")?;
            return Ok(());
        };

        if shown.as_ref().is_none_or(|(path, _)| *path != record.path) {
            let Some(metadata) = session.current_metadata() else { continue };
            shown = Some((record.path.clone(), metadata));
        }
        let Some((_, metadata)) = shown.as_ref() else { continue };

        let (position, total) = session.progress();
        writeln!(out)?;
        writeln!(
            out,
            "[{}/{}] {}",
            position,
            total,
            render_row(&record, metadata.category, &metadata.name, session.is_current_marked())
        )?;
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = read_line(&mut input)? else {
            return Ok(());
        };
        let (command, argument) = split_command(&line);

        match command {
            "" => {}
            "k" | "keep" => match session.keep_current() {
                Ok(MarkerOutcome::AlreadyMarked) => writeln!(out, "Already sorted")?,
                Ok(_) => writeln!(out, "Marked as sorted")?,
                Err(e) => writeln!(out, "Error: {:#}", e)?,
            },
            "s" | "skip" | "n" | "next" => {
                session.skip();
            }
            "p" | "prev" | "previous" => {
                if !session.previous() {
                    writeln!(out, "Already at the first mod")?;
                }
            }
            "d" | "delete" => {
                write!(out, "Delete {}? [y/N] ", record.name)?;
                out.flush()?;
                let answer = read_line(&mut input)?.unwrap_or_default();
                if matches!(answer.to_lowercase().as_str(), "y" | "yes") {
                    match session.delete_current() {
                        Ok(_) => writeln!(out, "Deleted {}", record.name)?,
                        Err(e) => writeln!(out, "Error: {:#}", e)?,
                    }
                } else {
                    writeln!(out, "Cancelled")?;
                }
            }
            "m" | "move" => {
                if argument.is_empty() {
                    list_move_folders(session, &mut out)?;
                } else {
                    let result = if session.settings().find_move_folder(argument).is_some() {
                        session.move_to_shortcut(argument)
                    } else {
                        session.move_current(Path::new(argument))
                    };
                    match result {
                        Ok(target) => writeln!(out, "Moved to {}", target.display())?,
                        Err(e) => writeln!(out, "Error: {:#}", e)?,
                    }
                }
            }
            "/" | "search" => {
                if !session.seek_name(argument) {
                    writeln!(out, "No mods found matching '{}'", argument)?;
                }
            }
            "t" | "type" => match Category::parse(argument) {
                Some(category) => {
                    let start = session.registry().cursor();
                    if !session.seek_category(category) {
                        writeln!(out, "No more mods of type {}", category)?;
                        session.seek_to(start);
                    }
                }
                None => writeln!(out, "Unknown type '{}', expected Vehicle, Map or Other", argument)?,
            },
            "i" | "info" => {
                let marker = session.marker_snapshot();
                write!(out, "{}", render_details(&record, metadata, marker.as_ref()))?;
            }
            "r" | "refresh" => {
                if let Err(e) = session.refresh() {
                    writeln!(out, "Error: {:#}", e)?;
                }
                shown = None;
            }
            "?" | "h" | "help" => writeln!(out, "{}", HELP)?,
            "q" | "quit" | "exit" => return Ok(()),
            other => writeln!(out, "Unknown command '{}'. Type ? for help.", other)?,
        }
    }
}

fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// `"/ pickup"` and `"/pickup"` both search for "pickup"
fn split_command(line: &str) -> (&str, &str) {
    if let Some(rest) = line.strip_prefix('/') {
        return ("/", rest.trim());
    }
    match line.split_once(char::is_whitespace) {
        Some((command, argument)) => (command, argument.trim()),
        None => (line, ""),
    }
}

fn list_move_folders<W: Write>(session: &TriageSession, out: &mut W) -> Result<()> {
    let folders = &session.settings().move_folders;
    if folders.is_empty() {
        writeln!(out, "No move folders configured; use 'move <directory>'")?;
        return Ok(());
    }
    for folder in folders {
        let key = folder.key.as_deref().map(|k| format!(" [{}]", k)).unwrap_or_default();
        writeln!(out, "  {}{} -> {}", folder.name, key, folder.resolve(session.registry().root()).display())?;
    }
    Ok(())
}
