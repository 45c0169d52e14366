// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Interactive console running every subcommand against one session table.

use anyhow::Result;
use clap::{Parser, Subcommand};
use directories::ProjectDirs;
use owo_colors::OwoColorize;
use rustyline::config::Configurer;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;

use super::{dispatch, sessions, CallerCredentials};
use crate::cli::Commands;
use crate::credentials::prompt_password;
use crate::operations::Fleet;
use crate::ui::OutputFormatter;

const PROMPT: &str = "fleetshare> ";
const MAX_HISTORY: usize = 1000;

#[derive(Parser, Debug)]
#[command(
    name = "fleetshare",
    no_binary_name = true,
    disable_version_flag = true
)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    #[command(flatten)]
    Fleet(Commands),

    /// List active sessions
    Sessions,

    /// Tear down every session
    DisconnectAll,

    /// Use USER (prompting for a password) for later commands
    Login { user: String },

    /// Forget the current user and fall back to the configured identity
    Logout,

    /// Leave the console
    #[command(alias = "quit")]
    Exit,
}

#[derive(Debug, PartialEq, Eq)]
pub struct UnclosedQuote;

/// Split a console line into words.
///
/// Single and double quotes group words. Backslashes are literal so Windows
/// paths can be typed unquoted.
pub fn split_line(line: &str) -> Result<Vec<String>, UnclosedQuote> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_word = true;
            }
            None if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            None => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quote.is_some() {
        return Err(UnclosedQuote);
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}

fn history_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "fleetshare").map(|dirs| dirs.data_dir().join("history"))
}

pub async fn run_shell(fleet: &Fleet, credentials: CallerCredentials) -> Result<()> {
    let mut credentials = credentials;
    let mut rl = DefaultEditor::new()?;
    rl.set_max_history_size(MAX_HISTORY)?;

    let history = history_path();
    if let Some(path) = &history {
        let _ = rl.load_history(path);
    }

    println!("{}", OutputFormatter::format_header("fleetshare console"));
    println!("Type 'help' for commands, 'exit' or Ctrl+D to quit.");
    println!();

    loop {
        let line = match rl.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => {
                tracing::error!("Failed to read console input: {}", e);
                break;
            }
        };

        let words = match split_line(&line) {
            Ok(words) if words.is_empty() => continue,
            Ok(words) => words,
            Err(UnclosedQuote) => {
                println!("{} Unclosed quote", "✗".red());
                continue;
            }
        };
        let _ = rl.add_history_entry(line.as_str());

        let parsed = match ShellLine::try_parse_from(&words) {
            Ok(parsed) => parsed,
            Err(e) => {
                let _ = e.print();
                continue;
            }
        };

        match parsed.command {
            ShellCommand::Exit => break,
            ShellCommand::Sessions => sessions::list_sessions(fleet).await,
            ShellCommand::DisconnectAll => {
                sessions::disconnect_all(fleet).await;
            }
            ShellCommand::Login { user } => match prompt_password(&user) {
                Ok(password) => {
                    println!("{} Using {} for later commands", "✓".green(), user.bold());
                    credentials = CallerCredentials::new(Some(user), Some(password));
                }
                Err(e) => println!("{} {:#}", "✗".red(), e),
            },
            ShellCommand::Logout => {
                credentials = CallerCredentials::default();
                println!("{}", "Credentials cleared".dimmed());
            }
            ShellCommand::Fleet(Commands::Shell) => {
                println!("{}", "Already in the console".dimmed());
            }
            ShellCommand::Fleet(command) => {
                if let Err(e) = dispatch(fleet, &credentials, &command).await {
                    println!("{} {:#}", "✗".red(), e);
                }
            }
        }
    }

    if let Some(path) = &history {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        if let Err(e) = rl.save_history(path) {
            tracing::debug!("Failed to save console history: {}", e);
        }
    }

    sessions::disconnect_all(fleet).await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_line_keeps_backslashes() {
        assert_eq!(
            split_line(r"check -r stores.xlsx -f report.txt -d data\in").unwrap(),
            vec!["check", "-r", "stores.xlsx", "-f", "report.txt", "-d", r"data\in"]
        );
    }

    #[test]
    fn test_split_line_quotes() {
        assert_eq!(
            split_line(r#"transfer -d "data\new dir" 'a b.csv' "" x"#).unwrap(),
            vec!["transfer", "-d", r"data\new dir", "a b.csv", "", "x"]
        );
        assert_eq!(split_line("  ").unwrap(), Vec::<String>::new());
        assert_eq!(split_line("check 'unclosed"), Err(UnclosedQuote));
    }

    #[test]
    fn test_shell_line_parsing() {
        let parsed = ShellLine::try_parse_from(["test-connection", "10.0.0.5"]).unwrap();
        assert!(matches!(
            parsed.command,
            ShellCommand::Fleet(Commands::TestConnection { ref address }) if address == "10.0.0.5"
        ));

        let parsed = ShellLine::try_parse_from(["disconnect-all"]).unwrap();
        assert!(matches!(parsed.command, ShellCommand::DisconnectAll));

        let parsed = ShellLine::try_parse_from(["quit"]).unwrap();
        assert!(matches!(parsed.command, ShellCommand::Exit));

        assert!(ShellLine::try_parse_from(["bogus"]).is_err());
    }
}
