//! User disambiguation during installs
//!
//! Installs ask questions whenever file signatures are not enough to decide
//! where content belongs. A [`Prompter`] answers them: interactively on a
//! terminal, or from a pre-supplied script for batch runs and tests.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

/// Answers install questions. `None` means the user cancelled.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Prompter: Send + Sync {
    /// Pick one of `options`. A returned value is always one of the
    /// `options` strings, with the caller's casing.
    async fn ask(&self, title: &str, message: &str, options: &[String]) -> Result<Option<String>>;

    /// Free-text answer, pre-filled with `default`.
    async fn ask_text(&self, title: &str, message: &str, default: &str) -> Result<Option<String>>;
}

/// Map a raw answer onto one of `options`: a 1-based index, or an option
/// name compared case-insensitively.
pub fn match_option(options: &[String], answer: &str) -> Option<String> {
    let answer = answer.trim();
    if let Ok(index) = answer.parse::<usize>() {
        if index >= 1 && index <= options.len() {
            return Some(options[index - 1].clone());
        }
    }
    options
        .iter()
        .find(|o| o.eq_ignore_ascii_case(answer))
        .cloned()
}

/// Interactive prompter reading numbered choices from stdin
pub struct TerminalPrompter {
    input: tokio::sync::Mutex<Lines<BufReader<Stdin>>>,
}

impl Default for TerminalPrompter {
    fn default() -> Self {
        Self::new()
    }
}

impl TerminalPrompter {
    pub fn new() -> Self {
        Self {
            input: tokio::sync::Mutex::new(BufReader::new(tokio::io::stdin()).lines()),
        }
    }

    async fn read_line(&self, prompt: &str) -> Result<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let mut input = self.input.lock().await;
        Ok(input.next_line().await?)
    }
}

#[async_trait]
impl Prompter for TerminalPrompter {
    async fn ask(&self, title: &str, message: &str, options: &[String]) -> Result<Option<String>> {
        let mut menu = format!("\n{}\n{:-<40}\n{}\n", title, "", message);
        for (i, option) in options.iter().enumerate() {
            menu.push_str(&format!("  {}) {}\n", i + 1, option));
        }
        menu.push_str("  (empty to cancel)\n");

        loop {
            let Some(line) = self.read_line(&format!("{}> ", menu)).await? else {
                return Ok(None);
            };
            if line.trim().is_empty() {
                return Ok(None);
            }
            if let Some(choice) = match_option(options, &line) {
                return Ok(Some(choice));
            }
            menu = format!("'{}' is not one of the choices.\n", line.trim());
        }
    }

    async fn ask_text(&self, title: &str, message: &str, default: &str) -> Result<Option<String>> {
        let prompt = format!("\n{}\n{} [{}]: ", title, message, default);
        let Some(line) = self.read_line(&prompt).await? else {
            return Ok(None);
        };
        let line = line.trim();
        if line.is_empty() {
            Ok(Some(default.to_string()))
        } else {
            Ok(Some(line.to_string()))
        }
    }
}

/// Answer to send for a cancelled question in a script
pub const SCRIPTED_CANCEL: &str = "-";

/// Prompter that replays pre-supplied answers in order.
///
/// Each question consumes one answer. `-` cancels. When answers run out,
/// choice questions are cancelled and text questions accept their default.
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
}

impl ScriptedPrompter {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(Into::into).collect()),
        }
    }

    fn next_answer(&self) -> Option<String> {
        self.answers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front()
    }

    /// Answers not consumed yet
    pub fn remaining(&self) -> usize {
        self.answers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl Prompter for ScriptedPrompter {
    async fn ask(&self, title: &str, _message: &str, options: &[String]) -> Result<Option<String>> {
        let Some(answer) = self.next_answer() else {
            tracing::info!("{}: no scripted answer left, cancelling", title);
            return Ok(None);
        };
        if answer == SCRIPTED_CANCEL {
            return Ok(None);
        }

        match match_option(options, &answer) {
            Some(choice) => {
                tracing::info!("{}: answered '{}'", title, choice);
                Ok(Some(choice))
            }
            None => anyhow::bail!(
                "Scripted answer '{}' for '{}' is not one of: {}",
                answer,
                title,
                options.join(", ")
            ),
        }
    }

    async fn ask_text(&self, title: &str, _message: &str, default: &str) -> Result<Option<String>> {
        match self.next_answer() {
            Some(answer) if answer == SCRIPTED_CANCEL => Ok(None),
            Some(answer) => {
                tracing::info!("{}: answered '{}'", title, answer);
                Ok(Some(answer))
            }
            None => Ok(Some(default.to_string())),
        }
    }
}
