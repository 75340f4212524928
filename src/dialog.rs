//! Confirm/prompt dialogs as values instead of blocking browser popups.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Confirm,
    Cancel,
}

#[async_trait]
pub trait Dialog: Send + Sync {
    async fn confirm(&self, message: &str) -> Choice;

    /// `None` when the user cancels or enters nothing.
    async fn prompt(&self, message: &str) -> Option<String>;
}

/// Answers every confirmation the same way and never supplies text.
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub Choice);

#[async_trait]
impl Dialog for FixedAnswer {
    async fn confirm(&self, _message: &str) -> Choice {
        self.0
    }

    async fn prompt(&self, _message: &str) -> Option<String> {
        None
    }
}

/// Replays queued answers in order; used by tests and scripted sessions.
#[derive(Debug, Default)]
pub struct ScriptedDialog {
    confirms: Mutex<VecDeque<Choice>>,
    prompts: Mutex<VecDeque<Option<String>>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_confirm(self, choice: Choice) -> Self {
        if let Ok(mut q) = self.confirms.lock() {
            q.push_back(choice);
        }
        self
    }

    pub fn with_prompt(self, answer: Option<&str>) -> Self {
        if let Ok(mut q) = self.prompts.lock() {
            q.push_back(answer.map(str::to_string));
        }
        self
    }

    /// Messages shown so far.
    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().map(|a| a.clone()).unwrap_or_default()
    }

    fn record(&self, message: &str) {
        if let Ok(mut a) = self.asked.lock() {
            a.push(message.to_string());
        }
    }
}

#[async_trait]
impl Dialog for ScriptedDialog {
    async fn confirm(&self, message: &str) -> Choice {
        self.record(message);
        self.confirms
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or(Choice::Cancel)
    }

    async fn prompt(&self, message: &str) -> Option<String> {
        self.record(message);
        self.prompts.lock().ok().and_then(|mut q| q.pop_front()).flatten()
    }
}

/// Terminal dialog used by the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleDialog;

impl ConsoleDialog {
    async fn read_answer(message: &str) -> Option<String> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(message.as_bytes()).await.ok()?;
        stdout.flush().await.ok()?;

        let mut line = String::new();
        BufReader::new(tokio::io::stdin())
            .read_line(&mut line)
            .await
            .ok()?;
        Some(line.trim().to_string()).filter(|s| !s.is_empty())
    }
}

#[async_trait]
impl Dialog for ConsoleDialog {
    async fn confirm(&self, message: &str) -> Choice {
        match Self::read_answer(&format!("{message} [y/N] ")).await {
            Some(a) if a.eq_ignore_ascii_case("y") || a.eq_ignore_ascii_case("yes") => Choice::Confirm,
            _ => Choice::Cancel,
        }
    }

    async fn prompt(&self, message: &str) -> Option<String> {
        Self::read_answer(&format!("{message}: ")).await
    }
}
