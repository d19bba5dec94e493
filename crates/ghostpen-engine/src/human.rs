//! Line-based question/answer boundary with the human operator.

use std::collections::VecDeque;
use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

#[async_trait]
pub trait HumanIo: Send {
    /// Prompt and wait for one line. Returns the trimmed answer, or `None`
    /// once input is closed.
    async fn ask(&mut self, prompt: &str) -> io::Result<Option<String>>;

    fn show_draft(&mut self, draft: &str);

    fn notice(&mut self, line: &str);

    fn warn(&mut self, line: &str);
}

/// Terminal implementation over tokio's stdin and stdout.
pub struct ConsoleIo {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleIo {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for ConsoleIo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HumanIo for ConsoleIo {
    async fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(format!("\n{prompt}\n> ").as_bytes()).await?;
        stdout.flush().await?;
        Ok(self
            .lines
            .next_line()
            .await?
            .map(|line| line.trim().to_string()))
    }

    fn show_draft(&mut self, draft: &str) {
        println!("\n{}\n{draft}\n{}", "─".repeat(50), "─".repeat(50));
    }

    fn notice(&mut self, line: &str) {
        println!("{line}");
    }

    fn warn(&mut self, line: &str) {
        println!("⚠ {line}");
    }
}

/// Replays canned answers and records everything shown. Input closes when
/// the answers run out.
#[derive(Debug, Default)]
pub struct ScriptedHuman {
    pub answers: VecDeque<String>,
    pub prompts: Vec<String>,
    pub drafts: Vec<String>,
    pub notices: Vec<String>,
    pub warnings: Vec<String>,
}

impl ScriptedHuman {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl HumanIo for ScriptedHuman {
    async fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.answers.pop_front().map(|a| a.trim().to_string()))
    }

    fn show_draft(&mut self, draft: &str) {
        self.drafts.push(draft.to_string());
    }

    fn notice(&mut self, line: &str) {
        self.notices.push(line.to_string());
    }

    fn warn(&mut self, line: &str) {
        self.warnings.push(line.to_string());
    }
}
