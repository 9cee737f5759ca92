//! Interactive operator console

use super::types::{CredentialSupplier, Renewal, RenewalRequest, STOP_KEYWORD};
use crate::error::{Error, Result};
use crate::types::FailureKind;
use async_trait::async_trait;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Stdin};

const RULE: &str = "============================================================";

/// Console bound to the process's stdin and stdout
pub type StdConsole = Console<BufReader<Stdin>, std::io::Stdout>;

/// Line-oriented prompt over an async reader and a writer
#[derive(Debug)]
pub struct Console<R, W> {
    reader: R,
    writer: W,
}

impl StdConsole {
    /// Console on stdin/stdout
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), std::io::stdout())
    }
}

impl<R, W> Console<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    /// Create a console over the given streams
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Print a line
    pub fn say(&mut self, line: &str) -> Result<()> {
        writeln!(self.writer, "{line}")
            .and_then(|()| self.writer.flush())
            .map_err(|e| Error::prompt(format!("Failed to write to console: {e}")))
    }

    /// Print `prompt` and read one trimmed line; `None` at end of input
    pub async fn ask(&mut self, prompt: &str) -> Result<Option<String>> {
        write!(self.writer, "{prompt}")
            .and_then(|()| self.writer.flush())
            .map_err(|e| Error::prompt(format!("Failed to write to console: {e}")))?;

        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .await
            .map_err(|e| Error::prompt(format!("Failed to read from console: {e}")))?;

        if read == 0 {
            Ok(None)
        } else {
            Ok(Some(line.trim().to_string()))
        }
    }

    /// Split into reader and writer
    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

/// Supplier that asks the operator on the console
#[derive(Debug)]
pub struct ConsoleSupplier<R, W> {
    console: Console<R, W>,
}

impl<R, W> ConsoleSupplier<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    /// Wrap a console
    pub fn new(console: Console<R, W>) -> Self {
        Self { console }
    }

    /// Give the console back
    pub fn into_console(self) -> Console<R, W> {
        self.console
    }
}

#[async_trait]
impl<R, W> CredentialSupplier for ConsoleSupplier<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: Write + Send,
{
    async fn request_renewal(&mut self, request: &RenewalRequest) -> Result<Renewal> {
        let headline = match request.reason {
            FailureKind::Timeout => "REQUEST TIMED OUT",
            _ => "SESSION EXPIRED",
        };

        self.console.say("")?;
        self.console.say(RULE)?;
        self.console.say(headline)?;
        self.console.say("Please provide a new session ID to continue.")?;
        self.console
            .say(&format!("Resume from page: {}", request.page))?;
        self.console.say(RULE)?;

        let prompt = format!("\nEnter new session ID (or '{STOP_KEYWORD}' to stop): ");
        loop {
            let Some(line) = self.console.ask(&prompt).await? else {
                return Ok(Renewal::Stop);
            };
            match Renewal::parse(&line) {
                Some(renewal) => return Ok(renewal),
                None => self.console.say("Session ID cannot be empty.")?,
            }
        }
    }
}
