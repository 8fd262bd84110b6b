//! Override policy for saving over an existing tracking record

use std::io::{self, BufRead, Write};

/// What to do when a record for the same repository is already stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverrideLevel {
    /// Keep the existing record
    Never,
    /// Ask before replacing it
    #[default]
    AskUser,
    /// Replace it unconditionally
    Always,
}

/// Yes/no decision on replacing the stored record of `name`
pub trait OverridePrompt {
    fn confirm_override(&mut self, name: &str) -> io::Result<bool>;
}

impl<F> OverridePrompt for F
where
    F: FnMut(&str) -> bool,
{
    fn confirm_override(&mut self, name: &str) -> io::Result<bool> {
        Ok(self(name))
    }
}

/// Line-based prompt over any reader/writer pair
pub struct ConsolePrompt<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> ConsolePrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> OverridePrompt for ConsolePrompt<R, W> {
    fn confirm_override(&mut self, name: &str) -> io::Result<bool> {
        let mut answer = String::new();
        loop {
            write!(
                self.output,
                "\"{name}\" repo already tracked! Do you want to override this (y|n)? "
            )?;
            self.output.flush()?;

            answer.clear();
            if self.input.read_line(&mut answer)? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "no answer to override prompt",
                ));
            }

            match answer.trim().to_lowercase().as_str() {
                "y" => return Ok(true),
                "n" => return Ok(false),
                _ => continue,
            }
        }
    }
}

/// Prompt on the terminal, writing to stderr
///
/// Stdin and stderr are locked only while a question is pending, so the
/// prompt stays visible when stdout is piped to a scheduler.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdioPrompt;

impl OverridePrompt for StdioPrompt {
    fn confirm_override(&mut self, name: &str) -> io::Result<bool> {
        let stdin = io::stdin();
        let stderr = io::stderr();
        ConsolePrompt::new(stdin.lock(), stderr.lock()).confirm_override(name)
    }
}
