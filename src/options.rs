//! Support bundle creation options
//!
//! An [`OptionsProvider`] decides what goes into the creation request. The default
//! provider leaves content selection to the server; the prompting provider asks the
//! user four yes/no questions through a [`Prompter`].

use crate::clock::{self, Clock, SystemClock};
use crate::error::{Error, Result};
use crate::types::{
    BundleParameters, CaseNumber, CreationOptions, LogsParameters, ThreadDumpParameters,
};
use chrono::Duration as ChronoDuration;
use std::io::{BufRead, Write};
use std::sync::Arc;

/// Provides the body of the creation request
pub trait OptionsProvider: Send + Sync {
    /// Options for a bundle attached to `case_number`
    fn options(&self, case_number: &CaseNumber) -> Result<CreationOptions>;
}

/// Name and description only, no parameters
pub struct DefaultOptionsProvider {
    clock: Arc<dyn Clock>,
}

impl DefaultOptionsProvider {
    /// Provider stamping descriptions with `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Default for DefaultOptionsProvider {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

impl OptionsProvider for DefaultOptionsProvider {
    fn options(&self, case_number: &CaseNumber) -> Result<CreationOptions> {
        Ok(CreationOptions {
            name: format!("JFrog Support Case number {case_number}"),
            description: format!("Generated on {}", clock::rfc3339(self.clock.now())),
            parameters: None,
        })
    }
}

/// Asks the user what to include in the bundle
pub trait Prompter: Send + Sync {
    /// Include logs?
    fn ask_include_logs(&self) -> Result<bool>;
    /// Include system info?
    fn ask_include_system(&self) -> Result<bool>;
    /// Include configuration?
    fn ask_include_configuration(&self) -> Result<bool>;
    /// Include a thread dump?
    fn ask_thread_dump(&self) -> Result<bool>;
}

/// Builds parameters from a [`Prompter`]'s answers
///
/// Logs cover yesterday and today (UTC). A requested thread dump means one dump.
pub struct PromptOptionsProvider {
    clock: Arc<dyn Clock>,
    prompter: Box<dyn Prompter>,
}

impl PromptOptionsProvider {
    /// Provider asking `prompter`, dating logs with `clock`
    pub fn new(clock: Arc<dyn Clock>, prompter: Box<dyn Prompter>) -> Self {
        Self { clock, prompter }
    }

    /// Provider asking on the terminal
    pub fn terminal() -> Self {
        Self::new(Arc::new(SystemClock), Box::new(TerminalPrompter))
    }
}

impl OptionsProvider for PromptOptionsProvider {
    fn options(&self, case_number: &CaseNumber) -> Result<CreationOptions> {
        let mut options = DefaultOptionsProvider::new(self.clock.clone()).options(case_number)?;

        let include_logs = self.prompter.ask_include_logs()?;
        let configuration = self.prompter.ask_include_configuration()?;
        let system = self.prompter.ask_include_system()?;
        let thread_dump = self.prompter.ask_thread_dump()?;

        let now = self.clock.now();
        let yesterday = now - ChronoDuration::hours(24);

        options.parameters = Some(BundleParameters {
            configuration,
            logs: LogsParameters {
                include: include_logs,
                start_date: clock::date(yesterday),
                end_date: clock::date(now),
            },
            system,
            thread_dump: ThreadDumpParameters {
                count: u32::from(thread_dump),
                interval: 0,
            },
        });
        Ok(options)
    }
}

/// [`Prompter`] reading answers from stdin
///
/// Questions go to stderr so stdout stays clean for the result.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    fn ask_boolean(&self, question: &str) -> Result<bool> {
        let stdin = std::io::stdin();
        let mut stderr = std::io::stderr();
        ask_boolean(question, &mut stdin.lock(), &mut stderr)
    }
}

impl Prompter for TerminalPrompter {
    fn ask_include_logs(&self) -> Result<bool> {
        self.ask_boolean("Include logs?")
    }

    fn ask_include_system(&self) -> Result<bool> {
        self.ask_boolean("Include system info?")
    }

    fn ask_include_configuration(&self) -> Result<bool> {
        self.ask_boolean("Include configuration?")
    }

    fn ask_thread_dump(&self) -> Result<bool> {
        self.ask_boolean("Include thread dump?")
    }
}

/// Ask a yes/no question, defaulting to yes; unrecognised answers ask again
fn ask_boolean(question: &str, input: &mut impl BufRead, output: &mut impl Write) -> Result<bool> {
    loop {
        write!(output, "{question} [Y/n] ").map_err(|e| Error::Prompt(e.to_string()))?;
        output.flush().map_err(|e| Error::Prompt(e.to_string()))?;

        let mut answer = String::new();
        let read = input
            .read_line(&mut answer)
            .map_err(|e| Error::Prompt(e.to_string()))?;
        if read == 0 {
            return Err(Error::Prompt(format!("no answer to '{question}'")));
        }
        match answer.trim().to_ascii_lowercase().as_str() {
            "" | "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            other => {
                writeln!(output, "invalid answer '{other}', expected y or n")
                    .map_err(|e| Error::Prompt(e.to_string()))?;
            }
        }
    }
}
