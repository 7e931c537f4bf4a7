//! The session loop: read an event, execute it, report the result.

use crate::commands::CommandResult;
use crate::io::{ExitReason, InputEvent, IoError, IoHost, Output};
use crate::session::Session;

/// Drives one [`Session`] from any [`IoHost`] and counts failed commands
/// for the process exit status.
pub struct ReplCore {
    session: Session,
    failures: usize,
}

impl ReplCore {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            failures: 0,
        }
    }

    /// Prompt, read and dispatch until the operator leaves or input ends.
    pub fn run(&mut self, io: &mut impl IoHost) -> Result<ExitReason, IoError> {
        io.write(Output::Notice(BANNER.to_string()))?;
        loop {
            let exit = match io.read_event(&self.session.prompt())? {
                InputEvent::Line(line) => self.dispatch(&line, io)?,
                InputEvent::Interrupt => {
                    io.write(Output::Notice("^C (use 'exit' to quit)".to_string()))?;
                    None
                }
                InputEvent::Eof => Some(ExitReason::Eof),
            };
            io.flush()?;
            if let Some(reason) = exit {
                return Ok(reason);
            }
        }
    }

    /// Execute `lines` in order without prompting. Stops at the first fatal
    /// error or explicit exit.
    pub fn run_commands<S: AsRef<str>>(
        &mut self,
        lines: &[S],
        io: &mut impl IoHost,
    ) -> Result<ExitReason, IoError> {
        for line in lines {
            if let Some(reason) = self.dispatch(line.as_ref(), io)? {
                io.flush()?;
                return Ok(reason);
            }
        }
        io.flush()?;
        Ok(ExitReason::Eof)
    }

    /// Number of commands that failed so far.
    pub fn failures(&self) -> usize {
        self.failures
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    fn dispatch(&mut self, line: &str, io: &mut impl IoHost) -> Result<Option<ExitReason>, IoError> {
        match self.session.execute(line) {
            CommandResult::Ok { display: None } => {}
            CommandResult::Ok {
                display: Some(output),
            } => io.write(Output::Display(output))?,
            CommandResult::Error(msg) => {
                self.failures += 1;
                io.write(Output::Error(msg))?;
            }
            CommandResult::Fatal(msg) => {
                self.failures += 1;
                io.write(Output::Error(msg.clone()))?;
                return Ok(Some(ExitReason::Fatal(msg)));
            }
            CommandResult::Exit => return Ok(Some(ExitReason::UserExit)),
        }
        Ok(None)
    }
}

const BANNER: &str = "vtyang: YANG-driven configuration shell
Type 'help' for available commands, '?' after a word for completions.";
