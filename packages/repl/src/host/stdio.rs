//! Host for scripts piped into the shell: no prompt, no line editing.

use std::io::{self, BufRead, Write};

use crate::io::{InputEvent, IoError, IoHost, Output, PromptConfig};

/// One command per input line. Command output goes to stdout and errors to
/// stderr; notices are dropped.
pub struct StdioHost<R> {
    reader: R,
}

impl StdioHost<io::StdinLock<'static>> {
    pub fn stdin() -> Self {
        Self::new(io::stdin().lock())
    }
}

impl<R: BufRead> StdioHost<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> IoHost for StdioHost<R> {
    fn read_event(&mut self, _prompt: &PromptConfig) -> Result<InputEvent, IoError> {
        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(InputEvent::Eof);
        }
        Ok(InputEvent::Line(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    fn write(&mut self, output: Output) -> Result<(), IoError> {
        match output {
            Output::Display(text) => println!("{}", text),
            Output::Error(text) => eprintln!("{}", text),
            Output::Notice(_) => {}
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        io::stdout().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_lines_then_eof() {
        let mut host = StdioHost::new("configure\r\ncommit\n".as_bytes());
        let prompt = PromptConfig::default();

        assert_eq!(host.read_event(&prompt).unwrap(), InputEvent::Line("configure".into()));
        assert_eq!(host.read_event(&prompt).unwrap(), InputEvent::Line("commit".into()));
        assert_eq!(host.read_event(&prompt).unwrap(), InputEvent::Eof);
    }
}
