//! Scripted host: replays queued events and keeps a transcript.

use std::collections::VecDeque;

use super::{InputEvent, IoError, IoHost, Output, PromptConfig};

#[derive(Debug, Default)]
pub struct TestHost {
    script: VecDeque<InputEvent>,
    transcript: Vec<Output>,
    prompts: Vec<PromptConfig>,
}

impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_line(&mut self, line: impl Into<String>) {
        self.script.push_back(InputEvent::Line(line.into()));
    }

    pub fn queue_lines(&mut self, lines: impl IntoIterator<Item = impl Into<String>>) {
        for line in lines {
            self.queue_line(line);
        }
    }

    pub fn queue_event(&mut self, event: InputEvent) {
        self.script.push_back(event);
    }

    pub fn transcript(&self) -> &[Output] {
        &self.transcript
    }

    /// Text of every output, newline separated.
    pub fn output_text(&self) -> String {
        self.transcript
            .iter()
            .map(Output::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Command output only.
    pub fn displayed(&self) -> Vec<&str> {
        self.transcript
            .iter()
            .filter(|o| matches!(o, Output::Display(_)))
            .map(Output::text)
            .collect()
    }

    pub fn errors(&self) -> Vec<&str> {
        self.transcript
            .iter()
            .filter(|o| o.is_error())
            .map(Output::text)
            .collect()
    }

    pub fn prompts(&self) -> &[PromptConfig] {
        &self.prompts
    }
}

impl IoHost for TestHost {
    fn read_event(&mut self, prompt: &PromptConfig) -> Result<InputEvent, IoError> {
        self.prompts.push(prompt.clone());
        Ok(self.script.pop_front().unwrap_or(InputEvent::Eof))
    }

    fn write(&mut self, output: Output) -> Result<(), IoError> {
        self.transcript.push(output);
        Ok(())
    }
}
