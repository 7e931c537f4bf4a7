/// What the operator did at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Line(String),
    /// Ctrl+C: abandon the current line.
    Interrupt,
    /// Ctrl+D, or no more input.
    Eof,
}

/// One message from the session, tagged with how a host should present it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// Command output: configuration JSON, tables, diffs.
    Display(String),
    Error(String),
    /// Banner and hints; hosts without a terminal may drop these.
    Notice(String),
}

impl Output {
    pub fn text(&self) -> &str {
        match self {
            Output::Display(text) | Output::Error(text) | Output::Notice(text) => text,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Output::Error(_))
    }
}

/// Prompt state announced before every read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptConfig {
    pub hostname: String,
    /// A candidate configuration is open.
    pub configure: bool,
}

impl PromptConfig {
    /// `vtyang# ` or `vtyang(config)# `.
    pub fn render(&self) -> String {
        format!("{}{}# ", self.hostname, self.mode_suffix())
    }

    pub fn mode_suffix(&self) -> &'static str {
        if self.configure {
            "(config)"
        } else {
            ""
        }
    }
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            hostname: "vtyang".to_string(),
            configure: false,
        }
    }
}

/// Why the session loop returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// `exit` or `quit` in view mode.
    UserExit,
    Eof,
    /// A structural invariant was violated; the session cannot continue.
    Fatal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_per_mode() {
        let mut prompt = PromptConfig::default();
        assert_eq!(prompt.render(), "vtyang# ");
        prompt.configure = true;
        assert_eq!(prompt.render(), "vtyang(config)# ");
    }

    #[test]
    fn output_text_ignores_kind() {
        assert_eq!(Output::Error("Not Found".into()).text(), "Not Found");
        assert!(Output::Error(String::new()).is_error());
        assert!(!Output::Notice(String::new()).is_error());
    }
}
