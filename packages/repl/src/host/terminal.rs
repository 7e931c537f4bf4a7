//! Interactive host on top of Reedline: vi or emacs line editing,
//! schema-aware tab completion and a line history kept across sessions.

use std::borrow::Cow;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nu_ansi_term::{Color, Style};
use reedline::{
    default_emacs_keybindings, default_vi_insert_keybindings, default_vi_normal_keybindings,
    ColumnarMenu, DefaultHinter, EditCommand, EditMode, Emacs, FileBackedHistory, KeyCode,
    KeyModifiers, Keybindings, MenuBuilder, Prompt, PromptEditMode, PromptHistorySearch,
    PromptHistorySearchStatus, PromptViMode, Reedline, ReedlineEvent, ReedlineMenu, Signal, Vi,
};

use crate::completer::ReplCompleter;
use crate::highlighter::ReplHighlighter;
use crate::io::{InputEvent, IoError, IoHost, Output, PromptConfig};
use crate::session::Session;

const COMPLETION_MENU: &str = "completion_menu";
const HISTORY_SIZE: usize = 1000;

pub struct TerminalHost {
    editor: Reedline,
    /// Shared with the completer and highlighter so both follow the mode
    /// the prompt shows.
    configure: Arc<AtomicBool>,
}

impl TerminalHost {
    pub fn new(session: &Session) -> io::Result<Self> {
        let completer = ReplCompleter::new(Arc::clone(session.schema()), Arc::clone(session.trees()));
        let configure = completer.mode_flag();

        let mut editor = Reedline::create()
            .with_completer(Box::new(completer))
            .with_highlighter(Box::new(ReplHighlighter::new(
                Arc::clone(session.trees()),
                Arc::clone(&configure),
            )))
            .with_hinter(Box::new(
                DefaultHinter::default().with_style(Style::new().fg(Color::LightGray).dimmed()),
            ))
            .with_menu(ReedlineMenu::EngineCompleter(Box::new(
                ColumnarMenu::default()
                    .with_name(COMPLETION_MENU)
                    .with_text_style(Style::new().fg(Color::Cyan))
                    .with_selected_text_style(Style::new().fg(Color::Black).on(Color::Cyan).bold()),
            )))
            .with_edit_mode(edit_mode());

        if let Some(history) = open_history()? {
            editor = editor.with_history(Box::new(history));
        }
        Ok(Self { editor, configure })
    }
}

impl IoHost for TerminalHost {
    fn read_event(&mut self, prompt: &PromptConfig) -> Result<InputEvent, IoError> {
        self.configure.store(prompt.configure, Ordering::Relaxed);
        let prompt = ShellPrompt::new(prompt);
        match self.editor.read_line(&prompt) {
            Ok(Signal::Success(line)) => Ok(InputEvent::Line(line)),
            Ok(Signal::CtrlC) => Ok(InputEvent::Interrupt),
            Ok(Signal::CtrlD) => Ok(InputEvent::Eof),
            Err(err) => Err(IoError::Editor(err.to_string())),
        }
    }

    fn write(&mut self, output: Output) -> Result<(), IoError> {
        match output {
            Output::Display(text) => println!("{}", text),
            Output::Error(text) => println!("{}", Color::Red.paint(text)),
            Output::Notice(text) => println!("{}", Color::Cyan.paint(text)),
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), IoError> {
        io::stdout().flush()?;
        Ok(())
    }
}

/// Tab opens the completion menu, or steps through it once open.
fn bind_tab(keybindings: &mut Keybindings) {
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu(COMPLETION_MENU.to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );
}

fn edit_mode() -> Box<dyn EditMode> {
    if wants_vi() {
        let mut insert = default_vi_insert_keybindings();
        bind_tab(&mut insert);
        return Box::new(Vi::new(insert, default_vi_normal_keybindings()));
    }
    let mut keybindings = default_emacs_keybindings();
    bind_tab(&mut keybindings);
    // Ctrl+D on a non-empty line clears it instead of ending the session.
    keybindings.add_binding(
        KeyModifiers::CONTROL,
        KeyCode::Char('d'),
        ReedlineEvent::Edit(vec![EditCommand::Clear]),
    );
    Box::new(Emacs::new(keybindings))
}

fn open_history() -> io::Result<Option<FileBackedHistory>> {
    let Some(path) = dirs::data_local_dir().map(|dir| dir.join("vtyang").join("history.txt")) else {
        return Ok(None);
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    match FileBackedHistory::with_file(HISTORY_SIZE, path) {
        Ok(history) => Ok(Some(history)),
        Err(err) => {
            tracing::warn!(error = %err, "line history unavailable");
            Ok(None)
        }
    }
}

/// `VTYANG_EDIT_MODE` wins when set. Otherwise a vi-like `EDITOR`/`VISUAL`
/// or an inputrc with `set editing-mode vi` selects vi.
fn wants_vi() -> bool {
    if let Ok(mode) = std::env::var("VTYANG_EDIT_MODE") {
        return names_vi(&mode);
    }
    ["EDITOR", "VISUAL"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .any(|editor| names_vi(&editor))
        || inputrc_selects_vi()
}

fn names_vi(editor: &str) -> bool {
    let editor = editor.to_lowercase();
    let program = editor.rsplit('/').next().unwrap_or(&editor);
    program == "vi" || program.contains("vim")
}

fn inputrc_selects_vi() -> bool {
    [
        std::env::var("INPUTRC").ok().map(PathBuf::from),
        dirs::home_dir().map(|home| home.join(".inputrc")),
        Some(PathBuf::from("/etc/inputrc")),
    ]
    .into_iter()
    .flatten()
    .filter_map(|path| std::fs::read_to_string(path).ok())
    .any(|content| {
        content
            .lines()
            .map(|line| line.split_whitespace().collect::<Vec<_>>())
            .any(|words| words == ["set", "editing-mode", "vi"])
    })
}

/// Hostname in green, `(config)` in yellow while a candidate is open.
struct ShellPrompt {
    left: String,
}

impl ShellPrompt {
    fn new(config: &PromptConfig) -> Self {
        let left = format!(
            "{}{}",
            Color::Green.bold().paint(config.hostname.as_str()),
            Color::Yellow.paint(config.mode_suffix())
        );
        Self { left }
    }
}

impl Prompt for ShellPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.left)
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, edit_mode: PromptEditMode) -> Cow<'_, str> {
        match edit_mode {
            PromptEditMode::Vi(PromptViMode::Normal) => Cow::Borrowed("[N]# "),
            _ => Cow::Borrowed("# "),
        }
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(": ")
    }

    fn render_prompt_history_search_indicator(&self, search: PromptHistorySearch) -> Cow<'_, str> {
        let failing = match search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!("({}reverse-search: {}) ", failing, search.term))
    }
}
