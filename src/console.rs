use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

/// Severity of a console message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Info,
    Warn,
    Error,
}

/// The display/input surface the interpreter talks to.
///
/// Everything user-visible goes through this trait; the `log` macros are
/// reserved for diagnostics. The input surface is disabled for the whole
/// duration of a line's execution and re-enabled afterwards.
pub trait Console {
    fn info(&mut self, msg: &str);
    fn warn(&mut self, msg: &str);
    fn error(&mut self, msg: &str);

    /// Gate the interactive input surface.
    fn set_input_enabled(&mut self, enabled: bool);

    /// Read the next input line. `None` means end of input.
    fn read_line(&mut self, prompt: &str) -> Result<Option<String>>;
}

/// Terminal console over a rustyline editor, with line history.
pub struct TermConsole {
    editor: DefaultEditor,
    input_enabled: bool,
}

impl TermConsole {
    pub fn new() -> Result<Self> {
        Ok(TermConsole {
            editor: DefaultEditor::new()?,
            input_enabled: true,
        })
    }
}

impl Console for TermConsole {
    fn info(&mut self, msg: &str) {
        println!("{msg}");
    }

    fn warn(&mut self, msg: &str) {
        println!("warning: {msg}");
    }

    fn error(&mut self, msg: &str) {
        eprintln!("error: {msg}");
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        // The blocking readline is only active between lines, so there
        // is nothing to tear down here; the flag mirrors the surface
        // state for anyone composing this console.
        self.input_enabled = enabled;
    }

    fn read_line(&mut self, prompt: &str) -> Result<Option<String>> {
        // The interpreter only asks for input between lines.
        debug_assert!(self.input_enabled);
        match self.editor.readline(prompt) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    self.editor.add_history_entry(line.as_str())?;
                }
                Ok(Some(line))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => Ok(None),
            Err(err) => Err(err.into()),
        }
    }
}

/// Everything a [`BufferConsole`] has recorded.
#[derive(Debug, Default)]
pub struct Recorded {
    /// Messages in emission order.
    pub messages: Vec<(Level, String)>,
    /// Input-surface transitions in call order.
    pub gates: Vec<bool>,
}

impl Recorded {
    /// Texts of all messages at `level`, in order.
    pub fn texts(&self, level: Level) -> Vec<&str> {
        self.messages
            .iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, m)| m.as_str())
            .collect()
    }
}

/// Memory-backed console for driving the interpreter without a terminal.
///
/// Public so it can be constructed from other modules' tests. Input
/// lines are served from a queue; the recording handle survives moving
/// the console into the interpreter.
#[derive(Default)]
pub struct BufferConsole {
    recorded: Rc<RefCell<Recorded>>,
    script: VecDeque<String>,
}

impl BufferConsole {
    /// Convenience: create a console and return (console, record handle).
    pub fn with_handle() -> (Self, Rc<RefCell<Recorded>>) {
        let console = BufferConsole::default();
        let handle = console.recorded.clone();
        (console, handle)
    }

    /// Queue an input line for [`Console::read_line`].
    pub fn push_line(&mut self, line: &str) {
        self.script.push_back(line.to_string());
    }
}

impl Console for BufferConsole {
    fn info(&mut self, msg: &str) {
        self.recorded
            .borrow_mut()
            .messages
            .push((Level::Info, msg.to_string()));
    }

    fn warn(&mut self, msg: &str) {
        self.recorded
            .borrow_mut()
            .messages
            .push((Level::Warn, msg.to_string()));
    }

    fn error(&mut self, msg: &str) {
        self.recorded
            .borrow_mut()
            .messages
            .push((Level::Error, msg.to_string()));
    }

    fn set_input_enabled(&mut self, enabled: bool) {
        self.recorded.borrow_mut().gates.push(enabled);
    }

    fn read_line(&mut self, _prompt: &str) -> Result<Option<String>> {
        Ok(self.script.pop_front())
    }
}
