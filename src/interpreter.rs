use crate::alias::AliasStore;
use crate::command::{self, CommandNode, Handler, NodeRef};
use crate::config::Settings;
use crate::console::Console;
use crate::lexer::split_into_words;
use anyhow::{Result, bail};
use std::rc::Rc;

/// Two-character statement chain separator.
const SEPARATOR: &str = "&&";

/// Reserved word opening an alias definition. A line starting with it is
/// never split on the separator, so alias bodies may embed chains.
const ALIAS_KEYWORD: &str = "alias";

/// Bound on nested alias replay; past it, replay fails like any other
/// handler instead of recursing without limit.
const MAX_ALIAS_DEPTH: usize = 64;

/// The interactive command interpreter.
///
/// Owns the command tree, the persisted alias table, the console and the
/// settings. One line of input is processed to completion — statement by
/// statement, in order — before the next is accepted; a failure in one
/// statement is reported and does not stop the rest of the line.
///
/// Example
/// ```no_run
/// use buildcon::config::Settings;
/// use buildcon::console::TermConsole;
/// use buildcon::Interpreter;
///
/// let mut con = Interpreter::new(Settings::default(), Box::new(TermConsole::new()?))?;
/// con.run_line("help extract && print done");
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct Interpreter {
    root: NodeRef,
    aliases: AliasStore,
    console: Box<dyn Console>,
    settings: Settings,
    alias_depth: usize,
}

impl Interpreter {
    /// Build a fully-populated interpreter: the reserved command surface,
    /// the extraction commands, and every persisted alias registered
    /// before the first line of input is read.
    ///
    /// Fails on configuration errors — a duplicate command name or an
    /// unreadable alias file — which must stop startup.
    pub fn new(settings: Settings, console: Box<dyn Console>) -> Result<Self> {
        let aliases = AliasStore::load(settings.alias_path())?;
        let mut interpreter = Interpreter {
            root: CommandNode::root(),
            aliases,
            console,
            settings,
            alias_depth: 0,
        };
        crate::builtin::register(&interpreter.root)?;
        crate::extract::register(&interpreter.root)?;
        interpreter.register_saved_aliases()?;
        Ok(interpreter)
    }

    /// The root of the command tree, for registering further commands.
    pub fn root(&self) -> NodeRef {
        self.root.clone()
    }

    pub fn console(&mut self) -> &mut dyn Console {
        self.console.as_mut()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Interactive session: read lines until end of input.
    pub fn repl(&mut self, prompt: &str) -> Result<()> {
        loop {
            let line = match self.console.read_line(prompt)? {
                Some(line) => line,
                None => break,
            };
            self.run_line(&line);
        }
        Ok(())
    }

    /// Execute one raw input line.
    ///
    /// The line is split into statements on the chain separator (alias
    /// definitions excepted), each statement tokenized and dispatched in
    /// order. The input surface stays disabled until the whole line has
    /// finished.
    pub fn run_line(&mut self, line: &str) {
        self.console.set_input_enabled(false);
        for statement in split_statements(line) {
            let tokens = split_into_words(statement);
            self.run_statement(&tokens);
        }
        self.console.set_input_enabled(true);
    }

    /// Dispatch one statement, trapping every failure at this boundary.
    fn run_statement(&mut self, tokens: &[String]) {
        log::debug!("dispatching {tokens:?}");
        if let Err(err) = self.dispatch(tokens) {
            let msg = if self.settings.verbose_errors {
                format!("{err:?}")
            } else {
                format!("{err:#}")
            };
            self.console.error(&msg);
        }
    }

    /// Resolve `tokens` from the root and invoke the matched handler with
    /// the leftover tokens.
    ///
    /// An empty statement is a no-op. A resolved node without a handler
    /// is an unknown-command error naming the offending token and the
    /// path resolved so far.
    pub fn dispatch(&mut self, tokens: &[String]) -> Result<()> {
        if tokens.is_empty() {
            return Ok(());
        }
        let (node, consumed) = command::resolve(&self.root, tokens);
        let rest = &tokens[consumed..];
        // Clone the handler out so it may mutate the tree underneath
        // itself (alias redefinition) or re-enter dispatch.
        let handler = node.borrow().handler();
        match handler {
            Some(handler) => (*handler)(self, rest),
            None => {
                let path = command::full_name(&node);
                match rest.first() {
                    Some(token) if path.is_empty() => bail!("unknown command \"{token}\""),
                    Some(token) => bail!("unknown command \"{token}\" under \"{path}\""),
                    None => bail!("\"{path}\" is a command group; try \"help {path}\""),
                }
            }
        }
    }

    /// Define or redefine `name` as a replay of `expansion`.
    ///
    /// The expansion is persisted as a single line, any existing root
    /// command of that name is removed, and a fresh node is registered
    /// whose handler re-enters the dispatch pipeline with the expansion
    /// followed by the runtime arguments — resolution happens at each
    /// invocation, so aliases compose and observe later tree changes.
    pub fn define_alias(&mut self, name: &str, expansion: &[String]) -> Result<()> {
        self.aliases.set(name, &expansion.join(" "))?;
        self.register_alias_node(name, expansion)?;
        log::info!("alias \"{name}\" -> {expansion:?}");
        Ok(())
    }

    /// Render the help listing for `path` (empty: the whole tree).
    ///
    /// The path is followed exactly; a miss is a warning, not a dispatch
    /// failure. Read-only.
    pub fn help(&mut self, path: &[String]) {
        let Some(target) = command::walk(&self.root, path) else {
            self.console
                .warn(&format!("no such command path: \"{}\"", path.join(" ")));
            return;
        };
        let mut out = String::new();
        command::render(&target, 0, &mut out);
        if out.is_empty() {
            self.console.info("no commands registered");
        } else {
            self.console.info(out.trim_end());
        }
    }

    fn register_saved_aliases(&mut self) -> Result<()> {
        // Same replay a fresh `alias` statement goes through, minus the
        // redundant save of a map just read from disk.
        let saved: Vec<(String, String)> = self
            .aliases
            .entries()
            .map(|(name, expansion)| (name.to_string(), expansion.to_string()))
            .collect();
        for (name, expansion) in saved {
            self.register_alias_node(&name, &split_into_words(&expansion))?;
        }
        Ok(())
    }

    fn register_alias_node(&mut self, name: &str, expansion: &[String]) -> Result<()> {
        command::remove_command(&self.root, name);
        let replay = expansion.to_vec();
        let handler: Handler = Rc::new(move |interpreter: &mut Interpreter, args: &[String]| {
            let mut tokens = replay.clone();
            tokens.extend(args.iter().cloned());
            interpreter.run_alias_replay(&tokens)
        });
        let help = format!("alias for \"{}\"", expansion.join(" "));
        command::add_command(&self.root, name, None, Some(&help), Some(handler))?;
        Ok(())
    }

    /// Replay an alias body: split on separator tokens so chained
    /// definitions execute as chained statements, each isolated like a
    /// typed one.
    fn run_alias_replay(&mut self, tokens: &[String]) -> Result<()> {
        if self.alias_depth >= MAX_ALIAS_DEPTH {
            bail!("alias expansion nested deeper than {MAX_ALIAS_DEPTH} levels (alias loop?)");
        }
        self.alias_depth += 1;
        for statement in tokens.split(|t| t.as_str() == SEPARATOR) {
            self.run_statement(statement);
        }
        self.alias_depth -= 1;
        Ok(())
    }
}

/// Split a raw line into statements on the chain separator.
///
/// A line whose first word is the alias keyword is one statement, no
/// matter how many separators the alias body embeds.
fn split_statements(line: &str) -> Vec<&str> {
    if line.split_whitespace().next() == Some(ALIAS_KEYWORD) {
        vec![line]
    } else {
        line.split(SEPARATOR).collect()
    }
}
