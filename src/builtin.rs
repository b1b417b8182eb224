use crate::command::{NodeRef, add_command, handler};
use crate::interpreter::Interpreter;
use anyhow::{Result, bail};

/// Register the reserved command surface at the root: `print`, `alias`
/// and `help`. These exist in every session regardless of which domain
/// commands are configured.
pub fn register(root: &NodeRef) -> Result<()> {
    add_command(
        root,
        "print",
        Some("words"),
        Some("echo a message to the console"),
        Some(handler(print_cmd)),
    )?;
    add_command(
        root,
        "alias",
        Some("name command"),
        Some("define a shortcut replayed through normal dispatch"),
        Some(handler(alias_cmd)),
    )?;
    add_command(
        root,
        "help",
        Some("command path"),
        Some("list commands, optionally below a path"),
        Some(handler(help_cmd)),
    )?;
    Ok(())
}

fn print_cmd(interpreter: &mut Interpreter, args: &[String]) -> Result<()> {
    interpreter.console().info(&args.join(" "));
    Ok(())
}

fn alias_cmd(interpreter: &mut Interpreter, args: &[String]) -> Result<()> {
    let Some((name, expansion)) = args.split_first() else {
        bail!("usage: alias <name> <command...>");
    };
    if expansion.is_empty() {
        bail!("usage: alias <name> <command...>");
    }
    interpreter.define_alias(name, expansion)?;
    interpreter
        .console()
        .info(&format!("alias \"{name}\" saved"));
    Ok(())
}

fn help_cmd(interpreter: &mut Interpreter, args: &[String]) -> Result<()> {
    interpreter.help(args);
    Ok(())
}
