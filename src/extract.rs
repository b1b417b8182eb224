use crate::command::{NodeRef, add_command, handler};
use crate::external::run_tool;
use crate::interpreter::Interpreter;
use anyhow::{Context, Result};

/// Register the client-data extraction commands: the `extract` group
/// with one sub-action per tool, and the `build` group chaining them.
pub fn register(root: &NodeRef) -> Result<()> {
    let extract = add_command(root, "extract", None, None, None)?;
    add_command(
        &extract,
        "maps",
        Some("extractor args"),
        Some("extract terrain maps from the client"),
        Some(handler(extract_maps)),
    )?;
    add_command(
        &extract,
        "vmaps",
        Some("extractor args"),
        Some("extract and assemble vmaps"),
        Some(handler(extract_vmaps)),
    )?;
    add_command(
        &extract,
        "mmaps",
        Some("generator args"),
        Some("generate mmaps from extracted maps and vmaps"),
        Some(handler(extract_mmaps)),
    )?;

    let build = add_command(root, "build", None, None, None)?;
    add_command(
        &build,
        "data",
        None,
        Some("run the full extraction chain: maps, vmaps, mmaps"),
        Some(handler(build_data)),
    )?;
    add_command(
        &build,
        "clean",
        None,
        Some("delete previously extracted output"),
        Some(handler(build_clean)),
    )?;
    Ok(())
}

/// Common leading arguments every tool receives; extra tokens from the
/// statement are passed through after them.
fn tool_args(interpreter: &Interpreter, extra: &[String]) -> Vec<String> {
    let settings = interpreter.settings();
    let mut args = vec![
        "--client".to_string(),
        settings.client_dir.to_string_lossy().into_owned(),
        "--output".to_string(),
        settings.output_dir.to_string_lossy().into_owned(),
    ];
    args.extend(extra.iter().cloned());
    args
}

fn extract_maps(interpreter: &mut Interpreter, args: &[String]) -> Result<()> {
    let tool = interpreter.settings().tools.map_extractor.clone();
    let args = tool_args(interpreter, args);
    interpreter.console().info("extracting maps...");
    run_tool(&tool, &args)?;
    interpreter.console().info("maps extracted");
    Ok(())
}

fn extract_vmaps(interpreter: &mut Interpreter, args: &[String]) -> Result<()> {
    let extractor = interpreter.settings().tools.vmap_extractor.clone();
    let assembler = interpreter.settings().tools.vmap_assembler.clone();
    let args = tool_args(interpreter, args);
    interpreter.console().info("extracting vmaps...");
    run_tool(&extractor, &args)?;
    // The assembler consumes the extractor's output; same directories.
    run_tool(&assembler, &args)?;
    interpreter.console().info("vmaps assembled");
    Ok(())
}

fn extract_mmaps(interpreter: &mut Interpreter, args: &[String]) -> Result<()> {
    let tool = interpreter.settings().tools.mmap_generator.clone();
    let args = tool_args(interpreter, args);
    interpreter.console().info("generating mmaps...");
    run_tool(&tool, &args)?;
    interpreter.console().info("mmaps generated");
    Ok(())
}

/// The full chain, stopping at the first failing step.
fn build_data(interpreter: &mut Interpreter, args: &[String]) -> Result<()> {
    extract_maps(interpreter, args)?;
    extract_vmaps(interpreter, args)?;
    extract_mmaps(interpreter, args)?;
    interpreter.console().info("data build complete");
    Ok(())
}

fn build_clean(interpreter: &mut Interpreter, _args: &[String]) -> Result<()> {
    let output_dir = interpreter.settings().output_dir.clone();
    for sub in ["maps", "vmaps", "mmaps"] {
        let dir = output_dir.join(sub);
        if dir.exists() {
            std::fs::remove_dir_all(&dir)
                .with_context(|| format!("removing {}", dir.display()))?;
            interpreter.console().info(&format!("removed {}", dir.display()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::console::{BufferConsole, Level};
    use tempfile::TempDir;

    fn interpreter_with_output(dir: &TempDir) -> (Interpreter, std::rc::Rc<std::cell::RefCell<crate::console::Recorded>>) {
        let (console, recorded) = BufferConsole::with_handle();
        let settings = Settings {
            output_dir: dir.path().join("out"),
            alias_file: Some(dir.path().join("aliases.toml")),
            ..Settings::default()
        };
        let interpreter = Interpreter::new(settings, Box::new(console)).unwrap();
        (interpreter, recorded)
    }

    #[test]
    fn tool_args_lead_with_the_configured_directories() {
        let dir = TempDir::new().unwrap();
        let (interpreter, _) = interpreter_with_output(&dir);
        let args = tool_args(&interpreter, &["--skip-existing".to_string()]);
        assert_eq!(args[0], "--client");
        assert_eq!(args[2], "--output");
        assert_eq!(args.last().unwrap(), "--skip-existing");
    }

    #[test]
    fn clean_removes_extracted_subdirectories() {
        let dir = TempDir::new().unwrap();
        let (mut interpreter, recorded) = interpreter_with_output(&dir);
        let maps = dir.path().join("out/maps");
        std::fs::create_dir_all(&maps).unwrap();

        interpreter.run_line("build clean");

        assert!(!maps.exists());
        let recorded = recorded.borrow();
        assert!(recorded.texts(Level::Info)[0].contains("removed"));
    }

    #[test]
    fn clean_with_nothing_extracted_is_quiet() {
        let dir = TempDir::new().unwrap();
        let (mut interpreter, recorded) = interpreter_with_output(&dir);
        interpreter.run_line("build clean");
        assert!(recorded.borrow().messages.is_empty());
    }

    #[test]
    fn missing_tool_is_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        let (mut interpreter, recorded) = interpreter_with_output(&dir);
        interpreter.run_line("extract maps && print still here");
        let recorded = recorded.borrow();
        assert!(
            recorded
                .texts(Level::Error)
                .iter()
                .any(|m| m.contains("tool not found"))
        );
        assert!(recorded.texts(Level::Info).contains(&"still here"));
    }
}
