use anyhow::{Context, Result, bail};
use std::borrow::Cow;
use std::ffi::OsStr;
use std::path::Path;
use std::process::ExitStatus;

/// Run `program` to completion with `args`.
///
/// Anything but a clean exit — program not found, spawn failure,
/// non-zero exit code, signal death — becomes a descriptive error for
/// the statement boundary to report.
pub fn run_tool(program: &str, args: &[String]) -> Result<()> {
    let search_paths = std::env::var_os("PATH").unwrap_or_default();
    let Some(executable) = find_tool_path(&search_paths, Path::new(program)) else {
        bail!("tool not found: {program} (not on PATH and not a path to an executable)");
    };
    log::info!("running {} {}", executable.display(), args.join(" "));
    let status = std::process::Command::new(executable.as_ref())
        .args(args)
        .status()
        .with_context(|| format!("failed to start {program}"))?;
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => bail!("{program} exited with code {code}"),
        None => bail!(
            "{program} terminated abnormally (status {})",
            abnormal_exit_code(status)
        ),
    }
}

/// Resolve a tool program the way a shell would.
///
/// - Absolute path: returned if it exists.
/// - `./`-prefixed or multi-component relative path: resolved against
///   the current directory.
/// - Single component: the first match found in `search_paths` (PATH).
/// - Empty path: `None`.
pub fn find_tool_path<'a>(search_paths: &OsStr, program: &'a Path) -> Option<Cow<'a, Path>> {
    if program.as_os_str().is_empty() {
        return None;
    }
    if program.is_absolute() {
        return program.exists().then(|| Cow::Borrowed(program));
    }
    if program.components().count() > 1 || program.starts_with("./") {
        return program.exists().then(|| Cow::Borrowed(program));
    }
    for dir in std::env::split_paths(search_paths) {
        let candidate = dir.join(program);
        if candidate.exists() {
            return Some(Cow::Owned(candidate));
        }
    }
    None
}

#[cfg(unix)]
fn abnormal_exit_code(status: ExitStatus) -> i32 {
    use std::os::unix::process::ExitStatusExt;
    match ExitStatusExt::signal(&status) {
        Some(signal) => 128 + signal,
        None => -1,
    }
}

#[cfg(not(unix))]
fn abnormal_exit_code(_status: ExitStatus) -> i32 {
    -1
}
