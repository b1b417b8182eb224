use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Program names of the external tools the extraction commands invoke.
/// Resolved against PATH at invocation time unless given as paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Tools {
    pub map_extractor: String,
    pub vmap_extractor: String,
    pub vmap_assembler: String,
    pub mmap_generator: String,
}

impl Default for Tools {
    fn default() -> Self {
        Tools {
            map_extractor: "map-extractor".to_string(),
            vmap_extractor: "vmap-extractor".to_string(),
            vmap_assembler: "vmap-assembler".to_string(),
            mmap_generator: "mmap-generator".to_string(),
        }
    }
}

/// Everything the interpreter needs to know about its surroundings.
///
/// Owned by the interpreter and threaded through it explicitly — there
/// are no process-global settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Game client installation the extractors read from.
    pub client_dir: PathBuf,
    /// Directory the extracted data is written to.
    pub output_dir: PathBuf,
    pub tools: Tools,
    /// Report handler failures with the full error chain instead of a
    /// one-line rendering.
    pub verbose_errors: bool,
    /// Override for the alias file location.
    pub alias_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            client_dir: PathBuf::from("Client"),
            output_dir: PathBuf::from("Data"),
            tools: Tools::default(),
            verbose_errors: false,
            alias_file: None,
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the default location.
    ///
    /// An explicit path must exist and parse. The default location
    /// (`~/.config/buildcon/settings.toml`) falls back to `Default`
    /// when the file is absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("reading settings file {}", path.display()))?;
                Self::parse(&text, path)
            }
            None => {
                let Some(path) = default_path() else {
                    return Ok(Settings::default());
                };
                match std::fs::read_to_string(&path) {
                    Ok(text) => Self::parse(&text, &path),
                    Err(_) => Ok(Settings::default()),
                }
            }
        }
    }

    fn parse(text: &str, path: &Path) -> Result<Self> {
        toml::from_str(text)
            .with_context(|| format!("malformed settings file {}", path.display()))
    }

    /// Where the alias store lives for these settings.
    pub fn alias_path(&self) -> PathBuf {
        self.alias_file
            .clone()
            .or_else(crate::alias::default_path)
            .unwrap_or_else(|| PathBuf::from("aliases.toml"))
    }
}

fn default_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(Path::new(&home).join(".config/buildcon/settings.toml"))
}
