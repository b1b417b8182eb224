use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// On-disk document: a flat name → expansion mapping.
#[derive(Debug, Default, Serialize, Deserialize)]
struct AliasFile {
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

/// The alias table plus its backing file.
///
/// Loaded once at startup; the full map is written back synchronously on
/// every definition. A missing file means no aliases yet.
#[derive(Debug)]
pub struct AliasStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl AliasStore {
    /// Open the store backed by `path`.
    ///
    /// An absent file yields an empty store; an unreadable or malformed
    /// one is a startup error.
    pub fn load(path: PathBuf) -> Result<Self> {
        let entries = match std::fs::read_to_string(&path) {
            Ok(text) => {
                let file: AliasFile = toml::from_str(&text)
                    .with_context(|| format!("malformed alias file {}", path.display()))?;
                file.aliases
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => {
                return Err(err).with_context(|| format!("reading alias file {}", path.display()));
            }
        };
        Ok(AliasStore { path, entries })
    }

    /// Insert or overwrite `name` and persist the whole map.
    pub fn set(&mut self, name: &str, expansion: &str) -> Result<()> {
        self.entries
            .insert(name.to_string(), expansion.to_string());
        self.save()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    /// All entries as (name, expansion) pairs.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
        }
        let file = AliasFile {
            aliases: self.entries.clone(),
        };
        let text = toml::to_string_pretty(&file).context("serializing aliases")?;
        std::fs::write(&self.path, text)
            .with_context(|| format!("writing alias file {}", self.path.display()))?;
        log::debug!("saved {} aliases to {}", self.entries.len(), self.path.display());
        Ok(())
    }
}

/// Default location of the alias file: `~/.config/buildcon/aliases.toml`.
pub fn default_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(Path::new(&home).join(".config/buildcon/aliases.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = AliasStore::load(dir.path().join("aliases.toml")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn set_then_reload_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aliases.toml");

        let mut store = AliasStore::load(path.clone()).unwrap();
        store.set("go", "move north").unwrap();
        store.set("dig", "excavate --deep").unwrap();

        let reloaded = AliasStore::load(path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("go"), Some("move north"));
        assert_eq!(reloaded.get("dig"), Some("excavate --deep"));
    }

    #[test]
    fn set_overwrites_an_existing_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aliases.toml");

        let mut store = AliasStore::load(path.clone()).unwrap();
        store.set("go", "move north").unwrap();
        store.set("go", "move south").unwrap();

        let reloaded = AliasStore::load(path).unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.get("go"), Some("move south"));
    }

    #[test]
    fn save_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config/aliases.toml");
        let mut store = AliasStore::load(path.clone()).unwrap();
        store.set("go", "move").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("aliases.toml");
        std::fs::write(&path, "aliases = 3").unwrap();
        assert!(AliasStore::load(path).is_err());
    }
}
