//! Minimal INI-style config model shared by `.git/config` and the
//! user-global `.mygitconfig`.
//!
//! Sections are `[name]` or `[name "subsection"]`; keys are `key = value`
//! lines indented under a section. This is intentionally far smaller than
//! real git config (no includes, no multi-valued keys, no quoting rules
//! beyond what this crate itself ever writes) since nothing here needs to
//! parse configs this crate didn't produce itself, except `.mygitconfig`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, GitError};

/// One `[section]` or `[section "subsection"]` block and its key/value pairs,
/// in insertion order (so re-serializing a parsed file is stable).
#[derive(Debug, Clone, PartialEq, Eq)]
struct Section {
    name: String,
    subsection: Option<String>,
    entries: Vec<(String, String)>,
}

/// A parsed config document, held as an ordered list of sections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    sections: Vec<Section>,
}

impl ConfigFile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config document from its on-disk text form.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut sections = Vec::new();
        let mut current: Option<Section> = None;

        for raw_line in text.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some(header) = line.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
                if let Some(section) = current.take() {
                    sections.push(section);
                }
                let (name, subsection) = match header.split_once(' ') {
                    Some((name, quoted)) => {
                        let sub = quoted.trim_matches('"').to_string();
                        (name.to_string(), Some(sub))
                    }
                    None => (header.to_string(), None),
                };
                current = Some(Section {
                    name,
                    subsection,
                    entries: Vec::new(),
                });
                continue;
            }

            let (key, value) = line
                .split_once('=')
                .ok_or_else(|| ConfigError::MalformedLine(raw_line.to_string()))?;
            let section = current
                .as_mut()
                .ok_or_else(|| ConfigError::MalformedLine(raw_line.to_string()))?;
            section
                .entries
                .push((key.trim().to_string(), value.trim().to_string()));
        }

        if let Some(section) = current.take() {
            sections.push(section);
        }

        Ok(ConfigFile { sections })
    }

    /// Read `key` as `"section.name"` or `"section.sub.name"` when the
    /// section carries a subsection (e.g. `"remote.origin.url"`).
    pub fn get(&self, key: &str) -> Option<&str> {
        let (section_name, sub, entry_name) = split_key(key)?;
        self.sections
            .iter()
            .find(|s| s.name == section_name && s.subsection.as_deref() == sub)
            .and_then(|s| s.entries.iter().find(|(k, _)| k == entry_name))
            .map(|(_, v)| v.as_str())
    }

    /// Set `key` to `value`, creating the section if it doesn't exist yet,
    /// or overwriting the first existing entry of that name.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let (section_name, sub, entry_name) =
            split_key(key).ok_or_else(|| ConfigError::MalformedKey(key.to_string()))?;

        let section = match self
            .sections
            .iter_mut()
            .find(|s| s.name == section_name && s.subsection.as_deref() == sub)
        {
            Some(section) => section,
            None => {
                self.sections.push(Section {
                    name: section_name.to_string(),
                    subsection: sub.map(str::to_string),
                    entries: Vec::new(),
                });
                self.sections.last_mut().unwrap()
            }
        };

        match section.entries.iter_mut().find(|(k, _)| k == entry_name) {
            Some((_, existing)) => *existing = value.to_string(),
            None => section
                .entries
                .push((entry_name.to_string(), value.to_string())),
        }

        Ok(())
    }

    /// Serialize back to on-disk INI text.
    pub fn to_string_pretty(&self) -> String {
        let mut out = String::new();
        for section in &self.sections {
            match &section.subsection {
                Some(sub) => out.push_str(&format!("[{} \"{sub}\"]\n", section.name)),
                None => out.push_str(&format!("[{}]\n", section.name)),
            }
            for (key, value) in &section.entries {
                out.push_str(&format!("\t{key} = {value}\n"));
            }
        }
        out
    }
}

/// Split `"section.sub.name"` or `"section.name"` into `(section, sub, name)`.
fn split_key(key: &str) -> Option<(&str, Option<&str>, &str)> {
    let mut parts = key.split('.');
    let section = parts.next()?;
    let rest: Vec<&str> = parts.collect();
    match rest.len() {
        1 => Some((section, None, rest[0])),
        2 => Some((section, Some(rest[0]), rest[1])),
        _ => None,
    }
}

/// Path to the per-user `.mygitconfig`, mirroring real git's layout choice
/// of putting it directly under the home directory rather than in an XDG
/// config directory.
pub fn global_config_path() -> Result<PathBuf, ConfigError> {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .ok_or(ConfigError::NoHomeDir)?;
    Ok(PathBuf::from(home).join(".mygitconfig"))
}

/// Load and parse `.mygitconfig`, or an empty document if it doesn't exist
/// yet (so `config --global --add` on a fresh machine just creates it).
pub fn load_global() -> Result<ConfigFile, GitError> {
    let path = global_config_path()?;
    match fs::read_to_string(&path) {
        Ok(text) => Ok(ConfigFile::parse(&text)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ConfigFile::new()),
        Err(e) => Err(GitError::io(&path, e)),
    }
}

pub fn save_global(config: &ConfigFile) -> Result<(), GitError> {
    let path = global_config_path()?;
    fs::write(&path, config.to_string_pretty()).map_err(|e| GitError::io(&path, e))
}

pub fn save_repo(root: &Path, config: &ConfigFile) -> Result<(), GitError> {
    let path = root.join(".git").join("config");
    fs::write(&path, config.to_string_pretty()).map_err(|e| GitError::io(&path, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sectioned_document() {
        let text = "[core]\n\trepositoryformatversion = 0\n[remote \"origin\"]\n\turl = https://example.com/repo.git\n\tfetch = +refs/heads/*:refs/remotes/origin/*\n";
        let config = ConfigFile::parse(text).unwrap();
        assert_eq!(config.get("core.repositoryformatversion"), Some("0"));
        assert_eq!(
            config.get("remote.origin.url"),
            Some("https://example.com/repo.git")
        );
    }

    #[test]
    fn set_then_get_roundtrips_through_text() {
        let mut config = ConfigFile::new();
        config.set("user.name", "Ada Lovelace").unwrap();
        config.set("user.email", "ada@example.com").unwrap();

        let text = config.to_string_pretty();
        let reparsed = ConfigFile::parse(&text).unwrap();
        assert_eq!(reparsed.get("user.name"), Some("Ada Lovelace"));
        assert_eq!(reparsed.get("user.email"), Some("ada@example.com"));
    }

    #[test]
    fn set_overwrites_existing_value() {
        let mut config = ConfigFile::new();
        config.set("user.name", "first").unwrap();
        config.set("user.name", "second").unwrap();
        assert_eq!(config.get("user.name"), Some("second"));
    }

    #[test]
    fn malformed_key_is_rejected() {
        let mut config = ConfigFile::new();
        let err = config.set("nodothere", "x").unwrap_err();
        assert!(matches!(err, ConfigError::MalformedKey(_)));
    }
}
