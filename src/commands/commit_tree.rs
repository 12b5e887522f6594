use std::fmt::Write;
use std::path::Path;

use anyhow::Context;

use crate::config;
use crate::error::ConfigError;
use crate::object::{Object, ObjectKind};
use crate::store;

/// git commit-tree command
pub fn invoke(
    tree_hash: &str,
    message: &str,
    parent_hash: Option<String>,
) -> anyhow::Result<[u8; 20]> {
    store::read_object_header(Path::new("."), tree_hash)
        .with_context(|| format!("tree object does not exist: {tree_hash}"))?;

    let global = config::load_global().context("reading .mygitconfig")?;
    let name = global
        .get("user.name")
        .ok_or_else(|| ConfigError::MissingKey("user.name".into()))
        .context("looking up commit author")?;
    let email = global
        .get("user.email")
        .ok_or_else(|| ConfigError::MissingKey("user.email".into()))
        .context("looking up commit author")?;

    let mut commit = String::new();
    writeln!(commit, "tree {tree_hash}")?;

    if let Some(parent_hash) = parent_hash {
        writeln!(commit, "parent {parent_hash}")?;
    }

    let time = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .context("current system time is before UNIX epoch")?;

    writeln!(commit, "author {name} <{email}> {} +0000", time.as_secs())?;
    writeln!(commit, "committer {name} <{email}> {} +0000", time.as_secs())?;
    writeln!(commit, "\n{message}")?;

    let object = Object::new(ObjectKind::Commit, commit.into_bytes());
    let id = store::write_object(Path::new("."), &object)?;

    Ok(id)
}
