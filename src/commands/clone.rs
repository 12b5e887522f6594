use std::path::PathBuf;

use anyhow::Context;

/// git clone command
pub fn invoke(repo_url: &str, dest: Option<String>) -> anyhow::Result<()> {
    let dest = dest
        .map(PathBuf::from)
        .unwrap_or_else(|| crate::clone::default_dest_name(repo_url));

    crate::clone::clone(repo_url, &dest)
        .with_context(|| format!("cloning {repo_url} into {}", dest.display()))?;

    println!("Cloned into '{}'", dest.display());
    Ok(())
}
