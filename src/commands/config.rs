use anyhow::Context;

use crate::config;

/// git config --global --add <key> <value>
pub fn add(key: &str, value: &str) -> anyhow::Result<()> {
    let mut global = config::load_global().context("reading .mygitconfig")?;
    global.set(key, value).context("setting config key")?;
    config::save_global(&global).context("writing .mygitconfig")?;
    Ok(())
}

/// git config --global --get <key>
pub fn get(key: &str) -> anyhow::Result<()> {
    let global = config::load_global().context("reading .mygitconfig")?;
    match global.get(key) {
        Some(value) => println!("{value}"),
        None => anyhow::bail!("key not found: {key}"),
    }
    Ok(())
}
