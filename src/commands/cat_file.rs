use std::io::Write;
use std::path::Path;

use anyhow::Context;

use crate::store;

/// git cat-file command
pub fn invoke(hash: &str, type_only: bool, size_only: bool) -> anyhow::Result<()> {
    let object = store::read_object(Path::new("."), hash).context("reading object")?;

    if type_only {
        println!("{}", object.kind);
        return Ok(());
    }

    if size_only {
        println!("{}", object.body.len());
        return Ok(());
    }

    std::io::stdout()
        .lock()
        .write_all(&object.body)
        .context("streaming object content to stdout")?;

    Ok(())
}
