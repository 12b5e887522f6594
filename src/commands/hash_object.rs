use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::object::{Object, ObjectKind};
use crate::store;

/// git hash-object command
pub fn invoke(path: impl AsRef<Path>, write: bool, kind: ObjectKind) -> anyhow::Result<[u8; 20]> {
    let path = path.as_ref();
    let body = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let object = Object::new(kind, body);

    let hash = if write {
        store::write_object(Path::new("."), &object)?
    } else {
        object.id()
    };

    Ok(hash)
}
