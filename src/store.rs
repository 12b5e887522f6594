//! Loose-object on-disk layout: `.git/objects/<xx>/<38-hex>`.

use std::fs;
use std::path::{Path, PathBuf};

use crate::codec;
use crate::error::GitError;
use crate::object::{unframe, Object, ObjectKind};

/// Path to the loose object for `id_hex` under `root` (a repository's
/// top-level directory, i.e. the parent of `.git`).
pub fn object_path(root: &Path, id_hex: &str) -> PathBuf {
    root.join(".git")
        .join("objects")
        .join(&id_hex[..2])
        .join(&id_hex[2..])
}

/// Write `object` as a loose object under `root`, returning its id. Creates
/// the fan-out directory if missing. Idempotent: an existing file at the
/// target path is left untouched, since two objects with equal identity are
/// interchangeable by construction.
pub fn write_object(root: &Path, object: &Object) -> Result<[u8; 20], GitError> {
    let id = object.id();
    let id_hex = codec::hex_encode(&id);
    let path = object_path(root, &id_hex);

    if path.exists() {
        return Ok(id);
    }

    let dir = path.parent().expect("object path always has a parent");
    fs::create_dir_all(dir).map_err(|e| GitError::io(dir, e))?;

    let compressed = codec::deflate(&object.frame());
    fs::write(&path, compressed).map_err(|e| GitError::io(&path, e))?;

    Ok(id)
}

/// Read and inflate the loose object identified by `id_hex` under `root`.
pub fn read_object(root: &Path, id_hex: &str) -> Result<Object, GitError> {
    let path = object_path(root, id_hex);
    let compressed = fs::read(&path).map_err(|e| GitError::io(&path, e))?;
    let (framed, _tail) = codec::inflate(&compressed, 0)?;
    let (kind, body) = unframe(&framed)?;
    Ok(Object::new(kind, body.to_vec()))
}

/// Read just the framed header (kind, declared length) without decoding the
/// body, for `cat-file -t`/`-s`. Cheaper than [`read_object`] when the body
/// itself is not needed, though for this crate's modest object sizes the
/// difference is mostly documentation of intent.
pub fn read_object_header(root: &Path, id_hex: &str) -> Result<(ObjectKind, usize), GitError> {
    let object = read_object(root, id_hex)?;
    Ok((object.kind, object.body.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::ObjectKind;

    #[test]
    fn write_then_read_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let object = Object::new(ObjectKind::Blob, b"hello\n".to_vec());
        let id = write_object(dir.path(), &object).unwrap();

        let id_hex = codec::hex_encode(&id);
        assert_eq!(id_hex, "ce013625030ba8dba906f756967f9e9ca394464a");

        let read_back = read_object(dir.path(), &id_hex).unwrap();
        assert_eq!(read_back, object);
    }

    #[test]
    fn write_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let object = Object::new(ObjectKind::Blob, b"same bytes\n".to_vec());
        let id1 = write_object(dir.path(), &object).unwrap();
        let id2 = write_object(dir.path(), &object).unwrap();
        assert_eq!(id1, id2);
    }
}
