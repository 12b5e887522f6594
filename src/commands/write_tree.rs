use std::fs;
use std::path::Path;

use anyhow::Context;

use crate::codec;
use crate::object::{encode_tree, Object, ObjectKind, TreeEntry};
use crate::store;

use super::hash_object;

/// git write-tree command
pub fn invoke() -> anyhow::Result<()> {
    let Some(hash) = write_tree_for(Path::new(".")).context("construct root tree object")? else {
        anyhow::bail!("asked to make tree object for empty tree");
    };

    println!("{}", codec::hex_encode(&hash));

    Ok(())
}

fn write_tree_for(path: &Path) -> anyhow::Result<Option<[u8; 20]>> {
    let mut entries = Vec::new();
    let dir = fs::read_dir(path).context("opening a directory")?;

    for entry in dir {
        let entry = entry.with_context(|| format!("bad directory entry in {}", path.display()))?;

        let file_name = entry.file_name();
        let metadata = entry.metadata().context("metadata for directory entry")?;

        if file_name == ".git" || file_name == "target" {
            continue;
        }

        entries.push((entry, file_name, metadata));
    }

    entries.sort_unstable_by(|a, b| {
        let mut aname = a.1.as_encoded_bytes().to_vec();
        let mut bname = b.1.as_encoded_bytes().to_vec();
        if a.2.is_dir() {
            aname.push(b'/');
        }
        if b.2.is_dir() {
            bname.push(b'/');
        }
        aname.cmp(&bname)
    });

    let mut tree_entries = Vec::new();
    for (entry, file_name, metadata) in entries {
        let mode = if metadata.is_dir() {
            "40000"
        } else if metadata.is_symlink() {
            "120000"
        } else if is_executable(&metadata) {
            "100755"
        } else {
            "100644"
        };

        let id = if metadata.is_dir() {
            match write_tree_for(&entry.path())? {
                Some(id) => id,
                None => continue,
            }
        } else {
            hash_object::invoke(&entry.path(), false, ObjectKind::Blob)?
        };

        tree_entries.push(TreeEntry {
            mode: mode.to_string(),
            name: file_name.as_encoded_bytes().to_vec(),
            id,
        });
    }

    if tree_entries.is_empty() {
        return Ok(None);
    }

    let object = Object::new(ObjectKind::Tree, encode_tree(&tree_entries));
    let id = store::write_object(Path::new("."), &object)?;

    Ok(Some(id))
}

#[cfg(unix)]
fn is_executable(metadata: &fs::Metadata) -> bool {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o111 != 0
}

#[cfg(not(unix))]
fn is_executable(_metadata: &fs::Metadata) -> bool {
    false
}
