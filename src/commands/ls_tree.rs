use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::codec;
use crate::object::{decode_tree, ObjectKind};
use crate::store;

/// git ls-tree command
pub fn invoke(hash: &str, recurse: bool, name_only: bool, object_only: bool) -> anyhow::Result<()> {
    list_tree(hash, recurse, name_only, object_only, None)
}

fn list_tree(
    hash: &str,
    recurse: bool,
    name_only: bool,
    object_only: bool,
    path_prefix: Option<&str>,
) -> anyhow::Result<()> {
    let object = store::read_object(Path::new("."), hash).context("reading object")?;
    anyhow::ensure!(
        object.kind == ObjectKind::Tree,
        "incorrect object type '{}'",
        object.kind
    );

    let entries = decode_tree(&object.body).context("decoding tree entries")?;

    for entry in entries {
        let name = String::from_utf8_lossy(&entry.name).into_owned();
        let hash_hex = codec::hex_encode(&entry.id);

        if recurse && entry.is_dir() {
            list_tree(&hash_hex, recurse, name_only, object_only, Some(&name))?;
            continue;
        }

        let mut display_name = PathBuf::from(&name);
        if let Some(prefix) = path_prefix {
            display_name = PathBuf::from(prefix).join(&name);
        }

        if name_only {
            println!("{}", display_name.display());
        } else if object_only {
            println!("{hash_hex}");
        } else {
            let kind = if entry.is_dir() {
                ObjectKind::Tree
            } else {
                ObjectKind::Blob
            };
            println!(
                "{:0>6} {} {}\t{}",
                entry.mode,
                kind,
                hash_hex,
                display_name.display()
            );
        }
    }

    Ok(())
}
