//! Orchestrates the clone pipeline: ref discovery, pack fetch, pack decode,
//! and working-tree materialization, in that order.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config::ConfigFile;
use crate::error::{DecodeError, GitError};
use crate::object::{decode_tree, ObjectKind};
use crate::pack::DecodedPack;
use crate::{codec, config, store, uploadpack};

/// Clone `repo_url` into `dest` (created if missing), materializing the
/// default branch's working tree on success.
pub fn clone(repo_url: &str, dest: &Path) -> Result<(), GitError> {
    fs::create_dir_all(dest).map_err(|e| GitError::io(dest, e))?;

    let client = reqwest::blocking::Client::new();
    let discovery = uploadpack::discover_refs(&client, repo_url)?;
    let pack_bytes = uploadpack::fetch_pack(&client, &discovery)?;

    info!(
        "fetched {} bytes for {}",
        pack_bytes.len(),
        discovery.advertisement.tip
    );
    let pack = crate::pack::decode(&pack_bytes)?;

    init_git_dir(dest, &discovery.advertisement.symref, &discovery.advertisement.tip, repo_url)?;
    persist_objects(dest, &pack)?;
    materialize_tree(dest, &pack, &discovery.advertisement.tip)?;

    Ok(())
}

/// Create `.git`'s skeleton and write `HEAD`, the branch ref, and
/// `.git/config`'s `[core]`/`[remote "origin"]` sections.
fn init_git_dir(root: &Path, symref: &str, tip: &str, repo_url: &str) -> Result<(), GitError> {
    let git_dir = root.join(".git");
    fs::create_dir_all(git_dir.join("objects")).map_err(|e| GitError::io(&git_dir, e))?;
    fs::create_dir_all(git_dir.join("refs").join("heads")).map_err(|e| GitError::io(&git_dir, e))?;

    fs::write(git_dir.join("HEAD"), format!("ref: {symref}\n"))
        .map_err(|e| GitError::io(&git_dir, e))?;

    let ref_path = git_dir.join(symref);
    fs::create_dir_all(ref_path.parent().expect("ref path has a parent"))
        .map_err(|e| GitError::io(&ref_path, e))?;
    fs::write(&ref_path, format!("{tip}\n")).map_err(|e| GitError::io(&ref_path, e))?;

    let mut config = ConfigFile::new();
    config.set("core.repositoryformatversion", "0")?;
    config.set("core.bare", "false")?;
    config.set("remote.origin.url", repo_url)?;
    config.set("remote.origin.fetch", "+refs/heads/*:refs/remotes/origin/*")?;
    let branch = symref.strip_prefix("refs/heads/").unwrap_or(symref);
    config.set(&format!("branch.{branch}.remote"), "origin")?;
    config.set(&format!("branch.{branch}.merge"), symref)?;
    config::save_repo(root, &config)?;

    Ok(())
}

fn persist_objects(root: &Path, pack: &DecodedPack) -> Result<(), GitError> {
    for object in pack.objects.values() {
        store::write_object(root, object)?;
    }
    Ok(())
}

/// Walk the tip commit's root tree and write every blob/directory into the
/// working directory. Entry modes this crate doesn't model on disk (symlinks,
/// gitlinks) are skipped with a warning rather than failing the whole clone.
fn materialize_tree(root: &Path, pack: &DecodedPack, tip_hex: &str) -> Result<(), GitError> {
    let tip_id = codec::hex_decode(tip_hex)
        .map_err(|_| GitError::Decode(DecodeError::MalformedTree("invalid tip sha".into())))?;
    let commit = pack
        .objects
        .get(&tip_id)
        .ok_or_else(|| GitError::ObjectNotFound(tip_hex.to_string()))?;

    let tree_hex = commit
        .body
        .split(|&b| b == b'\n')
        .next()
        .and_then(|line| std::str::from_utf8(line).ok())
        .and_then(|line| line.strip_prefix("tree "))
        .ok_or_else(|| {
            GitError::Decode(DecodeError::MalformedTree(
                "commit object missing tree header".into(),
            ))
        })?;
    let tree_id = codec::hex_decode(tree_hex)
        .map_err(|_| GitError::Decode(DecodeError::MalformedTree("invalid tree sha".into())))?;

    write_tree_contents(root, root, pack, &tree_id)
}

fn write_tree_contents(
    root: &Path,
    dir: &Path,
    pack: &DecodedPack,
    tree_id: &[u8; 20],
) -> Result<(), GitError> {
    let tree = pack
        .objects
        .get(tree_id)
        .ok_or_else(|| GitError::ObjectNotFound(codec::hex_encode(tree_id)))?;
    let entries = decode_tree(&tree.body)?;

    for entry in entries {
        let path = dir.join(String::from_utf8_lossy(&entry.name).as_ref());

        if entry.is_dir() {
            fs::create_dir_all(&path).map_err(|e| GitError::io(&path, e))?;
            write_tree_contents(root, &path, pack, &entry.id)?;
            continue;
        }

        if entry.mode != "100644" && entry.mode != "100755" {
            warn!(
                "skipping unsupported tree entry mode {} at {}",
                entry.mode,
                path.display()
            );
            continue;
        }

        let blob = pack
            .objects
            .get(&entry.id)
            .ok_or_else(|| GitError::ObjectNotFound(codec::hex_encode(&entry.id)))?;
        if blob.kind != ObjectKind::Blob {
            return Err(GitError::Decode(DecodeError::MalformedTree(format!(
                "tree entry {} does not point at a blob",
                path.display()
            ))));
        }

        fs::write(&path, &blob.body).map_err(|e| GitError::io(&path, e))?;
        set_executable(&path, entry.mode == "100755")?;
    }

    Ok(())
}

#[cfg(unix)]
fn set_executable(path: &Path, executable: bool) -> Result<(), GitError> {
    use std::os::unix::fs::PermissionsExt;
    if !executable {
        return Ok(());
    }
    let mut perms = fs::metadata(path).map_err(|e| GitError::io(path, e))?.permissions();
    perms.set_mode(perms.mode() | 0o111);
    fs::set_permissions(path, perms).map_err(|e| GitError::io(path, e))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path, _executable: bool) -> Result<(), GitError> {
    Ok(())
}

/// Default destination directory name for `clone <url>` with no explicit
/// destination argument: the last URL path segment, minus a trailing `.git`.
pub fn default_dest_name(repo_url: &str) -> PathBuf {
    let name = repo_url
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or("repo");
    PathBuf::from(name.strip_suffix(".git").unwrap_or(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dest_name_strips_git_suffix() {
        assert_eq!(
            default_dest_name("https://example.com/org/myrepo.git"),
            PathBuf::from("myrepo")
        );
        assert_eq!(
            default_dest_name("https://example.com/org/myrepo"),
            PathBuf::from("myrepo")
        );
    }
}
