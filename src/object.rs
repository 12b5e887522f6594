//! Object kinds, canonical framing, and tree-entry (de)serialization.

use std::fmt;

use crate::error::DecodeError;

/// The kind of a git object. `Tag` is represented so packfile entries can be
/// classified and rejected with a clear error; this crate never produces or
/// reads tag bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Commit,
    Tree,
    Blob,
    Tag,
}

impl ObjectKind {
    /// The lowercase name used in the framed `"<name> <len>\0"` header.
    pub fn name(self) -> &'static str {
        match self {
            ObjectKind::Commit => "commit",
            ObjectKind::Tree => "tree",
            ObjectKind::Blob => "blob",
            ObjectKind::Tag => "tag",
        }
    }

    /// Parse the kind name from a framed object header.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "commit" => Some(ObjectKind::Commit),
            "tree" => Some(ObjectKind::Tree),
            "blob" => Some(ObjectKind::Blob),
            "tag" => Some(ObjectKind::Tag),
            _ => None,
        }
    }

    /// The packfile object-type numbering (gitformat-pack's "Object types").
    pub fn from_pack_type(value: u8) -> Option<Self> {
        match value {
            1 => Some(ObjectKind::Commit),
            2 => Some(ObjectKind::Tree),
            3 => Some(ObjectKind::Blob),
            4 => Some(ObjectKind::Tag),
            _ => None,
        }
    }

    pub fn pack_type(self) -> u8 {
        match self {
            ObjectKind::Commit => 1,
            ObjectKind::Tree => 2,
            ObjectKind::Blob => 3,
            ObjectKind::Tag => 4,
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An immutable `(kind, body)` pair. Its identity is the SHA-1 of its framed
/// form, computed on demand rather than cached, since every object in this
/// crate is short-lived (resolved in memory for one clone, or streamed
/// straight to/from disk for the other commands).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Object {
    pub kind: ObjectKind,
    pub body: Vec<u8>,
}

impl Object {
    pub fn new(kind: ObjectKind, body: Vec<u8>) -> Self {
        Self { kind, body }
    }

    /// The canonical framed form: `"<kind> <len>\0<body>"`.
    pub fn frame(&self) -> Vec<u8> {
        frame(self.kind, &self.body)
    }

    /// `sha1(frame())`, the object's content-addressed identity.
    pub fn id(&self) -> [u8; 20] {
        crate::codec::sha1(&self.frame())
    }
}

/// Build the canonical framed form without allocating an [`Object`].
pub fn frame(kind: ObjectKind, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(kind.name().len() + 1 + 20 + 1 + body.len());
    out.extend_from_slice(kind.name().as_bytes());
    out.push(b' ');
    out.extend_from_slice(body.len().to_string().as_bytes());
    out.push(0);
    out.extend_from_slice(body);
    out
}

/// Split a framed object back into `(kind, body)`. `frame` must be the exact
/// bytes written by [`frame`] (i.e. the inflated loose-object contents).
pub fn unframe(frame: &[u8]) -> Result<(ObjectKind, &[u8]), DecodeError> {
    let space = frame
        .iter()
        .position(|&b| b == b' ')
        .ok_or_else(|| DecodeError::MalformedTree("object header missing space".into()))?;
    let nul = frame
        .iter()
        .position(|&b| b == 0)
        .ok_or_else(|| DecodeError::MalformedTree("object header missing NUL".into()))?;
    if nul < space {
        return Err(DecodeError::MalformedTree("object header malformed".into()));
    }

    let name = std::str::from_utf8(&frame[..space])
        .map_err(|_| DecodeError::MalformedTree("object kind is not UTF-8".into()))?;
    let kind = ObjectKind::from_name(name)
        .ok_or_else(|| DecodeError::MalformedTree(format!("unknown object kind '{name}'")))?;

    let len_str = std::str::from_utf8(&frame[space + 1..nul])
        .map_err(|_| DecodeError::MalformedTree("object length is not UTF-8".into()))?;
    let len: usize = len_str
        .parse()
        .map_err(|_| DecodeError::MalformedTree(format!("invalid object length '{len_str}'")))?;

    let body = &frame[nul + 1..];
    if body.len() != len {
        return Err(DecodeError::MalformedTree(format!(
            "object length mismatch: header says {len}, body is {}",
            body.len()
        )));
    }

    Ok((kind, body))
}

/// One entry of a tree object: a file-mode-like string, a raw name, and the
/// 20-byte id of the entry's blob or sub-tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeEntry {
    pub mode: String,
    pub name: Vec<u8>,
    pub id: [u8; 20],
}

impl TreeEntry {
    /// Directories are the only mode this crate treats specially, and
    /// canonical packfiles never zero-pad `40000`, so a prefix check is both
    /// correct and robust to either padding convention on read.
    pub fn is_dir(&self) -> bool {
        self.mode.starts_with('4')
    }
}

/// Parse a tree object's body into its ordered entries. Decoding preserves
/// whatever order the remote (or disk) provided; this crate does not
/// re-sort on read, only on write (see `commands::write_tree`).
pub fn decode_tree(body: &[u8]) -> Result<Vec<TreeEntry>, DecodeError> {
    let mut entries = Vec::new();
    let mut cursor = 0;

    while cursor < body.len() {
        let space = body[cursor..]
            .iter()
            .position(|&b| b == b' ')
            .ok_or_else(|| DecodeError::MalformedTree("tree entry missing mode separator".into()))?
            + cursor;
        let mode = std::str::from_utf8(&body[cursor..space])
            .map_err(|_| DecodeError::MalformedTree("tree entry mode is not UTF-8".into()))?
            .to_string();

        let nul = body[space + 1..]
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| DecodeError::MalformedTree("tree entry missing NUL".into()))?
            + space
            + 1;
        let name = body[space + 1..nul].to_vec();

        let id_start = nul + 1;
        let id_end = id_start + 20;
        let id_bytes = body
            .get(id_start..id_end)
            .ok_or_else(|| DecodeError::MalformedTree("tree entry truncated id".into()))?;
        let mut id = [0u8; 20];
        id.copy_from_slice(id_bytes);

        entries.push(TreeEntry { mode, name, id });
        cursor = id_end;
    }

    Ok(entries)
}

/// Serialize tree entries back into a tree object body, in the order given.
/// Callers (`write-tree`) are responsible for sorting before calling this.
pub fn encode_tree(entries: &[TreeEntry]) -> Vec<u8> {
    let mut out = Vec::new();
    for entry in entries {
        out.extend_from_slice(entry.mode.as_bytes());
        out.push(b' ');
        out.extend_from_slice(&entry.name);
        out.push(0);
        out.extend_from_slice(&entry.id);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_then_unframe_roundtrips() {
        for (kind, body) in [
            (ObjectKind::Blob, b"hello\n".to_vec()),
            (ObjectKind::Tree, Vec::new()),
            (ObjectKind::Commit, b"tree abc\n\nmsg\n".to_vec()),
        ] {
            let framed = frame(kind, &body);
            let (decoded_kind, decoded_body) = unframe(&framed).unwrap();
            assert_eq!(decoded_kind, kind);
            assert_eq!(decoded_body, body.as_slice());
        }
    }

    #[test]
    fn known_blob_hash() {
        let obj = Object::new(ObjectKind::Blob, b"hello\n".to_vec());
        assert_eq!(
            crate::codec::hex_encode(&obj.id()),
            "ce013625030ba8dba906f756967f9e9ca394464a"
        );
    }

    #[test]
    fn tree_roundtrip_preserves_order() {
        let entries = vec![
            TreeEntry {
                mode: "100644".into(),
                name: b"README".to_vec(),
                id: [1u8; 20],
            },
            TreeEntry {
                mode: "40000".into(),
                name: b"src".to_vec(),
                id: [2u8; 20],
            },
        ];
        let body = encode_tree(&entries);
        let decoded = decode_tree(&body).unwrap();
        assert_eq!(decoded, entries);
        assert!(!decoded[0].is_dir());
        assert!(decoded[1].is_dir());
    }

    #[test]
    fn unframe_rejects_length_mismatch() {
        let err = unframe(b"blob 10\0short").unwrap_err();
        assert!(matches!(err, DecodeError::MalformedTree(_)));
    }
}
