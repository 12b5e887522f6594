//! Packfile v2 decoding: header/trailer framing, per-entry extraction, and
//! delta-chain resolution into a flat map of resolved objects.

use std::collections::HashMap;

use bytes::Buf;
use log::debug;

use crate::codec;
use crate::delta;
use crate::error::{DecodeError, GitError, UnsupportedError};
use crate::object::{Object, ObjectKind};
use crate::varint;

const MAX_DELTA_DEPTH: usize = 50;

/// Object-type numbering used in the pack header varint; 6 and 7 are the two
/// delta encodings, 5 is reserved and never produced.
const TYPE_OFS_DELTA: u8 = 6;
const TYPE_REF_DELTA: u8 = 7;

/// One raw entry as extracted from the pack, before delta resolution.
enum RawEntry {
    Base { kind: ObjectKind, body: Vec<u8> },
    OfsDelta { base_offset: u64, delta: Vec<u8> },
}

/// Parse the 12-byte pack header (`"PACK"`, version, object count) and
/// verify the trailing 20-byte SHA-1 over everything preceding it.
fn parse_header(data: &[u8]) -> Result<u32, GitError> {
    if data.len() < 12 || &data[0..4] != b"PACK" {
        return Err(DecodeError::MalformedTree("missing PACK magic".into()).into());
    }
    let mut header = &data[4..12];
    let version = header.get_u32();
    if version != 2 {
        return Err(UnsupportedError::PackVersion(version).into());
    }
    let nobjects = header.get_u32();
    Ok(nobjects)
}

fn verify_trailer(data: &[u8]) -> Result<(), GitError> {
    if data.len() < 20 {
        return Err(DecodeError::Truncated {
            offset: data.len() as u64,
        }
        .into());
    }
    let (body, trailer) = data.split_at(data.len() - 20);
    let computed = codec::sha1(body);
    if computed != trailer {
        return Err(GitError::IntegrityFailure(format!(
            "pack trailer mismatch: computed {}, pack claims {}",
            codec::hex_encode(&computed),
            codec::hex_encode(trailer)
        )));
    }
    Ok(())
}

/// Fully decoded pack contents: every object, keyed by its content id, plus
/// the pack-relative offset each undeltified/resolved object started at (not
/// currently needed by callers beyond debugging, but mirrors how the
/// resolver tracks state internally).
pub struct DecodedPack {
    pub objects: HashMap<[u8; 20], Object>,
}

/// Decode an entire packfile: header, every entry (resolving deltas as they
/// appear), and the trailing checksum.
pub fn decode(data: &[u8]) -> Result<DecodedPack, GitError> {
    let nobjects = parse_header(data)?;
    verify_trailer(data)?;

    let body_end = data.len() - 20;
    let mut cursor: u64 = 12;

    // Raw entries keyed by the pack offset their header started at, so
    // OfsDelta's backward reference can look them up directly.
    let mut raw_by_offset: HashMap<u64, RawEntry> = HashMap::new();
    let mut order: Vec<u64> = Vec::with_capacity(nobjects as usize);

    for _ in 0..nobjects {
        let entry_offset = cursor;
        let (kind_bits, declared_size, header_len) =
            varint::read_header_varint(&data[cursor as usize..body_end], entry_offset)?;
        cursor += header_len as u64;

        let raw = match kind_bits {
            TYPE_REF_DELTA => return Err(UnsupportedError::RefDelta.into()),
            TYPE_OFS_DELTA => {
                let (distance_back, offset_len) =
                    varint::read_offset_varint(&data[cursor as usize..body_end], cursor)?;
                cursor += offset_len as u64;
                let base_offset = entry_offset.checked_sub(distance_back).ok_or_else(|| {
                    GitError::Decode(DecodeError::MalformedTree(format!(
                        "ofs-delta at {entry_offset} points before pack start"
                    )))
                })?;

                let (inflated, tail) = codec::inflate(&data[cursor as usize..body_end], cursor)?;
                if inflated.len() != declared_size {
                    return Err(DecodeError::DeltaTargetSizeMismatch {
                        expected: declared_size,
                        actual: inflated.len(),
                    }
                    .into());
                }
                cursor = body_end as u64 - tail as u64;

                RawEntry::OfsDelta {
                    base_offset,
                    delta: inflated,
                }
            }
            kind_bits => {
                let kind = ObjectKind::from_pack_type(kind_bits).ok_or_else(|| {
                    GitError::Decode(DecodeError::MalformedTree(format!(
                        "unknown pack object type {kind_bits}"
                    )))
                })?;
                if kind == ObjectKind::Tag {
                    return Err(UnsupportedError::TagObject.into());
                }

                let (inflated, tail) = codec::inflate(&data[cursor as usize..body_end], cursor)?;
                if inflated.len() != declared_size {
                    return Err(DecodeError::DeltaTargetSizeMismatch {
                        expected: declared_size,
                        actual: inflated.len(),
                    }
                    .into());
                }
                cursor = body_end as u64 - tail as u64;

                RawEntry::Base {
                    kind,
                    body: inflated,
                }
            }
        };

        raw_by_offset.insert(entry_offset, raw);
        order.push(entry_offset);
    }

    if cursor != body_end as u64 {
        return Err(GitError::Decode(DecodeError::MalformedTree(format!(
            "pack entries ended at offset {cursor}, expected to reach {body_end}"
        ))));
    }

    debug!("pack header declared {nobjects} objects, parsed {}", order.len());

    let mut resolved: HashMap<u64, Object> = HashMap::new();
    for &offset in &order {
        resolve(offset, &raw_by_offset, &mut resolved, 0)?;
    }

    let objects: HashMap<[u8; 20], Object> = resolved
        .into_values()
        .map(|object| (object.id(), object))
        .collect();

    if objects.len() != nobjects as usize {
        return Err(GitError::IntegrityFailure(format!(
            "pack declared {nobjects} objects, resolved {}",
            objects.len()
        )));
    }

    Ok(DecodedPack { objects })
}

/// Resolve the object at `offset`, recursing into its base chain as needed.
/// Memoized in `resolved` so a base shared by many deltas is only rebuilt
/// once; `depth` guards against pathological chains rather than genuine
/// stack depth, since this walks the base pointer rather than the call stack
/// growing per level (a chain of N deltas only recurses N frames deep here,
/// which is bounded by [`MAX_DELTA_DEPTH`] regardless).
fn resolve(
    offset: u64,
    raw_by_offset: &HashMap<u64, RawEntry>,
    resolved: &mut HashMap<u64, Object>,
    depth: usize,
) -> Result<Object, GitError> {
    if let Some(object) = resolved.get(&offset) {
        return Ok(object.clone());
    }
    if depth > MAX_DELTA_DEPTH {
        return Err(DecodeError::DeltaChainTooDeep {
            offset,
            max_depth: MAX_DELTA_DEPTH,
        }
        .into());
    }

    let raw = raw_by_offset.get(&offset).ok_or_else(|| {
        GitError::Decode(DecodeError::MalformedTree(format!(
            "ofs-delta base at {offset} does not exist in this pack"
        )))
    })?;

    let object = match raw {
        RawEntry::Base { kind, body } => Object::new(*kind, body.clone()),
        RawEntry::OfsDelta { base_offset, delta: delta_bytes } => {
            let base = resolve(*base_offset, raw_by_offset, resolved, depth + 1)?;
            let body = delta::apply(&base.body, delta_bytes, offset)?;
            Object::new(base.kind, body)
        }
    };

    resolved.insert(offset, object.clone());
    Ok(object)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pack_with_entries(entries: &[(u8, Vec<u8>)]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"PACK");
        out.extend_from_slice(&2u32.to_be_bytes());
        out.extend_from_slice(&(entries.len() as u32).to_be_bytes());

        for (kind_bits, body) in entries {
            out.extend(varint::write_header_varint(*kind_bits, body.len()));
            out.extend(codec::deflate(body));
        }

        let trailer = codec::sha1(&out);
        out.extend_from_slice(&trailer);
        out
    }

    #[test]
    fn rejects_object_count_mismatch_from_duplicate_ids() {
        // Two entries with identical content resolve to the same id, so the
        // final id-keyed map has one fewer object than the header declared.
        let pack = pack_with_entries(&[
            (ObjectKind::Blob.pack_type(), b"same\n".to_vec()),
            (ObjectKind::Blob.pack_type(), b"same\n".to_vec()),
        ]);
        let err = decode(&pack).unwrap_err();
        assert!(matches!(err, GitError::IntegrityFailure(_)));
    }

    #[test]
    fn decodes_single_blob() {
        let pack = pack_with_entries(&[(ObjectKind::Blob.pack_type(), b"hello\n".to_vec())]);
        let decoded = decode(&pack).unwrap();
        assert_eq!(decoded.objects.len(), 1);
        let object = decoded.objects.values().next().unwrap();
        assert_eq!(object.kind, ObjectKind::Blob);
        assert_eq!(object.body, b"hello\n");
    }

    #[test]
    fn rejects_bad_magic() {
        let err = decode(b"NOPE0000000000000000000000000000").unwrap_err();
        assert!(matches!(err, GitError::Decode(DecodeError::MalformedTree(_))));
    }

    #[test]
    fn rejects_corrupt_trailer() {
        let mut pack = pack_with_entries(&[(ObjectKind::Blob.pack_type(), b"x".to_vec())]);
        let last = pack.len() - 1;
        pack[last] ^= 0xff;
        let err = decode(&pack).unwrap_err();
        assert!(matches!(err, GitError::IntegrityFailure(_)));
    }

    #[test]
    fn resolves_ofs_delta_chain() {
        let base_body = b"the quick brown fox".to_vec();

        // Delta: base_size=20, target_size=9+6=15 -> "quick foxy!"
        let mut delta_bytes = Vec::new();
        delta_bytes.push(base_body.len() as u8); // size varint, single byte since <128
        delta_bytes.push(11u8); // target size 11 ("quick foxy!")
        delta_bytes.push(0b1001_0001);
        delta_bytes.push(4); // offset 4
        delta_bytes.push(5); // size 5 ("quick")
        let literal = b" foxy!";
        delta_bytes.push(literal.len() as u8);
        delta_bytes.extend_from_slice(literal);

        let mut out = Vec::new();
        out.extend_from_slice(b"PACK");
        out.extend_from_slice(&2u32.to_be_bytes());
        out.extend_from_slice(&2u32.to_be_bytes());

        let base_offset = out.len() as u64;
        out.extend(varint::write_header_varint(ObjectKind::Blob.pack_type(), base_body.len()));
        out.extend(codec::deflate(&base_body));

        let delta_offset = out.len() as u64;
        out.extend(varint::write_header_varint(TYPE_OFS_DELTA, delta_bytes.len()));
        out.extend(varint::write_offset_varint_for_test(delta_offset - base_offset));
        out.extend(codec::deflate(&delta_bytes));

        let trailer = codec::sha1(&out);
        out.extend_from_slice(&trailer);

        let decoded = decode(&out).unwrap();
        assert_eq!(decoded.objects.len(), 2);
        let target = decoded
            .objects
            .values()
            .find(|o| o.body == b"quick foxy!")
            .expect("delta-resolved object present");
        assert_eq!(target.kind, ObjectKind::Blob);
    }
}
