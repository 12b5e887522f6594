//! Pkt-line framing and smart-HTTP ref discovery.
//!
//! A pkt-line is a 4-hex-digit length prefix (counting itself) followed by
//! the payload; `0000` is the flush sentinel. Frames are packed back to back
//! with no separator, so a flush immediately followed by another frame's
//! length prefix must be decoded by byte count, not by splitting on `\n` —
//! a ref advertisement's flush-then-next-ref boundary has no newline
//! between them at all.

use log::debug;

use crate::error::{GitError, ProtocolError};

/// Encode `payload` as a pkt-line: a 4-hex length prefix over
/// `payload.len() + 4`, with no trailing newline added (callers that want
/// one include it in `payload`, matching how `want`/`done` lines are built).
pub fn encode(payload: &str) -> String {
    let len = payload.len() + 4;
    format!("{len:04x}{payload}")
}

/// The flush packet.
pub const FLUSH: &str = "0000";

/// One decoded pkt-line: `Flush` for `0000`, `Data` for everything else.
enum Frame<'a> {
    Flush,
    Data(&'a str),
}

/// Split `text` into its pkt-line frames by length prefix, the way a real
/// client must (never by scanning for `\n`, since a flush packet carries no
/// newline and packs directly against the next frame's length prefix).
fn frames(text: &str) -> Result<Vec<Frame<'_>>, ProtocolError> {
    let mut frames = Vec::new();
    let mut rest = text;

    while !rest.is_empty() {
        let len_field = rest
            .get(0..4)
            .ok_or_else(|| ProtocolError::MalformedPktLine("truncated length prefix".into()))?;
        let len = usize::from_str_radix(len_field, 16)
            .map_err(|_| ProtocolError::MalformedPktLine(format!("bad length prefix '{len_field}'")))?;

        if len == 0 {
            frames.push(Frame::Flush);
            rest = &rest[4..];
            continue;
        }

        let payload = rest
            .get(4..len)
            .ok_or_else(|| ProtocolError::MalformedPktLine("pkt-line shorter than declared".into()))?;
        frames.push(Frame::Data(payload));
        rest = &rest[len..];
    }

    Ok(frames)
}

/// Result of parsing a `GET info/refs?service=git-upload-pack` response.
pub struct RefAdvertisement {
    /// The commit SHA the symbolic HEAD target currently points at.
    pub tip: String,
    /// `refs/heads/<branch>` extracted from `symref=HEAD:...`.
    pub symref: String,
}

/// Parse the pkt-line stream described in §4.4: a service banner line, a
/// first-ref line carrying `symref=HEAD:refs/heads/<name>` behind a NUL in
/// its capabilities, zero or more further ref lines, and a terminating flush.
pub fn parse_ref_advertisement(data: &[u8]) -> Result<RefAdvertisement, GitError> {
    let text = std::str::from_utf8(data).map_err(|_| {
        ProtocolError::MalformedPktLine("ref advertisement is not valid UTF-8".into())
    })?;

    let frames = frames(text)?;
    let mut data_frames = frames.iter().filter_map(|f| match f {
        Frame::Data(s) => Some(*s),
        Frame::Flush => None,
    });

    let banner = data_frames
        .next()
        .ok_or_else(|| ProtocolError::MalformedPktLine("empty ref advertisement".into()))?;
    if !banner.trim_end().starts_with('#') {
        return Err(ProtocolError::UnexpectedPreamble(
            "first pkt-line is not a service banner".into(),
        )
        .into());
    }

    if !matches!(frames.last(), Some(Frame::Flush)) {
        return Err(ProtocolError::MalformedPktLine(
            "ref advertisement did not terminate with a flush packet".into(),
        )
        .into());
    }

    let first_ref_line = data_frames
        .next()
        .ok_or_else(|| ProtocolError::MalformedPktLine("missing first ref line".into()))?;

    let symref = first_ref_line
        .split(' ')
        .find_map(|field| field.strip_prefix("symref=HEAD:"))
        .ok_or(ProtocolError::MissingSymref)?
        .trim_end_matches(['\0', '\n'])
        .to_string();

    debug!("ref advertisement symref={symref}");

    // The first ref line always advertises "<sha> HEAD\0<capabilities>" —
    // that sha is exactly the tip of whatever HEAD's symref points at, with
    // no need to go hunting for a separately-advertised refs/heads/<name>
    // line (some servers omit it entirely when HEAD is the only ref wanted).
    let tip = first_ref_line
        .get(0..40)
        .ok_or_else(|| ProtocolError::MissingTip {
            symref: symref.clone(),
        })?
        .to_string();

    Ok(RefAdvertisement { tip, symref })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_matches_canonical_length() {
        // "done\n" is 5 bytes; total pkt-line is 4 (len) + 5 = 9 = 0x0009.
        assert_eq!(encode("done\n"), "0009done\n");
    }

    fn sample_advertisement() -> Vec<u8> {
        let banner = "001e# service=git-upload-pack\n";
        let first = "01556c073b08f7987018cbb2cb9a5747c84913b3608e HEAD\0multi_ack ofs-delta symref=HEAD:refs/heads/main\n";
        let branch = "003f6c073b08f7987018cbb2cb9a5747c84913b3608e refs/heads/main\n";
        format!("{banner}0000{first}{branch}0000").into_bytes()
    }

    #[test]
    fn parses_tip_and_symref() {
        let data = sample_advertisement();
        let ad = parse_ref_advertisement(&data).unwrap();
        assert_eq!(ad.symref, "refs/heads/main");
        assert_eq!(ad.tip, "6c073b08f7987018cbb2cb9a5747c84913b3608e");
    }

    #[test]
    fn rejects_bad_preamble() {
        let data = b"not a pkt-line stream at all".to_vec();
        assert!(parse_ref_advertisement(&data).is_err());
    }

    #[test]
    fn rejects_missing_flush_terminator() {
        let banner = "001e# service=git-upload-pack\n";
        let first = "01556c073b08f7987018cbb2cb9a5747c84913b3608e HEAD\0symref=HEAD:refs/heads/main\n";
        let data = format!("{banner}0000{first}").into_bytes();
        assert!(parse_ref_advertisement(&data).is_err());
    }
}
