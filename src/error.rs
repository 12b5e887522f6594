//! Crate-wide error type, composed from per-subsystem errors.
//!
//! Library code returns `Result<_, GitError>` (or a subsystem error that
//! converts into it via `#[from]`) and never panics on malformed input or
//! calls `std::process::exit`. Only the CLI shell in `main.rs` turns a
//! `GitError` into a `fatal:` message and a process exit code.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while decoding or applying a packfile/delta stream.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("zlib stream at pack offset {offset} is corrupt: {source}")]
    Zlib {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("truncated pack entry at offset {offset}")]
    Truncated { offset: u64 },

    #[error("malformed tree entry: {0}")]
    MalformedTree(String),

    #[error("delta base size mismatch: delta expects {expected}, base is {actual}")]
    DeltaBaseSizeMismatch { expected: usize, actual: usize },

    #[error("delta target size mismatch: delta declares {expected}, reconstructed {actual}")]
    DeltaTargetSizeMismatch { expected: usize, actual: usize },

    #[error("delta copy instruction out of range: base len {base_len}, wanted [{offset}..{offset}+{size})")]
    DeltaCopyOutOfRange {
        base_len: usize,
        offset: usize,
        size: usize,
    },

    #[error("delta chain deeper than {max_depth} levels at offset {offset}")]
    DeltaChainTooDeep { offset: u64, max_depth: usize },
}

/// Errors raised by the smart-HTTP ref-discovery / upload-pack exchange.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed pkt-line: {0}")]
    MalformedPktLine(String),

    #[error("unexpected response preamble: {0}")]
    UnexpectedPreamble(String),

    #[error("ref advertisement did not include a symref for HEAD")]
    MissingSymref,

    #[error("ref advertisement did not include the tip of {symref}")]
    MissingTip { symref: String },
}

/// Errors that stop the process before any protocol logic runs.
#[derive(Debug, Error)]
pub enum UnsupportedError {
    #[error("unsupported packfile version {0} (only version 2 is supported)")]
    PackVersion(u32),

    #[error("tag objects are not supported")]
    TagObject,

    #[error("ref-delta entries are not supported (clone only speaks ofs-delta)")]
    RefDelta,

    #[error("only https:// remotes are supported, got: {0}")]
    NonHttpsRemote(String),
}

/// Errors raised by the `.mygitconfig` / `.git/config` INI reader and writer.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed config line: {0}")]
    MalformedLine(String),

    #[error("could not locate home directory to find .mygitconfig")]
    NoHomeDir,

    #[error("missing {0} in .mygitconfig")]
    MissingKey(String),

    #[error("key must be in 'section.name' form: {0}")]
    MalformedKey(String),
}

/// The crate-wide error type. Every library function that can fail returns
/// `Result<_, GitError>`.
#[derive(Debug, Error)]
pub enum GitError {
    #[error("protocol violation: {0}")]
    ProtocolViolation(#[from] ProtocolError),

    #[error("unsupported: {0}")]
    UnsupportedFeature(#[from] UnsupportedError),

    #[error("integrity check failed: {0}")]
    IntegrityFailure(String),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    IoOpaque(#[from] io::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("misuse: {0}")]
    Misuse(String),

    #[error("object not found: {0}")]
    ObjectNotFound(String),
}

impl GitError {
    /// Attach a path to a plain I/O error for a more useful message.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GitError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, GitError>;
