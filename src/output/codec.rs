//! Output codec selection
//!
//! The output codec is fixed once per run: an explicit override wins, then
//! the codec detected on the input, then no compression.

use crate::source::SourceFile;
use crate::types::Codec;
use serde::Serialize;
use std::path::Path;

/// Resolved output codec and what detection found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CodecChoice {
    /// Codec every output writer uses
    pub codec: Codec,
    /// Codec found on the input, if any
    pub detected: Option<Codec>,
}

/// Best-effort detection of the codec of an input file.
///
/// Looks at the first column chunk of the first row group. Unreadable files,
/// files without row groups or columns, and uncompressed files yield `None`.
pub fn detect_codec(path: &Path) -> Option<Codec> {
    let source = match SourceFile::open(path) {
        Ok(source) => source,
        Err(e) => {
            tracing::debug!("codec detection skipped for {}: {e}", path.display());
            return None;
        }
    };
    source
        .first_column_compression()
        .and_then(Codec::from_parquet)
        .filter(|codec| *codec != Codec::Uncompressed)
}

/// Override > detected > uncompressed
pub fn resolve_codec(override_codec: Option<Codec>, detected: Option<Codec>) -> Codec {
    override_codec.or(detected).unwrap_or_default()
}

/// Detect on `path` and resolve against `override_codec`
pub fn select_codec(path: &Path, override_codec: Option<Codec>) -> CodecChoice {
    let detected = detect_codec(path);
    CodecChoice {
        codec: resolve_codec(override_codec, detected),
        detected,
    }
}
