//! Codec - Deck to Assembly Source, Deck to/from Persisted Blob
//!
//! Pure transformations. No file I/O happens here.
//!
//! The assembly artifact is a ca65 data segment: one `.byte` row per slide
//! line ending in `NEWLINE`, and one terminator row per slide (`NEXT_SLIDE`,
//! or `LAST_SLIDE` for the final slide).
//!
//! The persisted blob is the raw text of each slide followed by a zero byte.
//! A zero byte inside slide text cannot be represented.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::slides::{Deck, Slide};

pub const DEFAULT_LABEL: &str = "slides";
pub const LINE_MARKER: &str = "NEWLINE";
pub const NEXT_SLIDE_MARKER: &str = "NEXT_SLIDE";
pub const LAST_SLIDE_MARKER: &str = "LAST_SLIDE";

/// Delimiter of ca65 string literals. Never escaped.
pub const LITERAL_DELIMITER: char = '"';

/// Slide terminator in the persisted blob.
pub const SLIDE_TERMINATOR: u8 = 0;

/// Leading bytes of a versioned blob. 0xFF never starts UTF-8 text, so a
/// legacy blob cannot be mistaken for one.
pub const BLOB_MAGIC: [u8; 4] = [0xFF, b'N', b'S', b'D'];

const V1_HEADER_LEN: usize = BLOB_MAGIC.len() + 1 + 4;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("Blob header truncated: {0} bytes")]
    Truncated(usize),

    #[error("Unsupported blob version: {0}")]
    UnsupportedVersion(u8),

    #[error("Slide count mismatch: header says {expected}, found {found}")]
    SlideCount { expected: u32, found: usize },

    #[error("Unterminated slide at end of blob ({0} bytes)")]
    Unterminated(usize),

    #[error("Slide {slide} is not valid UTF-8")]
    Encoding { slide: usize },
}

/// Persisted blob layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatVersion {
    /// Bare zero-terminated slides, no header.
    #[default]
    Legacy,
    /// Magic, version byte, u32 LE slide count, then the legacy body.
    V1,
}

impl FormatVersion {
    /// The magic alone selects V1. A legacy deck is UTF-8 text, so it can
    /// never start with 0xFF; such a blob fails as V1 or as `Encoding`.
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(&BLOB_MAGIC) {
            FormatVersion::V1
        } else {
            FormatVersion::Legacy
        }
    }
}

/// Generate the assembly artifact under the default label.
pub fn encode(deck: &Deck) -> String {
    encode_labeled(deck, DEFAULT_LABEL)
}

/// Generate the assembly artifact under `label`.
pub fn encode_labeled(deck: &Deck, label: &str) -> String {
    let mut out = String::new();
    out.push_str(".segment \"RODATA\"\n\n");
    out.push_str(label);
    out.push_str(":\n");

    let last = deck.len().saturating_sub(1);
    for (index, slide) in deck.iter().enumerate() {
        for line in slide.lines() {
            encode_line(&mut out, line);
        }
        let marker = if index == last {
            LAST_SLIDE_MARKER
        } else {
            NEXT_SLIDE_MARKER
        };
        out.push_str("    .byte ");
        out.push_str(marker);
        out.push('\n');
    }

    out
}

fn encode_line(out: &mut String, line: &str) {
    out.push_str("    .byte ");
    if !line.is_empty() {
        out.push(LITERAL_DELIMITER);
        out.extend(line.chars().map(fold_case));
        out.push(LITERAL_DELIMITER);
        out.push_str(", ");
    }
    out.push_str(LINE_MARKER);
    out.push('\n');
}

/// The device font only has upper-case glyphs.
pub fn fold_case(c: char) -> char {
    c.to_ascii_uppercase()
}

/// Legacy persisted form: every slide's raw text plus a zero byte.
pub fn encode_binary(deck: &Deck) -> Vec<u8> {
    let capacity = deck.iter().map(|s| s.text().len() + 1).sum();
    let mut out = Vec::with_capacity(capacity);
    write_body(&mut out, deck);
    out
}

pub fn encode_binary_versioned(deck: &Deck, version: FormatVersion) -> Vec<u8> {
    match version {
        FormatVersion::Legacy => encode_binary(deck),
        FormatVersion::V1 => {
            let mut out = Vec::with_capacity(V1_HEADER_LEN);
            out.extend_from_slice(&BLOB_MAGIC);
            out.push(1);
            out.extend_from_slice(&(deck.len() as u32).to_le_bytes());
            write_body(&mut out, deck);
            out
        }
    }
}

fn write_body(out: &mut Vec<u8>, deck: &Deck) {
    for slide in deck {
        out.extend_from_slice(slide.text().as_bytes());
        out.push(SLIDE_TERMINATOR);
    }
}

/// Decode a persisted blob of either version.
///
/// In a legacy blob an unterminated tail is dropped. Slide bytes must be
/// UTF-8; anything else is rejected rather than rewritten. The result may be
/// empty; callers restore the one-slide invariant via `Deck::replace_all`.
pub fn decode_binary(bytes: &[u8]) -> Result<Vec<Slide>, CodecError> {
    match FormatVersion::detect(bytes) {
        FormatVersion::Legacy => decode_body(bytes).map(|(slides, _)| slides),
        FormatVersion::V1 => decode_v1(bytes),
    }
}

fn decode_v1(bytes: &[u8]) -> Result<Vec<Slide>, CodecError> {
    if bytes.len() < V1_HEADER_LEN {
        return Err(CodecError::Truncated(bytes.len()));
    }
    let version = bytes[BLOB_MAGIC.len()];
    if version != 1 {
        return Err(CodecError::UnsupportedVersion(version));
    }
    let mut count = [0u8; 4];
    count.copy_from_slice(&bytes[BLOB_MAGIC.len() + 1..V1_HEADER_LEN]);
    let expected = u32::from_le_bytes(count);

    let (slides, tail) = decode_body(&bytes[V1_HEADER_LEN..])?;
    if tail > 0 {
        return Err(CodecError::Unterminated(tail));
    }
    if slides.len() != expected as usize {
        return Err(CodecError::SlideCount {
            expected,
            found: slides.len(),
        });
    }
    Ok(slides)
}

/// Returns the decoded slides and the length of any discarded tail.
fn decode_body(bytes: &[u8]) -> Result<(Vec<Slide>, usize), CodecError> {
    let mut slides = Vec::new();
    let mut rest = bytes;
    while let Some(end) = rest.iter().position(|&b| b == SLIDE_TERMINATOR) {
        let text = String::from_utf8(rest[..end].to_vec()).map_err(|_| CodecError::Encoding {
            slide: slides.len(),
        })?;
        slides.push(Slide::from(text));
        rest = &rest[end + 1..];
    }
    if !rest.is_empty() {
        tracing::warn!(bytes = rest.len(), "discarding unterminated slide at end of blob");
    }
    Ok((slides, rest.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck_of(texts: &[&str]) -> Deck {
        Deck::from_slides(texts.iter().map(|t| Slide::from(*t)).collect())
    }

    #[test]
    fn test_encode_two_slides() {
        let artifact = encode(&deck_of(&["hi", "bye"]));
        assert_eq!(
            artifact,
            ".segment \"RODATA\"\n\nslides:\n\
             \x20   .byte \"HI\", NEWLINE\n\
             \x20   .byte NEXT_SLIDE\n\
             \x20   .byte \"BYE\", NEWLINE\n\
             \x20   .byte LAST_SLIDE\n"
        );
    }

    #[test]
    fn test_encode_trailing_feed_emits_empty_line() {
        let artifact = encode(&deck_of(&["a\n"]));
        assert!(artifact.ends_with(
            "    .byte \"A\", NEWLINE\n    .byte NEWLINE\n    .byte LAST_SLIDE\n"
        ));
    }

    #[test]
    fn test_encode_empty_deck_slide() {
        let artifact = encode(&Deck::new());
        assert!(artifact.ends_with("slides:\n    .byte NEWLINE\n    .byte LAST_SLIDE\n"));
    }

    #[test]
    fn test_encode_custom_label() {
        let artifact = encode_labeled(&Deck::new(), "deck_data");
        assert!(artifact.contains("\ndeck_data:\n"));
    }

    #[test]
    fn test_fold_case_leaves_non_alpha() {
        let folded: String = "abc 123 !?.xyz".chars().map(fold_case).collect();
        assert_eq!(folded, "ABC 123 !?.XYZ");
    }

    #[test]
    fn test_encode_binary_layout() {
        let bytes = encode_binary(&deck_of(&["HI", "", "BYE"]));
        assert_eq!(bytes, b"HI\0\0BYE\0");
    }

    #[test]
    fn test_encode_binary_keeps_case() {
        let bytes = encode_binary(&deck_of(&["Hello"]));
        assert_eq!(bytes, b"Hello\0");
    }

    #[test]
    fn test_decode_discards_unterminated_tail() {
        let slides = decode_binary(b"ONE\0TWO").unwrap();
        assert_eq!(slides, vec![Slide::from("ONE")]);
    }

    #[test]
    fn test_decode_empty_input() {
        assert!(decode_binary(b"").unwrap().is_empty());
    }

    #[test]
    fn test_decode_empty_slides() {
        let slides = decode_binary(b"\0\0").unwrap();
        assert_eq!(slides, vec![Slide::default(), Slide::default()]);
    }

    #[test]
    fn test_decode_rejects_non_utf8() {
        assert_eq!(
            decode_binary(b"ok\0caf\xE9\0"),
            Err(CodecError::Encoding { slide: 1 })
        );
    }

    #[test]
    fn test_magic_prefix_never_decodes_as_text() {
        let bytes = b"\xFFNSD hello\0";
        assert_eq!(FormatVersion::detect(bytes), FormatVersion::V1);
        assert!(decode_binary(bytes).is_err());
        assert!(String::from_utf8(bytes[..bytes.len() - 1].to_vec()).is_err());
    }

    #[test]
    fn test_v1_round_trip() {
        let deck = deck_of(&["a", "b\nc"]);
        let bytes = encode_binary_versioned(&deck, FormatVersion::V1);
        assert_eq!(FormatVersion::detect(&bytes), FormatVersion::V1);
        assert_eq!(decode_binary(&bytes).unwrap(), deck.into_slides());
    }

    #[test]
    fn test_v1_count_mismatch() {
        let mut bytes = encode_binary_versioned(&deck_of(&["a", "b"]), FormatVersion::V1);
        bytes[5] = 3;
        assert_eq!(
            decode_binary(&bytes),
            Err(CodecError::SlideCount { expected: 3, found: 2 })
        );
    }

    #[test]
    fn test_v1_truncated_header() {
        assert_eq!(decode_binary(&BLOB_MAGIC), Err(CodecError::Truncated(4)));
    }

    #[test]
    fn test_v1_unknown_version() {
        let bytes = [0xFF, b'N', b'S', b'D', 9, 0, 0, 0, 0];
        assert_eq!(decode_binary(&bytes), Err(CodecError::UnsupportedVersion(9)));
    }
}
