//! Title derivation: sample text → bounded document title.
//!
//! Paperless caps titles at 100 characters. The derived title takes the
//! first ten whitespace-separated words of the transcription behind a fixed
//! prefix; samples without usable text get a deterministic synthetic title
//! embedding their 1-based index. Either way the function is pure, so the
//! same sample always produces the same title.

/// Hard cap imposed by the Paperless title field.
const MAX_TITLE_CHARS: usize = 100;

/// How many leading words of the transcription make it into the title.
const TITLE_WORDS: usize = 10;

/// Derive a document title for the sample at `index` (0-indexed).
///
/// * With usable text: `"{prefix}: {first ten words}"`, truncated to 100
///   characters (97 plus `"..."`). Truncation counts characters, not bytes,
///   so multi-byte umlauts cannot split.
/// * Without text: `"{prefix} Sample {index+1:05}"`.
///
/// The result is never empty and never exceeds 100 characters.
pub fn derive_title(prefix: &str, text: Option<&str>, index: usize) -> String {
    let trimmed = text.map(str::trim).filter(|t| !t.is_empty());

    let title = match trimmed {
        Some(t) => {
            let words: Vec<&str> = t.split_whitespace().take(TITLE_WORDS).collect();
            format!("{prefix}: {}", words.join(" "))
        }
        None => format!("{prefix} Sample {:05}", index + 1),
    };

    if title.chars().count() > MAX_TITLE_CHARS {
        let head: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
        format!("{head}...")
    } else {
        title
    }
}
