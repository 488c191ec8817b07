//! Fixed charset table used for bodies, encoded words and RFC 2231 parameters.
//!
//! Only the charsets listed here are transcoded. Every other name is treated
//! as already being UTF-8 text.

use std::collections::HashMap;
use std::sync::LazyLock;

use encoding_rs::{Encoding, EUC_JP, ISO_2022_JP, SHIFT_JIS, WINDOWS_1252};
use tracing::{debug, warn};

static CHARSETS: LazyLock<HashMap<&'static str, &'static Encoding>> = LazyLock::new(|| {
    let entries: [(&str, &'static Encoding); 14] = [
        ("iso-2022-jp", ISO_2022_JP),
        ("csiso2022jp", ISO_2022_JP),
        ("euc-jp", EUC_JP),
        ("x-euc-jp", EUC_JP),
        ("cseucpkdfmtjapanese", EUC_JP),
        ("shift_jis", SHIFT_JIS),
        ("shift-jis", SHIFT_JIS),
        ("sjis", SHIFT_JIS),
        ("x-sjis", SHIFT_JIS),
        ("ms_kanji", SHIFT_JIS),
        ("csshiftjis", SHIFT_JIS),
        ("windows-31j", SHIFT_JIS),
        // Latin-1 labels decode with the Windows-1252 superset, as browsers do.
        ("iso-8859-1", WINDOWS_1252),
        ("latin1", WINDOWS_1252),
    ];
    entries.into_iter().collect()
});

/// Look up the decoder for `charset` (case-insensitive, surrounding whitespace ignored).
pub fn lookup(charset: &str) -> Option<&'static Encoding> {
    CHARSETS
        .get(charset.trim().to_ascii_lowercase().as_str())
        .copied()
}

/// Whether `charset` has a table entry.
pub fn is_known(charset: &str) -> bool {
    lookup(charset).is_some()
}

/// Decode `bytes` declared as `charset` into text.
///
/// Charsets outside the table pass through: valid UTF-8 is returned as-is,
/// anything else is decoded lossily.
pub fn decode(charset: &str, bytes: &[u8]) -> String {
    if let Some(encoding) = lookup(charset) {
        let (text, had_errors) = encoding.decode_without_bom_handling(bytes);
        if had_errors {
            debug!(
                charset = encoding.name(),
                "Malformed sequences replaced while transcoding"
            );
        }
        return text.into_owned();
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => {
            warn!(
                charset = charset,
                "Pass-through text is not valid UTF-8, replacing invalid sequences"
            );
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}
