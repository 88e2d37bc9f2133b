use std::{collections::HashSet, str::FromStr};

use anyhow::*;

const NUMBER_ESCAPE_CHAR: &[char] = &['%', ',', ' ', '"', '\n', '\r'];

/// Converts a raw numeric token from a quote page into an `f64`.
///
/// The token may carry thousands separators, percent signs and stray
/// whitespace; everything in the default escape set is stripped first, and
/// `escape_chars` adds per-call characters (a leading `+`, typically) to that
/// set. Conversion failures surface as errors, never as a default value.
///
/// # Arguments
///
/// * `s`: The raw token text as read from the page.
/// * `escape_chars`: Extra characters to strip before conversion.
///
/// # Returns
///
/// * `Result<f64>`: The parsed value, or an error naming the cleaned token
///   when conversion fails.
pub fn parse_f64(s: &str, escape_chars: Option<Vec<char>>) -> Result<f64> {
    let cleaned = clean_escape_chars(s, escape_chars);
    f64::from_str(&cleaned)
        .map_err(|why| anyhow!("Failed to parse '{}' as f64 because {:?}", cleaned, why))
}

/// Strips the escape character set out of a token. The default set covers the
/// separators and whitespace seen inside numeric tokens on quote pages.
pub(crate) fn clean_escape_chars(s: &str, escape_chars: Option<Vec<char>>) -> String {
    let mut combined: Vec<char> = NUMBER_ESCAPE_CHAR.to_vec();
    if let Some(ec) = escape_chars {
        combined.extend(ec);
    }

    let filters = combined.iter().collect::<HashSet<_>>();
    s.chars().filter(|c| !filters.contains(c)).collect()
}
