//! Minimal field scanner for the token endpoint's response.
//!
//! Not a JSON parser. It finds `"key"`, skips to the following `:`, and
//! consumes either a quoted string (no escape handling) or a bare run of
//! scalar characters. Nested objects, arrays and escaped quotes are out of
//! scope; the authorization payload is a flat object of a few known fields.

use std::ops::Range;

/// Locate the value of `key` and return its byte range, excluding quotes.
///
/// Occurrences of `"key"` that are not followed by `:` (for example when the
/// text appears as another field's value) are skipped. Returns `None` when
/// the key is absent or its value is empty.
pub fn extract_field(bytes: &[u8], key: &str) -> Option<Range<usize>> {
    let needle = quoted(key);
    let mut from = 0;

    while let Some(found) = find(&bytes[from..], &needle) {
        let after_key = from + found + needle.len();
        from = after_key;

        let Some(colon) = skip_ws(bytes, after_key).filter(|&i| bytes[i] == b':') else {
            continue;
        };
        let start = skip_ws(bytes, colon + 1)?;

        let value = if bytes[start] == b'"' {
            let open = start + 1;
            let close = bytes[open..].iter().position(|&b| b == b'"')? + open;
            open..close
        } else {
            let end = bytes[start..]
                .iter()
                .position(|&b| !is_scalar(b))
                .map_or(bytes.len(), |p| p + start);
            start..end
        };

        return (!value.is_empty()).then_some(value);
    }

    None
}

/// Read `key` as a non-negative integer number of seconds.
pub fn extract_seconds(bytes: &[u8], key: &str) -> Option<u64> {
    let range = extract_field(bytes, key)?;
    std::str::from_utf8(&bytes[range]).ok()?.parse().ok()
}

fn quoted(key: &str) -> Vec<u8> {
    let mut needle = Vec::with_capacity(key.len() + 2);
    needle.push(b'"');
    needle.extend_from_slice(key.as_bytes());
    needle.push(b'"');
    needle
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn skip_ws(bytes: &[u8], from: usize) -> Option<usize> {
    bytes[from.min(bytes.len())..]
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .map(|p| p + from)
}

fn is_scalar(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'+' | b'_')
}
