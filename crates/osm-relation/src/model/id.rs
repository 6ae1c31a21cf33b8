//! Element identifiers and the numeric coercions applied to them.
//!
//! Ids of stored elements are positive. Zero marks a provisional element
//! that the store has not assigned an id to yet, and negative values are
//! client placeholders for elements created in the same upload.

/// A 64-bit element identifier.
pub type ElementId = i64;

/// Id carried by a relation before the store assigns one.
pub const PROVISIONAL_ID: ElementId = 0;

/// Reads the leading integer of `s`, falling back to zero.
///
/// Leading and trailing whitespace and an optional sign are accepted; the
/// longest run of ASCII digits after that is the value and everything
/// following it is ignored. Input without leading digits (`""`, `"a"`)
/// yields zero, so `"00"` and `"0.0"` both become zero as well. Values
/// outside the `i64` range saturate.
pub fn coerce_id(s: &str) -> ElementId {
    let s = s.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let mut value: i64 = 0;
    for byte in digits.bytes().take_while(u8::is_ascii_digit) {
        let digit = i64::from(byte - b'0');
        value = value.saturating_mul(10);
        value = if negative {
            value.saturating_sub(digit)
        } else {
            value.saturating_add(digit)
        };
    }
    value
}

/// Parses an unsigned decimal number, surrounding whitespace allowed.
pub fn parse_unsigned(s: &str) -> Option<u64> {
    let s = s.trim();
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Parses a signed decimal element reference, surrounding whitespace allowed.
pub fn parse_ref(s: &str) -> Option<ElementId> {
    let s = s.trim();
    let digits = s.strip_prefix('-').unwrap_or(s);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}
