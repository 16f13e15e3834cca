//! Hex color decoding for gradient stops.
//!
//! Colors arrive from the caller as `#rrggbb` strings. A malformed string is
//! never an error: it decodes to full-intensity magenta so the mistake shows up
//! on screen instead of tearing down the session.

/// Normalized linear RGB triple, each channel in `[0, 1]`.
pub type Rgb = [f32; 3];

/// Returned for any string that is not exactly six hex digits.
pub const MAGENTA_SENTINEL: Rgb = [1.0, 0.0, 1.0];

/// Decodes `#rrggbb` or `rrggbb` (case-insensitive) into an [`Rgb`] triple.
pub fn decode_hex(value: &str) -> Rgb {
    match parse_hex(value) {
        Some(rgb) => rgb,
        None => {
            tracing::warn!(color = value, "malformed hex color; substituting magenta");
            MAGENTA_SENTINEL
        }
    }
}

/// Strict variant of [`decode_hex`] that reports failure instead of
/// substituting the sentinel.
pub fn parse_hex(value: &str) -> Option<Rgb> {
    let digits = value.strip_prefix('#').unwrap_or(value);
    if digits.len() != 6 || !digits.bytes().all(|byte| byte.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |range: std::ops::Range<usize>| {
        u8::from_str_radix(&digits[range], 16)
            .ok()
            .map(|byte| f32::from(byte) / 255.0)
    };
    Some([channel(0..2)?, channel(2..4)?, channel(4..6)?])
}
