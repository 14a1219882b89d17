// ── Packed MAC addresses ──
//
// The Analytics Engine ships some MAC addresses as the six raw bytes
// packed into a string. Bytes above 0x7f that did not survive the trip
// arrive as U+FFFD, which makes the value unusable.

/// Render a packed MAC as `xxxx.xxxx.xxxx`, or `(Invalid MAC address)`
/// when the value is not exactly six code points below 0x100.
pub fn format_packed_mac(packed: &str) -> String {
    let bytes: Option<Vec<u8>> = packed.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect();
    match bytes.as_deref() {
        Some(&[a, b, c, d, e, f]) => format!("{a:02x}{b:02x}.{c:02x}{d:02x}.{e:02x}{f:02x}"),
        _ => "(Invalid MAC address)".to_owned(),
    }
}
