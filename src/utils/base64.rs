use base64::{
    alphabet,
    engine::general_purpose::{self, GeneralPurpose, GeneralPurposeConfig},
    engine::DecodePaddingMode,
    Engine as _,
};

/// Standard alphabet decoder that tolerates missing padding and
/// non-canonical trailing bits, as found in most subscription feeds.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_allow_trailing_bits(true)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encodes a string to Base64 format.
pub fn base64_encode(input: &str) -> String {
    general_purpose::STANDARD.encode(input)
}

/// Reverses a URL-safe Base64 string to standard Base64 format.
pub fn url_safe_base64_reverse(input: &str) -> String {
    input.replace('-', "+").replace('_', "/")
}

/// Encodes a string to URL-safe Base64 format without padding.
pub fn url_safe_base64_encode(input: &str) -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(input)
}

/// Decodes standard or URL-safe Base64, with or without padding.
///
/// Whitespace (including line breaks) is ignored. Returns `None` when the
/// input is empty, is not Base64, or does not decode to UTF-8 text.
pub fn safe_base64_decode(input: &str) -> Option<String> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return None;
    }
    let bytes = LENIENT
        .decode(url_safe_base64_reverse(&compact).as_bytes())
        .ok()?;
    String::from_utf8(bytes).ok()
}
