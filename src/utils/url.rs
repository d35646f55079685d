//! URL encoding/decoding utilities

/// Encodes a string using URL encoding
///
/// # Examples
/// ```
/// use subsync::utils::url::url_encode;
///
/// let encoded = url_encode("Hello World!");
/// assert_eq!(encoded, "Hello%20World%21");
/// ```
pub fn url_encode(input: &str) -> String {
    urlencoding::encode(input).into_owned()
}

/// Decodes a URL-encoded string
///
/// Returns the original string if decoding fails.
///
/// # Examples
/// ```
/// use subsync::utils::url::url_decode;
///
/// let decoded = url_decode("%F0%9F%87%BA%F0%9F%87%B8%20US");
/// assert_eq!(decoded, "🇺🇸 US");
/// ```
pub fn url_decode(input: &str) -> String {
    urlencoding::decode(input)
        .map(|cow| cow.into_owned())
        .unwrap_or_else(|_| input.to_string())
}

/// Splits a share link into the part before `#` and the optional fragment.
pub fn split_fragment(link: &str) -> (&str, Option<&str>) {
    match link.split_once('#') {
        Some((head, fragment)) => (head, Some(fragment)),
        None => (link, None),
    }
}
