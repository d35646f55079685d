//! Query-string helpers shared by the link parsers.

use std::str::FromStr;

/// Decoded query parameters of a share link.
///
/// Keys with blank values are dropped and only the first value of a repeated
/// key is kept, so `get` never yields an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn parse(query: &str) -> Self {
        let mut pairs: Vec<(String, String)> = Vec::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() || pairs.iter().any(|(k, _)| k.as_str() == key.as_ref()) {
                continue;
            }
            pairs.push((key.into_owned(), value.into_owned()));
        }
        QueryParams { pairs }
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value of the first alias that is present.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter().find_map(|key| self.get(key))
    }

    pub fn get_or(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    /// Reads a flag from the first alias present.
    ///
    /// `1`, `true`, `on` and `yes` (any case) are true; any other present
    /// value is false. `default` applies only when no alias is present.
    pub fn get_bool(&self, keys: &[&str], default: bool) -> bool {
        match self.first_of(keys) {
            Some(value) => parse_flag(value),
            None => default,
        }
    }

    /// Parses a numeric parameter, `None` when absent or malformed.
    pub fn get_int<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|value| value.trim().parse().ok())
    }

    /// Splits a comma-separated parameter, dropping blank entries.
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        let items: Vec<String> = self
            .get(key)?
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        if items.is_empty() {
            None
        } else {
            Some(items)
        }
    }
}

/// Truthiness of a textual flag.
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "on" | "yes"
    )
}
