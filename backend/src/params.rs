use std::collections::HashMap;

use chrono::NaiveDate;

/// Raw form parameters as they arrive from a caller.
///
/// Values are trimmed on read; an empty or blank value counts as absent.
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    map: HashMap<String, String>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.map.insert(key.into(), value.into());
    }

    pub fn has(&self, key: &str) -> bool {
        self.get_str(key).is_some()
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.map
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.get_str(key)?.parse().ok()
    }

    /// Calendar date in `Y-n-j` form; zero padding is optional.
    pub fn get_date(&self, key: &str) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.get_str(key)?, "%Y-%m-%d").ok()
    }
}

impl<K, V> FromIterator<(K, V)> for RequestParams
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> RequestParams {
        [
            ("name", " Ada "),
            ("blank", "   "),
            ("empty", ""),
            ("count", "4"),
            ("bad_count", "four"),
            ("date", "2030-1-7"),
            ("padded", "2030-01-07"),
            ("bad_date", "07.01.2030"),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn blank_values_count_as_absent() {
        let p = params();
        assert!(p.has("name"));
        assert_eq!(p.get_str("name"), Some("Ada"));
        assert!(!p.has("blank"));
        assert!(!p.has("empty"));
        assert!(!p.has("missing"));
    }

    #[test]
    fn ints_parse_or_vanish() {
        let p = params();
        assert_eq!(p.get_int("count"), Some(4));
        assert_eq!(p.get_int("bad_count"), None);
        assert_eq!(p.get_int("missing"), None);
    }

    #[test]
    fn dates_accept_unpadded_parts() {
        let p = params();
        let expected = NaiveDate::from_ymd_opt(2030, 1, 7);
        assert_eq!(p.get_date("date"), expected);
        assert_eq!(p.get_date("padded"), expected);
        assert_eq!(p.get_date("bad_date"), None);
    }
}
