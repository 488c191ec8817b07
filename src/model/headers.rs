//! Ordered, multi-valued header field map.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Header fields of one MIME entity.
///
/// Keys keep the order of their first occurrence and are stored in canonical
/// form (see [`canonical_key`]); lookups ignore case. A field that repeats
/// appends to the value list of its key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, Vec<String>)>,
    /// Lower-cased key to its position in `entries`.
    index: HashMap<String, usize>,
}

impl HeaderMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` under `name`, creating the key if needed.
    pub fn append(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.position(name) {
            Some(idx) => self.entries[idx].1.push(value),
            None => {
                self.index
                    .insert(name.to_ascii_lowercase(), self.entries.len());
                self.entries.push((canonical_key(name), vec![value]));
            }
        }
    }

    /// All values of `name`, in order of appearance.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.position(name).map(|idx| self.entries[idx].1.as_slice())
    }

    /// The first value of `name`.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.get(name)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate `(key, values)` in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Build a map with the same keys and value counts, transforming each value.
    pub fn try_map_values<E>(
        &self,
        mut f: impl FnMut(&str, &str) -> Result<String, E>,
    ) -> Result<HeaderMap, E> {
        let mut entries = Vec::with_capacity(self.entries.len());
        for (key, values) in &self.entries {
            let mut mapped = Vec::with_capacity(values.len());
            for value in values {
                mapped.push(f(key, value)?);
            }
            entries.push((key.clone(), mapped));
        }
        Ok(HeaderMap {
            entries,
            index: self.index.clone(),
        })
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name.to_ascii_lowercase().as_str()).copied()
    }
}

impl Serialize for HeaderMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, values) in &self.entries {
            map.serialize_entry(key, values)?;
        }
        map.end()
    }
}

/// Canonical spelling of a header field name.
///
/// The first letter and every letter after a `-` are upper-cased, the rest
/// lower-cased: `MIME-Version` becomes `Mime-Version`, `message-id` becomes
/// `Message-Id`. Names containing spaces or non-ASCII bytes are returned as-is.
pub fn canonical_key(name: &str) -> String {
    if name.bytes().any(|b| !b.is_ascii_graphic()) {
        return name.to_string();
    }
    let mut upper = true;
    name.chars()
        .map(|c| {
            let out = if upper {
                c.to_ascii_uppercase()
            } else {
                c.to_ascii_lowercase()
            };
            upper = c == '-';
            out
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_key() {
        assert_eq!(canonical_key("content-type"), "Content-Type");
        assert_eq!(canonical_key("MIME-Version"), "Mime-Version");
        assert_eq!(canonical_key("Message-ID"), "Message-Id");
        assert_eq!(canonical_key("x-mailer"), "X-Mailer");
        assert_eq!(canonical_key("bad key"), "bad key");
    }

    #[test]
    fn test_repeated_fields_keep_first_position() {
        let mut headers = HeaderMap::new();
        headers.append("Received", "from a");
        headers.append("Subject", "hi");
        headers.append("received", "from b");

        let keys: Vec<&str> = headers.keys().collect();
        assert_eq!(keys, vec!["Received", "Subject"]);
        assert_eq!(
            headers.get("RECEIVED").unwrap(),
            &["from a".to_string(), "from b".to_string()]
        );
        assert_eq!(headers.first("subject"), Some("hi"));
        assert!(headers.get("To").is_none());
    }

    #[test]
    fn test_many_distinct_keys_keep_order_and_lookup() {
        let mut headers = HeaderMap::new();
        for i in 0..20_000 {
            headers.append(&format!("x-h{i}"), "v");
        }
        headers.append("X-H7", "again");

        assert_eq!(headers.len(), 20_000);
        let keys: Vec<&str> = headers.keys().take(3).collect();
        assert_eq!(keys, vec!["X-H0", "X-H1", "X-H2"]);
        assert_eq!(headers.keys().last(), Some("X-H19999"));
        assert_eq!(
            headers.get("X-h7").unwrap(),
            &["v".to_string(), "again".to_string()]
        );
        assert!(headers.contains("x-h12345"));
        assert!(!headers.contains("x-h20000"));
    }

    #[test]
    fn test_try_map_values_preserves_counts() {
        let mut headers = HeaderMap::new();
        headers.append("To", "a");
        headers.append("To", "b");
        let mapped = headers
            .try_map_values(|_, v| Ok::<_, ()>(v.to_uppercase()))
            .unwrap();
        assert_eq!(mapped.get("to").unwrap(), &["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn test_serializes_as_object_of_arrays() {
        let mut headers = HeaderMap::new();
        headers.append("subject", "hello");
        let json = serde_json::to_string(&headers).unwrap();
        assert_eq!(json, r#"{"Subject":["hello"]}"#);
    }
}
