//! Artist identities from favorites and creator listings.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::capitalize;

/// A creator entry as it appears in favorites and creator listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Creator {
    #[serde(deserialize_with = "super::post::string_or_number")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub service: String,
}

/// Mapping from artist id to display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtistNames {
    names: HashMap<String, String>,
}

impl ArtistNames {
    /// Build the mapping from a favorites or creators payload.
    ///
    /// An object with `id` and `name` yields one entry, an array yields an
    /// entry for every object carrying both, anything else yields nothing.
    /// Numeric ids are keyed by their decimal text.
    pub fn from_json(data: &Value) -> Self {
        let names = match data {
            Value::Object(_) => entry(data).into_iter().collect(),
            Value::Array(items) => items.iter().filter_map(entry).collect(),
            _ => HashMap::new(),
        };
        Self { names }
    }

    pub fn from_creators<'a>(creators: impl IntoIterator<Item = &'a Creator>) -> Self {
        let names = creators
            .into_iter()
            .map(|c| (c.id.clone(), capitalize(&c.name)))
            .collect();
        Self { names }
    }

    /// Display name for an artist id.
    pub fn get(&self, artist_id: &str) -> Option<&str> {
        self.names.get(artist_id).map(String::as_str)
    }

    pub fn insert(&mut self, artist_id: impl Into<String>, name: &str) {
        self.names.insert(artist_id.into(), capitalize(name));
    }

    pub fn extend(&mut self, other: ArtistNames) {
        self.names.extend(other.names);
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

fn entry(item: &Value) -> Option<(String, String)> {
    let id = match item.get("id")? {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    let name = item.get("name")?.as_str()?;
    Some((id, capitalize(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_single_object() {
        let names = ArtistNames::from_json(&json!({"id": "123", "name": "alice ART"}));
        assert_eq!(names.len(), 1);
        assert_eq!(names.get("123"), Some("Alice art"));
    }

    #[test]
    fn test_object_without_name_is_empty() {
        assert!(ArtistNames::from_json(&json!({"id": "123"})).is_empty());
    }

    #[test]
    fn test_array_skips_incomplete_entries() {
        let names = ArtistNames::from_json(&json!([
            {"id": "1", "name": "bob"},
            {"id": 2, "name": "carol"},
            {"name": "no id"},
            "not an object"
        ]));
        assert_eq!(names.len(), 2);
        assert_eq!(names.get("1"), Some("Bob"));
        assert_eq!(names.get("2"), Some("Carol"));
    }

    #[test]
    fn test_unsupported_payload_is_empty() {
        assert!(ArtistNames::from_json(&json!("text")).is_empty());
        assert!(ArtistNames::from_json(&json!(42)).is_empty());
    }

    #[test]
    fn test_from_creators() {
        let creators = vec![Creator {
            id: "77".into(),
            name: "dave".into(),
            service: "fanbox".into(),
        }];
        let names = ArtistNames::from_creators(&creators);
        assert_eq!(names.get("77"), Some("Dave"));
        assert_eq!(names.get("78"), None);
    }
}
