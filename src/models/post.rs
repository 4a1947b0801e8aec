//! Post and attachment records of an API page.

use std::collections::HashSet;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::models::PageUrl;
use crate::utils::sanitize::{sanitize_attachment_name, sanitize_filename};

/// One post of a page response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    /// Post identifier (numeric ids are kept as their decimal text)
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub published: Option<String>,

    #[serde(default)]
    pub added: Option<String>,

    /// HTML body
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub attachments: Vec<Attachment>,

    /// Primary file, distinct from the attachments
    #[serde(default)]
    pub file: Option<Attachment>,

    /// Embed metadata; anything other than an object counts as empty
    #[serde(default, deserialize_with = "object_or_empty")]
    pub embed: Map<String, Value>,
}

impl Post {
    /// Folder name `"{title-or-id}_{published-or-added}"`, sanitized.
    ///
    /// The date part is left out when neither date is present.
    pub fn folder_name(&self) -> String {
        let title = self
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(&self.id);

        let date = [&self.published, &self.added]
            .into_iter()
            .flatten()
            .find(|d| !d.is_empty());

        let name = match date {
            Some(date) => sanitize_filename(&format!("{title}_{date}")),
            None => sanitize_filename(title),
        };

        // A title made only of invalid characters still needs a folder.
        if name.is_empty() {
            sanitize_filename(&self.id)
        } else {
            name
        }
    }

    /// Downloads of this post: attachments first, then the primary file.
    ///
    /// File names are unique within the result; a later target whose name
    /// is already taken is dropped, as it would land on the same file.
    pub fn download_targets(&self, page: &PageUrl) -> Vec<DownloadTarget> {
        let attachments = self.attachments.iter().filter_map(|a| a.target(page));
        let file = self
            .file
            .as_ref()
            .filter(|f| f.is_complete())
            .and_then(|f| f.target(page));

        let mut seen = HashSet::new();
        attachments
            .chain(file)
            .filter(|t| {
                let fresh = seen.insert(t.file_name.clone());
                if !fresh {
                    log::debug!("Skipping duplicate file name {} ({})", t.file_name, t.url);
                }
                fresh
            })
            .collect()
    }
}

/// A file attached to a post.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attachment {
    #[serde(default)]
    pub name: Option<String>,

    /// Server-relative path, e.g. `/data/ab/cd/hash.png`
    #[serde(default)]
    pub path: Option<String>,
}

impl Attachment {
    /// Both `name` and `path` are present.
    pub fn is_complete(&self) -> bool {
        self.name.is_some() && self.path.is_some()
    }

    /// Absolute URL and sanitized file name, if the name survives sanitizing.
    pub fn target(&self, page: &PageUrl) -> Option<DownloadTarget> {
        let path = self.path.as_deref().filter(|p| !p.is_empty());
        let file_name = sanitize_attachment_name(self.name.as_deref().unwrap_or(""));
        match path {
            Some(path) if !file_name.is_empty() => Some(DownloadTarget {
                url: page.resolve(path),
                file_name,
            }),
            _ => {
                log::debug!("Skipping attachment with missing fields: {:?}", self);
                None
            }
        }
    }
}

/// A resolved file to fetch into a post folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub url: String,
    pub file_name: String,
}

pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn object_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post(value: Value) -> Post {
        serde_json::from_value(value).unwrap()
    }

    fn page() -> PageUrl {
        PageUrl::parse("https://kemono.party/api/v1/patreon/user/1").unwrap()
    }

    #[test]
    fn test_folder_name_title_and_published() {
        let p = post(json!({"id": "1", "title": "My Post", "published": "2024-01-01"}));
        assert_eq!(p.folder_name(), "My Post_2024-01-01");
    }

    #[test]
    fn test_folder_name_id_without_date() {
        let p = post(json!({"id": "42"}));
        assert_eq!(p.folder_name(), "42");

        let p = post(json!({"id": 42, "title": "   ", "published": null}));
        assert_eq!(p.folder_name(), "42");
    }

    #[test]
    fn test_folder_name_falls_back_to_added() {
        let p = post(json!({"id": "9", "title": "Sketch", "added": "2023-05-06T10:11:12"}));
        assert_eq!(p.folder_name(), "Sketch_2023-05-06T101112");
    }

    #[test]
    fn test_folder_name_strips_invalid_characters() {
        let p = post(json!({"id": "5", "title": "Q&A: why?", "published": "2024-01-01"}));
        assert_eq!(p.folder_name(), "Q&A why_2024-01-01");
    }

    #[test]
    fn test_embed_array_is_empty() {
        let p = post(json!({"id": "1", "embed": []}));
        assert!(p.embed.is_empty());

        let p = post(json!({"id": "1", "embed": {"type": "video", "url": "https://v"}}));
        assert_eq!(p.embed.len(), 2);
        assert_eq!(p.embed.keys().next().map(String::as_str), Some("type"));
    }

    #[test]
    fn test_null_fields_default() {
        let p = post(json!({"id": "1", "content": null, "attachments": null, "file": null}));
        assert!(p.content.is_empty());
        assert!(p.attachments.is_empty());
        assert!(p.file.is_none());
    }

    #[test]
    fn test_download_targets() {
        let p = post(json!({
            "id": "1",
            "file": {"name": "cover.png", "path": "/data/c/cover.png"},
            "attachments": [
                {"name": "a.zip", "path": "/data/a/a.zip"},
                {"name": "https://evil/../b.png", "path": "/data/b/b.png"},
                {"path": "/data/nameless.bin"}
            ]
        }));

        let targets = p.download_targets(&page());
        assert_eq!(
            targets,
            vec![
                DownloadTarget {
                    url: "https://kemono.party/data/a/a.zip".into(),
                    file_name: "a.zip".into(),
                },
                DownloadTarget {
                    url: "https://kemono.party/data/b/b.png".into(),
                    file_name: "evil..b.png".into(),
                },
                DownloadTarget {
                    url: "https://kemono.party/data/c/cover.png".into(),
                    file_name: "cover.png".into(),
                },
            ]
        );
    }

    #[test]
    fn test_download_targets_unique_names() {
        let p = post(json!({
            "id": "1",
            "file": {"name": "a.png", "path": "/data/main/a.png"},
            "attachments": [
                {"name": "a.png", "path": "/data/1/a.png"},
                {"name": "a?.png", "path": "/data/2/a.png"},
                {"name": "b.png", "path": "/data/3/b.png"}
            ]
        }));

        let targets = p.download_targets(&page());
        let names: Vec<&str> = targets.iter().map(|t| t.file_name.as_str()).collect();
        assert_eq!(names, vec!["a.png", "b.png"]);
        assert_eq!(targets[0].url, "https://kemono.party/data/1/a.png");
    }

    #[test]
    fn test_file_requires_name_and_path() {
        let p = post(json!({"id": "1", "file": {"name": "only-name.png"}}));
        assert!(p.download_targets(&page()).is_empty());
    }
}
