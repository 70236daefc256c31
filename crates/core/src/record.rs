use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Provenance metadata attached to a record and to every chunk cut from it.
///
/// Keys keep insertion order so artifacts list them the way the normalizer
/// produced them (`id`, `title`, `section`, `page` for tabular rows).
pub type Metadata = IndexMap<String, String>;

/// Name of the tabular column holding the text to chunk.
pub const CONTENT_FIELD: &str = "content";

/// Metadata key used as the document title on submission.
pub const TITLE_FIELD: &str = "title";

/// Optional tabular columns copied into metadata, in output order.
pub const METADATA_FIELDS: [&str; 4] = ["id", TITLE_FIELD, "section", "page"];

/// One row or file after normalization, independent of the source format.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CanonicalRecord {
    pub metadata: Metadata,
    pub content: String,
}

/// A bounded text segment plus the metadata of the record it came from.
///
/// Serializes to the artifact line shape `{"meta": {...}, "text": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    #[serde(rename = "meta", default, deserialize_with = "null_as_empty")]
    pub metadata: Metadata,
    pub text: String,
}

impl Chunk {
    pub fn new(metadata: Metadata, text: impl Into<String>) -> Self {
        Self {
            metadata,
            text: text.into(),
        }
    }

    /// The `title` metadata value, if present and non-empty.
    pub fn title(&self) -> Option<&str> {
        self.metadata
            .get(TITLE_FIELD)
            .map(String::as_str)
            .filter(|t| !t.is_empty())
    }

    /// Turn the chunk into what a sink receives. `fallback_title` is used
    /// when the chunk carries no usable title (typically the source file stem).
    pub fn into_submission(self, fallback_title: &str) -> Submission {
        let title = self.title().unwrap_or(fallback_title).to_string();
        Submission {
            text: self.text,
            title,
            metadata: self.metadata,
        }
    }
}

/// A single create-document call: text, title and the free-form metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub text: String,
    pub title: String,
    pub metadata: Metadata,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Metadata, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Metadata>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn chunk_serializes_as_meta_and_text() {
        let chunk = Chunk::new(meta(&[("id", "7"), ("title", "Guide")]), "hello");
        let json = serde_json::to_string(&chunk).unwrap();
        assert_eq!(json, r#"{"meta":{"id":"7","title":"Guide"},"text":"hello"}"#);
    }

    #[test]
    fn non_ascii_is_written_verbatim() {
        let chunk = Chunk::new(meta(&[("title", "手冊")]), "段落");
        let json = serde_json::to_string(&chunk).unwrap();
        assert!(json.contains("手冊"));
        assert!(json.contains("段落"));
    }

    #[test]
    fn missing_or_null_meta_reads_as_empty() {
        let a: Chunk = serde_json::from_str(r#"{"text":"x"}"#).unwrap();
        let b: Chunk = serde_json::from_str(r#"{"meta":null,"text":"x"}"#).unwrap();
        assert!(a.metadata.is_empty());
        assert!(b.metadata.is_empty());
    }

    #[test]
    fn submission_title_prefers_metadata() {
        let chunk = Chunk::new(meta(&[("title", "Manual")]), "body");
        let sub = chunk.into_submission("fallback");
        assert_eq!(sub.title, "Manual");
        assert_eq!(sub.metadata.get("title").map(String::as_str), Some("Manual"));
    }

    #[test]
    fn submission_title_falls_back_on_empty() {
        let chunk = Chunk::new(meta(&[("id", "1"), ("title", "")]), "body");
        assert_eq!(chunk.into_submission("faq").title, "faq");

        let untitled = Chunk::new(Metadata::new(), "body");
        assert_eq!(untitled.into_submission("notes").title, "notes");
    }
}
