//! Mapping raw rows and files onto [`CanonicalRecord`].

use csv::StringRecord;
use kbprep_core::{CanonicalRecord, Metadata, CONTENT_FIELD, METADATA_FIELDS, TITLE_FIELD};
use thiserror::Error;

/// A tabular header lacks a required column.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("missing required column `{0}`")]
pub struct MissingFieldError(pub &'static str);

/// Column positions resolved once per tabular file from its header row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularSchema {
    content: usize,
    /// `(name, column)` for each optional metadata field, in output order.
    fields: [(&'static str, Option<usize>); 4],
}

impl TabularSchema {
    pub fn from_headers(headers: &StringRecord) -> Result<Self, MissingFieldError> {
        let position = |name: &str| headers.iter().position(|h| h == name);
        let content = position(CONTENT_FIELD).ok_or(MissingFieldError(CONTENT_FIELD))?;
        Ok(Self {
            content,
            fields: METADATA_FIELDS.map(|name| (name, position(name))),
        })
    }

    fn value<'r>(row: &'r StringRecord, column: Option<usize>) -> &'r str {
        column.and_then(|i| row.get(i)).unwrap_or("")
    }
}

/// One unprocessed unit read from a source file.
#[derive(Debug, Clone, Copy)]
pub enum RawRecord<'a> {
    /// A data row of a tabular file, paired with that file's schema.
    Tabular {
        schema: &'a TabularSchema,
        row: &'a StringRecord,
    },
    /// The whole contents of a text file; `title` is the file stem.
    Textual { title: &'a str, bytes: &'a [u8] },
}

/// Produce the canonical `{metadata, content}` form of a raw record.
///
/// Tabular rows always get all four metadata keys, absent columns as `""`.
/// Text files get only `title`.
pub fn normalize(raw: RawRecord<'_>) -> CanonicalRecord {
    match raw {
        RawRecord::Tabular { schema, row } => {
            let metadata: Metadata = schema
                .fields
                .iter()
                .map(|&(name, column)| {
                    (name.to_string(), TabularSchema::value(row, column).to_string())
                })
                .collect();
            CanonicalRecord {
                metadata,
                content: TabularSchema::value(row, Some(schema.content)).to_string(),
            }
        }
        RawRecord::Textual { title, bytes } => {
            let mut metadata = Metadata::new();
            metadata.insert(TITLE_FIELD.to_string(), title.to_string());
            CanonicalRecord {
                metadata,
                content: decode_lossy(bytes),
            }
        }
    }
}

/// Best-effort UTF-8 decode: invalid byte sequences are dropped, a leading
/// byte-order mark is removed. Never fails.
pub fn decode_lossy(bytes: &[u8]) -> String {
    let text: String = match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.utf8_chunks().map(|chunk| chunk.valid()).collect(),
    };
    match text.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> StringRecord {
        StringRecord::from(names.to_vec())
    }

    #[test]
    fn schema_requires_content_column() {
        let err = TabularSchema::from_headers(&headers(&["id", "title", "body"])).unwrap_err();
        assert_eq!(err, MissingFieldError("content"));
        assert_eq!(err.to_string(), "missing required column `content`");
    }

    #[test]
    fn tabular_row_copies_known_fields_in_order() {
        let schema =
            TabularSchema::from_headers(&headers(&["page", "content", "title", "id", "section"]))
                .unwrap();
        let row = StringRecord::from(vec!["12", "Body text", "Guide", "42", "Intro"]);
        let record = normalize(RawRecord::Tabular {
            schema: &schema,
            row: &row,
        });

        let keys: Vec<&str> = record.metadata.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "title", "section", "page"]);
        assert_eq!(record.metadata["id"], "42");
        assert_eq!(record.metadata["page"], "12");
        assert_eq!(record.content, "Body text");
        assert!(!record.metadata.contains_key("content"));
    }

    #[test]
    fn missing_optional_columns_default_to_empty() {
        let schema = TabularSchema::from_headers(&headers(&["content"])).unwrap();
        let row = StringRecord::from(vec!["only content"]);
        let record = normalize(RawRecord::Tabular {
            schema: &schema,
            row: &row,
        });
        assert_eq!(record.metadata.len(), 4);
        assert!(record.metadata.values().all(String::is_empty));
        assert_eq!(record.content, "only content");
    }

    #[test]
    fn extra_columns_are_ignored() {
        let schema = TabularSchema::from_headers(&headers(&["content", "author"])).unwrap();
        let row = StringRecord::from(vec!["text", "someone"]);
        let record = normalize(RawRecord::Tabular {
            schema: &schema,
            row: &row,
        });
        assert!(!record.metadata.contains_key("author"));
    }

    #[test]
    fn textual_record_uses_title_only() {
        let record = normalize(RawRecord::Textual {
            title: "handbook",
            bytes: b"Chapter one.",
        });
        assert_eq!(record.metadata.len(), 1);
        assert_eq!(record.metadata["title"], "handbook");
        assert_eq!(record.content, "Chapter one.");
    }

    #[test]
    fn invalid_utf8_is_dropped() {
        let bytes = b"caf\xc3\xa9 \xff\xfe ok";
        assert_eq!(decode_lossy(bytes), "café  ok");
    }

    #[test]
    fn truncated_sequence_is_dropped() {
        assert_eq!(decode_lossy(b"abc\xe7\x9f"), "abc");
    }

    #[test]
    fn byte_order_mark_is_removed() {
        assert_eq!(decode_lossy("\u{feff}hello".as_bytes()), "hello");
    }
}
