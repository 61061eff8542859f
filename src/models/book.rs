//! Book model as returned by the OpenLibrary search endpoint.

use serde::{Deserialize, Serialize};

/// A single book (OpenLibrary "work") from a search response.
///
/// Field names on the wire follow OpenLibrary's search document schema; the
/// Rust names are the plural/readable forms. Values are never mutated after
/// deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Catalog key, e.g. `/works/OL27448W`
    pub key: String,

    /// Work title
    #[serde(default)]
    pub title: String,

    /// Author display names
    #[serde(rename = "author_name", default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<String>>,

    /// Year of first publication
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_publish_year: Option<i32>,

    /// Cover image identifier for the covers endpoint. Some records carry
    /// `-1` or `0` instead of omitting the field; both mean no cover.
    #[serde(rename = "cover_i", default, skip_serializing_if = "Option::is_none")]
    pub cover_id: Option<i64>,

    /// Subject tags
    #[serde(rename = "subject", default, skip_serializing_if = "Option::is_none")]
    pub subjects: Option<Vec<String>>,

    /// ISBNs of known editions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<Vec<String>>,

    /// Publishers of known editions
    #[serde(rename = "publisher", default, skip_serializing_if = "Option::is_none")]
    pub publishers: Option<Vec<String>>,

    /// Language codes
    #[serde(rename = "language", default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<Vec<String>>,

    /// Median page count across editions
    #[serde(
        rename = "number_of_pages_median",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub number_of_pages: Option<u32>,
}

impl Book {
    /// Create a book with only the required fields set
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            authors: None,
            first_publish_year: None,
            cover_id: None,
            subjects: None,
            isbn: None,
            publishers: None,
            languages: None,
            number_of_pages: None,
        }
    }

    /// Set authors
    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = Some(authors.into_iter().map(Into::into).collect());
        self
    }

    /// Set first publish year
    pub fn with_year(mut self, year: i32) -> Self {
        self.first_publish_year = Some(year);
        self
    }

    /// Set cover id
    pub fn with_cover(mut self, cover_id: i64) -> Self {
        self.cover_id = Some(cover_id);
        self
    }

    /// Set subjects
    pub fn with_subjects<I, S>(mut self, subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subjects = Some(subjects.into_iter().map(Into::into).collect());
        self
    }

    /// Author names, empty when unknown
    pub fn author_names(&self) -> &[String] {
        self.authors.as_deref().unwrap_or_default()
    }

    /// Subject tags, empty when unknown
    pub fn subject_tags(&self) -> &[String] {
        self.subjects.as_deref().unwrap_or_default()
    }

    /// OpenLibrary web URL for this work
    pub fn url(&self) -> String {
        format!("https://openlibrary.org{}", self.key)
    }
}
