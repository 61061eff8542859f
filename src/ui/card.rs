//! Presentational book card.

use serde::Serialize;

use super::{clamp_lines, truncate_with_ellipsis, OwoColorize};
use crate::models::Book;
use crate::sources::{cover_url, CoverSize};

/// Shown instead of a cover image when the book has none
pub const PLACEHOLDER_ICON: &str = "📖";

/// Author line for books without any author
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

const MAX_AUTHORS: usize = 2;
const MAX_SUBJECTS: usize = 3;
const TITLE_LINES: usize = 2;

/// Everything a card displays, derived from one [`Book`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookCard {
    pub key: String,
    pub title: String,
    pub authors: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    pub subjects: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
}

impl BookCard {
    pub fn from_book(book: &Book) -> Self {
        let names = book.author_names();
        let authors = if names.is_empty() {
            UNKNOWN_AUTHOR.to_string()
        } else {
            names
                .iter()
                .take(MAX_AUTHORS)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };

        Self {
            key: book.key.clone(),
            title: book.title.clone(),
            authors,
            year: book.first_publish_year,
            subjects: book
                .subject_tags()
                .iter()
                .take(MAX_SUBJECTS)
                .cloned()
                .collect(),
            cover_url: cover_url(book.cover_id, CoverSize::Large),
        }
    }

    pub fn has_cover(&self) -> bool {
        self.cover_url.is_some()
    }

    /// Cover line: the image URL, or the placeholder icon
    pub fn cover_line(&self) -> String {
        match &self.cover_url {
            Some(url) => url.clone(),
            None => PLACEHOLDER_ICON.to_string(),
        }
    }

    /// Plain text lines fitted to `width` cells
    pub fn render_lines(&self, width: usize) -> Vec<String> {
        let mut lines = vec![truncate_with_ellipsis(&self.cover_line(), width)];
        lines.extend(clamp_lines(&self.title, width, TITLE_LINES));
        lines.push(truncate_with_ellipsis(&self.authors, width));
        if let Some(year) = self.year {
            lines.push(year.to_string());
        }
        if !self.subjects.is_empty() {
            lines.push(truncate_with_ellipsis(&self.tag_line(), width));
        }
        lines
    }

    /// Colored lines for direct terminal output
    pub fn render_styled(&self, width: usize) -> Vec<String> {
        let mut lines = Vec::new();
        let cover = truncate_with_ellipsis(&self.cover_line(), width);
        lines.push(if self.has_cover() {
            cover.dimmed().to_string()
        } else {
            cover
        });
        for line in clamp_lines(&self.title, width, TITLE_LINES) {
            lines.push(line.bold().to_string());
        }
        lines.push(truncate_with_ellipsis(&self.authors, width).white().to_string());
        if let Some(year) = self.year {
            lines.push(year.to_string().yellow().to_string());
        }
        if !self.subjects.is_empty() {
            lines.push(truncate_with_ellipsis(&self.tag_line(), width).cyan().to_string());
        }
        lines
    }

    fn tag_line(&self) -> String {
        self.subjects
            .iter()
            .map(|s| format!("#{}", s))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<&Book> for BookCard {
    fn from(book: &Book) -> Self {
        Self::from_book(book)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dune() -> Book {
        Book::new("/works/OL893415W", "Dune")
            .with_authors(["Frank Herbert", "Brian Herbert", "Kevin J. Anderson"])
            .with_year(1965)
            .with_cover(12345)
            .with_subjects(["Science fiction", "Deserts", "Ecology", "Politics"])
    }

    #[test]
    fn test_card_fields() {
        let card = BookCard::from_book(&dune());
        assert_eq!(card.authors, "Frank Herbert, Brian Herbert");
        assert_eq!(card.year, Some(1965));
        assert_eq!(card.subjects, ["Science fiction", "Deserts", "Ecology"]);
        assert_eq!(
            card.cover_url.as_deref(),
            Some("https://covers.openlibrary.org/b/id/12345-L.jpg")
        );
    }

    #[test]
    fn test_unknown_author_and_placeholder() {
        let card = BookCard::from(&Book::new("/works/OL1W", "Anonymous Tales"));
        assert_eq!(card.authors, UNKNOWN_AUTHOR);
        assert!(!card.has_cover());
        assert_eq!(card.cover_line(), PLACEHOLDER_ICON);
        assert_eq!(card.year, None);
        assert!(card.subjects.is_empty());
    }

    #[test]
    fn test_empty_author_list_is_unknown() {
        let book = Book::new("/works/OL2W", "Empty").with_authors(Vec::<String>::new());
        assert_eq!(BookCard::from_book(&book).authors, UNKNOWN_AUTHOR);
    }

    #[test]
    fn test_render_lines() {
        let card = BookCard::from_book(&Book::new("/works/OL3W", "Dune").with_authors(["Frank Herbert"]));
        let lines = card.render_lines(30);
        assert_eq!(lines, vec![PLACEHOLDER_ICON, "Dune", "Frank Herbert"]);
    }

    #[test]
    fn test_render_lines_fit_width() {
        let card = BookCard::from_book(&dune());
        for line in card.render_lines(20) {
            assert!(unicode_width::UnicodeWidthStr::width(line.as_str()) <= 20, "{line}");
        }
        let lines = card.render_lines(40);
        assert!(lines.contains(&"1965".to_string()));
        assert!(lines.last().unwrap().starts_with("#Science fiction"));
    }

    #[test]
    fn test_render_styled_matches_plain_text() {
        let card = BookCard::from_book(&dune());
        let plain = card.render_lines(40);
        let styled = card.render_styled(40);
        assert_eq!(styled.len(), plain.len());
        for (styled, plain) in styled.iter().zip(&plain) {
            assert!(styled.contains(plain.as_str()), "{styled:?} vs {plain:?}");
        }
        assert_ne!(styled[1], plain[1]);
    }

    #[test]
    fn test_serializes_without_empty_options() {
        let card = BookCard::from_book(&Book::new("/works/OL4W", "Plain"));
        let json = serde_json::to_value(&card).unwrap();
        assert!(json.get("cover_url").is_none());
        assert_eq!(json["authors"], UNKNOWN_AUTHOR);
    }
}
