//! Routes and the static pages.
//!
//! Each render function returns the finished screen as a string so the
//! binary decides where it goes and tests can inspect it.

use comfy_table::{presets, Attribute, Cell, CellAlignment, ContentArrangement, Table};

use super::{format_number, truncate_with_ellipsis, BookCard, OwoColorize};
use crate::grid::GridRow;

/// Brand name on the landing page
pub const APP_NAME: &str = "ReadSphere";

/// Title shown in the library header
pub const LIBRARY_TITLE: &str = "Read Sphere";

const TAGLINE: &str = "Discover millions of books with our infinite-scrolling explorer. \
                       Search, filter, and browse the world's largest digital library.";

/// A feature blurb on the landing page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    pub icon: &'static str,
    pub title: &'static str,
    pub blurb: &'static str,
}

pub const FEATURES: [Feature; 3] = [
    Feature {
        icon: "🔍",
        title: "Smart Search",
        blurb: "Find books instantly with our powerful search and quick filters",
    },
    Feature {
        icon: "✨",
        title: "Beautiful Cards",
        blurb: "Enjoy rich, image-first book cards with smooth animations",
    },
    Feature {
        icon: "📖",
        title: "Infinite Browsing",
        blurb: "Seamlessly browse thousands of books with virtualized scrolling",
    },
];

/// Application routes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Library,
    NotFound(String),
}

impl Route {
    /// Resolve a path. Unknown paths are logged as 404s.
    pub fn parse(path: &str) -> Self {
        match path.trim() {
            "/" | "" => Route::Home,
            "/library" | "/library/" => Route::Library,
            other => {
                tracing::error!(
                    "404 Error: User attempted to access non-existent route: {}",
                    other
                );
                Route::NotFound(other.to_string())
            }
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Route::Home => "/",
            Route::Library => "/library",
            Route::NotFound(path) => path,
        }
    }
}

/// Landing page
pub fn render_home() -> String {
    let mut out = Vec::new();
    out.push(String::new());
    out.push(format!("  📚 {}", APP_NAME.bold().cyan()));
    out.push(String::new());
    out.push(format!("  {}", TAGLINE));
    out.push(String::new());

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.add_row(
        FEATURES
            .iter()
            .map(|f| {
                Cell::new(format!("{} {}\n\n{}", f.icon, f.title, f.blurb))
                    .set_alignment(CellAlignment::Center)
            })
            .collect::<Vec<_>>(),
    );
    out.push(table.to_string());
    out.push(String::new());
    out.push(format!(
        "  {} {}",
        "Explore Books →".bold().green(),
        "(read-sphere open /library)".dimmed()
    ));
    out.push(String::new());
    out.join("\n")
}

/// 404 page
pub fn render_not_found(path: &str) -> String {
    [
        String::new(),
        format!("  {}", "📖".dimmed()),
        format!("  {}", "404".bold()),
        format!("  {}", "Page Not Found".bold()),
        format!(
            "  {}",
            "The page you're looking for doesn't exist or has been moved.".dimmed()
        ),
        format!("  {}", path.dimmed()),
        String::new(),
        format!(
            "  {} {}",
            "Return to Home".bold().green(),
            "(read-sphere open /)".dimmed()
        ),
        String::new(),
    ]
    .join("\n")
}

/// Error view of the library
pub fn render_error(message: &str) -> String {
    [
        String::new(),
        format!("  {}", "Something went wrong".bold().red()),
        format!("  {}", message),
        String::new(),
        format!("  {} {}", "Try Again".bold(), "(:r)".dimmed()),
        String::new(),
    ]
    .join("\n")
}

/// Empty view of the library
pub fn render_empty() -> String {
    [
        String::new(),
        format!("  {}", "No books found".bold()),
        format!(
            "  {}",
            "Try searching for something else or use one of the quick filters above.".dimmed()
        ),
        String::new(),
    ]
    .join("\n")
}

/// Header status line: loading indicator or result count
pub fn status_line(is_loading: bool, total: u64, query: &str) -> String {
    if is_loading {
        "Searching...".to_string()
    } else {
        format!("{} books found for \"{}\"", format_number(total), query)
    }
}

/// Header counter of loaded books
pub fn loaded_line(loaded: usize) -> String {
    format!("{} loaded", loaded)
}

/// Quick filter chips; the selected one is highlighted
pub fn render_quick_filters(filters: &[&str], selected: Option<&str>) -> String {
    filters
        .iter()
        .map(|f| {
            if Some(*f) == selected {
                format!("[{}]", f).bold().cyan().to_string()
            } else {
                format!(" {} ", f).dimmed().to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render grid rows as a table, one card per cell
pub fn render_grid(rows: &[GridRow<'_>], columns: usize, total_width: usize) -> String {
    let columns = columns.max(1);
    // Borders take one cell per column plus one, padding two per column
    let card_width = (total_width.saturating_sub(columns + 1) / columns)
        .saturating_sub(2)
        .max(8);

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Disabled);

    for row in rows {
        let mut cells: Vec<Cell> = match row {
            GridRow::Books { books, .. } => books
                .iter()
                .map(|book| {
                    let lines = BookCard::from_book(book).render_lines(card_width);
                    Cell::new(lines.join("\n"))
                })
                .collect(),
            GridRow::Loading { columns, .. } => (0..*columns)
                .map(|_| {
                    Cell::new(truncate_with_ellipsis("◐ Loading...", card_width))
                        .add_attribute(Attribute::Dim)
                })
                .collect(),
        };
        while cells.len() < columns {
            cells.push(Cell::new(""));
        }
        table.add_row(cells);
    }

    table.to_string()
}
