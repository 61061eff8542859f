//! Virtualized, responsive grid of books.
//!
//! The flat book list is cut into rows of `columns` books. A [`RowWindow`]
//! decides which rows are rendered; [`BookGrid`] adds the synthetic loading
//! row and the infinite-scroll trigger on top.

pub mod layout;
pub mod viewport;
pub mod window;

pub use layout::{column_count, row_height, GridLayout};
pub use viewport::{Viewport, ViewportObserver, ViewportState};
pub use window::{RowRange, RowWindow, VirtualRow};

use crate::models::Book;

/// Rows rendered past each edge of the viewport
pub const DEFAULT_OVERSCAN: usize = 3;

/// One rendered row of the grid
#[derive(Debug, Clone, PartialEq)]
pub enum GridRow<'a> {
    /// Up to `columns` books; `first_index` is the first book's index in the
    /// flat list
    Books {
        row: VirtualRow,
        first_index: usize,
        books: &'a [Book],
    },
    /// Placeholder row shown while the next page loads
    Loading { row: VirtualRow, columns: usize },
}

impl GridRow<'_> {
    pub fn row(&self) -> VirtualRow {
        match self {
            GridRow::Books { row, .. } | GridRow::Loading { row, .. } => *row,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, GridRow::Loading { .. })
    }
}

/// Virtualized grid state
#[derive(Debug, Clone)]
pub struct BookGrid {
    layout: GridLayout,
    window: RowWindow,
    item_count: usize,
    data_rows: usize,
    loading_row: bool,
}

impl BookGrid {
    pub fn new(width: Option<u32>, viewport_height: u32, overscan: usize) -> Self {
        let layout = GridLayout::for_width(width);
        let mut window = RowWindow::new(0, layout.row_height, overscan);
        window.set_viewport_height(viewport_height);
        Self {
            layout,
            window,
            item_count: 0,
            data_rows: 0,
            loading_row: false,
        }
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn window(&self) -> &RowWindow {
        &self.window
    }

    /// Rows holding books (excludes the loading row)
    pub fn data_rows(&self) -> usize {
        self.data_rows
    }

    pub fn has_loading_row(&self) -> bool {
        self.loading_row
    }

    /// Recompute columns and row height for a new viewport
    pub fn resize(&mut self, width: Option<u32>, height: u32) {
        let layout = GridLayout::for_width(width);
        if layout != self.layout {
            tracing::trace!(
                columns = layout.columns,
                row_height = layout.row_height,
                "Grid re-measured"
            );
        }
        self.layout = layout;
        self.window.set_row_height(layout.row_height);
        self.window.set_viewport_height(height);
        self.recount();
    }

    /// Update the row count from the loaded data.
    ///
    /// One extra loading row is appended while a next-page fetch is
    /// outstanding.
    pub fn sync(&mut self, item_count: usize, has_next_page: bool, is_fetching_next: bool) {
        self.item_count = item_count;
        self.loading_row = has_next_page && is_fetching_next;
        self.recount();
    }

    fn recount(&mut self) {
        self.data_rows = self.layout.rows_for(self.item_count);
        self.window.set_count(self.data_rows + usize::from(self.loading_row));
    }

    pub fn scroll_to(&mut self, offset: u64) {
        self.window.scroll_to(offset);
    }

    /// Rows to render for the current window
    pub fn rows<'a>(&self, books: &'a [Book]) -> Vec<GridRow<'a>> {
        self.window
            .virtual_rows()
            .map(|row| {
                if row.index >= self.data_rows {
                    GridRow::Loading {
                        row,
                        columns: self.layout.columns,
                    }
                } else {
                    let span = self.layout.row_span(row.index, books.len());
                    GridRow::Books {
                        row,
                        first_index: span.start,
                        books: &books[span],
                    }
                }
            })
            .collect()
    }

    /// Whether the window has reached the end of the loaded data and
    /// another page should be requested
    pub fn should_fetch_next(&self, has_next_page: bool, is_fetching_next: bool) -> bool {
        if !has_next_page || is_fetching_next || self.data_rows == 0 {
            return false;
        }
        match self.window.last_virtual_index() {
            Some(last) => last >= self.data_rows - 1,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn books(n: usize) -> Vec<Book> {
        (0..n)
            .map(|i| Book::new(format!("/works/{}", i), format!("Book {}", i)))
            .collect()
    }

    #[test]
    fn test_single_book_single_card() {
        let data = books(1);
        let mut grid = BookGrid::new(Some(1280), 900, DEFAULT_OVERSCAN);
        grid.sync(data.len(), false, false);

        let rows = grid.rows(&data);
        assert_eq!(rows.len(), 1);
        match &rows[0] {
            GridRow::Books { books, .. } => assert_eq!(books.len(), 1),
            other => panic!("unexpected row {:?}", other),
        }
        assert!(!grid.should_fetch_next(false, false));
    }

    #[test]
    fn test_rows_partition_by_columns() {
        let data = books(14);
        let mut grid = BookGrid::new(Some(1024), 5000, DEFAULT_OVERSCAN); // 4 columns
        grid.sync(data.len(), false, false);

        let rows = grid.rows(&data);
        assert_eq!(rows.len(), 4);
        let sizes: Vec<usize> = rows
            .iter()
            .map(|r| match r {
                GridRow::Books { books, .. } => books.len(),
                GridRow::Loading { .. } => 0,
            })
            .collect();
        assert_eq!(sizes, [4, 4, 4, 2]);

        if let GridRow::Books { first_index, books, .. } = &rows[3] {
            assert_eq!(*first_index, 12);
            assert_eq!(books[0].key, "/works/12");
        }
    }

    #[test]
    fn test_loading_row_only_while_fetching() {
        let data = books(20);
        let mut grid = BookGrid::new(Some(1400), 5000, DEFAULT_OVERSCAN); // 6 columns
        grid.sync(data.len(), true, false);
        assert!(!grid.has_loading_row());
        assert_eq!(grid.window().count(), 4);

        grid.sync(data.len(), true, true);
        assert!(grid.has_loading_row());
        let rows = grid.rows(&data);
        assert_eq!(rows.len(), 5);
        assert_eq!(
            rows.last(),
            Some(&GridRow::Loading {
                row: grid.window().row(4),
                columns: 6
            })
        );
    }

    #[test]
    fn test_fetch_trigger_near_end() {
        let data = books(100);
        // 1 column, 400px rows, 800px viewport: 100 data rows
        let mut grid = BookGrid::new(Some(500), 800, DEFAULT_OVERSCAN);
        grid.sync(data.len(), true, false);

        assert!(!grid.should_fetch_next(true, false));

        // Visible rows 95..97, overscan reaches row 99
        grid.scroll_to(95 * 400);
        assert!(grid.should_fetch_next(true, false));
        assert!(!grid.should_fetch_next(true, true));
        assert!(!grid.should_fetch_next(false, false));
    }

    #[test]
    fn test_fetch_trigger_uses_overscan() {
        let data = books(10);
        let mut grid = BookGrid::new(Some(500), 800, DEFAULT_OVERSCAN);
        grid.sync(data.len(), true, false);

        // Visible rows 5..7; overscan 3 reaches row 9, the last data row
        grid.scroll_to(5 * 400);
        assert!(grid.should_fetch_next(true, false));

        grid.scroll_to(4 * 400 - 1);
        assert!(!grid.should_fetch_next(true, false));
    }

    #[test]
    fn test_resize_recomputes_rows() {
        let data = books(12);
        let mut grid = BookGrid::new(Some(1400), 900, DEFAULT_OVERSCAN);
        grid.sync(data.len(), false, false);
        assert_eq!(grid.data_rows(), 2);

        grid.resize(Some(600), 900);
        assert_eq!(grid.layout().columns, 1);
        assert_eq!(grid.window().row_height(), 400);
        assert_eq!(grid.data_rows(), 12);
    }

    #[test]
    fn test_empty_grid_never_triggers() {
        let grid = BookGrid::new(Some(1024), 900, DEFAULT_OVERSCAN);
        assert!(grid.rows(&[]).is_empty());
        assert!(!grid.should_fetch_next(true, false));
    }
}
