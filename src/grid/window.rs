//! Windowing over fixed-height rows.
//!
//! Only rows that intersect the viewport, plus `overscan` rows on each side,
//! are ever materialized. Every computation here is O(1) in the number of
//! rows, so render cost depends on the viewport and not on how many books
//! have been loaded.

use std::cmp;

/// A half-open range of row indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowRange {
    pub start_index: usize,
    pub end_index: usize, // exclusive
}

impl RowRange {
    pub const EMPTY: RowRange = RowRange {
        start_index: 0,
        end_index: 0,
    };

    pub fn is_empty(&self) -> bool {
        self.start_index >= self.end_index
    }

    pub fn len(&self) -> usize {
        self.end_index.saturating_sub(self.start_index)
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start_index && index < self.end_index
    }
}

/// A row positioned in the scroll axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualRow {
    pub index: usize,
    /// Offset of the row's top edge from the top of the list
    pub start: u64,
    pub size: u32,
}

impl VirtualRow {
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size as u64)
    }
}

/// Scroll window over `count` rows of equal height
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowWindow {
    count: usize,
    row_height: u32,
    overscan: usize,
    viewport_height: u32,
    scroll_offset: u64,
}

impl RowWindow {
    pub fn new(count: usize, row_height: u32, overscan: usize) -> Self {
        Self {
            count,
            row_height,
            overscan,
            viewport_height: 0,
            scroll_offset: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn row_height(&self) -> u32 {
        self.row_height
    }

    pub fn overscan(&self) -> usize {
        self.overscan
    }

    pub fn viewport_height(&self) -> u32 {
        self.viewport_height
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn set_count(&mut self, count: usize) {
        self.count = count;
        self.clamp_scroll();
    }

    /// Re-measure rows after a layout change
    pub fn set_row_height(&mut self, row_height: u32) {
        self.row_height = row_height;
        self.clamp_scroll();
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height;
        self.clamp_scroll();
    }

    /// Height of all rows together
    pub fn total_size(&self) -> u64 {
        self.count as u64 * self.row_height as u64
    }

    /// Largest valid scroll offset
    pub fn max_scroll(&self) -> u64 {
        self.total_size().saturating_sub(self.viewport_height as u64)
    }

    /// Scroll to an absolute offset, clamped to the scrollable extent
    pub fn scroll_to(&mut self, offset: u64) {
        self.scroll_offset = cmp::min(offset, self.max_scroll());
    }

    /// Scroll by a signed delta
    pub fn scroll_by(&mut self, delta: i64) {
        let target = if delta >= 0 {
            self.scroll_offset.saturating_add(delta as u64)
        } else {
            self.scroll_offset.saturating_sub(delta.unsigned_abs())
        };
        self.scroll_to(target);
    }

    fn clamp_scroll(&mut self) {
        self.scroll_offset = cmp::min(self.scroll_offset, self.max_scroll());
    }

    /// Rows intersecting the viewport, without overscan
    pub fn visible_range(&self) -> RowRange {
        if self.count == 0 || self.row_height == 0 || self.viewport_height == 0 {
            return RowRange::EMPTY;
        }
        let h = self.row_height as u64;
        let top = self.scroll_offset;
        let bottom = top.saturating_add(self.viewport_height as u64);

        let start_index = cmp::min((top / h) as usize, self.count);
        let end_index = cmp::min(bottom.div_ceil(h) as usize, self.count);
        RowRange {
            start_index,
            end_index,
        }
    }

    /// Rows to render: the visible range widened by overscan
    pub fn virtual_range(&self) -> RowRange {
        let visible = self.visible_range();
        if visible.is_empty() {
            return RowRange::EMPTY;
        }
        RowRange {
            start_index: visible.start_index.saturating_sub(self.overscan),
            end_index: cmp::min(self.count, visible.end_index.saturating_add(self.overscan)),
        }
    }

    /// Position of a single row
    pub fn row(&self, index: usize) -> VirtualRow {
        VirtualRow {
            index,
            start: index as u64 * self.row_height as u64,
            size: self.row_height,
        }
    }

    /// Rows to render, in order
    pub fn virtual_rows(&self) -> impl Iterator<Item = VirtualRow> + '_ {
        let range = self.virtual_range();
        (range.start_index..range.end_index).map(move |i| self.row(i))
    }

    /// Index of the last rendered row
    pub fn last_virtual_index(&self) -> Option<usize> {
        let range = self.virtual_range();
        if range.is_empty() {
            None
        } else {
            Some(range.end_index - 1)
        }
    }
}
