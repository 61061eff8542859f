//! Responsive grid geometry.

/// Columns used when the viewport width is unknown
pub const FALLBACK_COLUMNS: usize = 4;

/// Row height used when the viewport width is unknown
pub const FALLBACK_ROW_HEIGHT: u32 = 480;

/// Column count for a viewport width in pixels.
///
/// | width      | columns |
/// |------------|---------|
/// | < 640      | 1       |
/// | ≥ 640      | 2       |
/// | ≥ 768      | 3       |
/// | ≥ 1024     | 4       |
/// | ≥ 1200     | 5       |
/// | ≥ 1400     | 6       |
pub fn column_count(width: u32) -> usize {
    match width {
        1400.. => 6,
        1200.. => 5,
        1024.. => 4,
        768.. => 3,
        640.. => 2,
        _ => 1,
    }
}

/// Row height in pixels for a viewport width
pub fn row_height(width: u32) -> u32 {
    if width >= 640 {
        440
    } else {
        400
    }
}

/// Column count and row height for one viewport width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridLayout {
    pub columns: usize,
    pub row_height: u32,
}

impl GridLayout {
    /// Layout for a known or unknown viewport width
    pub fn for_width(width: Option<u32>) -> Self {
        match width {
            Some(w) => Self {
                columns: column_count(w),
                row_height: row_height(w),
            },
            None => Self::default(),
        }
    }

    /// Number of rows needed for `items` items
    pub fn rows_for(&self, items: usize) -> usize {
        items.div_ceil(self.columns)
    }

    /// Index range into the flat item list covered by a row
    pub fn row_span(&self, row: usize, items: usize) -> std::ops::Range<usize> {
        let start = (row * self.columns).min(items);
        let end = (start + self.columns).min(items);
        start..end
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            columns: FALLBACK_COLUMNS,
            row_height: FALLBACK_ROW_HEIGHT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_breakpoints() {
        let cases = [
            (0, 1),
            (320, 1),
            (639, 1),
            (640, 2),
            (767, 2),
            (768, 3),
            (1023, 3),
            (1024, 4),
            (1199, 4),
            (1200, 5),
            (1399, 5),
            (1400, 6),
            (3840, 6),
        ];
        for (width, columns) in cases {
            assert_eq!(column_count(width), columns, "width {width}");
        }
    }

    #[test]
    fn test_column_count_monotonic() {
        let mut prev = column_count(0);
        for width in (0..2000).step_by(7) {
            let c = column_count(width);
            assert!(c >= prev);
            prev = c;
        }
    }

    #[test]
    fn test_row_height_breakpoints() {
        assert_eq!(row_height(375), 400);
        assert_eq!(row_height(639), 400);
        assert_eq!(row_height(640), 440);
        assert_eq!(row_height(1920), 440);
    }

    #[test]
    fn test_unknown_width_fallback() {
        let layout = GridLayout::for_width(None);
        assert_eq!(layout.columns, 4);
        assert_eq!(layout.row_height, 480);
    }

    #[test]
    fn test_rows_and_spans() {
        let layout = GridLayout::for_width(Some(800)); // 3 columns
        assert_eq!(layout.rows_for(0), 0);
        assert_eq!(layout.rows_for(3), 1);
        assert_eq!(layout.rows_for(7), 3);
        assert_eq!(layout.row_span(2, 7), 6..7);
        assert_eq!(layout.row_span(5, 7), 7..7);
    }
}
