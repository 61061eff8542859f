//! Terminal UI utilities.
//!
//! Colored status output, spinners and text fitting shared by the card,
//! the route pages and the library screen.

pub mod card;
pub mod pages;

pub use card::BookCard;
pub use owo_colors::OwoColorize;
pub use pages::Route;

use std::io::IsTerminal;
use std::time::Duration;

/// Approximate width of one terminal cell in pixels
pub const CELL_WIDTH_PX: u32 = 8;

/// Approximate height of one terminal line in pixels
pub const CELL_HEIGHT_PX: u32 = 20;

/// Get the current terminal width.
pub fn terminal_width() -> usize {
    terminal_size::terminal_size()
        .map(|(w, _)| w.0 as usize)
        .unwrap_or(100)
}

/// Check if stdout is a terminal.
pub fn is_terminal() -> bool {
    std::io::stdout().is_terminal()
}

/// Terminal size expressed as a pixel viewport.
///
/// Width is `None` when stdout is not a terminal, which makes the grid fall
/// back to its default layout.
pub fn terminal_viewport() -> (Option<u32>, Option<u32>) {
    match terminal_size::terminal_size() {
        Some((w, h)) => (
            Some(w.0 as u32 * CELL_WIDTH_PX),
            Some(h.0 as u32 * CELL_HEIGHT_PX),
        ),
        None => (None, None),
    }
}

/// Status icons for different operations.
pub fn status_icon(status: Status) -> &'static str {
    match status {
        Status::Success => "✓",
        Status::Error => "✗",
        Status::Warning => "⚠",
        Status::Info => "ℹ",
        Status::Loading => "◐",
        Status::Search => "🔍",
    }
}

/// Status types for colored output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    Error,
    Warning,
    Info,
    Loading,
    Search,
}

/// Print a styled status message.
#[macro_export]
macro_rules! print_status {
    ($status:expr, $msg:expr) => {{
        use $crate::ui::{status_icon, OwoColorize, Status};
        let icon = status_icon($status);
        match $status {
            Status::Success => println!("{} {}", icon.green().bold(), $msg),
            Status::Error => println!("{} {}", icon.red().bold(), $msg),
            Status::Warning => println!("{} {}", icon.yellow().bold(), $msg),
            Status::Info => println!("{} {}", icon.cyan().bold(), $msg),
            Status::Loading => println!("{} {}", icon.cyan(), $msg),
            Status::Search => println!("{} {}", icon.yellow(), $msg),
        }
    }};
}

/// Print a section header.
pub fn print_section(title: &str) {
    println!();
    println!("{}", format!("━━━ {} ━━━", title).bold().cyan());
}

/// Format a number with commas.
pub fn format_number(n: u64) -> String {
    n.to_string()
        .chars()
        .rev()
        .collect::<Vec<_>>()
        .chunks(3)
        .map(|c| c.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(",")
        .chars()
        .rev()
        .collect()
}

/// Truncate text to fit within the specified width using unicode-aware truncation.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width <= 3 {
        return "...".to_string();
    }

    // Wide characters take two cells
    let char_widths: Vec<(char, usize)> = text
        .chars()
        .map(|c| (c, unicode_width::UnicodeWidthChar::width(c).unwrap_or(1)))
        .collect();

    let total_width: usize = char_widths.iter().map(|(_, w)| *w).sum();

    if total_width <= max_width {
        return text.to_string();
    }

    let mut current_width = 0;
    let mut end_idx = 0;

    for (i, (_, w)) in char_widths.iter().enumerate() {
        if current_width + w > max_width.saturating_sub(3) {
            break;
        }
        current_width += w;
        end_idx = i + 1;
    }

    if end_idx == 0 {
        return "...".to_string();
    }

    let truncated: String = char_widths[..end_idx].iter().map(|(c, _)| *c).collect();
    format!("{}...", truncated.trim_end())
}

/// Wrap text onto at most `max_lines` lines of `width` cells, ellipsizing
/// the last line if text remains.
pub fn clamp_lines(text: &str, width: usize, max_lines: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut words = text.split_whitespace().peekable();

    while let Some(word) = words.next() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", current, word)
        };

        if unicode_width::UnicodeWidthStr::width(candidate.as_str()) <= width
            || current.is_empty()
        {
            current = candidate;
            continue;
        }

        if lines.len() + 1 == max_lines {
            let rest: Vec<&str> = std::iter::once(word).chain(words).collect();
            let overflow = format!("{} {}", current, rest.join(" "));
            lines.push(truncate_with_ellipsis(&overflow, width));
            return lines;
        }
        lines.push(truncate_with_ellipsis(&current, width));
        current = word.to_string();
    }

    if !current.is_empty() && lines.len() < max_lines {
        lines.push(truncate_with_ellipsis(&current, width));
    }
    lines
}

/// Print a loading spinner with message.
pub struct Spinner {
    pb: indicatif::ProgressBar,
}

impl Spinner {
    /// Create a new spinner with the given message.
    pub fn new(msg: &str) -> Self {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg}")
                .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner())
                .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ "),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));

        Self { pb }
    }

    /// Finish with error message.
    pub fn finish_with_error(&self, msg: &str) {
        self.finish_styled("{spinner:.red} {msg}", "✗", msg);
    }

    fn finish_styled(&self, template: &str, tick: &str, msg: &str) {
        if let Ok(style) = indicatif::ProgressStyle::with_template(template) {
            self.pb.set_style(style.tick_chars(&format!("{tick}{tick}")));
        }
        self.pb.finish_with_message(msg.to_string());
    }

    /// Stop and erase the spinner.
    pub fn clear(&self) {
        self.pb.finish_and_clear();
    }
}
