//! Fixed visual style of generated reports

/// A4 in points
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;

pub const MARGIN_LEFT: f32 = 72.0;
pub const MARGIN_RIGHT: f32 = 72.0;
pub const MARGIN_TOP: f32 = 72.0;
pub const MARGIN_BOTTOM: f32 = 18.0;

pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;

pub const PRIMARY_COLOR: &str = "#667eea";
pub const SECONDARY_COLOR: &str = "#764ba2";
pub const INFO_TEXT_COLOR: &str = "#333333";
pub const TABLE_HEADER_FILL: &str = "#f0f0f0";
pub const GRID_COLOR: &str = "#808080";
pub const BODY_COLOR: &str = "#000000";

/// Series colours of vector charts, cycled
pub const SERIES_PALETTE: [&str; 6] = [
    "#667eea", "#764ba2", "#f093fb", "#4facfe", "#43e97b", "#fa709a",
];

pub const TITLE_SIZE: f32 = 24.0;
pub const HEADING_SIZE: f32 = 18.0;
pub const BODY_SIZE: f32 = 12.0;
pub const TABLE_SIZE: f32 = 10.0;
pub const CHART_LABEL_SIZE: f32 = 8.0;

pub const LEADING: f32 = 1.2;
pub const SECTION_SPACER: f32 = 20.0;

pub const INFO_COLUMNS: [f32; 2] = [150.0, 350.0];
pub const METRIC_COLUMNS: [f32; 3] = [200.0, 100.0, 50.0];
pub const CELL_PADDING: f32 = 4.0;

pub const CHART_WIDTH: f32 = 450.0;
pub const CHART_HEIGHT: f32 = 300.0;

/// Every string drawn is encoded with this
pub const TEXT_ENCODING: &str = "WinAnsiEncoding";

/// Font resources shared by every page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    /// Paragraphs, table values
    Body,
    /// Info labels, table headers, chart titles
    Bold,
    /// Document title
    Title,
    /// Section headings, kept on a resource of their own so they can be
    /// found again when reading a report back
    Heading,
}

impl Font {
    pub const ALL: [Font; 4] = [Font::Body, Font::Bold, Font::Title, Font::Heading];

    pub fn resource_name(self) -> &'static str {
        match self {
            Font::Body => "F1",
            Font::Bold => "F2",
            Font::Title => "FT",
            Font::Heading => "FH",
        }
    }

    pub fn base_font(self) -> &'static str {
        match self {
            Font::Body => "Helvetica",
            Font::Bold | Font::Title | Font::Heading => "Helvetica-Bold",
        }
    }

    fn widths(self) -> &'static [u16; 95] {
        match self {
            Font::Body => &HELVETICA_WIDTHS,
            _ => &HELVETICA_BOLD_WIDTHS,
        }
    }

    /// Advance width of `text` at `size`, from the standard AFM metrics
    pub fn text_width(self, text: &str, size: f32) -> f32 {
        let widths = self.widths();
        let units: u32 = text
            .chars()
            .map(|c| match c as u32 {
                code @ 32..=126 => widths[(code - 32) as usize] as u32,
                _ => DEFAULT_GLYPH_WIDTH,
            })
            .sum();
        units as f32 * size / 1000.0
    }
}

const DEFAULT_GLYPH_WIDTH: u32 = 556;

#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Parse `#rrggbb` into 0-1 RGB components; anything else is black
pub fn parse_hex_color(color: &str) -> (f32, f32, f32) {
    let hex = color.trim_start_matches('#');
    if hex.len() >= 6 && hex.is_ascii() {
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).unwrap_or(0) as f32 / 255.0
        };
        (channel(0..2), channel(2..4), channel(4..6))
    } else {
        (0.0, 0.0, 0.0)
    }
}

/// Greedy word wrap at `max_width`
///
/// Explicit newlines always break, blank lines are kept as empty strings and
/// words wider than a whole line are split between characters.
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{} {}", line, word)
            };
            if font.text_width(&candidate, size) <= max_width {
                line = candidate;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if font.text_width(word, size) <= max_width {
                line = word.to_string();
            } else {
                for c in word.chars() {
                    let mut next = line.clone();
                    next.push(c);
                    if !line.is_empty() && font.text_width(&next, size) > max_width {
                        lines.push(std::mem::take(&mut line));
                        line.push(c);
                    } else {
                        line = next;
                    }
                }
            }
        }
        lines.push(line);
    }

    lines
}
