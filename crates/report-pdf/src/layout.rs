//! Page canvas: collects content operations page by page and tracks the
//! vertical cursor used for pagination

use lopdf::content::Operation;
use lopdf::{Document, Object, Stream, StringFormat};

use crate::style::{parse_hex_color, Font, MARGIN_BOTTOM, MARGIN_TOP, PAGE_HEIGHT, TEXT_ENCODING};

/// Image XObject waiting to be written, with its resource name
pub struct PlacedImage {
    pub name: String,
    pub stream: Stream,
}

pub struct PageCanvas {
    pages: Vec<Vec<Operation>>,
    images: Vec<PlacedImage>,
    cursor: f32,
}

fn real(value: f32) -> Object {
    Object::Real(value)
}

impl PageCanvas {
    pub fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            images: Vec::new(),
            cursor: Self::top(),
        }
    }

    fn top() -> f32 {
        PAGE_HEIGHT - MARGIN_TOP
    }

    /// Current y position, in PDF space (origin bottom-left)
    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    pub fn advance(&mut self, dy: f32) {
        self.cursor -= dy;
    }

    /// 0-based index of the page being drawn on
    pub fn page_index(&self) -> usize {
        self.pages.len() - 1
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn at_page_top(&self) -> bool {
        self.cursor >= Self::top()
    }

    pub fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.cursor = Self::top();
    }

    /// Start a new page unless `height` still fits above the bottom margin.
    /// A fresh page never breaks again, so oversized blocks overflow instead
    /// of looping.
    pub fn ensure_space(&mut self, height: f32) {
        if self.cursor - height < MARGIN_BOTTOM && !self.at_page_top() {
            self.new_page();
        }
    }

    fn push(&mut self, op: &str, operands: Vec<Object>) {
        if let Some(page) = self.pages.last_mut() {
            page.push(Operation::new(op, operands));
        }
    }

    fn fill_color(&mut self, color: &str) {
        let (r, g, b) = parse_hex_color(color);
        self.push("rg", vec![real(r), real(g), real(b)]);
    }

    fn stroke_color(&mut self, color: &str) {
        let (r, g, b) = parse_hex_color(color);
        self.push("RG", vec![real(r), real(g), real(b)]);
    }

    /// One BT..ET block with a single string, `y` is the baseline
    pub fn text(&mut self, font: Font, size: f32, color: &str, x: f32, y: f32, text: &str) {
        self.push("BT", vec![]);
        self.push(
            "Tf",
            vec![Object::Name(font.resource_name().as_bytes().to_vec()), real(size)],
        );
        self.fill_color(color);
        self.push("Td", vec![real(x), real(y)]);
        self.push(
            "Tj",
            vec![Object::String(
                Document::encode_text(Some(TEXT_ENCODING), text),
                StringFormat::Literal,
            )],
        );
        self.push("ET", vec![]);
    }

    /// Several lines in one BT..ET block, `leading` apart, the first baseline
    /// at `y`
    pub fn text_lines(
        &mut self,
        font: Font,
        size: f32,
        color: &str,
        (x, y): (f32, f32),
        leading: f32,
        lines: &[String],
    ) {
        self.push("BT", vec![]);
        self.push(
            "Tf",
            vec![Object::Name(font.resource_name().as_bytes().to_vec()), real(size)],
        );
        self.fill_color(color);
        self.push("Td", vec![real(x), real(y)]);
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                self.push("Td", vec![real(0.0), real(-leading)]);
            }
            self.push(
                "Tj",
                vec![Object::String(
                    Document::encode_text(Some(TEXT_ENCODING), line),
                    StringFormat::Literal,
                )],
            );
        }
        self.push("ET", vec![]);
    }

    pub fn fill_rect(&mut self, color: &str, x: f32, y: f32, width: f32, height: f32) {
        self.fill_color(color);
        self.push("re", vec![real(x), real(y), real(width), real(height)]);
        self.push("f", vec![]);
    }

    pub fn stroke_rect(
        &mut self,
        color: &str,
        line_width: f32,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    ) {
        self.stroke_color(color);
        self.push("w", vec![real(line_width)]);
        self.push("re", vec![real(x), real(y), real(width), real(height)]);
        self.push("S", vec![]);
    }

    fn path(&mut self, points: &[(f32, f32)]) {
        for (i, &(x, y)) in points.iter().enumerate() {
            let op = if i == 0 { "m" } else { "l" };
            self.push(op, vec![real(x), real(y)]);
        }
    }

    pub fn polyline(&mut self, color: &str, line_width: f32, points: &[(f32, f32)]) {
        if points.len() < 2 {
            return;
        }
        self.stroke_color(color);
        self.push("w", vec![real(line_width)]);
        self.path(points);
        self.push("S", vec![]);
    }

    pub fn fill_polygon(&mut self, color: &str, points: &[(f32, f32)]) {
        if points.len() < 3 {
            return;
        }
        self.fill_color(color);
        self.path(points);
        self.push("h", vec![]);
        self.push("f", vec![]);
    }

    /// Register an image XObject and paint it into the given box
    pub fn image(&mut self, stream: Stream, x: f32, y: f32, width: f32, height: f32) {
        let name = format!("Im{}", self.images.len() + 1);
        self.push("q", vec![]);
        self.push(
            "cm",
            vec![real(width), real(0.0), real(0.0), real(height), real(x), real(y)],
        );
        self.push("Do", vec![Object::Name(name.as_bytes().to_vec())]);
        self.push("Q", vec![]);
        self.images.push(PlacedImage { name, stream });
    }

    pub fn finish(self) -> (Vec<Vec<Operation>>, Vec<PlacedImage>) {
        (self.pages, self.images)
    }
}

impl Default for PageCanvas {
    fn default() -> Self {
        Self::new()
    }
}
