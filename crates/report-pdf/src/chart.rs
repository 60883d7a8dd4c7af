//! Chart rendering: vector plots drawn from series data, or a PNG embedded
//! as an image XObject

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Object, Stream};
use shared_types::{ChartKind, ChartSpec};
use tracing::warn;

use crate::error::ReportError;
use crate::layout::PageCanvas;
use crate::style::{
    Font, CHART_HEIGHT, CHART_LABEL_SIZE, CHART_WIDTH, GRID_COLOR, SERIES_PALETTE,
};

const FRAME_COLOR: &str = "#dddddd";
const LABEL_COLOR: &str = "#555555";
const TITLE_SIZE: f32 = 11.0;
const TICKS: usize = 5;
const MAX_TICKS: usize = 20;
/// Pie wedges are approximated by chords of at most this many degrees
const ARC_STEP_DEGREES: f32 = 5.0;

struct PlotArea {
    left: f32,
    right: f32,
    bottom: f32,
    top: f32,
    axis: Axis,
}

impl PlotArea {
    fn y_of(&self, value: f64) -> f32 {
        let span = self.axis.hi - self.axis.lo;
        let value = value.clamp(self.axis.lo, self.axis.hi);
        self.bottom + ((value - self.axis.lo) / span) as f32 * (self.top - self.bottom)
    }

    fn baseline(&self) -> f32 {
        self.y_of(0.0_f64.clamp(self.axis.lo, self.axis.hi))
    }

    fn width(&self) -> f32 {
        self.right - self.left
    }
}

fn series_color(index: usize) -> &'static str {
    SERIES_PALETTE[index % SERIES_PALETTE.len()]
}

/// Value axis: always includes zero, `lo < hi`, and at most `MAX_TICKS`
/// steps between them
#[derive(Debug, Clone, Copy, PartialEq)]
struct Axis {
    lo: f64,
    hi: f64,
    step: f64,
    ticks: usize,
}

impl Axis {
    const FALLBACK: Axis = Axis {
        lo: 0.0,
        hi: 1.0,
        step: 0.2,
        ticks: TICKS,
    };

    /// `values` must be finite and non-empty
    fn for_values(values: &[f64]) -> Self {
        let min = values.iter().cloned().fold(f64::INFINITY, f64::min).min(0.0);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max).max(0.0);
        let max = if max > min { max } else { min + 1.0 };
        let step = nice_step((max - min) / TICKS as f64);
        let lo = (min / step).floor() * step;
        let hi = (max / step).ceil() * step;
        let span = hi - lo;
        if !span.is_finite() || span <= 0.0 || !step.is_finite() {
            return Self::FALLBACK;
        }
        let ticks = (span / step).round();
        if !(1.0..=MAX_TICKS as f64).contains(&ticks) {
            return Self::FALLBACK;
        }
        Self {
            lo,
            hi,
            step,
            ticks: ticks as usize,
        }
    }

    fn tick(&self, k: usize) -> f64 {
        self.lo + k as f64 * self.step
    }
}

/// Round a raw tick step up to 1, 2 or 5 times a power of ten
fn nice_step(raw: f64) -> f64 {
    if raw <= 0.0 || !raw.is_finite() {
        return 1.0;
    }
    let magnitude = 10f64.powf(raw.log10().floor());
    let normalized = raw / magnitude;
    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    nice * magnitude
}

fn format_tick(value: f64, step: f64) -> String {
    if step >= 1.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.1}", value)
    }
}

/// Shorten a label with a trailing ".." until it fits `max_width`
fn fit_label(label: &str, max_width: f32) -> String {
    if Font::Body.text_width(label, CHART_LABEL_SIZE) <= max_width {
        return label.to_string();
    }
    let mut chars: Vec<char> = label.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>() + "..";
        if Font::Body.text_width(&candidate, CHART_LABEL_SIZE) <= max_width {
            return candidate;
        }
    }
    String::new()
}

fn centered_text(
    canvas: &mut PageCanvas,
    font: Font,
    size: f32,
    color: &str,
    cx: f32,
    y: f32,
    text: &str,
) {
    let width = font.text_width(text, size);
    canvas.text(font, size, color, cx - width / 2.0, y, text);
}

/// Draw `spec` into the fixed chart box whose lower-left corner is `(x, y)`
pub fn draw_plot(canvas: &mut PageCanvas, spec: &ChartSpec, x: f32, y: f32) {
    canvas.stroke_rect(FRAME_COLOR, 0.5, x, y, CHART_WIDTH, CHART_HEIGHT);

    if let Some(title) = &spec.title {
        centered_text(
            canvas,
            Font::Bold,
            TITLE_SIZE,
            LABEL_COLOR,
            x + CHART_WIDTH / 2.0,
            y + CHART_HEIGHT - 18.0,
            title,
        );
    }

    let drawn = match spec.kind {
        ChartKind::Pie => draw_pie(canvas, spec, x, y),
        ChartKind::Line | ChartKind::Area | ChartKind::Bar => draw_axes_chart(canvas, spec, x, y),
    };
    if !drawn {
        centered_text(
            canvas,
            Font::Body,
            TITLE_SIZE,
            LABEL_COLOR,
            x + CHART_WIDTH / 2.0,
            y + CHART_HEIGHT / 2.0,
            "No data",
        );
    }
}

fn draw_axes_chart(canvas: &mut PageCanvas, spec: &ChartSpec, x: f32, y: f32) -> bool {
    let values: Vec<f64> = spec
        .series
        .iter()
        .flat_map(|s| s.values.iter())
        .cloned()
        .filter(|v| v.is_finite())
        .collect();
    let slots = spec
        .series
        .iter()
        .map(|s| s.values.len())
        .max()
        .unwrap_or(0)
        .max(spec.categories.len());
    if values.is_empty() || slots == 0 {
        return false;
    }

    let area = PlotArea {
        left: x + 45.0,
        right: x + CHART_WIDTH - 15.0,
        bottom: y + 50.0,
        top: y + CHART_HEIGHT - 35.0,
        axis: Axis::for_values(&values),
    };

    // horizontal grid with value labels
    for k in 0..=area.axis.ticks {
        let tick = area.axis.tick(k);
        let ty = area.y_of(tick);
        canvas.polyline(FRAME_COLOR, 0.5, &[(area.left, ty), (area.right, ty)]);
        let label = format_tick(tick, area.axis.step);
        let width = Font::Body.text_width(&label, CHART_LABEL_SIZE);
        canvas.text(
            Font::Body,
            CHART_LABEL_SIZE,
            LABEL_COLOR,
            area.left - 4.0 - width,
            ty - 3.0,
            &label,
        );
    }
    canvas.polyline(
        GRID_COLOR,
        1.0,
        &[
            (area.left, area.top),
            (area.left, area.bottom),
            (area.right, area.bottom),
        ],
    );

    let bars = spec.kind == ChartKind::Bar;
    let slot_width = area.width() / slots as f32;
    let x_of = |i: usize| -> f32 {
        if bars || slots == 1 {
            area.left + (i as f32 + 0.5) * slot_width
        } else {
            area.left + i as f32 * area.width() / (slots - 1) as f32
        }
    };

    for (i, category) in spec.categories.iter().enumerate() {
        let label = fit_label(category, slot_width.max(20.0));
        let width = Font::Body.text_width(&label, CHART_LABEL_SIZE);
        let (lx, ly) = (x_of(i) - width / 2.0, area.bottom - 12.0);
        canvas.text(Font::Body, CHART_LABEL_SIZE, LABEL_COLOR, lx, ly, &label);
    }

    let series_count = spec.series.len().max(1);
    for (s, series) in spec.series.iter().enumerate() {
        let color = series_color(s);
        let points: Vec<(f32, f32)> = series
            .values
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .map(|(i, &v)| (x_of(i), area.y_of(v)))
            .collect();

        match spec.kind {
            ChartKind::Bar => {
                let group = slot_width * 0.8;
                let bar = group / series_count as f32;
                let base = area.baseline();
                for (i, &v) in series.values.iter().enumerate() {
                    if !v.is_finite() {
                        continue;
                    }
                    let top = area.y_of(v);
                    let left = x_of(i) - group / 2.0 + s as f32 * bar;
                    canvas.fill_rect(color, left, top.min(base), bar, (top - base).abs());
                }
            }
            ChartKind::Area => {
                if let (Some(first), Some(last)) = (points.first(), points.last()) {
                    let base = area.baseline();
                    let mut polygon = points.clone();
                    polygon.push((last.0, base));
                    polygon.push((first.0, base));
                    canvas.fill_polygon(SERIES_PALETTE[(s + 2) % SERIES_PALETTE.len()], &polygon);
                }
                canvas.polyline(color, 2.0, &points);
            }
            _ => {
                canvas.polyline(color, 2.0, &points);
                for &(px, py) in &points {
                    canvas.fill_rect(color, px - 2.0, py - 2.0, 4.0, 4.0);
                }
            }
        }
    }

    draw_legend(
        canvas,
        spec.series.iter().map(|s| s.name.clone()).collect(),
        area.left,
        y + 12.0,
    );
    true
}

fn draw_legend(canvas: &mut PageCanvas, names: Vec<String>, mut x: f32, y: f32) {
    for (i, name) in names.iter().enumerate() {
        canvas.fill_rect(series_color(i), x, y, 8.0, 8.0);
        canvas.text(Font::Body, CHART_LABEL_SIZE, LABEL_COLOR, x + 11.0, y + 1.0, name);
        x += 11.0 + Font::Body.text_width(name, CHART_LABEL_SIZE) + 14.0;
    }
}

fn draw_pie(canvas: &mut PageCanvas, spec: &ChartSpec, x: f32, y: f32) -> bool {
    let Some(series) = spec.series.first() else {
        return false;
    };
    let slices: Vec<(String, f64)> = series
        .values
        .iter()
        .enumerate()
        .filter(|(_, v)| v.is_finite() && **v > 0.0)
        .map(|(i, &v)| {
            let label = spec
                .categories
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("#{}", i + 1));
            (label, v)
        })
        .collect();
    if series.values.len() != slices.len() {
        warn!(
            skipped = series.values.len() - slices.len(),
            "pie chart ignores non-positive values"
        );
    }
    // shares of the largest slice keep the sum finite
    let peak = slices.iter().map(|(_, v)| *v).fold(0.0, f64::max);
    let shares: Vec<(String, f32)> = slices
        .into_iter()
        .map(|(label, v)| (label, (v / peak) as f32))
        .collect();
    let total: f32 = shares.iter().map(|(_, v)| v).sum();
    if shares.is_empty() || total <= 0.0 {
        return false;
    }

    let radius = 100.0;
    let cx = x + 40.0 + radius;
    let cy = y + (CHART_HEIGHT - 30.0) / 2.0;
    let mut angle = 90.0_f32;

    for (i, (_, value)) in shares.iter().enumerate() {
        let sweep = value / total * 360.0;
        let steps = (sweep / ARC_STEP_DEGREES).ceil().max(1.0) as usize;
        let mut wedge = vec![(cx, cy)];
        for k in 0..=steps {
            let a = (angle - sweep * k as f32 / steps as f32).to_radians();
            wedge.push((cx + radius * a.cos(), cy + radius * a.sin()));
        }
        canvas.fill_polygon(series_color(i), &wedge);
        angle -= sweep;
    }

    let legend_x = cx + radius + 40.0;
    let mut legend_y = cy + shares.len() as f32 * 8.0;
    for (i, (label, value)) in shares.iter().enumerate() {
        canvas.fill_rect(series_color(i), legend_x, legend_y, 8.0, 8.0);
        let text = format!("{} ({:.1}%)", label, value / total * 100.0);
        let (tx, ty) = (legend_x + 11.0, legend_y + 1.0);
        canvas.text(Font::Body, CHART_LABEL_SIZE, LABEL_COLOR, tx, ty, &text);
        legend_y -= 16.0;
    }
    true
}

/// A decoded PNG ready to become an image XObject
pub struct ChartImage {
    pub width: u32,
    pub height: u32,
    color_space: &'static str,
    pixels: Vec<u8>,
    alpha: Option<Vec<u8>>,
}

impl ChartImage {
    pub fn decode_png(bytes: &[u8]) -> Result<Self, ReportError> {
        let mut decoder = png::Decoder::new(bytes);
        decoder.set_transformations(png::Transformations::normalize_to_color8());
        let mut reader = decoder
            .read_info()
            .map_err(|e| ReportError::InvalidImage(e.to_string()))?;
        let mut buf = vec![0; reader.output_buffer_size()];
        let info = reader
            .next_frame(&mut buf)
            .map_err(|e| ReportError::InvalidImage(e.to_string()))?;
        buf.truncate(info.buffer_size());

        let (color_space, channels, has_alpha) = match info.color_type {
            png::ColorType::Rgb => ("DeviceRGB", 3, false),
            png::ColorType::Rgba => ("DeviceRGB", 4, true),
            png::ColorType::Grayscale => ("DeviceGray", 1, false),
            png::ColorType::GrayscaleAlpha => ("DeviceGray", 2, true),
            png::ColorType::Indexed => {
                return Err(ReportError::InvalidImage(
                    "indexed colour was not expanded".to_string(),
                ))
            }
        };

        let (pixels, alpha) = if has_alpha {
            let mut pixels = Vec::with_capacity(buf.len());
            let mut alpha = Vec::with_capacity(buf.len() / channels);
            for px in buf.chunks_exact(channels) {
                pixels.extend_from_slice(&px[..channels - 1]);
                alpha.push(px[channels - 1]);
            }
            (pixels, Some(alpha))
        } else {
            (buf, None)
        };

        Ok(Self {
            width: info.width,
            height: info.height,
            color_space,
            pixels,
            alpha,
        })
    }

    fn image_stream(&self, color_space: &str, data: &[u8]) -> Result<Stream, ReportError> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data)?;
        let compressed = encoder.finish()?;
        let dict = dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => self.width as i64,
            "Height" => self.height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        };
        Ok(Stream::new(dict, compressed).with_compression(false))
    }

    /// The image XObject; the soft mask, when present, must be added to the
    /// document first and its id passed in
    pub fn xobject(&self, smask: Option<lopdf::ObjectId>) -> Result<Stream, ReportError> {
        let mut stream = self.image_stream(self.color_space, &self.pixels)?;
        if let Some(id) = smask {
            stream.dict.set("SMask", Object::Reference(id));
        }
        Ok(stream)
    }

    pub fn smask(&self) -> Result<Option<Stream>, ReportError> {
        self.alpha
            .as_ref()
            .map(|alpha| self.image_stream("DeviceGray", alpha))
            .transpose()
    }
}

#[cfg(test)]
pub(crate) fn encode_test_png(width: u32, height: u32, color: png::ColorType) -> Vec<u8> {
    let channels = match color {
        png::ColorType::Rgb => 3,
        png::ColorType::Rgba => 4,
        png::ColorType::GrayscaleAlpha => 2,
        _ => 1,
    };
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        let data: Vec<u8> = (0..width * height * channels).map(|i| (i % 251) as u8).collect();
        writer.write_image_data(&data).unwrap();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::ChartSeries;

    fn spec(kind: ChartKind, values: Vec<f64>) -> ChartSpec {
        ChartSpec {
            kind,
            title: Some("Test".to_string()),
            categories: (0..values.len()).map(|i| format!("C{}", i)).collect(),
            series: vec![ChartSeries {
                name: "Series".to_string(),
                values,
            }],
        }
    }

    fn operators(canvas: PageCanvas) -> Vec<String> {
        let (pages, _) = canvas.finish();
        pages[0].iter().map(|op| op.operator.clone()).collect()
    }

    #[test]
    fn test_nice_step() {
        assert_eq!(nice_step(18.6), 20.0);
        assert_eq!(nice_step(3.0), 5.0);
        assert!((nice_step(0.7) - 1.0).abs() < 1e-5);
        assert_eq!(nice_step(0.0), 1.0);
    }

    #[test]
    fn test_axis_always_includes_zero() {
        let axis = Axis::for_values(&[82.0, 85.0, 87.0]);
        assert_eq!((axis.lo, axis.hi, axis.step, axis.ticks), (0.0, 100.0, 20.0, 5));
        let axis = Axis::for_values(&[-5.0, -3.0]);
        assert_eq!((axis.lo, axis.hi), (-5.0, 0.0));
    }

    #[test]
    fn test_axis_for_extreme_values_is_bounded() {
        for values in [vec![-1e9], vec![3.2e38], vec![f64::MAX], vec![-f64::MAX, f64::MAX]] {
            let axis = Axis::for_values(&values);
            assert!(axis.lo < axis.hi, "{:?}", values);
            assert!(axis.ticks >= 1 && axis.ticks <= MAX_TICKS, "{:?}", values);
            assert!((axis.hi - axis.lo).is_finite());
        }
    }

    #[test]
    fn test_extreme_values_draw_a_bounded_grid() {
        for values in [vec![-1e9], vec![3.2e38]] {
            let mut canvas = PageCanvas::new();
            draw_plot(&mut canvas, &spec(ChartKind::Line, values.clone()), 72.0, 300.0);
            let ops = operators(canvas);
            let strokes = ops.iter().filter(|op| *op == "S").count();
            // frame and axes plus one line per tick
            assert!(strokes <= MAX_TICKS + 3, "{:?} drew {} strokes", values, strokes);
        }
    }

    #[test]
    fn test_fit_label_truncates() {
        let label = fit_label("A very long category label", 40.0);
        assert!(label.ends_with(".."));
        assert!(Font::Body.text_width(&label, CHART_LABEL_SIZE) <= 40.0);
        assert_eq!(fit_label("Jan", 40.0), "Jan");
    }

    #[test]
    fn test_every_kind_draws_paths() {
        for kind in [ChartKind::Line, ChartKind::Bar, ChartKind::Area, ChartKind::Pie] {
            let mut canvas = PageCanvas::new();
            draw_plot(&mut canvas, &spec(kind, vec![82.0, 85.0, 87.0]), 72.0, 300.0);
            let ops = operators(canvas);
            assert!(ops.iter().any(|op| op == "f" || op == "S"), "{:?} drew nothing", kind);
        }
    }

    #[test]
    fn test_empty_series_says_no_data() {
        let mut canvas = PageCanvas::new();
        draw_plot(&mut canvas, &spec(ChartKind::Line, vec![]), 72.0, 300.0);
        let (pages, _) = canvas.finish();
        let texts: Vec<Vec<u8>> = pages[0]
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| op.operands[0].as_str().ok().map(|s| s.to_vec()))
            .collect();
        assert!(texts.contains(&b"No data".to_vec()));
    }

    #[test]
    fn test_decode_rgb_png() {
        let bytes = encode_test_png(4, 3, png::ColorType::Rgb);
        let image = ChartImage::decode_png(&bytes).unwrap();
        assert_eq!((image.width, image.height), (4, 3));
        assert!(image.smask().unwrap().is_none());
    }

    #[test]
    fn test_decode_rgba_png_splits_alpha() {
        let bytes = encode_test_png(2, 2, png::ColorType::Rgba);
        let image = ChartImage::decode_png(&bytes).unwrap();
        assert_eq!(image.pixels.len(), 2 * 2 * 3);
        assert!(image.smask().unwrap().is_some());
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(
            ChartImage::decode_png(b"not a png"),
            Err(ReportError::InvalidImage(_))
        ));
    }
}
