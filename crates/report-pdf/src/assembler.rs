//! Turns a `ReportDocument` into a paginated A4 PDF

use std::io::Write;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{Local, NaiveDateTime};
use lopdf::content::Content;
use lopdf::{dictionary, Bookmark, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use shared_types::{
    ChartContent, KpiStatus, MetricRow, ReportDocument, ReportSection, SectionContent,
};
use tracing::{debug, info};

use crate::chart::{draw_plot, ChartImage};
use crate::error::ReportError;
use crate::layout::PageCanvas;
use crate::style::*;

pub const DEFAULT_PERIOD: &str = "Last 12 months";
pub const DEFAULT_RESPONSIBLE: &str = "Automated System";
pub const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

const TITLE_SPACE_AFTER: f32 = 30.0;
const TITLE_SPACER: f32 = 20.0;
const INFO_BOTTOM_PADDING: f32 = 10.0;
const INFO_SPACER: f32 = 30.0;
const HEADING_SPACE_AFTER: f32 = 20.0;
const PARAGRAPH_SPACE_AFTER: f32 = 12.0;

/// Outline entry waiting for its page object id
struct Mark {
    title: String,
    page: usize,
}

pub struct ReportAssembler {
    generated_at: NaiveDateTime,
}

impl ReportAssembler {
    /// Stamp reports with the local time
    pub fn new() -> Self {
        Self::with_timestamp(Local::now().naive_local())
    }

    pub fn with_timestamp(generated_at: NaiveDateTime) -> Self {
        Self { generated_at }
    }

    /// Write the report to `out` and return its page count
    pub fn assemble<W: Write>(
        &self,
        report: &ReportDocument,
        out: &mut W,
    ) -> Result<usize, ReportError> {
        if report.sections.is_empty() {
            return Err(ReportError::EmptyReport);
        }

        let mut canvas = PageCanvas::new();
        self.draw_frame(&mut canvas, report);

        let mut marks = Vec::with_capacity(report.sections.len());
        for section in &report.sections {
            let page = draw_heading(&mut canvas, &section.title);
            marks.push(Mark {
                title: section.title.clone(),
                page,
            });
            draw_section(&mut canvas, section)?;
            canvas.advance(SECTION_SPACER);
        }

        let mut doc = build_document(canvas, &marks, &report.title)?;
        let pages = doc.get_pages().len();
        doc.save_to(out)?;

        info!(title = %report.title, sections = report.sections.len(), pages, "report assembled");
        Ok(pages)
    }

    pub fn render(&self, report: &ReportDocument) -> Result<Vec<u8>, ReportError> {
        let mut buffer = Vec::new();
        self.assemble(report, &mut buffer)?;
        Ok(buffer)
    }

    /// Title and the generation info table
    fn draw_frame(&self, canvas: &mut PageCanvas, report: &ReportDocument) {
        let line_height = TITLE_SIZE * LEADING;
        for line in wrap_text(&report.title, Font::Title, TITLE_SIZE, CONTENT_WIDTH) {
            canvas.ensure_space(line_height);
            let width = Font::Title.text_width(&line, TITLE_SIZE);
            let x = MARGIN_LEFT + (CONTENT_WIDTH - width) / 2.0;
            let baseline = canvas.cursor() - TITLE_SIZE;
            canvas.text(Font::Title, TITLE_SIZE, PRIMARY_COLOR, x, baseline, &line);
            canvas.advance(line_height);
        }
        canvas.advance(TITLE_SPACE_AFTER + TITLE_SPACER);

        let generated = self.generated_at.format(DATE_FORMAT).to_string();
        let rows = [
            ("Generation date:", generated.as_str()),
            ("Period:", report.period.as_deref().unwrap_or(DEFAULT_PERIOD)),
            (
                "Responsible:",
                report.responsible.as_deref().unwrap_or(DEFAULT_RESPONSIBLE),
            ),
        ];
        let table_width: f32 = INFO_COLUMNS.iter().sum();
        let left = MARGIN_LEFT + (CONTENT_WIDTH - table_width) / 2.0;
        let line_height = TABLE_SIZE * LEADING;

        for (label, value) in rows {
            let value_width = INFO_COLUMNS[1] - 2.0 * CELL_PADDING;
            let lines = wrap_text(value, Font::Body, TABLE_SIZE, value_width);
            let height = CELL_PADDING + lines.len() as f32 * line_height + INFO_BOTTOM_PADDING;
            canvas.ensure_space(height);
            let baseline = canvas.cursor() - CELL_PADDING - TABLE_SIZE;
            let label_x = left + CELL_PADDING;
            canvas.text(Font::Bold, TABLE_SIZE, INFO_TEXT_COLOR, label_x, baseline, label);
            for (i, line) in lines.iter().enumerate() {
                canvas.text(
                    Font::Body,
                    TABLE_SIZE,
                    INFO_TEXT_COLOR,
                    left + INFO_COLUMNS[0] + CELL_PADDING,
                    baseline - i as f32 * line_height,
                    line,
                );
            }
            canvas.advance(height);
        }
        canvas.advance(INFO_SPACER);
    }
}

impl Default for ReportAssembler {
    fn default() -> Self {
        Self::new()
    }
}

/// Lines of a heading. Titles that fit are kept verbatim; longer ones wrap.
fn heading_lines(title: &str) -> Vec<String> {
    if Font::Heading.text_width(title, HEADING_SIZE) <= CONTENT_WIDTH {
        vec![title.to_string()]
    } else {
        wrap_text(title, Font::Heading, HEADING_SIZE, CONTENT_WIDTH)
    }
}

/// Draw a section heading, kept on the same page as the first line after
/// it. Returns the page index the heading landed on.
fn draw_heading(canvas: &mut PageCanvas, title: &str) -> usize {
    let lines = heading_lines(title);
    let line_height = HEADING_SIZE * LEADING;
    let height = lines.len() as f32 * line_height + HEADING_SPACE_AFTER;
    canvas.ensure_space(height + BODY_SIZE * LEADING);
    let origin = (MARGIN_LEFT, canvas.cursor() - HEADING_SIZE);
    canvas.text_lines(Font::Heading, HEADING_SIZE, SECONDARY_COLOR, origin, line_height, &lines);
    canvas.advance(height);
    canvas.page_index()
}

fn draw_section(canvas: &mut PageCanvas, section: &ReportSection) -> Result<(), ReportError> {
    match &section.content {
        SectionContent::Text(body) => draw_paragraph(canvas, body),
        SectionContent::Metrics(rows) => draw_metrics(canvas, rows),
        SectionContent::Chart(chart) => draw_chart(canvas, chart)?,
    }
    Ok(())
}

fn draw_paragraph(canvas: &mut PageCanvas, body: &str) {
    let line_height = BODY_SIZE * LEADING;
    for line in wrap_text(body, Font::Body, BODY_SIZE, CONTENT_WIDTH) {
        canvas.ensure_space(line_height);
        if !line.is_empty() {
            let baseline = canvas.cursor() - BODY_SIZE;
            canvas.text(Font::Body, BODY_SIZE, BODY_COLOR, MARGIN_LEFT, baseline, &line);
        }
        canvas.advance(line_height);
    }
    canvas.advance(PARAGRAPH_SPACE_AFTER);
}

fn metric_cells(row: &MetricRow) -> [String; 3] {
    let status = row.status.unwrap_or(KpiStatus::OnTarget);
    [row.name.clone(), row.value.clone(), status.marker().to_string()]
}

/// Bordered three-column table; rows break across pages individually
fn draw_metrics(canvas: &mut PageCanvas, rows: &[MetricRow]) {
    let table_width: f32 = METRIC_COLUMNS.iter().sum();
    let left = MARGIN_LEFT + (CONTENT_WIDTH - table_width) / 2.0;
    let line_height = TABLE_SIZE * LEADING;

    for (r, row) in rows.iter().enumerate() {
        let cells = metric_cells(row);
        let wrapped: Vec<Vec<String>> = cells
            .iter()
            .zip(METRIC_COLUMNS)
            .map(|(cell, width)| {
                wrap_text(cell, Font::Body, TABLE_SIZE, width - 2.0 * CELL_PADDING)
            })
            .collect();
        let lines = wrapped.iter().map(Vec::len).max().unwrap_or(1).max(1);
        let height = lines as f32 * line_height + 2.0 * CELL_PADDING;

        canvas.ensure_space(height);
        let bottom = canvas.cursor() - height;
        if r == 0 {
            canvas.fill_rect(TABLE_HEADER_FILL, left, bottom, table_width, height);
        }

        let mut x = left;
        for (column, width) in wrapped.iter().zip(METRIC_COLUMNS) {
            canvas.stroke_rect(GRID_COLOR, 1.0, x, bottom, width, height);
            for (i, line) in column.iter().enumerate() {
                let baseline = canvas.cursor() - CELL_PADDING - TABLE_SIZE - i as f32 * line_height;
                canvas.text(Font::Body, TABLE_SIZE, BODY_COLOR, x + CELL_PADDING, baseline, line);
            }
            x += width;
        }
        canvas.advance(height);
    }
}

fn draw_chart(canvas: &mut PageCanvas, chart: &ChartContent) -> Result<(), ReportError> {
    canvas.ensure_space(CHART_HEIGHT);
    let x = MARGIN_LEFT + (CONTENT_WIDTH - CHART_WIDTH) / 2.0;
    let y = canvas.cursor() - CHART_HEIGHT;

    match chart {
        ChartContent::Plot(spec) => draw_plot(canvas, spec, x, y),
        ChartContent::Image { png_base64 } => {
            let bytes = STANDARD
                .decode(png_base64.trim())
                .map_err(|e| ReportError::InvalidImage(e.to_string()))?;
            let image = ChartImage::decode_png(&bytes)?;
            debug!(width = image.width, height = image.height, "embedding chart image");
            canvas.image(image_with_mask(image)?, x, y, CHART_WIDTH, CHART_HEIGHT);
        }
    }
    canvas.advance(CHART_HEIGHT);
    Ok(())
}

/// The soft mask travels inline as an unresolved stream until the document
/// exists; `build_document` swaps it for a reference
fn image_with_mask(image: ChartImage) -> Result<Stream, ReportError> {
    let mut stream = image.xobject(None)?;
    if let Some(mask) = image.smask()? {
        stream.dict.set("SMask", Object::Stream(mask));
    }
    Ok(stream)
}

fn font_resources(doc: &mut Document) -> Dictionary {
    let mut fonts = Dictionary::new();
    for font in Font::ALL {
        let id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => font.base_font(),
            "Encoding" => TEXT_ENCODING,
        });
        fonts.set(font.resource_name(), Object::Reference(id));
    }
    fonts
}

/// PDF text string: ASCII as is, anything else UTF-16BE behind a BOM
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }
    let mut bytes = vec![0xFE, 0xFF];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_be_bytes());
    }
    Object::String(bytes, StringFormat::Hexadecimal)
}

/// Outline items carry their titles as raw UTF-8; re-encode them
fn encode_outline_titles(doc: &mut Document) {
    for object in doc.objects.values_mut() {
        let Ok(dict) = object.as_dict_mut() else {
            continue;
        };
        if !dict.has(b"Parent") {
            continue;
        }
        let title = dict
            .get(b"Title")
            .and_then(Object::as_str)
            .map(|t| String::from_utf8_lossy(t).into_owned());
        if let Ok(title) = title {
            dict.set("Title", text_string(&title));
        }
    }
}

fn build_document(
    canvas: PageCanvas,
    marks: &[Mark],
    title: &str,
) -> Result<Document, ReportError> {
    let (pages, images) = canvas.finish();
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut xobjects = Dictionary::new();
    for placed in images {
        let mut stream = placed.stream;
        if let Some(Object::Stream(mask)) = stream.dict.remove(b"SMask") {
            let mask_id = doc.add_object(mask);
            stream.dict.set("SMask", Object::Reference(mask_id));
        }
        let id = doc.add_object(stream);
        xobjects.set(placed.name, Object::Reference(id));
    }

    let fonts = font_resources(&mut doc);
    let resources_id = doc.add_object(dictionary! {
        "Font" => fonts,
        "XObject" => xobjects,
    });

    let mut page_ids: Vec<ObjectId> = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        });
        page_ids.push(page_id);
    }

    let kids: Vec<Object> = page_ids.iter().map(|&id| Object::Reference(id)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_ids.len() as i64,
        }),
    );

    for mark in marks {
        if let Some(&page_id) = page_ids.get(mark.page) {
            doc.add_bookmark(Bookmark::new(mark.title.clone(), [0.0, 0.0, 0.0], 0, page_id), None);
        }
    }

    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    if let Some(outline_id) = doc.build_outline() {
        encode_outline_titles(&mut doc);
        catalog.set("Outlines", outline_id);
        catalog.set("PageMode", "UseOutlines");
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Title" => text_string(title),
        "Producer" => Object::string_literal("compliance-analytics report-pdf"),
    });
    doc.trailer.set("Info", info_id);

    doc.compress();
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::encode_test_png;
    use crate::inspect::{page_count, section_headings};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use shared_types::{ChartKind, ChartSeries, ChartSpec};

    fn assembler() -> ReportAssembler {
        let at = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_hms_opt(14, 7, 0)
            .unwrap();
        ReportAssembler::with_timestamp(at)
    }

    fn report(sections: Vec<ReportSection>) -> ReportDocument {
        ReportDocument {
            title: "Compliance Management Report".to_string(),
            period: None,
            responsible: None,
            sections,
        }
    }

    fn metric(name: &str, value: &str, status: KpiStatus) -> MetricRow {
        MetricRow {
            name: name.to_string(),
            value: value.to_string(),
            status: Some(status),
        }
    }

    fn line_chart() -> ChartContent {
        ChartContent::Plot(ChartSpec {
            kind: ChartKind::Line,
            title: Some("Compliance Evolution".to_string()),
            categories: ["Jan", "Feb", "Mar", "Apr", "May", "Jun"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            series: vec![ChartSeries {
                name: "Compliance Score".to_string(),
                values: vec![82.0, 85.0, 87.0, 89.0, 91.0, 93.0],
            }],
        })
    }

    #[test]
    fn test_empty_report_is_rejected() {
        let err = assembler().render(&report(vec![])).unwrap_err();
        assert!(matches!(err, ReportError::EmptyReport));
    }

    #[test]
    fn test_headings_follow_section_order() {
        let doc = report(vec![
            ReportSection::text("Executive Summary", "Overall score is 87.5%."),
            ReportSection::metrics(
                "1. Senior Management Support",
                vec![
                    metric("Meeting Attendance", "92%", KpiStatus::OnTarget),
                    metric("Response Time", "85%", KpiStatus::AtRisk),
                ],
            ),
            ReportSection::chart("Chart Analysis", line_chart()),
            ReportSection::text("Recommendations", "1. Train\n2. Review"),
        ]);
        let bytes = assembler().render(&doc).unwrap();
        assert!(bytes.starts_with(b"%PDF-"));
        assert_eq!(
            section_headings(&bytes).unwrap(),
            vec![
                "Executive Summary",
                "1. Senior Management Support",
                "Chart Analysis",
                "Recommendations",
            ]
        );
    }

    #[test]
    fn test_long_text_breaks_pages() {
        let body = "Compliance evidence was reviewed for every department. ".repeat(400);
        let doc = report(vec![ReportSection::text("Findings", body)]);
        let mut out = Vec::new();
        let pages = assembler().assemble(&doc, &mut out).unwrap();
        assert!(pages > 1);
        assert_eq!(page_count(&out).unwrap(), pages);
        assert_eq!(section_headings(&out).unwrap(), vec!["Findings"]);
    }

    #[test]
    fn test_large_metric_table_breaks_pages() {
        let rows = (0..120)
            .map(|i| metric(&format!("Metric {}", i), "90%", KpiStatus::OnTarget))
            .collect();
        let bytes = assembler()
            .render(&report(vec![ReportSection::metrics("Metrics", rows)]))
            .unwrap();
        assert!(page_count(&bytes).unwrap() > 1);
    }

    #[test]
    fn test_one_outline_entry_per_section() {
        let doc = report(vec![
            ReportSection::text("Alpha", "a"),
            ReportSection::text("Beta", "b"),
            ReportSection::text("Alpha", "c"),
        ]);
        let bytes = assembler().render(&doc).unwrap();
        let pdf = Document::load_mem(&bytes).unwrap();
        let catalog = pdf.catalog().unwrap();
        let outlines_id = catalog.get(b"Outlines").and_then(Object::as_reference).unwrap();
        let outlines = pdf.get_dictionary(outlines_id).unwrap();
        assert_eq!(outlines.get(b"Count").and_then(Object::as_i64).unwrap(), 3);
    }

    #[test]
    fn test_png_chart_is_embedded() {
        let png = encode_test_png(8, 6, png::ColorType::Rgba);
        let chart = ChartContent::Image {
            png_base64: STANDARD.encode(png),
        };
        let bytes = assembler()
            .render(&report(vec![ReportSection::chart("Chart Analysis", chart)]))
            .unwrap();
        let pdf = Document::load_mem(&bytes).unwrap();
        let images = pdf
            .objects
            .values()
            .filter_map(|o| o.as_stream().ok())
            .filter(|s| {
                s.dict.get(b"Subtype").and_then(Object::as_name).ok() == Some(b"Image".as_slice())
            })
            .count();
        // the picture and its alpha mask
        assert_eq!(images, 2);
    }

    #[test]
    fn test_invalid_png_is_an_error() {
        let chart = ChartContent::Image {
            png_base64: STANDARD.encode(b"definitely not a png"),
        };
        let err = assembler()
            .render(&report(vec![ReportSection::chart("Chart", chart)]))
            .unwrap_err();
        assert!(matches!(err, ReportError::InvalidImage(_)));
    }

    #[test]
    fn test_empty_title_still_reads_back() {
        let doc = report(vec![ReportSection::text("", "a"), ReportSection::text("B", "b")]);
        let bytes = assembler().render(&doc).unwrap();
        assert_eq!(section_headings(&bytes).unwrap(), vec!["", "B"]);
    }

    #[test]
    fn test_long_heading_wraps_inside_margins() {
        let title =
            "Adherence to the Code of Conduct and Ethics Policies Across Every Regional Office";
        assert!(Font::Heading.text_width(title, HEADING_SIZE) > CONTENT_WIDTH);
        let lines = heading_lines(title);
        assert!(lines.len() > 1);
        for line in &lines {
            assert!(Font::Heading.text_width(line, HEADING_SIZE) <= CONTENT_WIDTH);
        }

        let doc = report(vec![
            ReportSection::text(title, "Body"),
            ReportSection::text("Next", "x"),
        ]);
        let bytes = assembler().render(&doc).unwrap();
        assert_eq!(section_headings(&bytes).unwrap(), vec![title, "Next"]);
    }

    #[test]
    fn test_extreme_chart_values_render() {
        for values in [vec![-1e9], vec![3.2e38], vec![f64::MAX]] {
            let chart = ChartContent::Plot(ChartSpec {
                kind: ChartKind::Line,
                title: None,
                categories: vec!["Only".to_string()],
                series: vec![ChartSeries {
                    name: "Value".to_string(),
                    values: values.clone(),
                }],
            });
            let bytes = assembler()
                .render(&report(vec![ReportSection::chart("Outlier", chart)]))
                .unwrap();
            assert_eq!(page_count(&bytes).unwrap(), 1, "{:?}", values);
        }
    }

    #[test]
    fn test_text_string_encoding() {
        assert_eq!(text_string("Report"), Object::string_literal("Report"));
        assert_eq!(
            text_string("Gestão"),
            Object::String(
                vec![0xFE, 0xFF, 0, b'G', 0, b'e', 0, b's', 0, b't', 0x00, 0xE3, 0, b'o'],
                StringFormat::Hexadecimal
            )
        );
    }

    #[test]
    fn test_non_ascii_titles_are_utf16() {
        let mut doc = report(vec![ReportSection::text("Conformidade Ética", "Texto")]);
        doc.title = "Relatório de Gestão".to_string();
        let bytes = assembler().render(&doc).unwrap();
        let pdf = Document::load_mem(&bytes).unwrap();

        let info_id = pdf.trailer.get(b"Info").and_then(Object::as_reference).unwrap();
        let title = pdf.get_dictionary(info_id).unwrap().get(b"Title").unwrap();
        assert_eq!(title.as_str().unwrap()[..2], [0xFE, 0xFF]);
        assert_eq!(*title, text_string("Relatório de Gestão"));

        let outline_titles: Vec<&Object> = pdf
            .objects
            .values()
            .filter_map(|o| o.as_dict().ok())
            .filter(|d| d.has(b"Parent"))
            .filter_map(|d| d.get(b"Title").ok())
            .collect();
        assert_eq!(outline_titles.len(), 1);
        assert_eq!(outline_titles[0].as_str().unwrap()[..2], [0xFE, 0xFF]);
    }

    #[test]
    fn test_same_input_same_bytes() {
        let doc = report(vec![ReportSection::text("Summary", "Stable output")]);
        assert_eq!(assembler().render(&doc).unwrap(), assembler().render(&doc).unwrap());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn headings_match_arbitrary_titles(
            titles in prop::collection::vec("[A-Za-z0-9][A-Za-z0-9 ,.()-]{0,20}", 1..12)
        ) {
            let sections = titles
                .iter()
                .map(|t| ReportSection::text(t.clone(), "Body text for the section."))
                .collect();
            let bytes = assembler().render(&report(sections)).unwrap();
            prop_assert_eq!(section_headings(&bytes).unwrap(), titles);
        }
    }
}
