//! Reading generated reports back

use lopdf::content::Content;
use lopdf::{Document, Object};

use crate::error::ReportError;
use crate::style::{Font, TEXT_ENCODING};

/// Section headings in page order
///
/// Headings are the text blocks set in the heading font resource; every other
/// text on the page is ignored. A heading wrapped over several lines is one
/// block and comes back joined by single spaces.
pub fn section_headings(bytes: &[u8]) -> Result<Vec<String>, ReportError> {
    let doc = Document::load_mem(bytes)?;
    let heading_font = Font::Heading.resource_name().as_bytes();
    let mut headings = Vec::new();

    for (_, page_id) in doc.get_pages() {
        let content = Content::decode(&doc.get_page_content(page_id)?)?;
        let mut in_heading = false;
        let mut lines: Vec<String> = Vec::new();

        for op in &content.operations {
            match op.operator.as_str() {
                "BT" => {
                    in_heading = false;
                    lines.clear();
                }
                "Tf" => {
                    let font = op.operands.first().and_then(|o| o.as_name().ok());
                    in_heading = font == Some(heading_font);
                }
                "Tj" if in_heading => {
                    if let Some(Ok(s)) = op.operands.first().map(Object::as_str) {
                        lines.push(Document::decode_text(Some(TEXT_ENCODING), s));
                    }
                }
                // an empty title is still a heading
                "ET" if in_heading => {
                    headings.push(lines.join(" "));
                    lines.clear();
                    in_heading = false;
                }
                _ => {}
            }
        }
    }

    Ok(headings)
}

pub fn page_count(bytes: &[u8]) -> Result<usize, ReportError> {
    Ok(Document::load_mem(bytes)?.get_pages().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_garbage_is_a_pdf_error() {
        assert!(matches!(section_headings(b"not a pdf"), Err(ReportError::Pdf(_))));
        assert!(matches!(page_count(b""), Err(ReportError::Pdf(_))));
    }
}
