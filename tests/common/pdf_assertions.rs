use lopdf::content::Content;
use lopdf::{Document as LopdfDocument, Object};

/// The literal strings of every `Tj` operator, per page in page order.
pub fn shown_text(doc: &LopdfDocument) -> Result<Vec<Vec<String>>, Box<dyn std::error::Error>> {
    let mut pages = Vec::new();
    for (_page_num, page_id) in doc.get_pages() {
        let content = Content::decode(&doc.get_page_content(page_id)?)?;
        let strings = content
            .operations
            .iter()
            .filter(|op| op.operator == "Tj")
            .filter_map(|op| match op.operands.first() {
                Some(Object::String(bytes, _)) => Some(String::from_utf8_lossy(bytes).into_owned()),
                _ => None,
            })
            .collect();
        pages.push(strings);
    }
    Ok(pages)
}

/// MediaBox width and height of every page, in points.
pub fn page_sizes(doc: &LopdfDocument) -> Result<Vec<(f32, f32)>, Box<dyn std::error::Error>> {
    let mut sizes = Vec::new();
    for (_page_num, page_id) in doc.get_pages() {
        let page = doc.get_dictionary(page_id)?;
        let media_box = page.get(b"MediaBox")?.as_array()?;
        let number = |index: usize| -> Result<f32, Box<dyn std::error::Error>> {
            Ok(media_box.get(index).ok_or("short MediaBox")?.as_float()?)
        };
        sizes.push((number(2)?, number(3)?));
    }
    Ok(sizes)
}

#[macro_export]
macro_rules! assert_pdf_contains_text {
    ($pdf:expr, $text:expr) => {{
        let pages = $pdf.page_texts()?;
        assert!(
            pages.iter().flatten().any(|shown| shown.contains($text)),
            "PDF should contain text '{}', got {:?}",
            $text,
            pages
        );
    }};
}
