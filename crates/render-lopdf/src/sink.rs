use crate::resources::{Resources, real};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, StringFormat, dictionary};
use stencil_layout::FontSet;
use stencil_render_core::utils::{flip_y, rotation_matrix, to_win_ansi};
use stencil_render_core::{Bitmap, DocumentSink, DrawOp, Primitive, RenderError, ShapeStyle, TextRun};
use stencil_types::{Color, Position, Rect};

// Bézier control distance for a quarter circle.
const KAPPA: f64 = 0.552_284_75;

/// Builds a PDF in memory, one page at a time. Coordinates arrive in points
/// with a top-left origin.
pub struct LopdfSink {
    doc: Document,
    pages_id: ObjectId,
    resources_id: ObjectId,
    fonts: FontSet,
    resources: Resources,
    page_ids: Vec<ObjectId>,
    page: Option<PageContext>,
    title: Option<String>,
    author: Option<String>,
}

impl LopdfSink {
    pub fn new(fonts: FontSet) -> Self {
        let mut doc = Document::with_version("1.7");
        let pages_id = doc.new_object_id();
        let resources_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            resources_id,
            fonts,
            resources: Resources::default(),
            page_ids: Vec::new(),
            page: None,
            title: None,
            author: None,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author;
        self
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    pub fn image_count(&self) -> usize {
        self.resources.image_count()
    }
}

impl DocumentSink for LopdfSink {
    fn begin_page(&mut self, width: f64, height: f64) -> Result<(), RenderError> {
        if self.page.is_some() {
            return Err(RenderError::Other("begin_page called while a page is open".into()));
        }
        self.page = Some(PageContext::new(width, height));
        Ok(())
    }

    fn draw(&mut self, op: &DrawOp) -> Result<(), RenderError> {
        let page = self.page.as_mut().ok_or(RenderError::NoOpenPage("draw"))?;

        let grouped = op.opacity < 1.0 || op.rotation.is_some();
        let saved = page.state.clone();
        if grouped {
            page.push("q", vec![]);
            if op.opacity < 1.0 {
                let name = self.resources.opacity(op.opacity);
                page.push("gs", vec![Object::Name(name.into_bytes())]);
            }
            if let Some(rotation) = op.rotation {
                page.rotate(rotation.degrees, rotation.pivot);
            }
        }

        match &op.primitive {
            Primitive::Text(run) => {
                let face = self.fonts.resolve(Some(&run.font));
                let resource = self.resources.font(face);
                page.draw_text(run, &resource);
            }
            Primitive::Image { bytes, rect } => {
                let name = self.resources.image(&mut self.doc, bytes)?;
                page.draw_image(&name, *rect);
            }
            Primitive::Line {
                from,
                to,
                width,
                color,
            } => page.draw_line(*from, *to, *width, *color),
            Primitive::Rectangle {
                rect,
                style,
                radius,
            } => page.draw_rectangle(*rect, style, *radius),
            Primitive::Ellipse { rect, style } => page.draw_ellipse(*rect, style),
            Primitive::Bitmap(bitmap) => page.draw_bitmap(bitmap),
        }

        if grouped {
            page.push("Q", vec![]);
            page.state = saved;
        }
        Ok(())
    }

    fn end_page(&mut self) -> Result<(), RenderError> {
        let page = self.page.take().ok_or(RenderError::NoOpenPage("end_page"))?;
        let operations = page.content.operations.len();
        let encoded = page.content.encode()?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), real(page.width), real(page.height)],
            "Contents" => content_id,
            "Resources" => self.resources_id,
        });
        self.page_ids.push(page_id);
        log::debug!(
            "Wrote page {} ({} operations)",
            self.page_ids.len(),
            operations
        );
        Ok(())
    }

    fn finish(self: Box<Self>) -> Result<Vec<u8>, RenderError> {
        let mut sink = *self;
        if sink.page.is_some() {
            return Err(RenderError::Other("finish called while a page is open".into()));
        }

        let resources = sink.resources.into_dictionary(&mut sink.doc, &sink.fonts)?;
        sink.doc.objects.insert(sink.resources_id, Object::Dictionary(resources));

        let kids: Vec<Object> = sink.page_ids.iter().map(|id| Object::Reference(*id)).collect();
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => sink.page_ids.len() as i64,
        };
        sink.doc.objects.insert(sink.pages_id, Object::Dictionary(pages));

        let catalog_id = sink.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => sink.pages_id,
        });
        sink.doc.trailer.set("Root", catalog_id);

        let mut info = dictionary! {
            "Producer" => Object::String(b"stencil".to_vec(), StringFormat::Literal),
        };
        if let Some(title) = &sink.title {
            info.set("Title", Object::String(to_win_ansi(title), StringFormat::Literal));
        }
        if let Some(author) = &sink.author {
            info.set("Author", Object::String(to_win_ansi(author), StringFormat::Literal));
        }
        let info_id = sink.doc.add_object(info);
        sink.doc.trailer.set("Info", info_id);

        let mut out = Vec::new();
        sink.doc
            .save_to(&mut out)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        log::info!("Finished PDF: {} pages, {} bytes", sink.page_ids.len(), out.len());
        Ok(out)
    }
}

/// Graphics state already set on the page, so repeated values are not re-emitted.
#[derive(Debug, Default, Clone, PartialEq)]
struct PageState {
    font: Option<(String, f64)>,
    fill: Option<Color>,
    stroke: Option<Color>,
    line_width: Option<f64>,
    char_spacing: f64,
}

struct PageContext {
    width: f64,
    height: f64,
    content: Content,
    state: PageState,
}

impl PageContext {
    fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            content: Content { operations: vec![] },
            state: PageState::default(),
        }
    }

    fn push(&mut self, operator: &str, operands: Vec<Object>) {
        self.content.operations.push(Operation::new(operator, operands));
    }

    fn y(&self, y: f64) -> f64 {
        flip_y(y, self.height)
    }

    fn set_fill(&mut self, color: Color) {
        if self.state.fill != Some(color) {
            let [r, g, b] = color.unit_rgb();
            self.push("rg", vec![r.into(), g.into(), b.into()]);
            self.state.fill = Some(color);
        }
    }

    fn set_stroke(&mut self, color: Color, width: f64) {
        if self.state.stroke != Some(color) {
            let [r, g, b] = color.unit_rgb();
            self.push("RG", vec![r.into(), g.into(), b.into()]);
            self.state.stroke = Some(color);
        }
        if self.state.line_width != Some(width) {
            self.push("w", vec![real(width)]);
            self.state.line_width = Some(width);
        }
    }

    /// Clockwise about `pivot`, given in top-left page coordinates.
    fn rotate(&mut self, degrees: f64, pivot: Position) {
        let (px, py) = (pivot.x, self.y(pivot.y));
        self.push("cm", [1.0, 0.0, 0.0, 1.0, px, py].map(real).to_vec());
        self.push("cm", rotation_matrix(degrees).map(real).to_vec());
        self.push("cm", [1.0, 0.0, 0.0, 1.0, -px, -py].map(real).to_vec());
    }

    fn draw_text(&mut self, run: &TextRun, font: &str) {
        if run.text.is_empty() {
            return;
        }
        self.push("BT", vec![]);
        let wanted = (font.to_string(), run.size);
        if self.state.font.as_ref() != Some(&wanted) {
            self.push("Tf", vec![Object::Name(font.as_bytes().to_vec()), real(run.size)]);
            self.state.font = Some(wanted);
        }
        self.set_fill(run.color);
        if self.state.char_spacing != run.char_spacing {
            self.push("Tc", vec![real(run.char_spacing)]);
            self.state.char_spacing = run.char_spacing;
        }
        let baseline = self.y(run.baseline);
        self.push("Td", vec![real(run.x), real(baseline)]);
        self.push(
            "Tj",
            vec![Object::String(to_win_ansi(&run.text), StringFormat::Literal)],
        );
        self.push("ET", vec![]);
    }

    fn draw_image(&mut self, name: &str, rect: Rect) {
        let bottom = self.y(rect.bottom());
        self.push("q", vec![]);
        self.push(
            "cm",
            vec![real(rect.width), 0.into(), 0.into(), real(rect.height), real(rect.x), real(bottom)],
        );
        self.push("Do", vec![Object::Name(name.as_bytes().to_vec())]);
        self.push("Q", vec![]);
    }

    fn draw_line(&mut self, from: Position, to: Position, width: f64, color: Color) {
        if width <= 0.0 {
            return;
        }
        self.set_stroke(color, width);
        let (y0, y1) = (self.y(from.y), self.y(to.y));
        self.push("m", vec![real(from.x), real(y0)]);
        self.push("l", vec![real(to.x), real(y1)]);
        self.push("S", vec![]);
    }

    /// Sets colours for `style` and closes the current path with the matching
    /// paint operator.
    fn paint(&mut self, style: &ShapeStyle) {
        let stroke = style.stroke.filter(|_| style.stroke_width > 0.0);
        if let Some(fill) = style.fill {
            self.set_fill(fill);
        }
        if let Some(color) = stroke {
            self.set_stroke(color, style.stroke_width);
        }
        let operator = match (style.fill.is_some(), stroke.is_some()) {
            (true, true) => "B",
            (true, false) => "f",
            (false, true) => "S",
            (false, false) => "n",
        };
        self.push(operator, vec![]);
    }

    fn draw_rectangle(&mut self, rect: Rect, style: &ShapeStyle, radius: f64) {
        if !style.is_visible() {
            return;
        }
        let (x0, y0) = (rect.x, self.y(rect.bottom()));
        let (x1, y1) = (x0 + rect.width, y0 + rect.height);
        let r = radius.min(rect.width / 2.0).min(rect.height / 2.0);

        if r <= 0.0 {
            self.push("re", [x0, y0, rect.width, rect.height].map(real).to_vec());
        } else {
            let k = KAPPA * r;
            self.move_to(x0 + r, y0);
            self.line_to(x1 - r, y0);
            self.curve_to([x1 - r + k, y0, x1, y0 + r - k, x1, y0 + r]);
            self.line_to(x1, y1 - r);
            self.curve_to([x1, y1 - r + k, x1 - r + k, y1, x1 - r, y1]);
            self.line_to(x0 + r, y1);
            self.curve_to([x0 + r - k, y1, x0, y1 - r + k, x0, y1 - r]);
            self.line_to(x0, y0 + r);
            self.curve_to([x0, y0 + r - k, x0 + r - k, y0, x0 + r, y0]);
            self.push("h", vec![]);
        }
        self.paint(style);
    }

    fn draw_ellipse(&mut self, rect: Rect, style: &ShapeStyle) {
        if !style.is_visible() {
            return;
        }
        let (rx, ry) = (rect.width / 2.0, rect.height / 2.0);
        let (cx, cy) = (rect.x + rx, self.y(rect.y + ry));
        let (kx, ky) = (KAPPA * rx, KAPPA * ry);

        self.move_to(cx + rx, cy);
        self.curve_to([cx + rx, cy + ky, cx + kx, cy + ry, cx, cy + ry]);
        self.curve_to([cx - kx, cy + ry, cx - rx, cy + ky, cx - rx, cy]);
        self.curve_to([cx - rx, cy - ky, cx - kx, cy - ry, cx, cy - ry]);
        self.curve_to([cx + kx, cy - ry, cx + rx, cy - ky, cx + rx, cy]);
        self.push("h", vec![]);
        self.paint(style);
    }

    /// Background, then one rectangle per horizontal run of dark modules.
    fn draw_bitmap(&mut self, bitmap: &Bitmap) {
        if bitmap.columns == 0 || bitmap.rows == 0 {
            return;
        }
        let rect = bitmap.rect;
        if let Some(background) = bitmap.background {
            self.draw_rectangle(rect, &ShapeStyle::filled(background), 0.0);
        }

        let module_width = rect.width / bitmap.columns as f64;
        let module_height = rect.height / bitmap.rows as f64;
        let mut runs = 0usize;
        for row in 0..bitmap.rows {
            let bottom = self.y(rect.y + (row + 1) as f64 * module_height);
            let mut column = 0;
            while column < bitmap.columns {
                if !bitmap.is_dark(column, row) {
                    column += 1;
                    continue;
                }
                let start = column;
                while column < bitmap.columns && bitmap.is_dark(column, row) {
                    column += 1;
                }
                let x = rect.x + start as f64 * module_width;
                let width = (column - start) as f64 * module_width;
                self.push("re", [x, bottom, width, module_height].map(real).to_vec());
                runs += 1;
            }
        }
        if runs > 0 {
            self.set_fill(bitmap.color);
            self.push("f", vec![]);
        }
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.push("m", vec![real(x), real(y)]);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.push("l", vec![real(x), real(y)]);
    }

    fn curve_to(&mut self, points: [f64; 6]) {
        self.push("c", points.map(real).to_vec());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::io::Cursor;
    use std::sync::Arc;

    type TestResult = Result<(), Box<dyn std::error::Error>>;

    fn png(alpha: u8) -> Arc<Vec<u8>> {
        let img = RgbaImage::from_pixel(2, 2, Rgba([255, 0, 0, alpha]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        Arc::new(out.into_inner())
    }

    fn text(content: &str) -> DrawOp {
        DrawOp::new(Primitive::Text(TextRun {
            text: content.into(),
            font: "Helvetica".into(),
            size: 12.0,
            color: Color::BLACK,
            x: 10.0,
            baseline: 20.0,
            char_spacing: 0.0,
        }))
    }

    fn page_contents(pdf: &[u8]) -> Result<Vec<String>, Box<dyn std::error::Error>> {
        let doc = Document::load_mem(pdf)?;
        let mut pages = Vec::new();
        for (_, id) in doc.get_pages() {
            let content = doc.get_page_content(id)?;
            pages.push(String::from_utf8_lossy(&content).into_owned());
        }
        Ok(pages)
    }

    #[test]
    fn writes_one_page_per_begin_end() -> TestResult {
        let mut sink = Box::new(LopdfSink::new(FontSet::new()).with_title(Some("Invoice".into())));
        for label in ["one", "two"] {
            sink.begin_page(595.0, 842.0)?;
            sink.draw(&text(label))?;
            sink.end_page()?;
        }
        let pdf = sink.finish()?;

        let pages = page_contents(&pdf)?;
        assert_eq!(pages.len(), 2);
        assert!(pages[0].contains("(one) Tj"));
        assert!(pages[1].contains("(two) Tj"));
        // baseline flipped against the page height
        let td = pages[0].lines().find(|line| line.ends_with("Td")).unwrap_or_default();
        assert!(td.starts_with("10 822"), "unexpected {td}");
        Ok(())
    }

    #[test]
    fn drawing_outside_a_page_fails() {
        let mut sink = LopdfSink::new(FontSet::new());
        assert!(matches!(sink.draw(&text("x")), Err(RenderError::NoOpenPage(_))));
        assert!(matches!(sink.end_page(), Err(RenderError::NoOpenPage(_))));
    }

    #[test]
    fn identical_images_share_one_xobject() -> TestResult {
        let mut sink = LopdfSink::new(FontSet::new());
        let bytes = png(255);
        sink.begin_page(100.0, 100.0)?;
        for x in [0.0, 50.0] {
            sink.draw(&DrawOp::new(Primitive::Image {
                bytes: Arc::clone(&bytes),
                rect: Rect::new(x, 0.0, 10.0, 10.0),
            }))?;
        }
        sink.end_page()?;
        assert_eq!(sink.image_count(), 1);
        Ok(())
    }

    #[test]
    fn translucent_png_gets_a_soft_mask() -> TestResult {
        let mut sink = Box::new(LopdfSink::new(FontSet::new()));
        sink.begin_page(100.0, 100.0)?;
        sink.draw(&DrawOp::new(Primitive::Image {
            bytes: png(128),
            rect: Rect::new(0.0, 0.0, 10.0, 10.0),
        }))?;
        sink.end_page()?;
        let pdf = sink.finish()?;

        let doc = Document::load_mem(&pdf)?;
        let masked = doc.objects.values().any(|object| {
            object
                .as_stream()
                .is_ok_and(|stream| stream.dict.has(b"SMask"))
        });
        assert!(masked);
        Ok(())
    }

    #[test]
    fn opacity_and_rotation_are_scoped() -> TestResult {
        let mut sink = Box::new(LopdfSink::new(FontSet::new()));
        sink.begin_page(100.0, 100.0)?;
        let op = DrawOp::new(Primitive::Rectangle {
            rect: Rect::new(10.0, 10.0, 20.0, 20.0),
            style: ShapeStyle::filled(Color::rgb(255, 0, 0)),
            radius: 0.0,
        })
        .with_opacity(0.5)
        .rotated(90.0, Position::new(20.0, 20.0));
        sink.draw(&op)?;
        sink.end_page()?;
        let pdf = sink.finish()?;

        let content = &page_contents(&pdf)?[0];
        assert!(content.starts_with("q"));
        assert!(content.contains("/GS500 gs"));
        assert!(content.trim_end().ends_with('Q'));
        Ok(())
    }

    #[test]
    fn bitmap_merges_dark_runs() -> TestResult {
        let mut sink = Box::new(LopdfSink::new(FontSet::new()));
        sink.begin_page(100.0, 100.0)?;
        sink.draw(&DrawOp::new(Primitive::Bitmap(Bitmap {
            rect: Rect::new(0.0, 0.0, 40.0, 10.0),
            columns: 4,
            rows: 1,
            modules: vec![true, true, false, true],
            color: Color::BLACK,
            background: None,
        })))?;
        sink.end_page()?;
        let pdf = sink.finish()?;

        let content = &page_contents(&pdf)?[0];
        assert_eq!(content.matches(" re").count(), 2);
        Ok(())
    }

    #[test]
    fn finishing_with_an_open_page_fails() -> TestResult {
        let mut sink = Box::new(LopdfSink::new(FontSet::new()));
        sink.begin_page(10.0, 10.0)?;
        assert!(sink.finish().is_err());
        Ok(())
    }
}
