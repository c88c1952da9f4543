//! Minimal flowing page layout on top of `pdf-writer`
//!
//! Content is placed top to bottom on US-Letter pages with one-inch margins.
//! Paragraphs and table cells wrap on word boundaries; table rows and images
//! that do not fit move to a fresh page.

use super::chart::{ColorSpace, RasterImage};
use super::fonts::{encode_win_ansi, Font};
use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

pub const PAGE_WIDTH: f32 = 612.0;
pub const PAGE_HEIGHT: f32 = 792.0;
pub const MARGIN: f32 = 72.0;
pub const CONTENT_WIDTH: f32 = PAGE_WIDTH - 2.0 * MARGIN;
/// Points per inch
pub const INCH: f32 = 72.0;

const TOP: f32 = PAGE_HEIGHT - MARGIN;
const CELL_PAD_X: f32 = 6.0;
const CELL_PAD_TOP: f32 = 3.0;
const CELL_PAD_BOTTOM: f32 = 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

/// Text appearance for a paragraph or table cell
#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    pub font: Font,
    pub size: f32,
    pub leading: f32,
    pub align: Align,
}

impl TextStyle {
    pub fn new(font: Font, size: f32) -> Self {
        Self {
            font,
            size,
            leading: size * 1.2,
            align: Align::Left,
        }
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self
    }
}

/// Grid table appearance; the header row is optional
#[derive(Debug, Clone, Copy)]
pub struct TableStyle {
    pub body: TextStyle,
    pub header: Option<TextStyle>,
    pub header_fill: [f32; 3],
    pub header_text: [f32; 3],
    pub grid_width: f32,
}

struct Page {
    content: Content,
    images: Vec<usize>,
}

impl Page {
    fn new() -> Self {
        Self {
            content: Content::new(),
            images: Vec::new(),
        }
    }
}

/// A document being laid out
pub struct Document {
    title: String,
    pages: Vec<Page>,
    images: Vec<RasterImage>,
    cursor: f32,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            pages: vec![Page::new()],
            images: Vec::new(),
            cursor: TOP,
        }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&mut self) -> &mut Page {
        // `pages` always holds at least the first page
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(Page::new());
        self.cursor = TOP;
    }

    /// Start a new page unless `height` still fits; a block taller than a
    /// whole page is placed at the top of a page anyway
    fn reserve(&mut self, height: f32) {
        if self.cursor - height < MARGIN && self.cursor < TOP {
            self.new_page();
        }
    }

    /// Vertical gap; swallowed at a page boundary
    pub fn space(&mut self, height: f32) {
        if self.cursor - height < MARGIN {
            self.new_page();
        } else {
            self.cursor -= height;
        }
    }

    /// Wrapped paragraph spanning the content width
    pub fn paragraph(&mut self, text: &str, style: TextStyle) {
        for line in wrap(text, style.font, style.size, CONTENT_WIDTH) {
            self.reserve(style.leading);
            let width = style.font.text_width(&line, style.size);
            let x = match style.align {
                Align::Left => MARGIN,
                Align::Center => MARGIN + (CONTENT_WIDTH - width) / 2.0,
            };
            let baseline = self.cursor - style.size;
            draw_text(&mut self.page().content, style, [0.0, 0.0, 0.0], x, baseline, &line);
            self.cursor -= style.leading;
        }
    }

    /// Grid table, horizontally centred; each row stays on one page
    pub fn table<S: AsRef<str>>(&mut self, rows: &[Vec<S>], widths: &[f32], style: TableStyle) {
        let total: f32 = widths.iter().sum();
        let left = MARGIN + (CONTENT_WIDTH - total).max(0.0) / 2.0;

        for (index, row) in rows.iter().enumerate() {
            let (text_style, fill, color) = match (index, style.header) {
                (0, Some(header)) => (header, Some(style.header_fill), style.header_text),
                _ => (style.body, None, [0.0, 0.0, 0.0]),
            };

            let cells: Vec<Vec<Vec<u8>>> = widths
                .iter()
                .enumerate()
                .map(|(col, width)| {
                    let text = row.get(col).map(|c| c.as_ref()).unwrap_or("");
                    wrap(text, text_style.font, text_style.size, width - 2.0 * CELL_PAD_X)
                })
                .collect();
            let lines = cells.iter().map(Vec::len).max().unwrap_or(1).max(1);
            let height = CELL_PAD_TOP + lines as f32 * text_style.leading + CELL_PAD_BOTTOM;

            self.reserve(height);
            let top = self.cursor;
            let content = &mut self.page().content;

            if let Some([r, g, b]) = fill {
                content.save_state();
                content.set_fill_rgb(r, g, b);
                content.rect(left, top - height, total, height);
                content.fill_nonzero();
                content.restore_state();
            }

            let mut x = left;
            for (cell, width) in cells.iter().zip(widths) {
                let mut baseline = top - CELL_PAD_TOP - text_style.size;
                for line in cell {
                    draw_text(content, text_style, color, x + CELL_PAD_X, baseline, line);
                    baseline -= text_style.leading;
                }

                content.save_state();
                content.set_line_width(style.grid_width);
                content.set_stroke_rgb(0.0, 0.0, 0.0);
                content.rect(x, top - height, *width, height);
                content.stroke();
                content.restore_state();

                x += width;
            }

            self.cursor -= height;
        }
    }

    /// Image scaled to `width` × `height` points, horizontally centred
    pub fn image(&mut self, image: RasterImage, width: f32, height: f32) {
        self.reserve(height);
        let x = MARGIN + (CONTENT_WIDTH - width).max(0.0) / 2.0;
        let y = self.cursor - height;

        let index = self.images.len();
        self.images.push(image);
        let name = image_name(index);

        let page = self.page();
        page.images.push(index);
        page.content.save_state();
        page.content.transform([width, 0.0, 0.0, height, x, y]);
        page.content.x_object(Name(name.as_bytes()));
        page.content.restore_state();

        self.cursor = y;
    }

    /// Serialize the document
    pub fn finish(self) -> Vec<u8> {
        let mut ids = RefAlloc::default();
        let catalog_id = ids.next();
        let tree_id = ids.next();
        let info_id = ids.next();
        let font_ids: Vec<Ref> = Font::ALL.iter().map(|_| ids.next()).collect();
        let image_ids: Vec<(Ref, Option<Ref>)> = self
            .images
            .iter()
            .map(|img| (ids.next(), img.alpha.as_ref().map(|_| ids.next())))
            .collect();
        let page_ids: Vec<(Ref, Ref)> = self.pages.iter().map(|_| (ids.next(), ids.next())).collect();

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(tree_id);
        pdf.pages(tree_id)
            .kids(page_ids.iter().map(|(page, _)| *page))
            .count(page_ids.len() as i32);
        pdf.document_info(info_id)
            .title(TextStr(&self.title))
            .producer(TextStr(env!("CARGO_PKG_NAME")));

        for (font, id) in Font::ALL.iter().zip(&font_ids) {
            pdf.type1_font(*id)
                .base_font(font.base_font())
                .encoding_predefined(Name(b"WinAnsiEncoding"));
        }

        for (image, (id, mask_id)) in self.images.iter().zip(&image_ids) {
            {
                let mut xobject = pdf.image_xobject(*id, &image.samples);
                xobject.filter(Filter::FlateDecode);
                xobject.width(image.width as i32);
                xobject.height(image.height as i32);
                match image.color {
                    ColorSpace::Rgb => xobject.color_space().device_rgb(),
                    ColorSpace::Gray => xobject.color_space().device_gray(),
                }
                xobject.bits_per_component(8);
                if let Some(mask_id) = mask_id {
                    xobject.s_mask(*mask_id);
                }
            }

            if let (Some(alpha), Some(mask_id)) = (&image.alpha, mask_id) {
                let mut mask = pdf.image_xobject(*mask_id, alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(image.width as i32);
                mask.height(image.height as i32);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
            }
        }

        for (page, (page_id, content_id)) in self.pages.into_iter().zip(&page_ids) {
            {
                let mut writer = pdf.page(*page_id);
                writer.media_box(Rect::new(0.0, 0.0, PAGE_WIDTH, PAGE_HEIGHT));
                writer.parent(tree_id);
                writer.contents(*content_id);

                let mut resources = writer.resources();
                {
                    let mut fonts = resources.fonts();
                    for (font, id) in Font::ALL.iter().zip(&font_ids) {
                        fonts.pair(font.resource(), *id);
                    }
                }
                if !page.images.is_empty() {
                    let names: Vec<String> = page.images.iter().map(|&i| image_name(i)).collect();
                    let mut xobjects = resources.x_objects();
                    for (name, &index) in names.iter().zip(&page.images) {
                        xobjects.pair(Name(name.as_bytes()), image_ids[index].0);
                    }
                }
            }
            pdf.stream(*content_id, &page.content.finish());
        }

        pdf.finish()
    }
}

#[derive(Default)]
struct RefAlloc(i32);

impl RefAlloc {
    fn next(&mut self) -> Ref {
        self.0 += 1;
        Ref::new(self.0)
    }
}

fn image_name(index: usize) -> String {
    format!("Im{}", index + 1)
}

fn draw_text(content: &mut Content, style: TextStyle, color: [f32; 3], x: f32, y: f32, text: &[u8]) {
    if text.is_empty() {
        return;
    }
    let [r, g, b] = color;
    content.begin_text();
    content.set_fill_rgb(r, g, b);
    content.set_font(style.font.resource(), style.size);
    content.next_line(x, y);
    content.show(Str(text));
    content.end_text();
}

/// Greedy word wrap of `text` into encoded lines no wider than `max_width`
///
/// Words longer than a line are split by character. Explicit newlines
/// start a new line. Always returns at least one (possibly empty) line.
pub fn wrap(text: &str, font: Font, size: f32, max_width: f32) -> Vec<Vec<u8>> {
    let mut lines = Vec::new();
    let space = font.text_width(b" ", size);

    for paragraph in text.split('\n') {
        let mut line: Vec<u8> = Vec::new();
        let mut width = 0.0;

        for word in paragraph.split(' ').filter(|w| !w.is_empty()) {
            let encoded = encode_win_ansi(word);
            let word_width = font.text_width(&encoded, size);

            if !line.is_empty() && width + space + word_width <= max_width {
                line.push(b' ');
                line.extend_from_slice(&encoded);
                width += space + word_width;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }

            if word_width <= max_width {
                line = encoded;
                width = word_width;
            } else {
                width = 0.0;
                for byte in encoded {
                    let w = font.text_width(&[byte], size);
                    if !line.is_empty() && width + w > max_width {
                        lines.push(std::mem::take(&mut line));
                        width = 0.0;
                    }
                    line.push(byte);
                    width += w;
                }
            }
        }
        lines.push(line);
    }

    lines
}
