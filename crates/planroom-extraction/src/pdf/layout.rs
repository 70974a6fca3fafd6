//! Positioned text and ruling lines from a page content stream.
//!
//! Interprets enough of the PDF graphics model to place every shown string
//! in page space: the graphics state stack (`q`/`Q`), the CTM (`cm`), text
//! objects and text positioning operators. Straight path segments are kept
//! as rulings for table detection.

use std::collections::BTreeMap;

use lopdf::content::Content;
use lopdf::{Dictionary, Document, Object, ObjectId};

/// US Letter, used when no MediaBox is found up the page tree.
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);
/// Baseline distance under which two items share a line.
const LINE_TOLERANCE: f32 = 3.0;
/// Maximum thickness for a rectangle to count as a single ruling.
const RULE_THICKNESS: f32 = 2.0;
/// Approximate advance per glyph, as a fraction of the font size.
const GLYPH_ADVANCE: f32 = 0.5;

// ── Geometry ──────────────────────────────────────────────────────────────────

/// Affine matrix `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix([f32; 6]);

impl Matrix {
    pub const IDENTITY: Matrix = Matrix([1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);

    pub fn translate(tx: f32, ty: f32) -> Self {
        Matrix([1.0, 0.0, 0.0, 1.0, tx, ty])
    }

    /// `self × other`: apply `self` first, then `other`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        let [a, b, c, d, e, f] = self.0;
        let [a2, b2, c2, d2, e2, f2] = other.0;
        Matrix([
            a * a2 + b * c2,
            a * b2 + b * d2,
            c * a2 + d * c2,
            c * b2 + d * d2,
            e * a2 + f * c2 + e2,
            e * b2 + f * d2 + f2,
        ])
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        let [a, b, c, d, e, f] = self.0;
        (x * a + y * c + e, x * b + y * d + f)
    }

    /// Vertical scale, used to size text in page space.
    fn y_scale(&self) -> f32 {
        let [_, _, c, d, _, _] = self.0;
        (c * c + d * d).sqrt()
    }
}

// ── Page content ──────────────────────────────────────────────────────────────

/// A shown string, positioned at its origin in page space (origin bottom-left).
#[derive(Debug, Clone, PartialEq)]
pub struct TextItem {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ruling {
    /// y, x-start, x-end
    Horizontal { y: f32, x0: f32, x1: f32 },
    /// x, y-start, y-end
    Vertical { x: f32, y0: f32, y1: f32 },
}

impl Ruling {
    fn from_segment((ax, ay): (f32, f32), (bx, by): (f32, f32)) -> Option<Ruling> {
        if (ay - by).abs() < 1.0 && (ax - bx).abs() >= 1.0 {
            Some(Ruling::Horizontal { y: (ay + by) / 2.0, x0: ax.min(bx), x1: ax.max(bx) })
        } else if (ax - bx).abs() < 1.0 && (ay - by).abs() >= 1.0 {
            Some(Ruling::Vertical { x: (ax + bx) / 2.0, y0: ay.min(by), y1: ay.max(by) })
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageLayout {
    pub number: u32,
    pub width: f32,
    pub height: f32,
    pub items: Vec<TextItem>,
    pub rulings: Vec<Ruling>,
}

impl PageLayout {
    /// Text of the items whose origin lies in the region starting at
    /// `(x_frac·w, top_frac·h)` in top-left coordinates and running to the
    /// bottom-right corner.
    pub fn region_text(&self, x_frac: f32, top_frac: f32) -> String {
        let min_x = self.width * x_frac;
        let max_y = self.height * (1.0 - top_frac);
        let items = self
            .items
            .iter()
            .filter(|i| i.x >= min_x && i.x <= self.width && i.y <= max_y && i.y >= 0.0)
            .cloned()
            .collect();
        lines_to_text(&group_into_lines(items))
    }

    pub fn text(&self) -> String {
        lines_to_text(&group_into_lines(self.items.clone()))
    }
}

// ── Line grouping ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct TextLine {
    pub items: Vec<TextItem>,
    pub y: f32,
}

impl TextLine {
    pub fn text(&self) -> String {
        self.items
            .iter()
            .map(|i| i.text.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Group items into lines, top to bottom, each ordered left to right.
pub fn group_into_lines(items: Vec<TextItem>) -> Vec<TextLine> {
    let mut sorted = items;
    sorted.sort_by(|a, b| b.y.total_cmp(&a.y));

    let mut lines: Vec<TextLine> = Vec::new();
    for item in sorted {
        match lines.last_mut() {
            Some(line) if (line.y - item.y).abs() < LINE_TOLERANCE => line.items.push(item),
            _ => {
                let y = item.y;
                lines.push(TextLine { items: vec![item], y });
            }
        }
    }
    for line in &mut lines {
        line.items.sort_by(|a, b| a.x.total_cmp(&b.x));
    }
    lines
}

pub fn lines_to_text(lines: &[TextLine]) -> String {
    lines
        .iter()
        .map(TextLine::text)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Page reading ──────────────────────────────────────────────────────────────

fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

fn numbers(operands: &[Object]) -> Vec<f32> {
    operands.iter().map(|o| number(o).unwrap_or(0.0)).collect()
}

/// MediaBox as `(llx, lly, width, height)`, inherited through `Parent`.
pub fn media_box(doc: &Document, page_id: ObjectId) -> (f32, f32, f32, f32) {
    let mut current = doc.get_dictionary(page_id).ok();
    for _ in 0..32 {
        let Some(dict) = current else { break };
        if let Ok(Object::Array(values)) = dict.get(b"MediaBox") {
            let v: Vec<f32> = values
                .iter()
                .filter_map(|o| match o {
                    Object::Reference(id) => doc.get_object(*id).ok().and_then(number),
                    other => number(other),
                })
                .collect();
            if v.len() == 4 {
                let (llx, lly) = (v[0].min(v[2]), v[1].min(v[3]));
                return (llx, lly, (v[2] - v[0]).abs(), (v[3] - v[1]).abs());
            }
        }
        current = dict
            .get(b"Parent")
            .and_then(Object::as_reference)
            .and_then(|id| doc.get_dictionary(id))
            .ok();
    }
    (0.0, 0.0, DEFAULT_PAGE_SIZE.0, DEFAULT_PAGE_SIZE.1)
}

fn decode_string(
    obj: &Object,
    doc: &Document,
    fonts: &BTreeMap<Vec<u8>, &Dictionary>,
    font: &[u8],
) -> Option<String> {
    let Object::String(bytes, _) = obj else { return None };

    if let Some(font_dict) = fonts.get(font) {
        if let Ok(encoding) = font_dict.get_font_encoding(doc) {
            if let Ok(text) = Document::decode_text(&encoding, bytes) {
                return Some(text);
            }
        }
    }

    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return Some(String::from_utf16_lossy(&utf16));
    }

    Some(bytes.iter().map(|&b| b as char).collect())
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    font: Vec<u8>,
    font_size: f32,
    leading: f32,
}

struct PageReader<'a> {
    doc: &'a Document,
    fonts: BTreeMap<Vec<u8>, &'a Dictionary>,
    origin: (f32, f32),
    gs: GraphicsState,
    stack: Vec<GraphicsState>,
    tm: Matrix,
    tlm: Matrix,
    path_start: Option<(f32, f32)>,
    path_point: Option<(f32, f32)>,
    pending: Vec<Ruling>,
    items: Vec<TextItem>,
    rulings: Vec<Ruling>,
}

impl<'a> PageReader<'a> {
    fn to_page(&self, (x, y): (f32, f32)) -> (f32, f32) {
        let (px, py) = self.gs.ctm.apply(x, y);
        (px - self.origin.0, py - self.origin.1)
    }

    fn next_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translate(tx, ty).then(&self.tlm);
        self.tm = self.tlm;
    }

    fn show(&mut self, text: String, advance_units: f32) {
        let trm = self.tm.then(&self.gs.ctm);
        let (x, y) = trm.apply(0.0, 0.0);
        if !text.trim().is_empty() {
            self.items.push(TextItem {
                text,
                x: x - self.origin.0,
                y: y - self.origin.1,
                font_size: self.gs.font_size * trm.y_scale(),
            });
        }
        self.tm = Matrix::translate(advance_units * self.gs.font_size, 0.0).then(&self.tm);
    }

    fn show_string(&mut self, obj: &Object) {
        if let Some(text) = decode_string(obj, self.doc, &self.fonts, &self.gs.font) {
            let advance = text.chars().count() as f32 * GLYPH_ADVANCE;
            self.show(text, advance);
        }
    }

    fn show_array(&mut self, obj: &Object) {
        let Ok(parts) = obj.as_array() else { return };
        let mut combined = String::new();
        let mut advance = 0.0;
        for part in parts {
            if let Some(adjust) = number(part) {
                advance -= adjust / 1000.0;
                // large negative kerning is how many producers encode a space
                if adjust < -200.0 && !combined.ends_with(' ') {
                    combined.push(' ');
                }
            } else if let Some(text) = decode_string(part, self.doc, &self.fonts, &self.gs.font) {
                advance += text.chars().count() as f32 * GLYPH_ADVANCE;
                combined.push_str(&text);
            }
        }
        self.show(combined, advance);
    }

    fn segment_to(&mut self, point: (f32, f32)) {
        if let Some(from) = self.path_point {
            if let Some(r) = Ruling::from_segment(from, point) {
                self.pending.push(r);
            }
        }
        self.path_point = Some(point);
    }

    fn rectangle(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let corners = [
            self.to_page((x, y)),
            self.to_page((x + w, y)),
            self.to_page((x + w, y + h)),
            self.to_page((x, y + h)),
        ];
        let (x0, y0) = corners[0];
        let (x2, y2) = corners[2];
        if (y2 - y0).abs() <= RULE_THICKNESS {
            let y = (y0 + y2) / 2.0;
            self.pending.push(Ruling::Horizontal { y, x0: x0.min(x2), x1: x0.max(x2) });
        } else if (x2 - x0).abs() <= RULE_THICKNESS {
            let x = (x0 + x2) / 2.0;
            self.pending.push(Ruling::Vertical { x, y0: y0.min(y2), y1: y0.max(y2) });
        } else {
            for i in 0..4 {
                if let Some(r) = Ruling::from_segment(corners[i], corners[(i + 1) % 4]) {
                    self.pending.push(r);
                }
            }
        }
        self.path_start = None;
        self.path_point = None;
    }

    fn end_path(&mut self, painted: bool) {
        if painted {
            self.rulings.append(&mut self.pending);
        } else {
            self.pending.clear();
        }
        self.path_start = None;
        self.path_point = None;
    }

    fn run(&mut self, content: &Content) {
        for op in &content.operations {
            let operands = &op.operands;
            match op.operator.as_str() {
                "q" => self.stack.push(self.gs.clone()),
                "Q" => {
                    if let Some(gs) = self.stack.pop() {
                        self.gs = gs;
                    }
                }
                "cm" if operands.len() >= 6 => {
                    let n = numbers(&operands[..6]);
                    let m = Matrix([n[0], n[1], n[2], n[3], n[4], n[5]]);
                    self.gs.ctm = m.then(&self.gs.ctm);
                }
                "BT" => {
                    self.tm = Matrix::IDENTITY;
                    self.tlm = Matrix::IDENTITY;
                }
                "Tf" if operands.len() >= 2 => {
                    if let Ok(name) = operands[0].as_name() {
                        self.gs.font = name.to_vec();
                    }
                    if let Some(size) = number(&operands[1]) {
                        self.gs.font_size = size;
                    }
                }
                "TL" if !operands.is_empty() => {
                    self.gs.leading = number(&operands[0]).unwrap_or(0.0);
                }
                "Td" if operands.len() >= 2 => {
                    let n = numbers(&operands[..2]);
                    self.next_line(n[0], n[1]);
                }
                "TD" if operands.len() >= 2 => {
                    let n = numbers(&operands[..2]);
                    self.gs.leading = -n[1];
                    self.next_line(n[0], n[1]);
                }
                "Tm" if operands.len() >= 6 => {
                    let n = numbers(&operands[..6]);
                    self.tlm = Matrix([n[0], n[1], n[2], n[3], n[4], n[5]]);
                    self.tm = self.tlm;
                }
                "T*" => {
                    let leading = self.effective_leading();
                    self.next_line(0.0, -leading);
                }
                "Tj" if !operands.is_empty() => self.show_string(&operands[0]),
                "TJ" if !operands.is_empty() => self.show_array(&operands[0]),
                "'" if !operands.is_empty() => {
                    let leading = self.effective_leading();
                    self.next_line(0.0, -leading);
                    self.show_string(&operands[0]);
                }
                "\"" if operands.len() >= 3 => {
                    let leading = self.effective_leading();
                    self.next_line(0.0, -leading);
                    self.show_string(&operands[2]);
                }
                "m" if operands.len() >= 2 => {
                    let n = numbers(&operands[..2]);
                    let p = self.to_page((n[0], n[1]));
                    self.path_start = Some(p);
                    self.path_point = Some(p);
                }
                "l" if operands.len() >= 2 => {
                    let n = numbers(&operands[..2]);
                    let p = self.to_page((n[0], n[1]));
                    self.segment_to(p);
                }
                "h" => {
                    if let Some(start) = self.path_start {
                        self.segment_to(start);
                    }
                }
                "re" if operands.len() >= 4 => {
                    let n = numbers(&operands[..4]);
                    self.rectangle(n[0], n[1], n[2], n[3]);
                }
                "S" | "s" | "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => self.end_path(true),
                "n" => self.end_path(false),
                _ => {}
            }
        }
    }

    /// `T*` without a prior `TL` still needs to move down a line.
    fn effective_leading(&self) -> f32 {
        if self.gs.leading != 0.0 {
            self.gs.leading
        } else {
            self.gs.font_size * 1.2
        }
    }
}

/// Read one page's positioned text and rulings.
pub fn read_page(doc: &Document, number: u32, page_id: ObjectId) -> Result<PageLayout, lopdf::Error> {
    let (llx, lly, width, height) = media_box(doc, page_id);
    let data = doc.get_page_content(page_id)?;
    let content = Content::decode(&data)?;

    let mut reader = PageReader {
        doc,
        fonts: doc.get_page_fonts(page_id).unwrap_or_default(),
        origin: (llx, lly),
        gs: GraphicsState {
            ctm: Matrix::IDENTITY,
            font: Vec::new(),
            font_size: 12.0,
            leading: 0.0,
        },
        stack: Vec::new(),
        tm: Matrix::IDENTITY,
        tlm: Matrix::IDENTITY,
        path_start: None,
        path_point: None,
        pending: Vec::new(),
        items: Vec::new(),
        rulings: Vec::new(),
    };
    reader.run(&content);

    Ok(PageLayout { number, width, height, items: reader.items, rulings: reader.rulings })
}
