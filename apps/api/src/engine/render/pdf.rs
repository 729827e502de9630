//! Minimal PDF 1.4 writer: standard Helvetica faces, WinAnsi text, US letter pages.
//!
//! Output is a complete document (catalog, page tree, fonts, content streams,
//! cross-reference table) readable by any conforming PDF reader.

use std::fmt::Write as _;

use crate::engine::render::{Block, ResumeDocument};

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;
const LEADING: f32 = 14.0;
const NAME_SIZE: f32 = 16.0;
const HEADING_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.5;
/// Characters per line at body size across the 6.5" text column.
const WRAP_COLUMNS: usize = 92;
const BULLET_INDENT: f32 = 12.0;

const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const REGULAR_FONT_ID: usize = 3;
const BOLD_FONT_ID: usize = 4;
const FIRST_PAGE_ID: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Face {
    Regular,
    Bold,
}

#[derive(Debug, Clone, PartialEq)]
struct Line {
    text: String,
    face: Face,
    size: f32,
    indent: f32,
}

impl Line {
    fn new(text: impl Into<String>, face: Face, size: f32) -> Self {
        Self {
            text: text.into(),
            face,
            size,
            indent: 0.0,
        }
    }

    fn blank() -> Self {
        Self::new("", Face::Regular, BODY_SIZE)
    }

    fn indented(mut self, indent: f32) -> Self {
        self.indent = indent;
        self
    }
}

/// Renders `doc` to PDF bytes.
pub fn render_pdf(doc: &ResumeDocument) -> Vec<u8> {
    let lines = layout(doc);
    let lines_per_page = ((PAGE_HEIGHT - 2.0 * MARGIN) / LEADING).floor() as usize;
    let pages: Vec<&[Line]> = if lines.is_empty() {
        vec![&[]]
    } else {
        lines.chunks(lines_per_page).collect()
    };

    let mut writer = PdfWriter::new();

    let kids = (0..pages.len())
        .map(|i| format!("{} 0 R", FIRST_PAGE_ID + 2 * i))
        .collect::<Vec<_>>()
        .join(" ");

    writer.object(
        CATALOG_ID,
        format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R >>").as_bytes(),
    );
    writer.object(
        PAGES_ID,
        format!(
            "<< /Type /Pages /Kids [{kids}] /Count {} >>",
            pages.len()
        )
        .as_bytes(),
    );
    writer.object(REGULAR_FONT_ID, font_dict("Helvetica").as_bytes());
    writer.object(BOLD_FONT_ID, font_dict("Helvetica-Bold").as_bytes());

    for (i, page_lines) in pages.iter().enumerate() {
        let page_id = FIRST_PAGE_ID + 2 * i;
        let content_id = page_id + 1;
        writer.object(
            page_id,
            format!(
                "<< /Type /Page /Parent {PAGES_ID} 0 R /MediaBox [0 0 {PAGE_WIDTH} {PAGE_HEIGHT}] \
                 /Resources << /Font << /F1 {REGULAR_FONT_ID} 0 R /F2 {BOLD_FONT_ID} 0 R >> >> \
                 /Contents {content_id} 0 R >>"
            )
            .as_bytes(),
        );
        writer.stream(content_id, content_stream(page_lines).as_bytes());
    }

    writer.finish(CATALOG_ID)
}

fn font_dict(base_font: &str) -> String {
    format!(
        "<< /Type /Font /Subtype /Type1 /BaseFont /{base_font} /Encoding /WinAnsiEncoding >>"
    )
}

fn layout(doc: &ResumeDocument) -> Vec<Line> {
    let mut lines = Vec::new();

    if !doc.name.trim().is_empty() {
        lines.push(Line::new(doc.name.trim(), Face::Bold, NAME_SIZE));
    }
    if !doc.contact.is_empty() {
        for wrapped in wrap(&doc.contact.join(" | "), WRAP_COLUMNS) {
            lines.push(Line::new(wrapped, Face::Regular, BODY_SIZE));
        }
    }

    for section in &doc.sections {
        lines.push(Line::blank());
        lines.push(Line::new(section.title.as_str(), Face::Bold, HEADING_SIZE));
        for block in &section.blocks {
            match block {
                Block::Paragraph(text) => {
                    for wrapped in wrap(text, WRAP_COLUMNS) {
                        lines.push(Line::new(wrapped, Face::Regular, BODY_SIZE));
                    }
                }
                Block::Bullet(text) => {
                    for (i, wrapped) in wrap(text, WRAP_COLUMNS - 3).into_iter().enumerate() {
                        let line = if i == 0 {
                            Line::new(format!("\u{2022} {wrapped}"), Face::Regular, BODY_SIZE)
                        } else {
                            Line::new(wrapped, Face::Regular, BODY_SIZE)
                                .indented(BULLET_INDENT)
                        };
                        lines.push(line);
                    }
                }
            }
        }
    }

    lines
}

/// Greedy word wrap. Words longer than `width` are split hard.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let mut word: Vec<char> = word.chars().collect();
            while word.len() > width {
                if !current.is_empty() {
                    out.push(std::mem::take(&mut current));
                }
                out.push(word.drain(..width).collect());
            }
            let word: String = word.into_iter().collect();
            if word.is_empty() {
                continue;
            }
            let needed = if current.is_empty() {
                word.chars().count()
            } else {
                current.chars().count() + 1 + word.chars().count()
            };
            if needed > width {
                out.push(std::mem::take(&mut current));
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&word);
        }
        if !current.is_empty() {
            out.push(current);
        }
    }
    out
}

fn content_stream(lines: &[Line]) -> String {
    let mut content = String::new();
    let mut y = PAGE_HEIGHT - MARGIN;
    for line in lines {
        if !line.text.is_empty() {
            let font = match line.face {
                Face::Regular => "F1",
                Face::Bold => "F2",
            };
            let _ = writeln!(
                content,
                "BT /{font} {} Tf {} {} Td ({}) Tj ET",
                line.size,
                MARGIN + line.indent,
                y,
                escape_text(&line.text)
            );
        }
        y -= LEADING;
    }
    content
}

/// Encodes `text` as the body of a PDF literal string in WinAnsiEncoding.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' => out.push_str("\\("),
            ')' => out.push_str("\\)"),
            '\\' => out.push_str("\\\\"),
            ' '..='~' => out.push(ch),
            _ => match win_ansi_code(ch) {
                Some(code) => {
                    let _ = write!(out, "\\{code:03o}");
                }
                None => out.push('?'),
            },
        }
    }
    out
}

fn win_ansi_code(ch: char) -> Option<u8> {
    match ch {
        '\u{2022}' => Some(0x95),
        '\u{2013}' => Some(0x96),
        '\u{2014}' => Some(0x97),
        '\u{2018}' => Some(0x91),
        '\u{2019}' => Some(0x92),
        '\u{201C}' => Some(0x93),
        '\u{201D}' => Some(0x94),
        '\u{20AC}' => Some(0x80),
        '\u{2026}' => Some(0x85),
        c if ('\u{A0}'..='\u{FF}').contains(&c) => Some(c as u32 as u8),
        _ => None,
    }
}

/// Accumulates numbered objects and emits the cross-reference table on finish.
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<(usize, usize)>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, id: usize, body: &[u8]) {
        self.offsets.push((id, self.buf.len()));
        self.buf
            .extend_from_slice(format!("{id} 0 obj\n").as_bytes());
        self.buf.extend_from_slice(body);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn stream(&mut self, id: usize, data: &[u8]) {
        let mut body = format!("<< /Length {} >>\nstream\n", data.len()).into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(b"\nendstream");
        self.object(id, &body);
    }

    fn finish(mut self, root_id: usize) -> Vec<u8> {
        self.offsets.sort_by_key(|(id, _)| *id);
        let size = self.offsets.len() + 1;
        let xref_offset = self.buf.len();

        let mut xref = format!("xref\n0 {size}\n0000000000 65535 f \n");
        for (_, offset) in &self.offsets {
            let _ = write!(xref, "{offset:010} 00000 n \n");
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {size} /Root {root_id} 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n"
        );
        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}
