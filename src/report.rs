// 🧾 Report Renderer
// Header line + one line per expense row. Pure formatting: no totals.
//
// The PDF writer below emits the smallest valid PDF 1.4 file that carries
// those lines: one Helvetica font, one content stream per page, a classic
// xref table. Nothing else (no images, no compression, no metadata).

use crate::error::TrackerResult;
use crate::ledger::ExpenseRow;
use std::fmt::Write as _;
use std::path::Path;

/// First line of every report
pub const REPORT_TITLE: &str = "Expense Report";

/// Lines printed per PDF page (header counts as a line on page one)
pub const LINES_PER_PAGE: usize = 40;

// A4 in points
const PAGE_WIDTH: f32 = 595.0;
const PAGE_HEIGHT: f32 = 842.0;
const MARGIN_LEFT: f32 = 56.0;
const TOP_BASELINE: f32 = 800.0;
const LINE_HEIGHT: f32 = 18.0;
const FONT_SIZE: f32 = 12.0;
// Rough Helvetica advance width, used only to centre the title
const AVG_CHAR_WIDTH: f32 = FONT_SIZE * 0.5;

// ============================================================================
// REPORT
// ============================================================================

/// A rendered report: title line followed by one line per row
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    lines: Vec<String>,
}

/// Format a single expense row as `date | item | {prefix}{amount}`.
///
/// The amount is printed exactly as stored (`3.5`, `12.0`, `3.456`), never
/// rounded.
pub fn format_row(row: &ExpenseRow, currency_prefix: &str) -> String {
    format!(
        "{} | {} | {}{:?}",
        row.date, row.item, currency_prefix, row.amount
    )
}

/// Render query rows into a report
pub fn render(rows: &[ExpenseRow], currency_prefix: &str) -> Report {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(REPORT_TITLE.to_string());
    lines.extend(rows.iter().map(|row| format_row(row, currency_prefix)));
    Report { lines }
}

impl Report {
    /// All lines, title first
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Lines after the title
    pub fn body(&self) -> &[String] {
        &self.lines[1..]
    }

    /// True when no expense rows were rendered
    pub fn is_empty(&self) -> bool {
        self.lines.len() <= 1
    }

    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }

    /// Serialise as a PDF document
    pub fn to_pdf(&self) -> Vec<u8> {
        PdfWriter::new().write(&self.lines)
    }
}

/// Write the report as a PDF file at `path`
pub fn write_pdf(report: &Report, path: &Path) -> TrackerResult<()> {
    std::fs::write(path, report.to_pdf())?;
    tracing::info!(path = %path.display(), lines = report.lines().len(), "report written");
    Ok(())
}

// ============================================================================
// PDF WRITER
// ============================================================================

struct PdfWriter {
    out: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        PdfWriter {
            out: Vec::new(),
            offsets: Vec::new(),
        }
    }

    fn write(mut self, lines: &[String]) -> Vec<u8> {
        let pages: Vec<&[String]> = if lines.is_empty() {
            vec![&lines[..0]]
        } else {
            lines.chunks(LINES_PER_PAGE).collect()
        };

        // Object numbering: 1 catalog, 2 page tree, 3 font,
        // then (page, content) pairs starting at 4.
        let page_ids: Vec<usize> = (0..pages.len()).map(|i| 4 + i * 2).collect();

        self.out.extend_from_slice(b"%PDF-1.4\n");

        self.object(1, "<< /Type /Catalog /Pages 2 0 R >>");

        let kids = page_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        self.object(
            2,
            &format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids, pages.len()),
        );

        self.object(
            3,
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
        );

        for (index, page_lines) in pages.iter().enumerate() {
            let page_id = page_ids[index];
            let content_id = page_id + 1;

            self.object(
                page_id,
                &format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                     /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
                    PAGE_WIDTH, PAGE_HEIGHT, content_id
                ),
            );

            let stream = content_stream(page_lines, index == 0);
            self.stream_object(content_id, &stream);
        }

        self.trailer();
        self.out
    }

    fn object(&mut self, id: usize, body: &str) {
        self.begin_object(id);
        self.out.extend_from_slice(body.as_bytes());
        self.out.extend_from_slice(b"\nendobj\n");
    }

    fn stream_object(&mut self, id: usize, stream: &[u8]) {
        self.begin_object(id);
        self.out
            .extend_from_slice(format!("<< /Length {} >>\nstream\n", stream.len()).as_bytes());
        self.out.extend_from_slice(stream);
        self.out.extend_from_slice(b"\nendstream\nendobj\n");
    }

    fn begin_object(&mut self, id: usize) {
        // Objects are always written in id order
        debug_assert_eq!(id, self.offsets.len() + 1);
        self.offsets.push(self.out.len());
        self.out.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
    }

    fn trailer(&mut self) {
        let xref_offset = self.out.len();
        let count = self.offsets.len() + 1;

        let mut xref = String::new();
        let _ = write!(xref, "xref\n0 {}\n0000000000 65535 f \n", count);
        for offset in &self.offsets {
            let _ = write!(xref, "{:010} 00000 n \n", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            count, xref_offset
        );
        self.out.extend_from_slice(xref.as_bytes());
    }
}

/// Text operators for one page. The first line of the first page is the
/// centred title.
fn content_stream(lines: &[String], first_page: bool) -> Vec<u8> {
    let mut stream = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let y = TOP_BASELINE - i as f32 * LINE_HEIGHT;
        let x = if first_page && i == 0 {
            let width = line.chars().count() as f32 * AVG_CHAR_WIDTH;
            ((PAGE_WIDTH - width) / 2.0).max(MARGIN_LEFT)
        } else {
            MARGIN_LEFT
        };

        stream.extend_from_slice(
            format!("BT /F1 {} Tf {:.2} {:.2} Td (", FONT_SIZE, x, y).as_bytes(),
        );
        stream.extend(encode_text(line));
        stream.extend_from_slice(b") Tj ET\n");
    }

    stream
}

/// Encode text as a WinAnsi PDF string literal body.
///
/// Latin-1 characters map to their byte value; anything else (and control
/// characters) becomes `?`. `(`, `)` and `\` are escaped.
fn encode_text(text: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                bytes.push(b'\\');
                bytes.push(c as u8);
            }
            c if (c as u32) < 0x20 || (0x7F..0xA0).contains(&(c as u32)) => bytes.push(b'?'),
            c if (c as u32) <= 0xFF => bytes.push(c as u32 as u8),
            _ => bytes.push(b'?'),
        }
    }
    bytes
}

// ============================================================================
// TESTS
// ============================================================================
