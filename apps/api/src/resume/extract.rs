//! Format detection and plain-text extraction for PDF, DOCX and TXT resumes.
//!
//! Detection sniffs the content signature first and only falls back to the declared
//! content type when sniffing finds nothing. PDF and DOCX parsing are CPU-bound and
//! should be driven from `tokio::task::spawn_blocking`.

use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, Run, RunChild, Table, TableCellContent,
    TableChild, TableRowChild,
};
use serde::Serialize;

use crate::errors::AppError;

/// Below this many characters the extracted text is flagged as low confidence.
pub const MIN_CONFIDENT_TEXT_LEN: usize = 100;

/// The closed set of resume formats we can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResumeFormat {
    Pdf,
    Docx,
    Txt,
}

impl ResumeFormat {
    pub const ALL: [ResumeFormat; 3] = [ResumeFormat::Pdf, ResumeFormat::Docx, ResumeFormat::Txt];

    pub fn extension(self) -> &'static str {
        match self {
            ResumeFormat::Pdf => "pdf",
            ResumeFormat::Docx => "docx",
            ResumeFormat::Txt => "txt",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ResumeFormat::Pdf => "application/pdf",
            ResumeFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ResumeFormat::Txt => "text/plain",
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.extension() == ext)
    }

    pub fn from_mime_type(mime: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.mime_type() == mime)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedFormat {
    pub format: ResumeFormat,
    pub mime_type: String,
}

#[derive(Debug, Clone)]
pub struct ExtractedText {
    pub text: String,
    pub low_confidence: bool,
}

/// `text/plain; charset=utf-8` → `text/plain`
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

pub fn detect_format(
    bytes: &[u8],
    declared_content_type: Option<&str>,
) -> Result<DetectedFormat, AppError> {
    if let Some(kind) = infer::get(bytes) {
        return ResumeFormat::from_extension(kind.extension())
            .map(|format| DetectedFormat {
                format,
                mime_type: kind.mime_type().to_string(),
            })
            .ok_or_else(|| unsupported(&format!("detected .{}", kind.extension())));
    }

    let declared = declared_content_type.map(essence);
    declared
        .as_deref()
        .and_then(ResumeFormat::from_mime_type)
        .map(|format| DetectedFormat {
            format,
            mime_type: format.mime_type().to_string(),
        })
        .ok_or_else(|| match declared.as_deref() {
            Some(mime) if !mime.is_empty() => unsupported(&format!("declared {mime}")),
            _ => unsupported("type could not be determined"),
        })
}

fn unsupported(detail: &str) -> AppError {
    AppError::UnsupportedResumeFormat(format!(
        "Unsupported resume file type ({detail}). Please upload PDF, DOCX, or TXT files."
    ))
}

/// Extracts and normalizes text. Only reachable with a detected, supported format.
pub fn extract_text(format: ResumeFormat, bytes: &[u8]) -> Result<ExtractedText, AppError> {
    let raw = match format {
        ResumeFormat::Pdf => extract_pdf(bytes)?,
        ResumeFormat::Docx => extract_docx(bytes)?,
        ResumeFormat::Txt => decode_text(bytes),
    };

    let text = normalize_whitespace(&raw);
    let low_confidence = text.chars().count() < MIN_CONFIDENT_TEXT_LEN;
    Ok(ExtractedText {
        text,
        low_confidence,
    })
}

/// NUL → space, whitespace runs → single space, trimmed. Idempotent.
pub fn normalize_whitespace(input: &str) -> String {
    input
        .replace('\0', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn extract_pdf(bytes: &[u8]) -> Result<String, AppError> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| {
        AppError::UnprocessableEntity(format!("Could not extract text from PDF: {e}"))
    })
}

fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

fn extract_docx(bytes: &[u8]) -> Result<String, AppError> {
    let docx = docx_rs::read_docx(bytes).map_err(|e| {
        AppError::UnprocessableEntity(format!("Could not read DOCX document: {e:?}"))
    })?;

    let mut text = String::new();
    for child in &docx.document.children {
        match child {
            DocumentChild::Paragraph(p) => push_paragraph(&mut text, p),
            DocumentChild::Table(t) => push_table(&mut text, t),
            _ => {}
        }
    }
    Ok(text)
}

fn push_paragraph(out: &mut String, paragraph: &Paragraph) {
    for child in &paragraph.children {
        push_paragraph_child(out, child);
    }
    out.push('\n');
}

fn push_paragraph_child(out: &mut String, child: &ParagraphChild) {
    match child {
        ParagraphChild::Run(run) => push_run(out, run),
        ParagraphChild::Hyperlink(link) => {
            for c in &link.children {
                push_paragraph_child(out, c);
            }
        }
        _ => {}
    }
}

fn push_run(out: &mut String, run: &Run) {
    for child in &run.children {
        match child {
            RunChild::Text(t) => out.push_str(&t.text),
            RunChild::Tab(_) => out.push('\t'),
            RunChild::Break(_) => out.push('\n'),
            _ => {}
        }
    }
}

fn push_table(out: &mut String, table: &Table) {
    for TableChild::TableRow(row) in &table.rows {
        for TableRowChild::TableCell(cell) in &row.cells {
            for content in &cell.children {
                match content {
                    TableCellContent::Paragraph(p) => push_paragraph(out, p),
                    TableCellContent::Table(t) => push_table(out, t),
                    _ => {}
                }
            }
        }
    }
}
