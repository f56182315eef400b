//! Text extraction: content bytes → per-page text.
//!
//! Each supported format implements [`TextExtractor`]; [`extractor_for`]
//! returns the right one. Paginated formats yield one string per page (PDF)
//! or per spine chapter (EPUB) so callers can filter page by page. Formats
//! with no text strategy (images, archives, unknown files) resolve to `None`
//! rather than an error.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

use super::tokenizer::TokenizerOptions;

/// Result type for extraction.
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

/// Formats with a text extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContentFormat {
    PlainText,
    Html,
    Pdf,
    Epub,
}

impl ContentFormat {
    /// Human-readable name for diagnostics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlainText => "text",
            Self::Html => "html",
            Self::Pdf => "pdf",
            Self::Epub => "epub",
        }
    }

    /// Tokenizer preparation matching the format's page text.
    pub fn tokenizer_options(&self) -> TokenizerOptions {
        match self {
            Self::PlainText => TokenizerOptions::PLAIN,
            Self::Html | Self::Epub => TokenizerOptions::MARKUP,
            Self::Pdf => TokenizerOptions::PAGINATED,
        }
    }

    /// Parse a user-supplied format name.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "text" | "txt" | "plain" | "md" | "markdown" => Some(Self::PlainText),
            "html" | "htm" | "xhtml" => Some(Self::Html),
            "pdf" => Some(Self::Pdf),
            "epub" => Some(Self::Epub),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the text of a content item comes from.
#[derive(Debug, Clone)]
pub enum ContentSource {
    /// Plain text, e.g. a note body.
    Text(String),
    /// HTML markup, e.g. a rich-text note.
    Html(String),
    /// Raw file bytes with an optional known format.
    Bytes {
        data: Vec<u8>,
        format: Option<ContentFormat>,
    },
    /// A file on disk; the format comes from its extension or content.
    File(PathBuf),
}

/// Text of one content item, split the way its format paginates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText {
    pub format: ContentFormat,
    pub pages: Vec<String>,
}

/// Trait for format-specific text extractors.
pub trait TextExtractor {
    /// Extract text from raw bytes, one entry per page.
    fn pages(&self, data: &[u8]) -> ExtractResult<Vec<String>>;

    /// The format this extractor handles.
    fn format(&self) -> ContentFormat;
}

/// Get the extractor for a content format.
pub fn extractor_for(format: ContentFormat) -> Box<dyn TextExtractor + Send + Sync> {
    match format {
        ContentFormat::PlainText => Box::new(PlainTextExtractor),
        ContentFormat::Html => Box::new(HtmlExtractor),
        ContentFormat::Pdf => Box::new(PdfExtractor),
        ContentFormat::Epub => Box::new(EpubExtractor),
    }
}

/// Detect the content format from a file extension.
pub fn detect_format(path: &Path) -> Option<ContentFormat> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "html" | "htm" | "xhtml" => Some(ContentFormat::Html),
        "pdf" => Some(ContentFormat::Pdf),
        "epub" => Some(ContentFormat::Epub),
        "txt" | "md" | "text" | "markdown" | "rst" | "org" => Some(ContentFormat::PlainText),
        _ => None,
    }
}

/// Detect the format from leading bytes.
pub fn sniff_format(data: &[u8]) -> Option<ContentFormat> {
    if data.starts_with(b"%PDF-") {
        return Some(ContentFormat::Pdf);
    }
    // EPUB is a ZIP whose first entry is an uncompressed `mimetype` file.
    if data.starts_with(b"PK\x03\x04")
        && data.len() > 58
        && &data[30..38] == b"mimetype"
        && data[38..].starts_with(b"application/epub+zip")
    {
        return Some(ContentFormat::Epub);
    }
    let head = String::from_utf8_lossy(&data[..data.len().min(512)]).to_lowercase();
    let head = head.trim_start();
    if head.starts_with("<!doctype html") || head.starts_with("<html") {
        return Some(ContentFormat::Html);
    }
    None
}

/// Resolve a source into extracted text. `Ok(None)` means the source has
/// no text strategy and should not be indexed.
pub fn extract(source: &ContentSource) -> ExtractResult<Option<ExtractedText>> {
    let (data, format) = match source {
        ContentSource::Text(text) => {
            return Ok(Some(ExtractedText {
                format: ContentFormat::PlainText,
                pages: vec![text.clone()],
            }));
        }
        ContentSource::Html(html) => {
            return Ok(Some(ExtractedText {
                format: ContentFormat::Html,
                pages: vec![html.clone()],
            }));
        }
        ContentSource::Bytes { data, format } => {
            (std::borrow::Cow::Borrowed(data.as_slice()), format.or_else(|| sniff_format(data)))
        }
        ContentSource::File(path) => {
            let data = std::fs::read(path).map_err(|e| ExtractError::Io {
                path: path.display().to_string(),
                source: e,
            })?;
            let format = detect_format(path).or_else(|| sniff_format(&data));
            (std::borrow::Cow::Owned(data), format)
        }
    };

    let Some(format) = format else {
        return Ok(None);
    };
    let pages = extractor_for(format).pages(&data)?;
    Ok(Some(ExtractedText { format, pages }))
}

/// Plain text: the whole input is one page.
struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn format(&self) -> ContentFormat {
        ContentFormat::PlainText
    }

    fn pages(&self, data: &[u8]) -> ExtractResult<Vec<String>> {
        Ok(vec![String::from_utf8_lossy(data).into_owned()])
    }
}

/// HTML: one page of markup; the tokenizer strips the tags.
struct HtmlExtractor;

impl TextExtractor for HtmlExtractor {
    fn format(&self) -> ContentFormat {
        ContentFormat::Html
    }

    fn pages(&self, data: &[u8]) -> ExtractResult<Vec<String>> {
        Ok(vec![String::from_utf8_lossy(data).into_owned()])
    }
}

/// PDF via `pdf-extract`, one string per page.
struct PdfExtractor;

impl TextExtractor for PdfExtractor {
    fn format(&self) -> ContentFormat {
        ContentFormat::Pdf
    }

    fn pages(&self, data: &[u8]) -> ExtractResult<Vec<String>> {
        pdf_extract::extract_text_from_mem_by_pages(data).map_err(|e| ExtractError::Parse {
            format: "pdf".into(),
            message: e.to_string(),
        })
    }
}

/// EPUB via the `epub` crate, one XHTML string per spine chapter.
struct EpubExtractor;

impl TextExtractor for EpubExtractor {
    fn format(&self) -> ContentFormat {
        ContentFormat::Epub
    }

    fn pages(&self, data: &[u8]) -> ExtractResult<Vec<String>> {
        let cursor = Cursor::new(data.to_vec());
        let mut doc = epub::doc::EpubDoc::from_reader(cursor).map_err(|e| ExtractError::Parse {
            format: "epub".into(),
            message: e.to_string(),
        })?;

        let mut pages = Vec::new();
        for chapter in 0..doc.get_num_chapters() {
            doc.set_current_chapter(chapter);
            if let Some((content, _mime)) = doc.get_current_str() {
                if !content.trim().is_empty() {
                    pages.push(content);
                }
            }
        }
        Ok(pages)
    }
}
