// src/services/parser/text.rs

//! Text extraction from downloaded schedule documents.

use crate::error::{AppError, Result};

/// Turns raw document bytes into plain text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, bytes: &[u8]) -> Result<String>;
}

/// Extracts the text layer of a PDF document.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfTextExtractor;

impl TextExtractor for PdfTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| AppError::parse("pdf document", e))
    }
}

/// Treats the bytes as already extracted UTF-8 text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextExtractor;

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec()).map_err(|e| AppError::parse("text document", e))
    }
}
