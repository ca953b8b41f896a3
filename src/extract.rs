//! Text extraction from uploaded documents.
//!
//! Binary → plain UTF-8 text. PDF is the primary format; plain-text files
//! pass through a UTF-8 decode. Anything that yields fewer than
//! [`MIN_EXTRACTED_CHARS`] characters of text is treated as a failed
//! extraction and no document record is created downstream.

use crate::errors::ApiError;

/// Extractions shorter than this are considered empty uploads.
pub const MIN_EXTRACTED_CHARS: usize = 10;

pub fn extract_text(bytes: &[u8], file_name: &str) -> Result<String, ApiError> {
    let text = match classify(bytes, file_name) {
        Format::Pdf => pdf_extract::extract_text_from_mem(bytes).map_err(|err| {
            ApiError::ExtractionFailed(format!("Could not read PDF '{}': {}", file_name, err))
        })?,
        Format::PlainText => String::from_utf8(bytes.to_vec()).map_err(|_| {
            ApiError::ExtractionFailed(format!("'{}' is not valid UTF-8 text", file_name))
        })?,
        Format::Unsupported => {
            return Err(ApiError::ExtractionFailed(format!(
                "Unsupported file type for '{}'; upload a PDF or plain-text file",
                file_name
            )))
        }
    };

    if text.trim().chars().count() < MIN_EXTRACTED_CHARS {
        return Err(ApiError::ExtractionFailed(format!(
            "No extractable text found in '{}'",
            file_name
        )));
    }

    Ok(text)
}

enum Format {
    Pdf,
    PlainText,
    Unsupported,
}

fn classify(bytes: &[u8], file_name: &str) -> Format {
    if bytes.starts_with(b"%PDF") {
        return Format::Pdf;
    }

    let lower = file_name.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        return Format::Pdf;
    }
    if lower.ends_with(".txt") || lower.ends_with(".md") {
        return Format::PlainText;
    }

    Format::Unsupported
}
