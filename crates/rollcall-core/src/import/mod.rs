//! Roster import from uploaded documents.
//!
//! Two best-effort parsers turn unstructured roster text into candidate
//! members:
//! - `pdf`: fixed patterns tuned to the ward roster PDF layout, plus a
//!   line-by-line cleanup heuristic
//! - `ai`: asks Gemini for a JSON list and normalizes what comes back
//!
//! Neither is authoritative. Callers decide what to persist.

pub mod ai;
pub mod pdf;

use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::models::{NewMember, Sex, Track};
use crate::remote::RemoteError;

pub use ai::GeminiClient;
pub use pdf::{parse_member_row, parse_roster, parse_roster_lines};

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Could not find any members in the document")]
    NothingFound,

    #[error("Failed to read PDF: {0}")]
    Pdf(String),

    #[error("Gemini API key not configured. Set GEMINI_API_KEY in your environment.")]
    NotConfigured,

    #[error("Unexpected Gemini reply: {0}")]
    MalformedReply(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),
}

/// A member proposed by an importer, not yet stored
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct RosterCandidate {
    pub name: String,
    #[serde(rename = "gender")]
    pub sex: Sex,
    #[serde(rename = "category")]
    pub track: Track,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl RosterCandidate {
    pub fn new(name: impl Into<String>, sex: Sex) -> Self {
        Self {
            name: name.into(),
            sex,
            track: Track::Regular,
            email: None,
            phone: None,
        }
    }

    pub fn into_new_member(self) -> NewMember {
        NewMember {
            name: self.name,
            sex: self.sex,
            track: self.track,
            email: self.email,
            phone: self.phone,
        }
    }
}

fn is_pdf(filename: Option<&str>, content_type: Option<&str>) -> bool {
    content_type == Some("application/pdf")
        || filename.is_some_and(|f| f.to_ascii_lowercase().ends_with(".pdf"))
}

/// Pull plain text out of an uploaded file.
///
/// PDFs go through the text extractor; anything else is read as UTF-8,
/// replacing invalid sequences. Non-breaking spaces become plain spaces.
pub fn extract_text(
    filename: Option<&str>,
    content_type: Option<&str>,
    bytes: &[u8],
) -> Result<String, ImportError> {
    let text = if is_pdf(filename, content_type) {
        pdf_extract::extract_text_from_mem(bytes).map_err(|e| ImportError::Pdf(e.to_string()))?
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    };

    debug!(
        filename = filename.unwrap_or("<unnamed>"),
        bytes = bytes.len(),
        chars = text.chars().count(),
        "Extracted upload text"
    );
    Ok(text.replace('\u{a0}', " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_passes_through() {
        let text = extract_text(Some("roster.txt"), Some("text/plain"), "Smith,\u{a0}Jane".as_bytes())
            .unwrap();
        assert_eq!(text, "Smith, Jane");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let text = extract_text(None, None, &[b'A', 0xFF, b'B']).unwrap();
        assert_eq!(text, "A\u{FFFD}B");
    }

    #[test]
    fn test_pdf_detection() {
        assert!(is_pdf(Some("ROSTER.PDF"), None));
        assert!(is_pdf(None, Some("application/pdf")));
        assert!(!is_pdf(Some("roster.txt"), Some("text/plain")));
    }

    #[test]
    fn test_garbage_pdf_is_an_error() {
        let err = extract_text(Some("roster.pdf"), None, b"not a pdf").unwrap_err();
        assert!(matches!(err, ImportError::Pdf(_)));
    }

    #[test]
    fn test_candidate_into_new_member() {
        let member = RosterCandidate::new("Jane Smith", Sex::Female).into_new_member();
        assert_eq!(member.name, "Jane Smith");
        assert_eq!(member.track, Track::Regular);
    }
}
