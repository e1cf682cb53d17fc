//! Activity events emitted around PDF generation.
//!
//! The host application decides where they go (an activity log table, a
//! local journal, ...) by implementing [`ActivityLogger`].

use serde::Serialize;

use crate::DocumentKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    PdfGenerated,
    PdfGenerationFailed,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActivityEvent {
    pub action: ActivityAction,
    pub document_type: DocumentKind,
    pub document_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActivityEvent {
    pub fn generated(document_type: DocumentKind, document_number: &str, size_bytes: usize) -> Self {
        Self {
            action: ActivityAction::PdfGenerated,
            document_type,
            document_number: document_number.to_owned(),
            size_bytes: Some(size_bytes),
            error: None,
        }
    }

    pub fn failed(document_type: DocumentKind, document_number: &str, error: String) -> Self {
        Self {
            action: ActivityAction::PdfGenerationFailed,
            document_type,
            document_number: document_number.to_owned(),
            size_bytes: None,
            error: Some(error),
        }
    }
}

/// Sink for [`ActivityEvent`]s.
///
/// Called inline on the request path; implementations that do I/O should
/// hand the event off (e.g. to a channel) rather than block.
pub trait ActivityLogger: Send + Sync {
    fn log(&self, event: ActivityEvent);
}
