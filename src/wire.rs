use serde::{Deserialize, Serialize};

use crate::{CompanyInfo, DocumentKind, PrinterInfo};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest<'a> {
    pub document_type: DocumentKind,
    pub document_number: &'a str,
    pub document: &'a serde_json::Value,
    pub company_info: &'a CompanyInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub printer_info: Option<&'a PrinterInfo>,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Pulls `error` out of a `{ "error": ... }` body, falling back to the raw text.
pub fn error_message(body: &[u8]) -> String {
    match serde_json::from_slice::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => String::from_utf8_lossy(body).trim().to_owned(),
    }
}
