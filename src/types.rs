use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Financial document types the rendering service understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Invoice,
    Receipt,
    PaymentVoucher,
    StatementOfPayment,
}

impl DocumentKind {
    /// Identifier used in file names and on the wire.
    pub fn slug(self) -> &'static str {
        match self {
            Self::Invoice => "invoice",
            Self::Receipt => "receipt",
            Self::PaymentVoucher => "payment_voucher",
            Self::StatementOfPayment => "statement_of_payment",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Invoice => "Invoice",
            Self::Receipt => "Receipt",
            Self::PaymentVoucher => "Payment Voucher",
            Self::StatementOfPayment => "Statement of Payment",
        }
    }
}

/// Issuing company printed in the document header.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

impl CompanyInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// The user who printed the document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrinterInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Input for [`crate::PdfServiceClient::generate_pdf`].
#[derive(Clone, Debug, PartialEq)]
pub struct PdfRequest {
    pub kind: DocumentKind,
    /// Document number, e.g. `INV-0042`.
    pub number: String,
    /// Document body as stored by the application (line items, totals, ...).
    pub document: serde_json::Value,
    pub company: CompanyInfo,
    pub printer: Option<PrinterInfo>,
}

impl PdfRequest {
    pub fn new(
        kind: DocumentKind,
        number: impl Into<String>,
        document: serde_json::Value,
        company: CompanyInfo,
    ) -> Self {
        Self {
            kind,
            number: number.into(),
            document,
            company,
            printer: None,
        }
    }

    pub fn with_printer(mut self, printer: PrinterInfo) -> Self {
        self.printer = Some(printer);
        self
    }

    /// `{kind}_{number}.pdf`, with the number reduced to `[A-Za-z0-9_-]`.
    pub fn file_name(&self) -> String {
        let number: String = self
            .number
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        let number = if number.is_empty() {
            "document"
        } else {
            number.as_str()
        };
        format!("{}_{number}.pdf", self.kind.slug())
    }
}

/// Rendered PDF returned by the service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedPdf {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl GeneratedPdf {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Standard base64 of the file, for storage and share APIs that take text.
    pub fn to_base64(&self) -> String {
        BASE64.encode(&self.bytes)
    }

    /// Writes the file into `dir` under [`GeneratedPdf::file_name`] and returns its path.
    pub async fn save_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }
}
