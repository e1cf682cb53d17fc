//! `pdfgen-http` is an async client for a remote PDF rendering service.
//!
//! It turns financial documents (invoices, receipts, payment vouchers,
//! statements of payment) into PDF files:
//! - [`PdfServiceClient::generate_pdf`]
//! - [`PdfServiceClient::health_check`]
//!
//! Requests go through [`fetch_with_retry`], which bounds every attempt with
//! a timeout and retries timeouts, network failures and 5xx responses with
//! exponential backoff.

mod activity;
mod client;
mod error;
mod options;
pub mod retry;
mod types;
mod wire;

pub use activity::{ActivityAction, ActivityEvent, ActivityLogger};
pub use client::{service_url, PdfServiceClient};
pub use error::PdfServiceError;
pub use options::{ClientOptions, RetryConfig};
pub use retry::fetch_with_retry;
pub use types::{CompanyInfo, DocumentKind, GeneratedPdf, PdfRequest, PrinterInfo};

pub type Result<T> = std::result::Result<T, PdfServiceError>;
