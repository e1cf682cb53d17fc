use std::{fmt, sync::Arc, time::Duration};

use reqwest::header;

use crate::{
    retry::fetch_with_retry,
    wire::{self, GenerateRequest},
    ActivityEvent, ActivityLogger, ClientOptions, GeneratedPdf, PdfRequest, PdfServiceError,
    Result,
};

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Joins the service base URL and an endpoint path.
///
/// Example: `("https://pdf.example.com/", "health")` → `"https://pdf.example.com/health"`
pub fn service_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim().trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[derive(Clone)]
/// HTTP client for the PDF rendering service.
pub struct PdfServiceClient {
    http: reqwest::Client,
    base_url: String,
    authorization: Option<String>,
    options: ClientOptions,
    activity: Option<Arc<dyn ActivityLogger>>,
}

impl fmt::Debug for PdfServiceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PdfServiceClient")
            .field("base_url", &self.base_url)
            .field(
                "authorization",
                &self.authorization.as_ref().map(|_| "<redacted>"),
            )
            .field("options", &self.options)
            .field("activity_logger", &self.activity.is_some())
            .finish()
    }
}

impl PdfServiceClient {
    /// Creates a client for the service rooted at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            authorization: None,
            options: ClientOptions::default(),
            activity: None,
        }
    }

    /// Creates a client from environment variables.
    ///
    /// Reads:
    /// - `PDF_SERVICE_URL`: service base URL (required)
    /// - `PDF_SERVICE_TOKEN`: bearer token (optional, `Bearer ` prefix optional)
    pub fn from_env() -> std::result::Result<Self, String> {
        let url = std::env::var("PDF_SERVICE_URL")
            .map_err(|_| "missing PDF_SERVICE_URL environment variable".to_owned())?;
        if url.trim().is_empty() {
            return Err("PDF_SERVICE_URL is set but empty".to_owned());
        }
        let client = Self::new(url);
        match std::env::var("PDF_SERVICE_TOKEN") {
            Ok(token) if !token.trim().is_empty() => Ok(client.with_bearer(token)),
            _ => Ok(client),
        }
    }

    /// Sends `Authorization: Bearer <token>` with every request.
    ///
    /// If the token is missing the `Bearer ` prefix, it is added automatically.
    pub fn with_bearer(mut self, token: impl AsRef<str>) -> Self {
        self.authorization = Some(normalize_bearer_authorization(token.as_ref()));
        self
    }

    /// Applies client options such as timeout and retry behavior.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    /// Reports generation results to `logger`.
    pub fn with_activity_logger(mut self, logger: Arc<dyn ActivityLogger>) -> Self {
        self.activity = Some(logger);
        self
    }

    /// Replaces the underlying `reqwest` client (proxies, TLS roots, pooling).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn generate_url(&self) -> String {
        service_url(&self.base_url, "generate-pdf")
    }

    pub fn health_url(&self) -> String {
        service_url(&self.base_url, "health")
    }

    /// Renders `request` to PDF.
    ///
    /// Timeouts, network failures and 5xx responses are retried according to
    /// [`ClientOptions::retry`]. A 5xx that persists becomes
    /// [`PdfServiceError::ServerError`]; any other non-success status becomes
    /// [`PdfServiceError::ClientError`] on the first occurrence.
    pub async fn generate_pdf(&self, request: &PdfRequest) -> Result<GeneratedPdf> {
        let result = self.send_generate(request).await;

        if let Some(logger) = &self.activity {
            let event = match &result {
                Ok(pdf) => ActivityEvent::generated(request.kind, &request.number, pdf.len()),
                Err(err) => ActivityEvent::failed(request.kind, &request.number, err.to_string()),
            };
            logger.log(event);
        }

        result
    }

    /// Returns `true` if `GET /health` answers with a success status within
    /// [`ClientOptions::health_timeout_ms`]. Never retried.
    pub async fn health_check(&self) -> bool {
        let request = self
            .authorize(self.http.get(self.health_url()))
            .timeout(Duration::from_millis(self.options.health_timeout_ms));

        match request.send().await {
            Ok(response) => response.status().is_success(),
            Err(_err) => {
                #[cfg(feature = "tracing")]
                tracing::debug!(error = %_err, "pdf service health check failed");
                false
            }
        }
    }

    async fn send_generate(&self, request: &PdfRequest) -> Result<GeneratedPdf> {
        let payload = GenerateRequest {
            document_type: request.kind,
            document_number: &request.number,
            document: &request.document,
            company_info: &request.company,
            printer_info: request.printer.as_ref(),
        };

        let builder = self
            .authorize(self.http.post(self.generate_url()))
            .header(header::ACCEPT, "application/pdf")
            .json(&payload);

        let retry = &self.options.retry;
        let response = fetch_with_retry(builder, retry).await?;
        let status = response.status();

        let body = tokio::time::timeout(retry.timeout(), response.bytes()).await;

        if !status.is_success() {
            // A stalled or broken error body costs the message, never the status.
            let message = match &body {
                Ok(Ok(bytes)) => wire::error_message(bytes),
                _ => String::new(),
            };
            return Err(if status.is_server_error() {
                PdfServiceError::ServerError {
                    status: status.as_u16(),
                    message,
                }
            } else {
                PdfServiceError::ClientError {
                    status: status.as_u16(),
                    message,
                }
            });
        }

        let body = match body {
            Ok(body) => body.map_err(|err| PdfServiceError::from_transport(err, retry.timeout_ms))?,
            Err(_elapsed) => {
                return Err(PdfServiceError::Timeout {
                    timeout_ms: retry.timeout_ms,
                })
            }
        };

        if body.is_empty() {
            return Err(PdfServiceError::Decode(
                "pdf service returned an empty body".to_owned(),
            ));
        }
        if !body.starts_with(PDF_MAGIC) {
            return Err(PdfServiceError::Decode(format!(
                "response is not a PDF document ({} bytes)",
                body.len()
            )));
        }

        #[cfg(feature = "tracing")]
        tracing::info!(
            document_type = request.kind.slug(),
            document_number = %request.number,
            size_bytes = body.len(),
            "generated pdf"
        );

        Ok(GeneratedPdf {
            file_name: request.file_name(),
            bytes: body.to_vec(),
        })
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.authorization {
            Some(value) => builder.header(header::AUTHORIZATION, value),
            None => builder,
        }
    }
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}
