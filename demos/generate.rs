use std::sync::Arc;

use pdfgen_http::{
    ActivityEvent, ActivityLogger, ClientOptions, CompanyInfo, DocumentKind, PdfRequest,
    PdfServiceClient, PrinterInfo, RetryConfig,
};
use serde_json::json;

struct StdoutLogger;

impl ActivityLogger for StdoutLogger {
    fn log(&self, event: ActivityEvent) {
        match serde_json::to_string(&event) {
            Ok(line) => println!("activity: {line}"),
            Err(err) => eprintln!("activity: unserializable event: {err}"),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let url = std::env::var("PDF_SERVICE_URL")?;
    let out_dir = std::env::var("PDF_OUT_DIR").unwrap_or_else(|_| ".".to_owned());

    let client = PdfServiceClient::new(url)
        .with_options(ClientOptions {
            retry: RetryConfig {
                max_attempts: 4,
                timeout_ms: 20_000,
                initial_delay_ms: 500,
                backoff_multiplier: 2.0,
            },
            ..ClientOptions::default()
        })
        .with_activity_logger(Arc::new(StdoutLogger));

    if !client.health_check().await {
        anyhow::bail!("pdf service at {} is not healthy", client.health_url());
    }

    let mut company = CompanyInfo::new("Acme Trading");
    company.address = Some("12 Harbour Road".to_owned());

    let request = PdfRequest::new(
        DocumentKind::Invoice,
        "INV-0001",
        json!({
            "customer": "Globex",
            "issueDate": "2026-10-19",
            "items": [
                { "description": "Consulting", "quantity": 2, "unitPrice": 150.0 },
                { "description": "Travel", "quantity": 1, "unitPrice": 42.0 }
            ],
            "total": 342.0
        }),
        company,
    )
    .with_printer(PrinterInfo {
        name: "Kit".to_owned(),
        email: Some("kit@acme.test".to_owned()),
    });

    let pdf = client.generate_pdf(&request).await?;
    let path = pdf.save_to(&out_dir).await?;
    println!("wrote {} ({} bytes)", path.display(), pdf.len());

    Ok(())
}
