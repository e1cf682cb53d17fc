use pdfgen_http::PdfServiceClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = PdfServiceClient::from_env().map_err(anyhow::Error::msg)?;

    if client.health_check().await {
        println!("{} is up", client.health_url());
    } else {
        println!("{} is down", client.health_url());
        std::process::exit(1);
    }

    Ok(())
}
