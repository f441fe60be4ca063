#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stream_url_api_lib::run().await
}
