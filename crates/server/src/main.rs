#[tokio::main]
async fn main() -> anyhow::Result<()> {
    socialice_server::run().await
}
