#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wordlens_lib::run().await
}
