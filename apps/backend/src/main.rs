#[tokio::main]
async fn main() -> anyhow::Result<()> {
    studycards_backend::run().await
}
