#[tokio::main]
async fn main() -> anyhow::Result<()> {
    matchpoint::run().await
}
