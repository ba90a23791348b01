use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    inputsync::relay::run().await
}
