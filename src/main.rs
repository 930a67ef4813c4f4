#[tokio::main]
async fn main() -> anyhow::Result<()> {
    skillswap_search::run().await
}
