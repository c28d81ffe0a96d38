#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dinopet_lib::run().await
}
