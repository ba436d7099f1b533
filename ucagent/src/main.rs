#[tokio::main]
async fn main() -> anyhow::Result<()> {
    ucagent::run_cli().await
}
