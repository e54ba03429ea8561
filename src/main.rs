#[tokio::main]
async fn main() -> anyhow::Result<()> {
    soudanshitsu_lib::run().await
}
