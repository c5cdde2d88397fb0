use sketchy::prelude::*;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    sketchy::init_tracing("info");

    let config = ServerConfig::from_env()?;
    let server = SketchyServer::builder().config(config).build().await?;
    tracing::info!(addr = %server.local_addr()?, "listening");

    server.run().await
}
