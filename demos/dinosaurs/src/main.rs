use talon::prelude::*;

mod dinosaurs;

use dinosaurs::DinosaurModule;

#[tokio::main]
async fn main() -> talon::Result<()> {
    tracing_subscriber::fmt::init();

    tracing::info!("Starting dinosaurs server...");

    let app = Application::builder()
        .module::<DinosaurModule>()
        .build()
        .await?;

    app.listen().await
}
