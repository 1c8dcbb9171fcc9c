use tracing::error;

#[tokio::main]
async fn main() {
    if let Err(e) = travel_backend::start_server().await {
        error!("Failed to start server: {e:#}");
        std::process::exit(1);
    }
}
