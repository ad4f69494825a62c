//! Sentinel Site - binary entry point
//! Delegates to the library for all app logic.

#[tokio::main]
async fn main() {
    if let Err(e) = sentinel_site::run().await {
        tracing::error!("Fatal: {}", e);
        eprintln!("sentinel-site: {e}");
        std::process::exit(1);
    }
}
