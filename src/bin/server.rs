use std::sync::Arc;

use cantstop::env_config;
use cantstop::server::{create_router, Session};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_config::init_tracing();
    env_config::init_rayon_threads_lenient();
    let port = env_config::server_port();
    let seed = env_config::fixed_seed();
    println!("Starting Can't Stop coach server...");
    if let Some(seed) = seed {
        println!("Dice seeded with CANTSTOP_SEED={}", seed);
    }

    let session = Arc::new(Session::new(seed)?);
    let app = create_router(session);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    println!("Server is running on port {}. Press Ctrl+C to stop.", port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    println!("\nStopping server...");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        eprintln!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
}
