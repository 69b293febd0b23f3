//! Desk server: polls the treasury backend until it is ready, loads inventory, auctions,
//! yields and order history, and serves the order workflow over REST.
//!
//! Configuration: see [`treasury_desk::DeskConfig`].

use std::sync::Arc;

use log::{error, info};
use tokio::net::TcpListener;
use treasury_desk::{api, Desk, DeskConfig};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let _ = env_logger::try_init();
    let config = DeskConfig::from_env();
    info!(
        "treasury desk starting api_url={} policy={:?}",
        config.api_url, config.amount_policy
    );

    let desk = match Desk::from_config(&config) {
        Ok(desk) => Arc::new(desk),
        Err(e) => {
            error!("could not build backend client: {}", e);
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e));
        }
    };

    let poll = desk.start_health_poll(config.health_poll_interval);
    let loader = {
        let desk = desk.clone();
        tokio::spawn(async move {
            desk.readiness().wait_ready().await;
            let failures = desk.load_all().await;
            info!("initial load finished failures={}", failures.len());
        })
    };

    let app = api::create_router(desk.clone());
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("listening on http://{}", addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    desk.close();
    loader.abort();
    let _ = poll.await;
    info!("treasury desk stopped");
    Ok(())
}
