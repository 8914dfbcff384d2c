//! HTTP front end for the stockroom ledger.
//!
//! Serves the JSON API the stockroom pages call, plus server-rendered
//! product, sold and clinic listings.
//!
//! | Method | Path | Purpose |
//! |---|---|---|
//! | GET | `/`, `/products` | products in stock |
//! | GET | `/sold` | sold history |
//! | GET | `/clinic` | clinic history |
//! | POST | `/api/add_product` | register incoming stock |
//! | POST | `/api/sell_product` | sell units |
//! | POST | `/api/send_to_clinic` | send one unit to the clinic |
//! | GET | `/api/search_products?q=` | search products in stock |
//! | GET | `/api/get_stats` | stock and history counters |
//! | GET | `/api/sold_history`, `/api/clinic_history` | history as JSON |

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::signal::ctrl_c;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod views;

use routes::{
    add_product_handler, clinic_history_handler, clinic_page, products_page, search_handler,
    sell_product_handler, send_to_clinic_handler, sold_history_handler, sold_page, stats_handler,
};
use state::State;

pub fn router(state: Arc<State>) -> Router {
    Router::new()
        .route("/", get(products_page))
        .route("/products", get(products_page))
        .route("/sold", get(sold_page))
        .route("/clinic", get(clinic_page))
        .route("/api/add_product", post(add_product_handler))
        .route("/api/sell_product", post(sell_product_handler))
        .route("/api/send_to_clinic", post(send_to_clinic_handler))
        .route("/api/search_products", get(search_handler))
        .route("/api/get_stats", get(stats_handler))
        .route("/api/sold_history", get(sold_history_handler))
        .route("/api/clinic_history", get(clinic_history_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!("Failed to install Ctrl+C handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
