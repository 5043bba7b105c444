//! Guest Review Insights — Binary Entrypoint
//! Boots the Axum HTTP server, wiring review sources, shared state, and
//! the Prometheus exporter.

use guest_review_insights::api::{create_router, AppState};
use guest_review_insights::metrics::Metrics;
use guest_review_insights::source::{GoogleClient, HostawayClient, ReviewSource};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Structured logs; `LOG_FORMAT=json` switches to JSON lines for
/// container deployments.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

/// Build one provider per configured channel. Without credentials each
/// channel falls back to its bundled fixture payload, so the dashboard
/// works out of the box in development.
fn build_sources() -> Vec<Box<dyn ReviewSource>> {
    let mut sources: Vec<Box<dyn ReviewSource>> = Vec::new();

    match std::env::var("HOSTAWAY_API_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            let base = std::env::var("HOSTAWAY_BASE_URL")
                .unwrap_or_else(|_| "https://api.hostaway.com".to_string());
            tracing::info!(%base, "hostaway source: live API");
            sources.push(Box::new(HostawayClient::from_api(base, key)));
        }
        _ => {
            tracing::info!("hostaway source: bundled fixture");
            sources.push(Box::new(HostawayClient::from_fixture(include_str!(
                "../fixtures/hostaway_reviews.json"
            ))));
        }
    }

    match (
        std::env::var("GOOGLE_MAPS_API_KEY"),
        std::env::var("GOOGLE_PLACE_ID"),
    ) {
        (Ok(key), Ok(place_id)) if !key.trim().is_empty() => {
            let property_id =
                std::env::var("GOOGLE_PROPERTY_ID").unwrap_or_else(|_| "prop-253".to_string());
            let listing_name = std::env::var("GOOGLE_LISTING_NAME")
                .unwrap_or_else(|_| "2B N1 A - 29 Shoreditch Heights".to_string());
            tracing::info!(%place_id, "google source: live API");
            sources.push(Box::new(GoogleClient::from_api(
                property_id,
                listing_name,
                place_id,
                key,
            )));
        }
        _ => {
            tracing::info!("google source: bundled fixture");
            sources.push(Box::new(GoogleClient::from_fixture(
                "prop-253",
                "2B N1 A - 29 Shoreditch Heights",
                include_str!("../fixtures/google_reviews.json"),
            )));
        }
    }

    sources
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    init_tracing();

    let metrics = Metrics::init();
    let state = AppState::new(build_sources());
    let app = create_router(state).merge(metrics.router());

    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "guest-review-insights listening");
    axum::serve(listener, app).await?;

    Ok(())
}
