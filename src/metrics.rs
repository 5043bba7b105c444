// src/metrics.rs
use axum::{routing::get, Router};
use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder and register the API-side series.
    /// (Source-side series are described on first fetch.)
    pub fn init() -> Self {
        let builder = PrometheusBuilder::new();

        let handle = builder
            .install_recorder()
            .expect("prometheus: install recorder");

        describe_counter!(
            "approvals_toggled_total",
            "Approval toggles applied through the API."
        );
        describe_counter!(
            "review_list_requests_total",
            "Filtered review list requests served."
        );
        describe_counter!("insight_reports_total", "Insight reports computed.");

        Self { handle }
    }

    /// Router exposing `/metrics` in the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
