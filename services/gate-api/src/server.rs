use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryRecordStore};
use crate::routes::with_gate_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use product_gate::config::AppConfig;
use product_gate::error::AppError;
use product_gate::pipeline::{QualityGate, RecordService};
use product_gate::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let gate = QualityGate::standard()?;
    let categories = gate.registry().list().len();
    let store = Arc::new(InMemoryRecordStore::default());
    let service = Arc::new(RecordService::new(gate, store));

    let app = with_gate_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, categories, "product quality gate ready");

    axum::serve(listener, app).await?;
    Ok(())
}
