use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use tracing::info;

use hostel_finder::config::AppConfig;
use hostel_finder::error::AppError;
use hostel_finder::telemetry;

use crate::cli::ServeArgs;
use crate::infra::{seed_store, AppState, InMemoryStore};
use crate::routes::{build_router, ApiContext};

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
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let store = Arc::new(InMemoryStore::default());
    if args.seed {
        seed_store(&store);
        info!("seeded demo accounts and listings");
    }
    let context = ApiContext::new(store);

    let app = build_router(&context)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "hostel marketplace api ready");

    axum::serve(listener, app).await?;
    Ok(())
}
