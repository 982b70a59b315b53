use crate::cli::ServeArgs;
use crate::infra::{load_snapshot, AppState, LoadMode};
use crate::routes::router;
use adscore::config::AppConfig;
use adscore::error::AppError;
use adscore::scoring::ScoringEngine;
use adscore::sources::SnapshotStore;
use adscore::telemetry;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(dir) = args.data_dir.take() {
        config.data.dir = dir;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let paths = config.data.source_paths();
    let app_state = AppState::new(
        SnapshotStore::new(paths.clone()),
        ScoringEngine::new(config.scoring),
        prometheus_handle,
    );

    if paths.iter().all(|(_, path)| path.is_file()) {
        if let Err(err) = load_snapshot(app_state.store.clone(), LoadMode::Reload).await {
            warn!(error = %err, "initial source load failed; will retry on demand");
        }
    } else {
        warn!(
            preference = %paths.preference.display(),
            expression = %paths.expression.display(),
            "source files missing; loading deferred to first request"
        );
    }

    let readiness_flag = app_state.readiness.clone();
    let app = router()
        .layer(Extension(app_state))
        .layer(CorsLayer::permissive())
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        environment = config.environment.label(),
        formula = %config.scoring.formula,
        clamp = %config.scoring.clamp,
        %addr,
        "content scoring service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
