use crate::infra::{load_snapshot, AppState, LoadMode};
use adscore::error::AppError;
use adscore::scoring::{ScoreOutcome, ScoreRequest};
use adscore::sources::{DataSnapshot, FileStatus, SourceKind, SourcePreview};
use adscore::taxonomy::{AdType, DimensionSpec};
use axum::extract::rejection::JsonRejection;
use axum::extract::Query;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

const PREVIEW_ROWS: usize = 5;
const SAMPLE_ROWS: usize = 2;
const PREFERENCE_COLUMN_PREVIEW: usize = 10;

pub(crate) fn router() -> Router {
    Router::new()
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .route("/api/theme-tags", get(theme_tags_endpoint))
        .route("/api/dimension-tags", get(dimension_tags_endpoint))
        .route("/api/data-status", get(data_status_endpoint))
        .route("/api/preference-data", get(preference_data_endpoint))
        .route("/api/debug-files", get(debug_files_endpoint))
        .route("/api/calculate-score", post(calculate_score_endpoint))
        .route("/api/reload-data", post(reload_data_endpoint))
}

pub(crate) async fn healthcheck(Extension(state): Extension<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "csv_loaded": state.store.is_loaded(),
        "csv_error": state.store.last_error(),
        "snapshot_version": state.store.current().map(|snapshot| snapshot.version()),
    }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Ad type catalogue with flattened and per-dimension tag lists.
pub(crate) async fn theme_tags_endpoint() -> Json<Value> {
    let theme_mapping: BTreeMap<&str, Vec<&str>> = AdType::scored()
        .map(|ad_type| (ad_type.label(), ad_type.all_tags()))
        .collect();
    let taxonomy: Vec<Value> = AdType::scored()
        .map(|ad_type| {
            json!({
                "ad_type": ad_type,
                "dimensions": ad_type.dimension_specs(),
            })
        })
        .collect();

    Json(json!({
        "success": true,
        "theme_mapping": theme_mapping,
        "ad_types": AdType::ordered(),
        "taxonomy": taxonomy,
    }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct DimensionTagsQuery {
    #[serde(default)]
    ad_type: Option<String>,
}

pub(crate) async fn dimension_tags_endpoint(Query(query): Query<DimensionTagsQuery>) -> Json<Value> {
    let ad_type = query
        .ad_type
        .as_deref()
        .and_then(AdType::from_label)
        .filter(|ad_type| ad_type.has_taxonomy());

    let Some(ad_type) = ad_type else {
        return Json(json!({ "success": false, "error": "invalid ad type" }));
    };

    let dimension_tags: BTreeMap<&str, &[&str]> = ad_type
        .dimension_specs()
        .iter()
        .map(|spec: &DimensionSpec| (spec.name, spec.tags))
        .collect();

    Json(json!({
        "success": true,
        "ad_type": ad_type,
        "dimensions": ad_type.dimensions(),
        "dimension_tags": dimension_tags,
    }))
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

pub(crate) async fn data_status_endpoint(Extension(state): Extension<AppState>) -> Json<Value> {
    let mut files_status = Map::new();
    let mut all_files_exist = true;
    for (_, path) in state.store.paths().iter() {
        let status = FileStatus::probe(path);
        all_files_exist &= status.exists;
        files_status.insert(file_label(path), json!(status));
    }

    let snapshot = state.store.current();
    Json(json!({
        "success": all_files_exist,
        "files_status": files_status,
        "all_files_exist": all_files_exist,
        "user_preference_loaded": snapshot.is_some(),
        "content_expression_loaded": snapshot.is_some(),
        "snapshot_version": snapshot.as_ref().map(|snapshot| snapshot.version()),
        "loaded_at": snapshot.as_ref().map(|snapshot| snapshot.loaded_at().to_rfc3339()),
        "last_error": state.store.last_error(),
    }))
}

/// Summary of the loaded tables, loading them first if nothing is published.
pub(crate) async fn preference_data_endpoint(Extension(state): Extension<AppState>) -> Json<Value> {
    match load_snapshot(state.store.clone(), LoadMode::Ensure).await {
        Ok(snapshot) => {
            let columns: Vec<&String> = snapshot
                .preferences()
                .columns()
                .iter()
                .take(PREFERENCE_COLUMN_PREVIEW)
                .collect();
            Json(json!({
                "success": true,
                "data_loaded": true,
                "snapshot_version": snapshot.version(),
                "column_count": snapshot.preferences().len(),
                "user_preference_columns": columns,
                "content_expression_types": snapshot.expressions().ad_types(),
            }))
        }
        Err(err) => {
            let files_checked: Map<String, Value> = state
                .store
                .paths()
                .iter()
                .map(|(_, path)| (file_label(path), json!(path.is_file())))
                .collect();
            Json(json!({
                "success": false,
                "error": err.to_string(),
                "data_loaded": false,
                "files_checked": files_checked,
            }))
        }
    }
}

fn preview_entry(source_kind: SourceKind, path: &Path) -> Value {
    let status = FileStatus::probe(path);
    let mut entry = json!({
        "source": source_kind.label(),
        "exists": status.exists,
        "size": status.size,
    });
    if !status.exists {
        return entry;
    }

    match SourcePreview::read(source_kind, path, PREVIEW_ROWS, SAMPLE_ROWS) {
        Ok(preview) => {
            entry["shape"] = json!([preview.row_count, preview.columns.len()]);
            entry["columns"] = json!(preview.columns);
            entry["sample_data"] = json!(preview.sample);
        }
        Err(err) => entry["read_error"] = json!(err.to_string()),
    }
    entry
}

/// Raw look at both source files: presence, size, header and first rows.
pub(crate) async fn debug_files_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, AppError> {
    let store = state.store.clone();
    let files = tokio::task::spawn_blocking(move || {
        store
            .paths()
            .iter()
            .map(|(kind, path)| (file_label(path), preview_entry(kind, path)))
            .collect::<Map<String, Value>>()
    })
    .await
    .map_err(|join| AppError::Io(std::io::Error::other(join)))?;

    Ok(Json(Value::Object(files)))
}

fn failure(error: impl ToString) -> Json<Value> {
    Json(json!({ "success": false, "error": error.to_string() }))
}

fn score_response(
    outcome: &ScoreOutcome,
    request: &ScoreRequest,
    data_source: &str,
    clamp: &str,
) -> Value {
    let breakdown = &outcome.breakdown;
    json!({
        "success": true,
        "data_source": data_source,
        "results": {
            "base_score": breakdown.base_percent(),
            "match_value": breakdown.match_value,
            "k": breakdown.k,
            "final_score": breakdown.final_percent(),
        },
        "dimensions_used": request.dimensions,
        "ad_type": outcome.ad_type,
        "derivation": {
            "formula": outcome.formula,
            "clamp": clamp,
            "clamped": breakdown.clamped,
            "snapshot_version": outcome.snapshot_version,
            "used_default": outcome.used_default(),
            "formula_detail": outcome.formula_detail(),
            "dimensions": outcome.dimensions,
        },
    })
}

/// Scores a weighted tag selection. Every outcome is HTTP 200 with a
/// `success` flag, including unparsable bodies.
pub(crate) async fn calculate_score_endpoint(
    Extension(state): Extension<AppState>,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Json<Value> {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return failure(format!("calculation error: {}", rejection.body_text()));
        }
    };

    let config = state.engine.config();
    let (snapshot, data_source) = match load_snapshot(state.store.clone(), LoadMode::Ensure).await
    {
        Ok(snapshot) => (snapshot, config.formula.data_source().to_string()),
        Err(err) => {
            warn!(error = %err, "scoring against default lookup values");
            (
                Arc::new(DataSnapshot::empty()),
                format!("default lookup value {} (sources unavailable)", config.default_value),
            )
        }
    };

    match state.engine.score(&snapshot, &request) {
        Ok(outcome) => Json(score_response(
            &outcome,
            &request,
            &data_source,
            config.clamp.label(),
        )),
        Err(rejection) => {
            info!(%rejection, "score request rejected");
            failure(rejection)
        }
    }
}

pub(crate) async fn reload_data_endpoint(
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, AppError> {
    let snapshot = load_snapshot(state.store.clone(), LoadMode::Reload).await?;
    Ok(Json(json!({
        "success": true,
        "snapshot_version": snapshot.version(),
        "loaded_at": snapshot.loaded_at().to_rfc3339(),
        "preference_columns": snapshot.preferences().len(),
        "expression_types": snapshot.expressions().len(),
    })))
}
