//! The external interface facade: a small axum router exposing the
//! engine's read/mutate operations to the surrounding driver.
//!
//! Every handler locks the shared engine for the duration of its body
//! and releases it before responding, so operations are serialized and
//! individually atomic.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::Extension;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::response::ErasedJson;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::engine::{Config, ConfigPatch, Engine, EngineError};

use super::view::status_view;

pub type SharedEngine = Arc<Mutex<Engine>>;

/// Builds the router. The caller is responsible for binding and serving
/// it (see `main.rs`), keeping route construction separate from the
/// listener loop.
pub fn router(engine: SharedEngine) -> Router {
  Router::new()
    .route("/status", get(status))
    .route("/step", post(step))
    .route("/toggle_fault", post(toggle_fault))
    .route("/metrics", get(metrics))
    .route("/config", get(get_config).post(post_config))
    .route("/simulate_attack", post(simulate_attack))
    .route("/reset", post(reset))
    .layer(Extension(engine))
}

/// Binds and serves the router forever. Kept separate from [`router`] so
/// tests can exercise the router without a real socket.
pub async fn serve(engine: SharedEngine, addr: SocketAddr) -> anyhow::Result<()> {
  info!(%addr, "serving simulator API");
  axum::Server::bind(&addr)
    .serve(router(engine).into_make_service())
    .await?;
  Ok(())
}

fn engine_error_response(err: EngineError) -> (StatusCode, ErasedJson) {
  let status = match err {
    EngineError::InvalidId(_) | EngineError::InvalidConfig { .. } => StatusCode::BAD_REQUEST,
    EngineError::UnknownParent(_) => StatusCode::INTERNAL_SERVER_ERROR,
  };
  (status, ErasedJson::pretty(json!({ "error": err.to_string() })))
}

async fn status(Extension(engine): Extension<SharedEngine>) -> impl axum::response::IntoResponse {
  let engine = engine.lock().unwrap();
  ErasedJson::pretty(status_view(&engine))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepRequest {
  #[serde(default)]
  attack: bool,
}

async fn step(
  Extension(engine): Extension<SharedEngine>,
  Json(req): Json<StepRequest>,
) -> impl axum::response::IntoResponse {
  let mut engine = engine.lock().unwrap();
  let outcome = engine.step(req.attack);
  (StatusCode::OK, ErasedJson::pretty(outcome))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToggleFaultRequest {
  id: usize,
}

async fn toggle_fault(
  Extension(engine): Extension<SharedEngine>,
  Json(req): Json<ToggleFaultRequest>,
) -> impl axum::response::IntoResponse {
  let mut engine = engine.lock().unwrap();
  match engine.toggle_fault(req.id) {
    Ok(validator) => (
      StatusCode::OK,
      ErasedJson::pretty(json!({ "ok": true, "validator": validator })),
    ),
    Err(e) => engine_error_response(e),
  }
}

async fn metrics(Extension(engine): Extension<SharedEngine>) -> impl axum::response::IntoResponse {
  let engine = engine.lock().unwrap();
  ErasedJson::pretty(engine.metrics_snapshot())
}

async fn get_config(Extension(engine): Extension<SharedEngine>) -> impl axum::response::IntoResponse {
  let engine = engine.lock().unwrap();
  ErasedJson::pretty(*engine.config())
}

async fn post_config(
  Extension(engine): Extension<SharedEngine>,
  Json(patch): Json<ConfigPatch>,
) -> impl axum::response::IntoResponse {
  let mut engine = engine.lock().unwrap();
  match engine.update_config(patch) {
    Ok(config) => (StatusCode::OK, ErasedJson::pretty(applied_config(config))),
    Err(e) => engine_error_response(e),
  }
}

fn applied_config(config: Config) -> serde_json::Value {
  json!({ "ok": true, "config": config })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SimulateAttackRequest {
  slots: u64,
}

async fn simulate_attack(
  Extension(engine): Extension<SharedEngine>,
  Json(req): Json<SimulateAttackRequest>,
) -> impl axum::response::IntoResponse {
  let mut engine = engine.lock().unwrap();
  let results = engine.simulate_attack(req.slots);
  (
    StatusCode::OK,
    ErasedJson::pretty(json!({ "ran": req.slots, "results": results })),
  )
}

async fn reset(Extension(engine): Extension<SharedEngine>) -> impl axum::response::IntoResponse {
  let mut engine = engine.lock().unwrap();
  engine.reset();
  (StatusCode::OK, ErasedJson::pretty(json!({ "ok": true })))
}
