//! JSON HTTP API over the studio task.

use std::net::SocketAddr;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tracing::info;

use crate::runtime::StudioHandle;
use crate::simulation::{
    AppendRequest, CatalogView, DiversitySeries, ObserverSnapshot, PhaseRequest, StudioCommand,
};

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub enum ApiError {
    /// The command was understood but the session refused it.
    Rejected(String),
    Unavailable(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            ApiError::Rejected(error) => (StatusCode::UNPROCESSABLE_ENTITY, error),
            ApiError::Unavailable(err) => (StatusCode::SERVICE_UNAVAILABLE, err.to_string()),
        };
        (status, Json(ErrorBody { error })).into_response()
    }
}

pub fn router(handle: StudioHandle) -> Router {
    Router::new()
        .route("/api/state", get(get_state))
        .route("/api/diversity", get(get_diversity))
        .route("/api/catalog", get(get_catalog))
        .route("/api/phase", post(run_phase))
        .route("/api/append", post(append_phase))
        .route("/api/reset", post(reset))
        .with_state(handle)
}

pub async fn serve(addr: SocketAddr, handle: StudioHandle) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "studio API listening");
    axum::serve(listener, router(handle)).await?;
    Ok(())
}

async fn get_state(State(handle): State<StudioHandle>) -> Json<ObserverSnapshot> {
    Json(handle.snapshot())
}

async fn get_diversity(State(handle): State<StudioHandle>) -> Json<DiversitySeries> {
    Json(handle.snapshot().diversity)
}

async fn get_catalog() -> Json<CatalogView> {
    Json(CatalogView::current())
}

async fn run_phase(
    State(handle): State<StudioHandle>,
    Json(request): Json<PhaseRequest>,
) -> Result<Json<ObserverSnapshot>, ApiError> {
    dispatch(&handle, StudioCommand::Submit { request }).await
}

async fn append_phase(
    State(handle): State<StudioHandle>,
    Json(request): Json<AppendRequest>,
) -> Result<Json<ObserverSnapshot>, ApiError> {
    dispatch(&handle, StudioCommand::SubmitAppend { request }).await
}

async fn reset(State(handle): State<StudioHandle>) -> Result<Json<ObserverSnapshot>, ApiError> {
    dispatch(&handle, StudioCommand::Reset).await
}

async fn dispatch(
    handle: &StudioHandle,
    command: StudioCommand,
) -> Result<Json<ObserverSnapshot>, ApiError> {
    let snapshot = handle
        .request(command)
        .await
        .map_err(ApiError::Unavailable)?;
    if let Some(error) = snapshot.last_error.clone() {
        return Err(ApiError::Rejected(error));
    }
    Ok(Json(snapshot))
}
