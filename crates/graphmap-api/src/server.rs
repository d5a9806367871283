//! Axum server and routes.

use crate::document::Document;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use graphmap_template::{
    Direction, EdgeEntity, EdgeId, EdgeRecord, EntityId, GraphTemplate, MappingError, Property,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub struct AppState {
    pub template: GraphTemplate,
}

/// Envelope shared by every response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

type Reply<T> = (StatusCode, Json<ApiResponse<T>>);

fn ok<T>(data: T) -> Reply<T> {
    (
        StatusCode::OK,
        Json(ApiResponse {
            code: 200,
            message: "Success".to_string(),
            data: Some(data),
        }),
    )
}

fn fail<T>(status: StatusCode, message: impl Into<String>) -> Reply<T> {
    (
        status,
        Json(ApiResponse {
            code: status.as_u16(),
            message: message.into(),
            data: None,
        }),
    )
}

fn from_error<T>(err: MappingError) -> Reply<T> {
    let status = match &err {
        MappingError::MissingArgument(_) | MappingError::AlreadyPersisted(_) => {
            StatusCode::BAD_REQUEST
        }
        MappingError::EntityNotFound { .. } | MappingError::EdgeNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        MappingError::Mapping(_) | MappingError::Graph(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status == StatusCode::INTERNAL_SERVER_ERROR {
        tracing::error!(error = %err, "request failed");
    }
    fail(status, err.to_string())
}

/// JSON view of an edge with both endpoints loaded.
#[derive(Debug, Serialize, Deserialize)]
pub struct EdgeView {
    pub id: EdgeId,
    pub label: String,
    pub outbound: Document,
    pub inbound: Document,
    pub properties: Vec<Property>,
}

impl From<&EdgeEntity<Document, Document>> for EdgeView {
    fn from(edge: &EdgeEntity<Document, Document>) -> Self {
        Self {
            id: edge.id().clone(),
            label: edge.label().to_string(),
            outbound: edge.outbound().clone(),
            inbound: edge.inbound().clone(),
            properties: edge.properties().to_vec(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EndpointRef {
    pub label: String,
    pub id: EntityId,
}

#[derive(Debug, Deserialize)]
pub struct EdgeRequest {
    pub outbound: EndpointRef,
    pub label: String,
    pub inbound: EndpointRef,
}

#[derive(Debug, Deserialize)]
pub struct EdgesQuery {
    #[serde(default = "default_direction")]
    pub direction: Direction,
    /// Comma-separated label filter.
    #[serde(default)]
    pub labels: Option<String>,
}

fn default_direction() -> Direction {
    Direction::Both
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/vertices", post(handle_insert_vertex))
        .route(
            "/vertices/:label/:id",
            get(handle_get_vertex).delete(handle_delete_vertex),
        )
        .route("/vertices/:label/:id/edges", get(handle_vertex_edges))
        .route("/edges", post(handle_edge))
        .route(
            "/edges/:id",
            get(handle_get_edge).delete(handle_delete_edge),
        )
        .route(
            "/edges/:id/properties/:key",
            put(handle_put_property).delete(handle_remove_property),
        )
        .route("/health", get(handle_health))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Load a vertex and check it carries the expected label.
async fn load_vertex(
    state: &AppState,
    label: &str,
    id: EntityId,
) -> Result<Document, MappingError> {
    match state.template.find::<Document>(id.clone()).await? {
        Some(doc) if doc.label == label => Ok(doc),
        _ => Err(MappingError::EntityNotFound {
            label: label.to_string(),
            id,
        }),
    }
}

async fn load_edge(
    state: &AppState,
    id: String,
) -> Result<EdgeEntity<Document, Document>, MappingError> {
    let id = EdgeId::from(id);
    state
        .template
        .find_edge_by_id::<Document, Document>(&id)
        .await?
        .ok_or(MappingError::EdgeNotFound(id))
}

async fn handle_insert_vertex(
    State(state): State<Arc<AppState>>,
    Json(doc): Json<Document>,
) -> Reply<Document> {
    if doc.label.is_empty() {
        return from_error(MappingError::MissingArgument("label"));
    }
    match state.template.insert(doc).await {
        Ok(doc) => {
            tracing::info!(label = %doc.label, id = ?doc.id, "vertex inserted");
            ok(doc)
        }
        Err(e) => from_error(e),
    }
}

async fn handle_get_vertex(
    State(state): State<Arc<AppState>>,
    Path((label, id)): Path<(String, String)>,
) -> Reply<Document> {
    match load_vertex(&state, &label, id.into()).await {
        Ok(doc) => ok(doc),
        Err(e) => from_error(e),
    }
}

async fn handle_delete_vertex(
    State(state): State<Arc<AppState>>,
    Path((label, id)): Path<(String, String)>,
) -> Reply<bool> {
    if let Err(e) = load_vertex(&state, &label, id.clone().into()).await {
        return from_error(e);
    }
    match state.template.delete::<Document>(id).await {
        Ok(deleted) => ok(deleted),
        Err(e) => from_error(e),
    }
}

fn split_labels(raw: &str) -> Vec<&str> {
    raw.split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect()
}

async fn handle_vertex_edges(
    State(state): State<Arc<AppState>>,
    Path((label, id)): Path<(String, String)>,
    Query(q): Query<EdgesQuery>,
) -> Reply<Vec<EdgeRecord>> {
    let doc = match load_vertex(&state, &label, id.into()).await {
        Ok(doc) => doc,
        Err(e) => return from_error(e),
    };
    let labels: Vec<&str> = q.labels.as_deref().map(split_labels).unwrap_or_default();
    match state.template.edges(&doc, q.direction, &labels).await {
        Ok(edges) => ok(edges),
        Err(e) => from_error(e),
    }
}

async fn handle_edge(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EdgeRequest>,
) -> Reply<EdgeView> {
    let result = async {
        let outbound = load_vertex(&state, &req.outbound.label, req.outbound.id.clone()).await?;
        let inbound = load_vertex(&state, &req.inbound.label, req.inbound.id.clone()).await?;
        state.template.edge(&outbound, &req.label, &inbound).await
    }
    .await;
    match result {
        Ok(edge) => ok(EdgeView::from(&edge)),
        Err(e) => from_error(e),
    }
}

async fn handle_get_edge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Reply<EdgeView> {
    match load_edge(&state, id).await {
        Ok(edge) => ok(EdgeView::from(&edge)),
        Err(e) => from_error(e),
    }
}

async fn handle_delete_edge(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Reply<bool> {
    match state.template.delete_edge(&EdgeId::from(id)).await {
        Ok(deleted) => ok(deleted),
        Err(e) => from_error(e),
    }
}

async fn handle_put_property(
    State(state): State<Arc<AppState>>,
    Path((id, key)): Path<(String, String)>,
    Json(value): Json<serde_json::Value>,
) -> Reply<EdgeView> {
    let result = async {
        let mut edge = load_edge(&state, id).await?;
        edge.add(&key, value).await?;
        Ok::<_, MappingError>(edge)
    }
    .await;
    match result {
        Ok(edge) => ok(EdgeView::from(&edge)),
        Err(e) => from_error(e),
    }
}

async fn handle_remove_property(
    State(state): State<Arc<AppState>>,
    Path((id, key)): Path<(String, String)>,
) -> Reply<EdgeView> {
    let result = async {
        let mut edge = load_edge(&state, id).await?;
        edge.remove(&key).await?;
        Ok::<_, MappingError>(edge)
    }
    .await;
    match result {
        Ok(edge) => ok(EdgeView::from(&edge)),
        Err(e) => from_error(e),
    }
}

async fn handle_health() -> &'static str {
    "ok"
}
