use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::get, Json, Router};

use crate::application::task_service::TaskService;
use crate::domain::query::{ListParams, ListQuery, TaskPage};
use crate::domain::task::{CreateTask, TaskId, UpdateTask};
use crate::http::types::ApiError;

#[derive(Clone)]
pub struct AppState<S: TaskService> { pub service: S }

pub fn router<S: TaskService + Clone + Send + Sync + 'static>(state: AppState<S>) -> Router {
    Router::new()
        .route("/api/tasks", get(list_tasks::<S>).post(create_task::<S>))
        .route("/api/tasks/:id", get(get_task::<S>).patch(update_task::<S>).delete(delete_task::<S>))
        .with_state(state)
}

async fn list_tasks<S: TaskService>(State(state): State<AppState<S>>, Query(params): Query<ListParams>) -> Result<Json<TaskPage>, ApiError> {
    let query = ListQuery::parse(&params)?;
    let page = state.service.list(query).await.map_err(ApiError::internal)?;
    Ok(Json(page))
}

async fn create_task<S: TaskService>(State(state): State<AppState<S>>, Json(payload): Json<CreateTask>) -> Result<Response, ApiError> {
    let task = state.service.create(payload).await.map_err(ApiError::internal)?;
    Ok((StatusCode::CREATED, Json(task)).into_response())
}

async fn get_task<S: TaskService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Response, ApiError> {
    let Some(id) = parse_id(&id) else { return Ok(ApiError::not_found()) };
    match state.service.get(id).await.map_err(ApiError::internal)? {
        Some(t) => Ok(Json(t).into_response()),
        None => Ok(ApiError::not_found()),
    }
}

async fn update_task<S: TaskService>(State(state): State<AppState<S>>, Path(id): Path<String>, Json(payload): Json<UpdateTask>) -> Result<Response, ApiError> {
    let Some(id) = parse_id(&id) else { return Ok(ApiError::not_found()) };
    match state.service.update(id, payload).await.map_err(ApiError::internal)? {
        Some(t) => Ok(Json(t).into_response()),
        None => Ok(ApiError::not_found()),
    }
}

async fn delete_task<S: TaskService>(State(state): State<AppState<S>>, Path(id): Path<String>) -> Result<Response, ApiError> {
    let Some(id) = parse_id(&id) else { return Ok(ApiError::not_found()) };
    let deleted = state.service.delete(id).await.map_err(ApiError::internal)?;
    if deleted { Ok(StatusCode::NO_CONTENT.into_response()) } else { Ok(ApiError::not_found()) }
}

/// Ids are opaque to callers: anything that is not a UUID simply names no task.
fn parse_id(s: &str) -> Option<TaskId> { s.parse().ok() }
