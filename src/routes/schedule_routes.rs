// src/routes/schedule_routes.rs

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, ListQuery, NewSchedule, OkData, ROLE_PHYSICIAN, Schedule, ScheduleChanges},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/schedules", get(list_schedules).post(create_schedule))
        .route(
            "/schedules/{schedule_id}",
            get(get_schedule).patch(update_schedule).delete(delete_schedule),
        )
}

pub async fn list_schedules(
    State(state): State<AppState>,
    _auth: AuthContext,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiOk<Vec<Schedule>>>, ApiError> {
    let (limit, offset) = q.bounds();
    let rows = state.schedules.list(limit, offset).await?;
    Ok(Json(ApiOk { data: rows }))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<ApiOk<Schedule>>, ApiError> {
    Ok(Json(ApiOk {
        data: state.schedules.find(schedule_id).await?,
    }))
}

/// Rejected with 409 when the physician already has an active schedule.
pub async fn create_schedule(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<NewSchedule>,
) -> Result<Json<ApiOk<Schedule>>, ApiError> {
    auth.require_role(&[ROLE_PHYSICIAN], "manage schedules")?;
    Ok(Json(ApiOk {
        data: state.schedules.create_schedule(req).await?,
    }))
}

pub async fn update_schedule(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(schedule_id): Path<Uuid>,
    Json(req): Json<ScheduleChanges>,
) -> Result<Json<ApiOk<Schedule>>, ApiError> {
    auth.require_role(&[ROLE_PHYSICIAN], "manage schedules")?;
    Ok(Json(ApiOk {
        data: state.schedules.update_schedule(schedule_id, req).await?,
    }))
}

pub async fn delete_schedule(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(schedule_id): Path<Uuid>,
) -> Result<Json<ApiOk<OkData>>, ApiError> {
    auth.require_role(&[ROLE_PHYSICIAN], "manage schedules")?;
    state.schedules.delete(schedule_id).await?;
    Ok(Json(ApiOk { data: OkData { ok: true } }))
}
