// src/routes/nurse_routes.rs

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{required, valid_email};
use crate::{
    error::{ApiError, db_error},
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, ListQuery, NurseRow, OkData, ROLE_NURSE},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/nurses", get(list_nurses).post(create_nurse))
        .route(
            "/nurses/{nurse_id}",
            get(get_nurse).patch(update_nurse).delete(delete_nurse),
        )
}

#[derive(Debug, Deserialize)]
pub struct CreateNurseRequest {
    pub username: String,
    pub full_name: String,
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNurseRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

pub async fn list_nurses(
    State(state): State<AppState>,
    _auth: AuthContext,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiOk<Vec<NurseRow>>>, ApiError> {
    let (limit, offset) = q.bounds();
    let rows = sqlx::query_as::<_, NurseRow>(
        r#"
        SELECT nurse_id, username, full_name, email, created_at
        FROM nurse
        ORDER BY full_name ASC
        LIMIT $1 OFFSET $2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await
    .map_err(db_error)?;

    Ok(Json(ApiOk { data: rows }))
}

pub async fn get_nurse(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(nurse_id): Path<Uuid>,
) -> Result<Json<ApiOk<NurseRow>>, ApiError> {
    let row = sqlx::query_as::<_, NurseRow>(
        "SELECT nurse_id, username, full_name, email, created_at FROM nurse WHERE nurse_id = $1",
    )
    .bind(nurse_id)
    .fetch_optional(&state.db)
    .await
    .map_err(db_error)?
    .ok_or_else(|| ApiError::not_found("nurse"))?;

    Ok(Json(ApiOk { data: row }))
}

pub async fn create_nurse(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<CreateNurseRequest>,
) -> Result<Json<ApiOk<NurseRow>>, ApiError> {
    auth.require_role(&[], "register nurses")?;

    let username = required("username", &req.username)?;
    let full_name = required("full_name", &req.full_name)?;
    let email = valid_email(&req.email)?;

    let row = sqlx::query_as::<_, NurseRow>(
        r#"
        INSERT INTO nurse (username, full_name, email)
        VALUES ($1, $2, $3)
        RETURNING nurse_id, username, full_name, email, created_at
        "#,
    )
    .bind(username)
    .bind(full_name)
    .bind(email)
    .fetch_one(&state.db)
    .await
    .map_err(db_error)?;

    Ok(Json(ApiOk { data: row }))
}

pub async fn update_nurse(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(nurse_id): Path<Uuid>,
    Json(req): Json<UpdateNurseRequest>,
) -> Result<Json<ApiOk<NurseRow>>, ApiError> {
    auth.require_role(&[ROLE_NURSE], "update nurses")?;

    let full_name = req.full_name.as_deref().map(|s| required("full_name", s)).transpose()?;
    let email = req.email.as_deref().map(valid_email).transpose()?;

    let row = sqlx::query_as::<_, NurseRow>(
        r#"
        UPDATE nurse
        SET full_name = COALESCE($2, full_name),
            email = COALESCE($3, email)
        WHERE nurse_id = $1
        RETURNING nurse_id, username, full_name, email, created_at
        "#,
    )
    .bind(nurse_id)
    .bind(full_name)
    .bind(email)
    .fetch_optional(&state.db)
    .await
    .map_err(db_error)?
    .ok_or_else(|| ApiError::not_found("nurse"))?;

    Ok(Json(ApiOk { data: row }))
}

pub async fn delete_nurse(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(nurse_id): Path<Uuid>,
) -> Result<Json<ApiOk<OkData>>, ApiError> {
    auth.require_role(&[], "remove nurses")?;

    let res = sqlx::query("DELETE FROM nurse WHERE nurse_id = $1")
        .bind(nurse_id)
        .execute(&state.db)
        .await
        .map_err(db_error)?;
    if res.rows_affected() == 0 {
        return Err(ApiError::not_found("nurse"));
    }

    Ok(Json(ApiOk { data: OkData { ok: true } }))
}
