// src/routes/department_routes.rs

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{ApiError, db_error},
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, DepartmentRow, ListQuery, OkData, PhysicianRow},
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/departments", get(list_departments).post(create_department))
        .route(
            "/departments/{department_id}",
            get(get_department)
                .patch(update_department)
                .delete(delete_department),
        )
        .route("/departments/{department_id}/physicians", get(list_department_physicians))
}

#[derive(Debug, Deserialize)]
pub struct DepartmentRequest {
    pub department_name: String,
}

fn validate_name(name: &str) -> Result<&str, ApiError> {
    let n = name.trim();
    if n.is_empty() {
        return Err(ApiError::validation("department_name is required"));
    }
    if n.len() > 128 {
        return Err(ApiError::validation("department_name is too long (max 128)"));
    }
    Ok(n)
}

pub async fn list_departments(
    State(state): State<AppState>,
    _auth: AuthContext,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiOk<Vec<DepartmentRow>>>, ApiError> {
    let (limit, offset) = q.bounds();
    let rows = sqlx::query_as::<_, DepartmentRow>(
        r#"
        SELECT department_id, department_name
        FROM department
        ORDER BY department_name ASC
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

pub async fn get_department(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(department_id): Path<Uuid>,
) -> Result<Json<ApiOk<DepartmentRow>>, ApiError> {
    let row = sqlx::query_as::<_, DepartmentRow>(
        "SELECT department_id, department_name FROM department WHERE department_id = $1",
    )
    .bind(department_id)
    .fetch_optional(&state.db)
    .await
    .map_err(db_error)?
    .ok_or_else(|| ApiError::not_found("department"))?;

    Ok(Json(ApiOk { data: row }))
}

pub async fn create_department(
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<DepartmentRequest>,
) -> Result<Json<ApiOk<DepartmentRow>>, ApiError> {
    auth.require_role(&[], "manage departments")?;
    let name = validate_name(&req.department_name)?;

    let row = sqlx::query_as::<_, DepartmentRow>(
        r#"
        INSERT INTO department (department_name)
        VALUES ($1)
        RETURNING department_id, department_name
        "#,
    )
    .bind(name)
    .fetch_one(&state.db)
    .await
    .map_err(db_error)?;

    Ok(Json(ApiOk { data: row }))
}

pub async fn update_department(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(department_id): Path<Uuid>,
    Json(req): Json<DepartmentRequest>,
) -> Result<Json<ApiOk<DepartmentRow>>, ApiError> {
    auth.require_role(&[], "manage departments")?;
    let name = validate_name(&req.department_name)?;

    let row = sqlx::query_as::<_, DepartmentRow>(
        r#"
        UPDATE department
        SET department_name = $2
        WHERE department_id = $1
        RETURNING department_id, department_name
        "#,
    )
    .bind(department_id)
    .bind(name)
    .fetch_optional(&state.db)
    .await
    .map_err(db_error)?
    .ok_or_else(|| ApiError::not_found("department"))?;

    Ok(Json(ApiOk { data: row }))
}

pub async fn delete_department(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(department_id): Path<Uuid>,
) -> Result<Json<ApiOk<OkData>>, ApiError> {
    auth.require_role(&[], "manage departments")?;

    let res = sqlx::query("DELETE FROM department WHERE department_id = $1")
        .bind(department_id)
        .execute(&state.db)
        .await
        .map_err(db_error)?;
    if res.rows_affected() == 0 {
        return Err(ApiError::not_found("department"));
    }

    Ok(Json(ApiOk { data: OkData { ok: true } }))
}

pub async fn list_department_physicians(
    State(state): State<AppState>,
    _auth: AuthContext,
    Path(department_id): Path<Uuid>,
    Query(q): Query<ListQuery>,
) -> Result<Json<ApiOk<Vec<PhysicianRow>>>, ApiError> {
    let (limit, offset) = q.bounds();
    let rows = sqlx::query_as::<_, PhysicianRow>(
        r#"
        SELECT p.physician_id, p.username, p.full_name, p.email, p.contact,
               p.department_name, p.about, p.verified, p.created_at
        FROM physician p
        JOIN department d ON d.department_name = p.department_name
        WHERE d.department_id = $1
        ORDER BY p.full_name ASC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(department_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.db)
    .await
    .map_err(db_error)?;

    Ok(Json(ApiOk { data: rows }))
}
