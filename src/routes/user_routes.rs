// src/routes/user_routes.rs

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState, Permission},
};

pub fn router() -> Router<AppState> {
    Router::new().route("/users/{user_id}/permissions", get(get_user_permissions))
}

/// Users may read their own permissions; admins anyone's.
pub async fn get_user_permissions(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ApiOk<Vec<Permission>>>, ApiError> {
    if auth.user_id != user_id {
        auth.require_role(&[], "view other users' permissions")?;
    }
    Ok(Json(ApiOk {
        data: state.access.permissions_of_user(user_id).await?,
    }))
}
