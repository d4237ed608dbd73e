use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};
use uuid::Uuid;

use crate::auth::hash_access_token;
use crate::error::ApiError;
use crate::models::{AppState, ROLE_ADMIN};

/// The caller behind a valid bearer session.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub role_id: i16,
    pub session_token_id: Uuid,
}

impl AuthContext {
    /// Admins pass every role gate.
    pub fn require_role(&self, allowed: &[i16], what: &str) -> Result<(), ApiError> {
        if self.role_id == ROLE_ADMIN || allowed.contains(&self.role_id) {
            Ok(())
        } else {
            Err(ApiError::Forbidden(
                "FORBIDDEN",
                format!("You do not have permission to {what}"),
            ))
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SessionLookupRow {
    session_token_id: Uuid,
    user_id: Uuid,
    role_id: i16,
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let TypedHeader(authz): TypedHeader<Authorization<Bearer>> =
                TypedHeader::from_request_parts(parts, state)
                    .await
                    .map_err(|_| ApiError::session_expired())?;

            let token_hash = hash_access_token(authz.token());

            let row: SessionLookupRow = sqlx::query_as::<_, SessionLookupRow>(
                r#"
                SELECT st.session_token_id, st.user_id, u.role_id
                FROM session_token st
                JOIN app_user u ON u.user_id = st.user_id
                WHERE st.session_token_hash = $1
                  AND st.revoked_at IS NULL
                  AND st.expires_at > now()
                  AND u.is_active = true
                "#,
            )
            .bind(&token_hash)
            .fetch_optional(&state.db)
            .await
            .map_err(|e| ApiError::Internal(format!("db error: {e}")))?
            .ok_or_else(ApiError::session_expired)?;

            // best-effort
            let _ = sqlx::query("UPDATE session_token SET last_seen_at = now() WHERE session_token_id = $1")
                .bind(row.session_token_id)
                .execute(&state.db)
                .await;

            Ok(AuthContext {
                user_id: row.user_id,
                role_id: row.role_id,
                session_token_id: row.session_token_id,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ROLE_NURSE, ROLE_PATIENT, ROLE_PHYSICIAN};

    fn ctx(role_id: i16) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            role_id,
            session_token_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn admin_passes_every_gate() {
        assert!(ctx(ROLE_ADMIN).require_role(&[], "manage schedules").is_ok());
    }

    #[test]
    fn other_roles_need_to_be_listed() {
        assert!(ctx(ROLE_PHYSICIAN).require_role(&[ROLE_PHYSICIAN], "x").is_ok());
        assert!(matches!(
            ctx(ROLE_PATIENT).require_role(&[ROLE_PHYSICIAN, ROLE_NURSE], "x"),
            Err(ApiError::Forbidden(..))
        ));
    }
}
