use std::sync::Arc;

use uuid::Uuid;

use crate::models::Permission;
use crate::repository::{PermissionStore, RepoError};

use super::SchedulingError;

#[derive(Clone)]
pub struct AccessService {
    store: Arc<dyn PermissionStore>,
}

impl AccessService {
    pub fn new(store: Arc<dyn PermissionStore>) -> Self {
        Self { store }
    }

    /// Permissions granted to the user's role.
    pub async fn permissions_of_user(&self, user_id: Uuid) -> Result<Vec<Permission>, SchedulingError> {
        let user = self.store.find_user(user_id).await.map_err(|e| match e {
            RepoError::NotFound(_) => SchedulingError::NoSuchUser,
            other => other.into(),
        })?;
        Ok(self.store.find_by_role(user.role_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ROLE_NURSE, ROLE_PHYSICIAN, UserRow};
    use crate::repository::InMemoryStore;

    fn permission(role_id: i16, name: &str) -> Permission {
        Permission {
            permission_id: Uuid::new_v4(),
            role_id,
            permission: name.into(),
        }
    }

    #[tokio::test]
    async fn returns_permissions_of_the_users_role() {
        let store = Arc::new(InMemoryStore::new());
        let user_id = Uuid::new_v4();
        store.seed_user(
            UserRow {
                user_id,
                username: "drhouse".into(),
                display_name: "Gregory House".into(),
                password_hash: String::new(),
                role_id: ROLE_PHYSICIAN,
                is_active: true,
            },
            vec![
                permission(ROLE_PHYSICIAN, "appointment:approve"),
                permission(ROLE_PHYSICIAN, "schedule:write"),
                permission(ROLE_NURSE, "record:write"),
            ],
        );

        let access = AccessService::new(store);
        let perms = access.permissions_of_user(user_id).await.unwrap();
        let names: Vec<_> = perms.iter().map(|p| p.permission.as_str()).collect();
        assert_eq!(names, ["appointment:approve", "schedule:write"]);
    }

    #[tokio::test]
    async fn unknown_user_is_reported() {
        let access = AccessService::new(Arc::new(InMemoryStore::new()));
        assert!(matches!(
            access.permissions_of_user(Uuid::new_v4()).await,
            Err(SchedulingError::NoSuchUser)
        ));
    }
}
