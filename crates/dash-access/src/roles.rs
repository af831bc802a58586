//! User role lookup
//!
//! Lookups fail closed: a missing assignment, an unknown role name or any
//! backend error resolves to [`Role::Guest`].

use std::sync::Arc;

use async_trait::async_trait;
use dash_store::TableBackend;

use crate::rbac::Role;

/// Source of per-tenant role assignments
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Effective role of a user within a tenant
    async fn user_role(&self, user_id: &str, tenant_id: &str) -> Role;
}

/// Role directory reading the backend's `user_roles` table
#[derive(Clone)]
pub struct BackendRoleDirectory {
    backend: Arc<dyn TableBackend>,
}

impl BackendRoleDirectory {
    #[inline]
    #[must_use]
    pub fn new(backend: Arc<dyn TableBackend>) -> Self {
        Self { backend }
    }
}

impl std::fmt::Debug for BackendRoleDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendRoleDirectory").finish_non_exhaustive()
    }
}

#[async_trait]
impl RoleDirectory for BackendRoleDirectory {
    async fn user_role(&self, user_id: &str, tenant_id: &str) -> Role {
        match self.backend.fetch_user_role(user_id, tenant_id).await {
            Ok(Some(name)) => name.parse().unwrap_or_else(|e| {
                tracing::warn!(user_id, tenant_id, error = %e, "unrecognized role, using guest");
                Role::Guest
            }),
            Ok(None) => {
                tracing::debug!(user_id, tenant_id, "no role assignment, using guest");
                Role::Guest
            }
            Err(e) => {
                tracing::warn!(user_id, tenant_id, error = %e, "role lookup failed, using guest");
                Role::Guest
            }
        }
    }
}

/// Directory granting every user the same role
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticRoleDirectory(pub Role);

#[async_trait]
impl RoleDirectory for StaticRoleDirectory {
    async fn user_role(&self, _user_id: &str, _tenant_id: &str) -> Role {
        self.0
    }
}

/// Role of a user within a tenant through `directory`
pub async fn get_user_role(directory: &dyn RoleDirectory, user_id: &str, tenant_id: &str) -> Role {
    directory.user_role(user_id, tenant_id).await
}
