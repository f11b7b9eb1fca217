//! # Role-Scoped Connection Router
//!
//! Maps an authenticated role to the pool logged in as that role.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Some(DbRole::Admin)  ──► pool (login ∈ admin_role)   full DML          │
//! │  Some(DbRole::Seller) ──► pool (login ∈ seller_role)  receipts only     │
//! │  None                 ──► no handle  → caller answers 403               │
//! │                                                                         │
//! │  provisioning()       ──► schema owner pool                             │
//! │                           reachable only from fixed code paths          │
//! │                           (login, employee provisioning, migrations)    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The router never interprets strings. Role names are parsed once, into
//! [`DbRole`], by the identity layer.

use depot_core::DbRole;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::DbResult;
use crate::pool::{Database, DbConfig};

/// Per-pool liveness, reported by the health endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PoolHealth {
    pub admin: bool,
    pub seller: bool,
    pub provisioning: bool,
}

impl PoolHealth {
    pub fn all_up(&self) -> bool {
        self.admin && self.seller && self.provisioning
    }
}

/// The three process-wide pools.
#[derive(Debug, Clone)]
pub struct ConnectionRouter {
    admin: Database,
    seller: Database,
    provisioning: Database,
}

impl ConnectionRouter {
    /// Builds a router from already-connected handles.
    pub fn new(admin: Database, seller: Database, provisioning: Database) -> Self {
        ConnectionRouter {
            admin,
            seller,
            provisioning,
        }
    }

    /// Connects all three pools. Migrations run on the provisioning pool
    /// first, so role grants exist before the role pools log in.
    pub async fn connect(
        admin: DbConfig,
        seller: DbConfig,
        provisioning: DbConfig,
    ) -> DbResult<Self> {
        let provisioning = Database::new(provisioning).await?;
        let admin = Database::new(admin.run_migrations(false)).await?;
        let seller = Database::new(seller.run_migrations(false)).await?;

        info!("Role-scoped pools connected");
        Ok(Self::new(admin, seller, provisioning))
    }

    /// Returns the handle for `role`, or `None` when the role is unknown.
    pub fn handle(&self, role: Option<DbRole>) -> Option<&Database> {
        let db = match role? {
            DbRole::Admin => &self.admin,
            DbRole::Seller => &self.seller,
        };
        debug!(role = ?role, "Resolved role-scoped handle");
        Some(db)
    }

    /// Resolves a raw stored role name. Anything other than the two known
    /// role names yields `None`.
    pub fn resolve_handle(&self, role_name: &str) -> Option<&Database> {
        self.handle(DbRole::from_role_name(role_name))
    }

    /// The schema-owner handle. Never selected from request input.
    pub fn provisioning(&self) -> &Database {
        &self.provisioning
    }

    pub async fn health(&self) -> PoolHealth {
        let (admin, seller, provisioning) = tokio::join!(
            self.admin.health_check(),
            self.seller.health_check(),
            self.provisioning.health_check(),
        );
        PoolHealth {
            admin,
            seller,
            provisioning,
        }
    }

    pub async fn close(&self) {
        tokio::join!(
            self.admin.close(),
            self.seller.close(),
            self.provisioning.close(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lazy_router() -> ConnectionRouter {
        let db = |user: &str| {
            Database::connect_lazy(&DbConfig::new(format!("postgres://{user}@127.0.0.1:1/depot")))
                .unwrap()
        };
        ConnectionRouter::new(db("admin_app"), db("seller_app"), db("owner"))
    }

    fn same_pool(a: &Database, b: &Database) -> bool {
        a.pool().connect_options().get_username() == b.pool().connect_options().get_username()
    }

    #[tokio::test]
    async fn test_known_roles_map_to_distinct_pools() {
        let router = lazy_router();
        let admin = router.handle(Some(DbRole::Admin)).unwrap();
        let seller = router.handle(Some(DbRole::Seller)).unwrap();

        assert!(!same_pool(admin, seller));
        assert_eq!(admin.pool().connect_options().get_username(), "admin_app");
        assert_eq!(seller.pool().connect_options().get_username(), "seller_app");
    }

    #[tokio::test]
    async fn test_unknown_roles_have_no_handle() {
        let router = lazy_router();
        assert!(router.handle(None).is_none());
        for name in ["", "unknown", "postgres", "Admin_Role", "admin_role ", "owner"] {
            assert!(router.resolve_handle(name).is_none(), "{name:?} must not map");
        }
    }

    #[tokio::test]
    async fn test_role_names_resolve() {
        let router = lazy_router();
        let admin = router.resolve_handle("admin_role").unwrap();
        assert_eq!(admin.pool().connect_options().get_username(), "admin_app");
        let seller = router.resolve_handle("seller_role").unwrap();
        assert_eq!(seller.pool().connect_options().get_username(), "seller_app");
    }
}
