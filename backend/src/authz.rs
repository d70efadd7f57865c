//! Warehouse access policy
//!
//! Every component that reads or writes warehouse-scoped data resolves its
//! scope through [`resolve_warehouse_scope`]. The role rules live here and
//! nowhere else.

use crate::error::{AppError, AppResult};
use crate::middleware::AuthUser;
use crate::models::Role;

/// The set of warehouses a request is allowed to touch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarehouseScope {
    /// Every warehouse (admins only)
    All,
    /// A single warehouse
    Warehouse(i64),
}

impl WarehouseScope {
    pub fn warehouse_id(&self) -> Option<i64> {
        match self {
            WarehouseScope::All => None,
            WarehouseScope::Warehouse(id) => Some(*id),
        }
    }
}

/// Resolve the warehouse scope for the current user.
///
/// Admins may request any warehouse, or all of them by omitting the id.
/// Managers are pinned to their assigned warehouse; requesting a different
/// one is a validation error, as is a manager account with no assignment.
/// Every other role is rejected.
pub fn resolve_warehouse_scope(
    user: &AuthUser,
    requested_warehouse_id: Option<i64>,
) -> AppResult<WarehouseScope> {
    match user.role {
        Role::Admin => Ok(requested_warehouse_id
            .map(WarehouseScope::Warehouse)
            .unwrap_or(WarehouseScope::All)),
        Role::Manager => {
            let assigned = user.warehouse_id.ok_or_else(|| {
                AppError::Validation("No warehouse assigned to current user".to_string())
            })?;
            if let Some(requested) = requested_warehouse_id {
                if requested != assigned {
                    return Err(AppError::Validation(
                        "Managers can only access their own warehouse".to_string(),
                    ));
                }
            }
            Ok(WarehouseScope::Warehouse(assigned))
        }
        Role::User => Err(AppError::InsufficientPermissions),
    }
}

/// Resolve a scope down to one concrete warehouse, for operations that
/// cannot span warehouses (purchase-order creation, product creation).
pub fn require_single_warehouse(scope: WarehouseScope) -> AppResult<i64> {
    scope
        .warehouse_id()
        .ok_or_else(|| AppError::Validation("A warehouse id must be provided".to_string()))
}
