//! Tenant scope resolution
//!
//! Every engine entry point takes an already-resolved tenant id; this module
//! is the single place where a caller's role decides which tenant that is.
//! There is no ambient request context anywhere in the engine.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Caller role for tenant scoping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// May operate on any tenant, including explicit cross-tenant requests
    SuperAdmin,
    /// Confined to its own tenant
    TenantAdmin,
}

/// Resolve the tenant a caller may operate on.
///
/// - `TenantAdmin` always resolves to `own_tenant`; naming a different tenant
///   explicitly is refused.
/// - `SuperAdmin` resolves to the requested tenant, falling back to its own
///   when the request names none.
pub fn resolve_tenant_scope(
    role: Role,
    own_tenant: &str,
    requested: Option<&str>,
) -> Result<String> {
    if own_tenant.trim().is_empty() {
        return Err(Error::Unauthorized("caller has no tenant".to_string()));
    }

    match role {
        Role::SuperAdmin => Ok(requested.unwrap_or(own_tenant).to_string()),
        Role::TenantAdmin => match requested {
            None => Ok(own_tenant.to_string()),
            Some(t) if t == own_tenant => Ok(own_tenant.to_string()),
            Some(t) => Err(Error::Unauthorized(format!(
                "tenant admin for '{own_tenant}' may not operate on tenant '{t}'"
            ))),
        },
    }
}
