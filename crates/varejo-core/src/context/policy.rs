use crate::config::TenancyConfig;
use crate::models::{Principal, TenantId};

/// Decides which principals may act as tenants other than their own.
pub trait AccessPolicy: Send + Sync {
    fn is_exempt(&self, principal: &Principal) -> bool;

    /// A principal may act as its own tenant, or as any tenant when exempt.
    fn may_act_as(&self, principal: &Principal, tenant_id: TenantId) -> bool {
        principal.tenant_id == Some(tenant_id) || self.is_exempt(principal)
    }
}

/// Exemption granted by holding one of a set of roles.
#[derive(Debug, Clone)]
pub struct RoleExemption {
    roles: Vec<String>,
}

impl RoleExemption {
    pub fn new<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            roles: roles.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &TenancyConfig) -> Self {
        Self::new(config.exempt_roles.iter().cloned())
    }
}

impl Default for RoleExemption {
    fn default() -> Self {
        Self::new(["super-admin"])
    }
}

impl AccessPolicy for RoleExemption {
    fn is_exempt(&self, principal: &Principal) -> bool {
        self.roles.iter().any(|role| principal.has_role(role))
    }
}
