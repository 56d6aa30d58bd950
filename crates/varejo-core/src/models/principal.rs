use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::TenantId;

/// User kind stored alongside the user row (`tipo` column).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserKind {
    Admin,
    Gerente,
    Vendedor,
    Operador,
    Supervisor,
    Assistente,
}

impl Display for UserKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let name = match self {
            UserKind::Admin => "admin",
            UserKind::Gerente => "gerente",
            UserKind::Vendedor => "vendedor",
            UserKind::Operador => "operador",
            UserKind::Supervisor => "supervisor",
            UserKind::Assistente => "assistente",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for UserKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(UserKind::Admin),
            "gerente" => Ok(UserKind::Gerente),
            "vendedor" => Ok(UserKind::Vendedor),
            "operador" => Ok(UserKind::Operador),
            "supervisor" => Ok(UserKind::Supervisor),
            "assistente" => Ok(UserKind::Assistente),
            other => Err(format!("unknown user kind: {}", other)),
        }
    }
}

/// The authenticated actor of a request, as handed over by authentication.
///
/// `tenant_id` is absent for super administrators who are not bound to a
/// single company.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub user_id: i64,
    pub tenant_id: Option<TenantId>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub kind: Option<UserKind>,
}

impl Principal {
    pub fn new(user_id: i64) -> Self {
        Self {
            user_id,
            tenant_id: None,
            roles: Vec::new(),
            kind: None,
        }
    }

    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    pub fn with_kind(mut self, kind: UserKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r.eq_ignore_ascii_case(role))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_kind_round_trips_through_str() {
        for kind in [UserKind::Admin, UserKind::Vendedor, UserKind::Assistente] {
            assert_eq!(kind.to_string().parse::<UserKind>(), Ok(kind));
        }
        assert!("caixa".parse::<UserKind>().is_err());
    }

    #[test]
    fn role_check_is_case_insensitive() {
        let principal = Principal::new(1).with_role("Super-Admin");
        assert!(principal.has_role("super-admin"));
        assert!(!principal.has_role("vendedor"));
    }
}
