use std::fmt::{Display, Formatter, Result as FmtResult};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a tenant (company, "empresa").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(transparent))]
#[serde(transparent)]
pub struct TenantId(pub i64);

impl TenantId {
    pub fn get(self) -> i64 {
        self.0
    }
}

impl From<i64> for TenantId {
    fn from(id: i64) -> Self {
        TenantId(id)
    }
}

impl Display for TenantId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// Tenant (company) entity.
///
/// Tenants are only ever soft-deleted; a row with `deleted_at` set is treated
/// as missing by every lookup the resolver performs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Tenant {
    pub id: TenantId,
    pub uuid: Uuid,
    pub legal_name: String,
    pub trade_name: String,
    pub tax_id: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub active: bool,
    pub joined_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Tenant {
    /// Name shown to users: the trade name, falling back to the legal name.
    pub fn display_name(&self) -> &str {
        if self.trade_name.trim().is_empty() {
            &self.legal_name
        } else {
            &self.trade_name
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Active flag set, not deleted, and `now` inside the membership window.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.active
            && !self.is_deleted()
            && self.joined_at <= now
            && self.expires_at.map_or(true, |expiry| expiry > now)
    }
}
