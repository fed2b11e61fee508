use serde::{Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::jwt::Role;
use crate::error::ApiError;
use crate::store::{Query, StoreError, TableStore};

/// Staff and coach accounts live in separate tables and therefore separate
/// email-uniqueness namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountKind {
    Staff,
    Coach,
}

impl AccountKind {
    pub fn table(self) -> &'static str {
        match self {
            AccountKind::Staff => "staff_users",
            AccountKind::Coach => "coaches",
        }
    }

    pub fn role(self) -> Role {
        match self {
            AccountKind::Staff => Role::Admin,
            AccountKind::Coach => Role::Coach,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub school: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

fn default_true() -> bool {
    true
}

/// Fields supplied at account creation; id and created_at are generated
/// here, never by the caller.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub name: Option<String>,
    pub school: Option<String>,
    pub title: Option<String>,
    pub state: Option<String>,
}

pub async fn find_by_email(
    store: &dyn TableStore,
    kind: AccountKind,
    email: &str,
) -> Result<Option<Account>, ApiError> {
    let page = store
        .select(kind.table(), &Query::new().eq("email", email).limit(1))
        .await?;
    first_account(page.rows)
}

pub async fn find_by_id(
    store: &dyn TableStore,
    kind: AccountKind,
    id: Uuid,
) -> Result<Option<Account>, ApiError> {
    let page = store
        .select(kind.table(), &Query::new().eq("id", id).limit(1))
        .await?;
    first_account(page.rows)
}

fn first_account(rows: Vec<serde_json::Value>) -> Result<Option<Account>, ApiError> {
    rows.into_iter()
        .next()
        .map(|row| serde_json::from_value(row).map_err(StoreError::from))
        .transpose()
        .map_err(ApiError::from)
}

/// Creates an account after an explicit duplicate-email check. The backing
/// store does not enforce uniqueness transactionally, so two concurrent
/// creates can race; the losing insert is an accepted limitation.
pub async fn create(
    store: &dyn TableStore,
    kind: AccountKind,
    new: NewAccount,
) -> Result<Account, ApiError> {
    if find_by_email(store, kind, &new.email).await?.is_some() {
        return Err(ApiError::Conflict("email already registered"));
    }

    let row = json!({
        "id": Uuid::new_v4(),
        "email": new.email,
        "password_hash": new.password_hash,
        "role": kind.role(),
        "is_active": new.is_active,
        "is_verified": new.is_verified,
        "name": new.name,
        "school": new.school,
        "title": new.title,
        "state": new.state,
        "created_at": OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(|e| ApiError::Internal(e.into()))?,
    });
    let inserted = store.insert(kind.table(), row).await?;
    serde_json::from_value(inserted)
        .map_err(StoreError::from)
        .map_err(ApiError::from)
}

pub async fn count(store: &dyn TableStore, kind: AccountKind) -> Result<u64, ApiError> {
    Ok(store.count(kind.table(), &Query::new()).await?)
}

/// Flag mutation only; authorization is the caller's responsibility.
pub async fn set_flags(
    store: &dyn TableStore,
    kind: AccountKind,
    id: Uuid,
    is_active: Option<bool>,
    is_verified: Option<bool>,
) -> Result<Account, ApiError> {
    let mut patch = serde_json::Map::new();
    if let Some(active) = is_active {
        patch.insert("is_active".into(), json!(active));
    }
    if let Some(verified) = is_verified {
        patch.insert("is_verified".into(), json!(verified));
    }
    let updated = store
        .update(
            kind.table(),
            &Query::new().eq("id", id),
            serde_json::Value::Object(patch),
        )
        .await?;
    let row = updated
        .into_iter()
        .next()
        .ok_or(ApiError::NotFound("account not found"))?;
    serde_json::from_value(row)
        .map_err(StoreError::from)
        .map_err(ApiError::from)
}
