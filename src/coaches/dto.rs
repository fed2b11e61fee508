use serde::{Deserialize, Serialize};

use crate::auth::repo::Account;

#[derive(Debug, Deserialize)]
pub struct CoachFilter {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    pub verified: Option<bool>,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    20
}

/// Coach accounts serialize through `Account`, which never emits the
/// password hash.
#[derive(Debug, Serialize)]
pub struct CoachPage {
    pub coaches: Vec<Account>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct CoachVerifiedResponse {
    pub is_verified: bool,
}
