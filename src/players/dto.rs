use serde::{Deserialize, Serialize};

use crate::players::repo::Prospect;

/// Listing filters. `grad_class` and `gender` are exact matches pushed to
/// the store; `search` and `position` are matched engine-side. `verified`
/// is a real optional boolean: absent means no filter.
#[derive(Debug, Deserialize)]
pub struct ProspectFilter {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    pub grad_class: Option<String>,
    pub position: Option<String>,
    pub gender: Option<String>,
    pub verified: Option<bool>,
    pub search: Option<String>,
}

fn default_page() -> u64 {
    1
}

fn default_page_size() -> u64 {
    20
}

#[derive(Debug, Serialize)]
pub struct ProspectPage {
    pub players: Vec<Prospect>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct VerifiedResponse {
    pub verified: bool,
}
