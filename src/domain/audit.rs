use chrono::{DateTime, Utc};
use uuid::Uuid;

pub const ACTION_LOGS_PER_PAGE: i64 = 10;

#[derive(Debug, Clone)]
pub struct ActionLogView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ActionLogPage {
    pub items: Vec<ActionLogView>,
    pub page: i64,
    pub pages: i64,
}

/// Number of pages needed for `total` entries; an empty log still has one
/// (empty) page.
pub fn page_count(total: i64, per_page: i64) -> i64 {
    ((total + per_page - 1) / per_page).max(1)
}

/// Out-of-range requests land on the nearest valid page.
pub fn clamp_page(requested: i64, pages: i64) -> i64 {
    requested.clamp(1, pages.max(1))
}
