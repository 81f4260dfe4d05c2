use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::audit::{clamp_page, page_count, ActionLogPage, ACTION_LOGS_PER_PAGE};
use crate::domain::errors::DomainError;
use crate::domain::ports::AuditLog;
use crate::schema::action_logs;

use super::models::{ActionLogRow, NewActionLogRow};

#[derive(Clone)]
pub struct DieselAuditLog {
    pool: DbPool,
}

impl DieselAuditLog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn insert(&self, user_id: Uuid, action: &str) -> Result<(), DomainError> {
        let mut conn = self.pool.get()?;
        diesel::insert_into(action_logs::table)
            .values(&NewActionLogRow {
                id: Uuid::new_v4(),
                user_id,
                action: action.to_string(),
            })
            .execute(&mut conn)?;
        Ok(())
    }
}

impl AuditLog for DieselAuditLog {
    /// The triggering request has already succeeded, so a failed write is
    /// logged and swallowed.
    fn record(&self, user_id: Uuid, action: &str) {
        if let Err(e) = self.insert(user_id, action) {
            log::error!("Failed to record action log for {}: {}", user_id, e);
        }
    }

    fn page(&self, page: i64) -> Result<ActionLogPage, DomainError> {
        let mut conn = self.pool.get()?;

        let total: i64 = action_logs::table.count().get_result(&mut conn)?;
        let pages = page_count(total, ACTION_LOGS_PER_PAGE);
        let page = clamp_page(page, pages);

        let items = action_logs::table
            .select(ActionLogRow::as_select())
            .order((action_logs::created_at.desc(), action_logs::id.desc()))
            .limit(ACTION_LOGS_PER_PAGE)
            .offset((page - 1) * ACTION_LOGS_PER_PAGE)
            .load(&mut conn)?
            .into_iter()
            .map(Into::into)
            .collect();

        Ok(ActionLogPage { items, page, pages })
    }
}
