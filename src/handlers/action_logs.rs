use std::num::IntErrorKind;

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::AuditData;
use crate::auth::AuthenticatedCaller;
use crate::domain::audit::ActionLogView;
use crate::domain::ports::AuditLog;
use crate::errors::AppError;

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ActionLogParams {
    /// Page number (1-based). Out-of-range pages land on the last page and
    /// anything that is not an integer reads as page 1.
    #[param(value_type = Option<i64>)]
    pub page: Option<String>,
}

impl ActionLogParams {
    pub fn page_number(&self) -> i64 {
        let Some(raw) = self.page.as_deref() else {
            return 1;
        };
        match raw.trim().parse::<i64>() {
            Ok(page) => page,
            // Too large still means "past the end".
            Err(e) if *e.kind() == IntErrorKind::PosOverflow => i64::MAX,
            Err(_) => 1,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ActionLogResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub action: String,
    pub created_at: String,
}

impl From<ActionLogView> for ActionLogResponse {
    fn from(a: ActionLogView) -> Self {
        Self {
            id: a.id,
            user: a.user_id,
            action: a.action,
            created_at: a.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ActionLogPageResponse {
    pub logs: Vec<ActionLogResponse>,
    pub page: i64,
    pub pages: i64,
}

/// GET /action-logs
///
/// Admin audit trail, ten entries per page, newest first.
#[utoipa::path(
    get,
    path = "/action-logs",
    params(ActionLogParams),
    responses(
        (status = 200, description = "One page of the audit trail", body = ActionLogPageResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("bearer" = [])),
    tag = "action-logs"
)]
pub async fn list_action_logs(
    audit: AuditData,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    query: web::Query<ActionLogParams>,
) -> Result<HttpResponse, AppError> {
    caller.require_admin()?;
    let requested = query.page_number();

    let page = web::block(move || audit.page(requested)).await??;

    Ok(HttpResponse::Ok().json(ActionLogPageResponse {
        logs: page.items.into_iter().map(Into::into).collect(),
        page: page.page,
        pages: page.pages,
    }))
}
