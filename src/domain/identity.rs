use uuid::Uuid;

use super::errors::DomainError;

/// The authenticated principal behind a request, as vouched for by the
/// identity provider. The service never sees credentials, only this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: Uuid,
    pub name: String,
    pub is_admin: bool,
}

impl Caller {
    /// Owners and admins may act on a resource; everybody else may not.
    pub fn can_access(&self, owner_id: Uuid) -> bool {
        self.is_admin || self.id == owner_id
    }

    pub fn require_admin(&self) -> Result<(), DomainError> {
        if self.is_admin {
            Ok(())
        } else {
            Err(DomainError::Forbidden("admin privileges required".to_string()))
        }
    }
}
