use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Not authorized: {0}")]
    Forbidden(String),
    #[error("Already exists: {0}")]
    Duplicate(String),
    #[error(
        "Insufficient stock for product '{name}' ({product_id}): requested {requested}, available {available}"
    )]
    InsufficientStock {
        product_id: Uuid,
        name: String,
        requested: i32,
        available: i32,
    },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn product_not_found(id: Uuid) -> Self {
        DomainError::NotFound(format!("Product {id}"))
    }

    pub fn order_not_found(id: Uuid) -> Self {
        DomainError::NotFound(format!("Order {id}"))
    }
}
