use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::audit::ActionLogPage;
use super::catalog::{ProductDraft, ProductStock, ProductView, ShoeSize};
use super::errors::DomainError;
use super::order::{ListResult, Milestone, NewOrder, OrderView};
use super::review::{NewReview, ReviewView};

pub trait CatalogRepository: Send + Sync + 'static {
    fn get_product(&self, id: Uuid) -> Result<Option<ProductView>, DomainError>;
    fn get_shoe_size(&self, id: Uuid) -> Result<Option<ShoeSize>, DomainError>;
    fn create_product(&self, draft: ProductDraft) -> Result<ProductView, DomainError>;
    fn create_shoe_size(&self, size: i32) -> Result<ShoeSize, DomainError>;
}

/// Writes issued while an order transaction is open. Everything done through
/// one unit of work commits or rolls back together.
pub trait OrderUnitOfWork {
    /// Locks the rows of the given products until the transaction ends.
    /// Unknown ids are simply absent from the result.
    fn lock_products(&mut self, ids: &[Uuid]) -> Result<Vec<ProductStock>, DomainError>;
    fn find_shoe_size(&mut self, id: Uuid) -> Result<Option<ShoeSize>, DomainError>;
    /// Inserts the order, its shipping address and its items.
    fn insert_order(&mut self, order: NewOrder) -> Result<OrderView, DomainError>;
    /// Decrements stock, failing rather than letting it go negative.
    fn decrement_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<(), DomainError>;
}

pub trait OrderRepository: Send + Sync + 'static {
    fn in_transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn OrderUnitOfWork) -> Result<T, DomainError>;
    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError>;
    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError>;
    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError>;
    /// Sets (`Some`) or clears (`None`) a milestone; returns `None` for an
    /// unknown order.
    fn set_milestone(
        &self,
        id: Uuid,
        milestone: Milestone,
        at: Option<DateTime<Utc>>,
    ) -> Result<Option<OrderView>, DomainError>;
}

pub trait ReviewUnitOfWork {
    /// Locks the product row so rating recomputations never interleave.
    fn lock_product(&mut self, id: Uuid) -> Result<bool, DomainError>;
    fn find_review(
        &mut self,
        product_id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<ReviewView>, DomainError>;
    fn find_review_by_author(
        &mut self,
        product_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ReviewView>, DomainError>;
    fn insert_review(&mut self, review: NewReview) -> Result<ReviewView, DomainError>;
    fn delete_review(&mut self, review_id: Uuid) -> Result<(), DomainError>;
    fn ratings_for_product(&mut self, product_id: Uuid) -> Result<Vec<i32>, DomainError>;
    fn update_rating(
        &mut self,
        product_id: Uuid,
        rating: BigDecimal,
        num_reviews: i32,
    ) -> Result<ProductView, DomainError>;
}

pub trait ReviewRepository: Send + Sync + 'static {
    fn in_transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn ReviewUnitOfWork) -> Result<T, DomainError>;
    fn list_for_product(&self, product_id: Uuid) -> Result<Vec<ReviewView>, DomainError>;
}

/// Fire-and-forget admin audit trail.
pub trait AuditLog: Send + Sync + 'static {
    fn record(&self, user_id: Uuid, action: &str);
    fn page(&self, page: i64) -> Result<ActionLogPage, DomainError>;
}
