use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShoeSize {
    pub id: Uuid,
    pub size: i32,
}

#[derive(Debug, Clone)]
pub struct ProductView {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub count_in_stock: i32,
    pub rating: BigDecimal,
    pub num_reviews: i32,
    pub visible: bool,
    pub sizes: Vec<ShoeSize>,
    pub created_at: DateTime<Utc>,
}

/// The slice of a product the order engine needs while it holds the row lock.
#[derive(Debug, Clone)]
pub struct ProductStock {
    pub id: Uuid,
    pub name: String,
    pub count_in_stock: i32,
}

#[derive(Debug, Clone)]
pub struct ProductDraft {
    pub name: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub count_in_stock: i32,
    pub visible: bool,
    pub size_ids: Vec<Uuid>,
}
