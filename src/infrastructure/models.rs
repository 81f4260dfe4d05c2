use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::audit::ActionLogView;
use crate::domain::catalog::{ProductView, ShoeSize};
use crate::domain::errors::DomainError;
use crate::domain::order::{OrderItemView, OrderView, ShippingAddressView};
use crate::domain::review::ReviewView;
use crate::schema::{
    action_logs, order_items, orders, product_sizes, products, reviews, shipping_addresses,
    shoe_sizes,
};

// ── Catalog ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = products)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub count_in_stock: i32,
    pub rating: BigDecimal,
    pub num_reviews: i32,
    pub visible: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ProductRow {
    pub fn into_view(self, sizes: Vec<ShoeSizeRow>) -> ProductView {
        ProductView {
            id: self.id,
            name: self.name,
            category_id: self.category_id,
            description: self.description,
            price: self.price,
            count_in_stock: self.count_in_stock,
            rating: self.rating,
            num_reviews: self.num_reviews,
            visible: self.visible,
            sizes: sizes.into_iter().map(ShoeSize::from).collect(),
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = products)]
pub struct NewProductRow {
    pub id: Uuid,
    pub name: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub count_in_stock: i32,
    pub visible: bool,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Insertable)]
#[diesel(table_name = shoe_sizes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShoeSizeRow {
    pub id: Uuid,
    pub size: i32,
}

impl From<ShoeSizeRow> for ShoeSize {
    fn from(row: ShoeSizeRow) -> Self {
        ShoeSize {
            id: row.id,
            size: row.size,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = product_sizes)]
pub struct NewProductSizeRow {
    pub product_id: Uuid,
    pub shoe_size_id: Uuid,
}

// ── Orders ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_method: String,
    pub tax_price: BigDecimal,
    pub shipping_price: BigDecimal,
    pub total_price: BigDecimal,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_shipped: bool,
    pub shipped_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderRow {
    pub fn into_view(
        self,
        items: Vec<OrderItemRow>,
        address: Option<ShippingAddressRow>,
    ) -> Result<OrderView, DomainError> {
        Ok(OrderView {
            id: self.id,
            user_id: self.user_id,
            payment_method: self.payment_method,
            tax_price: self.tax_price,
            shipping_price: self.shipping_price,
            total_price: self.total_price,
            is_paid: self.is_paid,
            paid_at: self.paid_at,
            is_shipped: self.is_shipped,
            shipped_at: self.shipped_at,
            is_delivered: self.is_delivered,
            delivered_at: self.delivered_at,
            created_at: self.created_at,
            shipping_address: address.map(ShippingAddressView::from),
            items: items
                .into_iter()
                .map(OrderItemRow::into_view)
                .collect::<Result<_, _>>()?,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = orders)]
pub struct NewOrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub payment_method: String,
    pub tax_price: BigDecimal,
    pub shipping_price: BigDecimal,
    pub total_price: BigDecimal,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = order_items)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub image: String,
    pub size_id: Option<Uuid>,
    pub colors: Value,
    pub created_at: DateTime<Utc>,
}

impl OrderItemRow {
    pub fn into_view(self) -> Result<OrderItemView, DomainError> {
        let colors: BTreeMap<String, String> = serde_json::from_value(self.colors)?;
        Ok(OrderItemView {
            id: self.id,
            product_id: self.product_id,
            name: self.name,
            price: self.price,
            image: self.image,
            size_id: self.size_id,
            colors,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = order_items)]
pub struct NewOrderItemRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub image: String,
    pub size_id: Option<Uuid>,
    pub colors: Value,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, Associations)]
#[diesel(table_name = shipping_addresses)]
#[diesel(belongs_to(OrderRow, foreign_key = order_id))]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ShippingAddressRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

impl From<ShippingAddressRow> for ShippingAddressView {
    fn from(row: ShippingAddressRow) -> Self {
        ShippingAddressView {
            id: row.id,
            address: row.address,
            city: row.city,
            postal_code: row.postal_code,
            country: row.country,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = shipping_addresses)]
pub struct NewShippingAddressRow {
    pub id: Uuid,
    pub order_id: Uuid,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

// ── Reviews & audit ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ReviewRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

impl From<ReviewRow> for ReviewView {
    fn from(row: ReviewRow) -> Self {
        ReviewView {
            id: row.id,
            product_id: row.product_id,
            user_id: row.user_id,
            name: row.name,
            rating: row.rating,
            comment: row.comment,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = reviews)]
pub struct NewReviewRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = action_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ActionLogRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
    pub created_at: DateTime<Utc>,
}

impl From<ActionLogRow> for ActionLogView {
    fn from(row: ActionLogRow) -> Self {
        ActionLogView {
            id: row.id,
            user_id: row.user_id,
            action: row.action,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = action_logs)]
pub struct NewActionLogRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub action: String,
}
