use std::collections::BTreeMap;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::catalog::{ProductStock, ShoeSize};
use super::errors::DomainError;

/// One requested unit of a product. There is no quantity field: three units
/// of the same product arrive as three lines.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub image: String,
    pub size_id: Option<Uuid>,
    pub colors: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ShippingAddressInput {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone)]
pub struct PlaceOrder {
    pub payment_method: String,
    pub tax_price: BigDecimal,
    pub shipping_price: BigDecimal,
    pub total_price: BigDecimal,
    pub shipping_address: ShippingAddressInput,
    pub lines: Vec<CartLine>,
}

/// Longest text an order column holds.
pub const MAX_TEXT_LEN: usize = 200;

/// Amounts are stored with two decimal places and at most five integer
/// digits.
pub const MONEY_SCALE: i64 = 2;
const MONEY_INTEGER_DIGITS: u32 = 5;

fn check_text(field: &str, value: &str) -> Result<(), DomainError> {
    if value.trim().is_empty() {
        return Err(DomainError::Validation(format!("{field} is required")));
    }
    if value.chars().count() > MAX_TEXT_LEN {
        return Err(DomainError::Validation(format!(
            "{field} must be at most {MAX_TEXT_LEN} characters"
        )));
    }
    Ok(())
}

fn check_money(field: &str, amount: &BigDecimal) -> Result<(), DomainError> {
    if amount < &BigDecimal::from(0) {
        return Err(DomainError::Validation(format!(
            "{field} must not be negative"
        )));
    }
    let (_, scale) = amount.normalized().as_bigint_and_exponent();
    if scale > MONEY_SCALE {
        return Err(DomainError::Validation(format!(
            "{field} {amount} has more than {MONEY_SCALE} decimal places"
        )));
    }
    if amount >= &BigDecimal::from(10_i64.pow(MONEY_INTEGER_DIGITS)) {
        return Err(DomainError::Validation(format!(
            "{field} {amount} exceeds the maximum amount"
        )));
    }
    Ok(())
}

impl PlaceOrder {
    /// Rejects malformed carts before anything touches the database.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.lines.is_empty() {
            return Err(DomainError::Validation("empty cart".to_string()));
        }
        check_text("payment method", &self.payment_method)?;

        let address = &self.shipping_address;
        for (field, value) in [
            ("shipping address", &address.address),
            ("shipping city", &address.city),
            ("shipping postal code", &address.postal_code),
            ("shipping country", &address.country),
        ] {
            check_text(field, value)?;
        }

        check_money("tax price", &self.tax_price)?;
        check_money("shipping price", &self.shipping_price)?;
        check_money("total price", &self.total_price)?;

        for line in &self.lines {
            let context = format!("order item for product {}", line.product_id);
            check_text(&format!("{context}: name"), &line.name)?;
            check_text(&format!("{context}: image"), &line.image)?;
            check_money(&format!("{context}: price"), &line.price)?;
        }

        Ok(())
    }
}

/// Units requested per distinct product, keyed in ascending id order so row
/// locks are always taken in the same sequence.
pub fn aggregate_quantities(lines: &[CartLine]) -> BTreeMap<Uuid, i32> {
    let mut quantities = BTreeMap::new();
    for line in lines {
        *quantities.entry(line.product_id).or_insert(0) += 1;
    }
    quantities
}

/// Every requested product must have been found and must cover its
/// aggregated quantity. Missing products are reported before shortfalls.
pub fn check_stock(
    quantities: &BTreeMap<Uuid, i32>,
    stock: &[ProductStock],
) -> Result<(), DomainError> {
    for product_id in quantities.keys() {
        if !stock.iter().any(|p| p.id == *product_id) {
            return Err(DomainError::product_not_found(*product_id));
        }
    }

    for product in stock {
        let requested = quantities.get(&product.id).copied().unwrap_or(0);
        if requested > product.count_in_stock {
            return Err(DomainError::InsufficientStock {
                product_id: product.id,
                name: product.name.clone(),
                requested,
                available: product.count_in_stock,
            });
        }
    }

    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub image: String,
    pub size: Option<ShoeSize>,
    pub colors: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: Uuid,
    pub payment_method: String,
    pub tax_price: BigDecimal,
    pub shipping_price: BigDecimal,
    pub total_price: BigDecimal,
    pub shipping_address: ShippingAddressInput,
    pub items: Vec<NewOrderItem>,
}

#[derive(Debug, Clone)]
pub struct OrderItemView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub name: String,
    pub price: BigDecimal,
    pub image: String,
    pub size_id: Option<Uuid>,
    pub colors: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct ShippingAddressView {
    pub id: Uuid,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Clone)]
pub struct OrderView {
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
    pub shipping_address: Option<ShippingAddressView>,
    pub items: Vec<OrderItemView>,
}

/// A boolean/timestamp pair on an order. Setting a milestone stores a
/// timestamp, clearing it stores `None`; the flag follows the timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Milestone {
    Paid,
    Shipped,
    Delivered,
}

impl Milestone {
    pub fn label(self) -> &'static str {
        match self {
            Milestone::Paid => "paid",
            Milestone::Shipped => "shipped",
            Milestone::Delivered => "delivered",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}
