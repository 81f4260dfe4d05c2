//! In-process stand-ins for the Diesel repositories, used by the service
//! tests. A transaction holds the store's mutex for its whole duration and
//! works on a copy of the state that is swapped in only on success.

use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::audit::{clamp_page, page_count, ActionLogPage, ActionLogView, ACTION_LOGS_PER_PAGE};
use crate::domain::catalog::{ProductStock, ProductView, ShoeSize};
use crate::domain::errors::DomainError;
use crate::domain::order::{
    ListResult, Milestone, NewOrder, OrderItemView, OrderView, ShippingAddressView,
};
use crate::domain::ports::{
    AuditLog, OrderRepository, OrderUnitOfWork, ReviewRepository, ReviewUnitOfWork,
};
use crate::domain::review::{NewReview, ReviewView};

#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    products: BTreeMap<Uuid, ProductView>,
    sizes: BTreeMap<Uuid, ShoeSize>,
    orders: Vec<OrderView>,
    reviews: Vec<ReviewView>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().expect("memory store poisoned")
    }

    fn transact<T>(
        &self,
        work: impl FnOnce(&mut MemoryState) -> Result<T, DomainError>,
    ) -> Result<T, DomainError> {
        let mut committed = self.lock();
        let mut working = committed.clone();
        let result = work(&mut working)?;
        *committed = working;
        Ok(result)
    }

    pub fn add_product(&self, name: &str, price: &str, count_in_stock: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().products.insert(
            id,
            ProductView {
                id,
                name: name.to_string(),
                category_id: None,
                description: None,
                price: BigDecimal::from_str(price).expect("valid decimal"),
                count_in_stock,
                rating: BigDecimal::from(0).with_scale(2),
                num_reviews: 0,
                visible: true,
                sizes: vec![],
                created_at: Utc::now(),
            },
        );
        id
    }

    pub fn add_size(&self, size: i32) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().sizes.insert(id, ShoeSize { id, size });
        id
    }

    pub fn product(&self, id: Uuid) -> ProductView {
        self.lock().products[&id].clone()
    }

    pub fn stock_of(&self, id: Uuid) -> i32 {
        self.product(id).count_in_stock
    }

    pub fn order_count(&self) -> usize {
        self.lock().orders.len()
    }

    pub fn review_count(&self, product_id: Uuid) -> usize {
        self.lock()
            .reviews
            .iter()
            .filter(|r| r.product_id == product_id)
            .count()
    }
}

fn newest_first(orders: &[OrderView]) -> Vec<OrderView> {
    let mut sorted = orders.to_vec();
    sorted.reverse();
    sorted
}

impl OrderUnitOfWork for MemoryState {
    fn lock_products(&mut self, ids: &[Uuid]) -> Result<Vec<ProductStock>, DomainError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.products.get(id))
            .map(|p| ProductStock {
                id: p.id,
                name: p.name.clone(),
                count_in_stock: p.count_in_stock,
            })
            .collect())
    }

    fn find_shoe_size(&mut self, id: Uuid) -> Result<Option<ShoeSize>, DomainError> {
        Ok(self.sizes.get(&id).cloned())
    }

    fn insert_order(&mut self, order: NewOrder) -> Result<OrderView, DomainError> {
        let view = OrderView {
            id: Uuid::new_v4(),
            user_id: order.user_id,
            payment_method: order.payment_method,
            tax_price: order.tax_price,
            shipping_price: order.shipping_price,
            total_price: order.total_price,
            is_paid: false,
            paid_at: None,
            is_shipped: false,
            shipped_at: None,
            is_delivered: false,
            delivered_at: None,
            created_at: Utc::now(),
            shipping_address: Some(ShippingAddressView {
                id: Uuid::new_v4(),
                address: order.shipping_address.address,
                city: order.shipping_address.city,
                postal_code: order.shipping_address.postal_code,
                country: order.shipping_address.country,
            }),
            items: order
                .items
                .into_iter()
                .map(|i| OrderItemView {
                    id: Uuid::new_v4(),
                    product_id: i.product_id,
                    name: i.name,
                    price: i.price,
                    image: i.image,
                    size_id: i.size.map(|s| s.id),
                    colors: i.colors,
                })
                .collect(),
        };
        self.orders.push(view.clone());
        Ok(view)
    }

    fn decrement_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<(), DomainError> {
        let product = self
            .products
            .get_mut(&product_id)
            .ok_or_else(|| DomainError::product_not_found(product_id))?;
        if product.count_in_stock < quantity {
            return Err(DomainError::InsufficientStock {
                product_id,
                name: product.name.clone(),
                requested: quantity,
                available: product.count_in_stock,
            });
        }
        product.count_in_stock -= quantity;
        Ok(())
    }
}

impl OrderRepository for MemoryStore {
    fn in_transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn OrderUnitOfWork) -> Result<T, DomainError>,
    {
        self.transact(|state| work(state as &mut dyn OrderUnitOfWork))
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        Ok(self.lock().orders.iter().find(|o| o.id == id).cloned())
    }

    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
        Ok(newest_first(&self.lock().orders)
            .into_iter()
            .filter(|o| o.user_id == user_id)
            .collect())
    }

    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let orders = newest_first(&self.lock().orders);
        let total = orders.len() as i64;
        let items = orders
            .into_iter()
            .skip(((page - 1) * limit) as usize)
            .take(limit as usize)
            .collect();
        Ok(ListResult { items, total })
    }

    fn set_milestone(
        &self,
        id: Uuid,
        milestone: Milestone,
        at: Option<DateTime<Utc>>,
    ) -> Result<Option<OrderView>, DomainError> {
        let mut state = self.lock();
        let Some(order) = state.orders.iter_mut().find(|o| o.id == id) else {
            return Ok(None);
        };
        let (flag, stamp) = match milestone {
            Milestone::Paid => (&mut order.is_paid, &mut order.paid_at),
            Milestone::Shipped => (&mut order.is_shipped, &mut order.shipped_at),
            Milestone::Delivered => (&mut order.is_delivered, &mut order.delivered_at),
        };
        *flag = at.is_some();
        *stamp = at;
        Ok(Some(order.clone()))
    }
}

impl ReviewUnitOfWork for MemoryState {
    fn lock_product(&mut self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.products.contains_key(&id))
    }

    fn find_review(
        &mut self,
        product_id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<ReviewView>, DomainError> {
        Ok(self
            .reviews
            .iter()
            .find(|r| r.id == review_id && r.product_id == product_id)
            .cloned())
    }

    fn find_review_by_author(
        &mut self,
        product_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ReviewView>, DomainError> {
        Ok(self
            .reviews
            .iter()
            .find(|r| r.product_id == product_id && r.user_id == user_id)
            .cloned())
    }

    fn insert_review(&mut self, review: NewReview) -> Result<ReviewView, DomainError> {
        let view = ReviewView {
            id: Uuid::new_v4(),
            product_id: review.product_id,
            user_id: review.user_id,
            name: review.name,
            rating: review.rating,
            comment: review.comment,
            created_at: Utc::now(),
        };
        self.reviews.push(view.clone());
        Ok(view)
    }

    fn delete_review(&mut self, review_id: Uuid) -> Result<(), DomainError> {
        self.reviews.retain(|r| r.id != review_id);
        Ok(())
    }

    fn ratings_for_product(&mut self, product_id: Uuid) -> Result<Vec<i32>, DomainError> {
        Ok(self
            .reviews
            .iter()
            .filter(|r| r.product_id == product_id)
            .map(|r| r.rating)
            .collect())
    }

    fn update_rating(
        &mut self,
        product_id: Uuid,
        rating: BigDecimal,
        num_reviews: i32,
    ) -> Result<ProductView, DomainError> {
        let product = self
            .products
            .get_mut(&product_id)
            .ok_or_else(|| DomainError::product_not_found(product_id))?;
        product.rating = rating;
        product.num_reviews = num_reviews;
        Ok(product.clone())
    }
}

impl ReviewRepository for MemoryStore {
    fn in_transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn ReviewUnitOfWork) -> Result<T, DomainError>,
    {
        self.transact(|state| work(state as &mut dyn ReviewUnitOfWork))
    }

    fn list_for_product(&self, product_id: Uuid) -> Result<Vec<ReviewView>, DomainError> {
        let mut reviews: Vec<ReviewView> = self
            .lock()
            .reviews
            .iter()
            .filter(|r| r.product_id == product_id)
            .cloned()
            .collect();
        reviews.reverse();
        Ok(reviews)
    }
}

#[derive(Clone, Default)]
pub struct MemoryAuditLog {
    entries: Arc<Mutex<Vec<ActionLogView>>>,
}

impl MemoryAuditLog {
    pub fn entries(&self) -> Vec<(Uuid, String)> {
        self.entries
            .lock()
            .expect("audit log poisoned")
            .iter()
            .map(|e| (e.user_id, e.action.clone()))
            .collect()
    }
}

impl AuditLog for MemoryAuditLog {
    fn record(&self, user_id: Uuid, action: &str) {
        self.entries
            .lock()
            .expect("audit log poisoned")
            .push(ActionLogView {
                id: Uuid::new_v4(),
                user_id,
                action: action.to_string(),
                created_at: Utc::now(),
            });
    }

    fn page(&self, page: i64) -> Result<ActionLogPage, DomainError> {
        let entries = self.entries.lock().expect("audit log poisoned");
        let pages = page_count(entries.len() as i64, ACTION_LOGS_PER_PAGE);
        let page = clamp_page(page, pages);
        let items = entries
            .iter()
            .rev()
            .skip(((page - 1) * ACTION_LOGS_PER_PAGE) as usize)
            .take(ACTION_LOGS_PER_PAGE as usize)
            .cloned()
            .collect();
        Ok(ActionLogPage { items, page, pages })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_transaction_leaves_state_untouched() {
        let store = MemoryStore::default();
        let id = store.add_product("A", "1.00", 3);

        let result: Result<(), DomainError> = OrderRepository::in_transaction(&store, |uow| {
            uow.decrement_stock(id, 2)?;
            Err(DomainError::Internal("boom".to_string()))
        });

        assert!(result.is_err());
        assert_eq!(store.stock_of(id), 3);
    }

    #[test]
    fn audit_pages_are_newest_first() {
        let audit = MemoryAuditLog::default();
        let user = Uuid::new_v4();
        for i in 0..12 {
            audit.record(user, &format!("action {i}"));
        }

        let first = audit.page(1).unwrap();
        assert_eq!(first.pages, 2);
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.items[0].action, "action 11");

        let last = audit.page(9).unwrap();
        assert_eq!(last.page, 2);
        assert_eq!(last.items.len(), 2);
    }
}
