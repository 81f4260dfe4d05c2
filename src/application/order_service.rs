use chrono::Utc;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::identity::Caller;
use crate::domain::order::{
    aggregate_quantities, check_stock, ListResult, Milestone, NewOrder, NewOrderItem, OrderView,
    PlaceOrder,
};
use crate::domain::ports::{AuditLog, OrderRepository};

pub struct OrderService<R, A> {
    repo: R,
    audit: A,
}

impl<R: OrderRepository, A: AuditLog> OrderService<R, A> {
    pub fn new(repo: R, audit: A) -> Self {
        Self { repo, audit }
    }

    /// Validates the cart against current stock and persists the order, its
    /// shipping address, its items and the stock decrements as one unit.
    pub fn place_order(&self, caller: &Caller, order: PlaceOrder) -> Result<OrderView, DomainError> {
        order.validate()?;

        let quantities = aggregate_quantities(&order.lines);
        let product_ids: Vec<Uuid> = quantities.keys().copied().collect();

        let placed = self.repo.in_transaction(|uow| {
            let stock = uow.lock_products(&product_ids)?;
            check_stock(&quantities, &stock)?;

            let mut items = Vec::with_capacity(order.lines.len());
            for line in &order.lines {
                let size = match line.size_id {
                    Some(size_id) => Some(uow.find_shoe_size(size_id)?.ok_or_else(|| {
                        DomainError::NotFound(format!("Shoe size {size_id}"))
                    })?),
                    None => None,
                };
                items.push(NewOrderItem {
                    product_id: line.product_id,
                    name: line.name.clone(),
                    price: line.price.clone(),
                    image: line.image.clone(),
                    size,
                    colors: line.colors.clone(),
                });
            }

            let placed = uow.insert_order(NewOrder {
                user_id: caller.id,
                payment_method: order.payment_method.clone(),
                tax_price: order.tax_price.clone(),
                shipping_price: order.shipping_price.clone(),
                total_price: order.total_price.clone(),
                shipping_address: order.shipping_address.clone(),
                items,
            })?;

            for (product_id, quantity) in &quantities {
                uow.decrement_stock(*product_id, *quantity)?;
            }

            Ok(placed)
        });

        match &placed {
            Ok(o) => log::info!(
                "Order {} placed by {} with {} item(s)",
                o.id,
                caller.id,
                o.items.len()
            ),
            Err(e) => log::warn!("Order by {} rejected: {}", caller.id, e),
        }
        placed
    }

    pub fn get_order(&self, caller: &Caller, id: Uuid) -> Result<OrderView, DomainError> {
        let order = self
            .repo
            .find_by_id(id)?
            .ok_or_else(|| DomainError::order_not_found(id))?;
        if !caller.can_access(order.user_id) {
            return Err(DomainError::Forbidden(
                "not authorized to view this order".to_string(),
            ));
        }
        Ok(order)
    }

    pub fn list_my_orders(&self, caller: &Caller) -> Result<Vec<OrderView>, DomainError> {
        self.repo.list_for_user(caller.id)
    }

    pub fn list_orders(
        &self,
        caller: &Caller,
        page: i64,
        limit: i64,
    ) -> Result<ListResult, DomainError> {
        caller.require_admin()?;
        let page = page.max(1);
        let limit = limit.clamp(1, 100);
        if page.checked_mul(limit).is_none() {
            return Err(DomainError::Validation(format!("page {page} is out of range")));
        }
        self.repo.list(page, limit)
    }

    pub fn mark_paid(&self, caller: &Caller, id: Uuid) -> Result<OrderView, DomainError> {
        let order = self
            .repo
            .find_by_id(id)?
            .ok_or_else(|| DomainError::order_not_found(id))?;
        if !caller.can_access(order.user_id) {
            return Err(DomainError::Forbidden(
                "not authorized to pay for this order".to_string(),
            ));
        }
        self.change_milestone(caller, id, Milestone::Paid, true)
    }

    pub fn mark_shipped(&self, caller: &Caller, id: Uuid) -> Result<OrderView, DomainError> {
        self.admin_milestone(caller, id, Milestone::Shipped, true)
    }

    pub fn reset_shipped(&self, caller: &Caller, id: Uuid) -> Result<OrderView, DomainError> {
        self.admin_milestone(caller, id, Milestone::Shipped, false)
    }

    pub fn mark_delivered(&self, caller: &Caller, id: Uuid) -> Result<OrderView, DomainError> {
        self.admin_milestone(caller, id, Milestone::Delivered, true)
    }

    pub fn reset_delivered(&self, caller: &Caller, id: Uuid) -> Result<OrderView, DomainError> {
        self.admin_milestone(caller, id, Milestone::Delivered, false)
    }

    fn admin_milestone(
        &self,
        caller: &Caller,
        id: Uuid,
        milestone: Milestone,
        reached: bool,
    ) -> Result<OrderView, DomainError> {
        caller.require_admin()?;
        let order = self.change_milestone(caller, id, milestone, reached)?;
        let action = if reached {
            format!("Marked order {id} as {}", milestone.label())
        } else {
            format!("Reset order {id} to not {}", milestone.label())
        };
        self.audit.record(caller.id, &action);
        Ok(order)
    }

    fn change_milestone(
        &self,
        caller: &Caller,
        id: Uuid,
        milestone: Milestone,
        reached: bool,
    ) -> Result<OrderView, DomainError> {
        let at = reached.then(Utc::now);
        let order = self
            .repo
            .set_milestone(id, milestone, at)?
            .ok_or_else(|| DomainError::order_not_found(id))?;
        log::info!(
            "Order {} {} set to {} by {}",
            id,
            milestone.label(),
            reached,
            caller.id
        );
        Ok(order)
    }
}
