use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{ProductStock, ShoeSize};
use crate::domain::errors::DomainError;
use crate::domain::order::{ListResult, Milestone, NewOrder, OrderView};
use crate::domain::ports::{OrderRepository, OrderUnitOfWork};
use crate::schema::{order_items, orders, products, shipping_addresses, shoe_sizes};

use super::models::{
    NewOrderItemRow, NewOrderRow, NewShippingAddressRow, OrderItemRow, OrderRow,
    ShippingAddressRow, ShoeSizeRow,
};

/// Attaches items and shipping addresses to a batch of orders, keeping the
/// batch's ordering.
fn load_order_views(
    conn: &mut PgConnection,
    rows: Vec<OrderRow>,
) -> Result<Vec<OrderView>, DomainError> {
    let items = OrderItemRow::belonging_to(&rows)
        .select(OrderItemRow::as_select())
        .order((order_items::created_at.asc(), order_items::id.asc()))
        .load(conn)?
        .grouped_by(&rows);
    let addresses = ShippingAddressRow::belonging_to(&rows)
        .select(ShippingAddressRow::as_select())
        .load(conn)?
        .grouped_by(&rows);

    rows.into_iter()
        .zip(items)
        .zip(addresses)
        .map(|((order, items), mut address)| order.into_view(items, address.pop()))
        .collect()
}

// ── Unit of work ─────────────────────────────────────────────────────────────

struct PgOrderUnitOfWork<'a> {
    conn: &'a mut PgConnection,
}

impl OrderUnitOfWork for PgOrderUnitOfWork<'_> {
    fn lock_products(&mut self, ids: &[Uuid]) -> Result<Vec<ProductStock>, DomainError> {
        // Ascending id order keeps concurrent orders from deadlocking.
        let rows: Vec<(Uuid, String, i32)> = products::table
            .filter(products::id.eq_any(ids.to_vec()))
            .order(products::id.asc())
            .select((products::id, products::name, products::count_in_stock))
            .for_update()
            .load(&mut *self.conn)?;

        Ok(rows
            .into_iter()
            .map(|(id, name, count_in_stock)| ProductStock {
                id,
                name,
                count_in_stock,
            })
            .collect())
    }

    fn find_shoe_size(&mut self, id: Uuid) -> Result<Option<ShoeSize>, DomainError> {
        let size = shoe_sizes::table
            .find(id)
            .select(ShoeSizeRow::as_select())
            .first(&mut *self.conn)
            .optional()?;
        Ok(size.map(ShoeSize::from))
    }

    fn insert_order(&mut self, order: NewOrder) -> Result<OrderView, DomainError> {
        let conn = &mut *self.conn;
        let order_id = Uuid::new_v4();

        // 1. Insert the order
        let row = diesel::insert_into(orders::table)
            .values(&NewOrderRow {
                id: order_id,
                user_id: order.user_id,
                payment_method: order.payment_method,
                tax_price: order.tax_price,
                shipping_price: order.shipping_price,
                total_price: order.total_price,
            })
            .returning(OrderRow::as_returning())
            .get_result(conn)?;

        // 2. Insert the shipping address
        let address = order.shipping_address;
        let address = diesel::insert_into(shipping_addresses::table)
            .values(&NewShippingAddressRow {
                id: Uuid::new_v4(),
                order_id,
                address: address.address,
                city: address.city,
                postal_code: address.postal_code,
                country: address.country,
            })
            .returning(ShippingAddressRow::as_returning())
            .get_result(conn)?;

        // 3. Insert one line item per cart line
        let new_items = order
            .items
            .into_iter()
            .map(|item| {
                Ok(NewOrderItemRow {
                    id: Uuid::new_v4(),
                    order_id,
                    product_id: item.product_id,
                    name: item.name,
                    price: item.price,
                    image: item.image,
                    size_id: item.size.map(|s| s.id),
                    colors: serde_json::to_value(&item.colors)?,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;
        let items = diesel::insert_into(order_items::table)
            .values(&new_items)
            .returning(OrderItemRow::as_returning())
            .get_results(conn)?;

        row.into_view(items, Some(address))
    }

    fn decrement_stock(&mut self, product_id: Uuid, quantity: i32) -> Result<(), DomainError> {
        let conn = &mut *self.conn;
        let updated = diesel::update(
            products::table
                .filter(products::id.eq(product_id))
                .filter(products::count_in_stock.ge(quantity)),
        )
        .set((
            products::count_in_stock.eq(products::count_in_stock - quantity),
            products::updated_at.eq(Utc::now()),
        ))
        .execute(conn)?;

        if updated == 1 {
            return Ok(());
        }

        let current: Option<(String, i32)> = products::table
            .find(product_id)
            .select((products::name, products::count_in_stock))
            .first(conn)
            .optional()?;
        match current {
            Some((name, available)) => Err(DomainError::InsufficientStock {
                product_id,
                name,
                requested: quantity,
                available,
            }),
            None => Err(DomainError::product_not_found(product_id)),
        }
    }
}

// ── Repository ────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DieselOrderRepository {
    pool: DbPool,
}

impl DieselOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl OrderRepository for DieselOrderRepository {
    fn in_transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn OrderUnitOfWork) -> Result<T, DomainError>,
    {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let mut uow = PgOrderUnitOfWork { conn };
            work(&mut uow as &mut dyn OrderUnitOfWork)
        })
    }

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let order = orders::table
            .find(id)
            .select(OrderRow::as_select())
            .first(&mut conn)
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        Ok(load_order_views(&mut conn, vec![order])?.pop())
    }

    fn list_for_user(&self, user_id: Uuid) -> Result<Vec<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = orders::table
            .filter(orders::user_id.eq(user_id))
            .order(orders::created_at.desc())
            .select(OrderRow::as_select())
            .load(&mut conn)?;

        load_order_views(&mut conn, rows)
    }

    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        let mut conn = self.pool.get()?;

        let offset = (page - 1)
            .checked_mul(limit)
            .ok_or_else(|| DomainError::Validation(format!("page {page} is out of range")))?;
        conn.transaction::<_, DomainError, _>(|conn| {
            let total: i64 = orders::table.count().get_result(conn)?;

            let rows = orders::table
                .select(OrderRow::as_select())
                .order(orders::created_at.desc())
                .limit(limit)
                .offset(offset)
                .load(conn)?;

            Ok(ListResult {
                items: load_order_views(conn, rows)?,
                total,
            })
        })
    }

    fn set_milestone(
        &self,
        id: Uuid,
        milestone: Milestone,
        at: Option<DateTime<Utc>>,
    ) -> Result<Option<OrderView>, DomainError> {
        let mut conn = self.pool.get()?;
        let reached = at.is_some();
        let now = Utc::now();

        conn.transaction::<_, DomainError, _>(|conn| {
            let target = orders::table.find(id);
            // Flag and timestamp always change in the same statement.
            let updated = match milestone {
                Milestone::Paid => diesel::update(target)
                    .set((
                        orders::is_paid.eq(reached),
                        orders::paid_at.eq(at),
                        orders::updated_at.eq(now),
                    ))
                    .execute(conn)?,
                Milestone::Shipped => diesel::update(target)
                    .set((
                        orders::is_shipped.eq(reached),
                        orders::shipped_at.eq(at),
                        orders::updated_at.eq(now),
                    ))
                    .execute(conn)?,
                Milestone::Delivered => diesel::update(target)
                    .set((
                        orders::is_delivered.eq(reached),
                        orders::delivered_at.eq(at),
                        orders::updated_at.eq(now),
                    ))
                    .execute(conn)?,
            };

            if updated == 0 {
                return Ok(None);
            }

            let row = orders::table
                .find(id)
                .select(OrderRow::as_select())
                .first(conn)?;
            Ok(load_order_views(conn, vec![row])?.pop())
        })
    }
}
