use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::{ProductDraft, ProductView, ShoeSize};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;
use crate::schema::{product_sizes, products, shoe_sizes};

use super::models::{NewProductRow, NewProductSizeRow, ProductRow, ShoeSizeRow};

/// Loads a product together with its sizes, smallest first.
pub(crate) fn load_product_view(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<ProductView>, DomainError> {
    let product = products::table
        .find(id)
        .select(ProductRow::as_select())
        .first(conn)
        .optional()?;

    let Some(product) = product else {
        return Ok(None);
    };

    let sizes = product_sizes::table
        .inner_join(shoe_sizes::table)
        .filter(product_sizes::product_id.eq(id))
        .order(shoe_sizes::size.asc())
        .select(ShoeSizeRow::as_select())
        .load(conn)?;

    Ok(Some(product.into_view(sizes)))
}

#[derive(Clone)]
pub struct DieselCatalogRepository {
    pool: DbPool,
}

impl DieselCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl CatalogRepository for DieselCatalogRepository {
    fn get_product(&self, id: Uuid) -> Result<Option<ProductView>, DomainError> {
        let mut conn = self.pool.get()?;
        load_product_view(&mut conn, id)
    }

    fn get_shoe_size(&self, id: Uuid) -> Result<Option<ShoeSize>, DomainError> {
        let mut conn = self.pool.get()?;
        let size = shoe_sizes::table
            .find(id)
            .select(ShoeSizeRow::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(size.map(ShoeSize::from))
    }

    fn create_product(&self, draft: ProductDraft) -> Result<ProductView, DomainError> {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let product_id = Uuid::new_v4();
            diesel::insert_into(products::table)
                .values(&NewProductRow {
                    id: product_id,
                    name: draft.name,
                    category_id: draft.category_id,
                    description: draft.description,
                    price: draft.price,
                    count_in_stock: draft.count_in_stock,
                    visible: draft.visible,
                })
                .execute(conn)?;

            let links: Vec<NewProductSizeRow> = draft
                .size_ids
                .iter()
                .map(|&shoe_size_id| NewProductSizeRow {
                    product_id,
                    shoe_size_id,
                })
                .collect();
            if !links.is_empty() {
                diesel::insert_into(product_sizes::table)
                    .values(&links)
                    .execute(conn)
                    .map_err(|e| match e {
                        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                            DomainError::NotFound("Shoe size".to_string())
                        }
                        other => other.into(),
                    })?;
            }

            load_product_view(conn, product_id)?.ok_or_else(|| {
                DomainError::Internal(format!("product {product_id} vanished after insert"))
            })
        })
    }

    fn create_shoe_size(&self, size: i32) -> Result<ShoeSize, DomainError> {
        let mut conn = self.pool.get()?;
        let row = diesel::insert_into(shoe_sizes::table)
            .values(&ShoeSizeRow {
                id: Uuid::new_v4(),
                size,
            })
            .returning(ShoeSizeRow::as_returning())
            .get_result(&mut conn)
            .map_err(|e| match e {
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    DomainError::Duplicate(format!("shoe size {size}"))
                }
                other => other.into(),
            })?;
        Ok(row.into())
    }
}
