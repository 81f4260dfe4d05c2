use bigdecimal::BigDecimal;
use chrono::Utc;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use uuid::Uuid;

use crate::db::DbPool;
use crate::domain::catalog::ProductView;
use crate::domain::errors::DomainError;
use crate::domain::ports::{ReviewRepository, ReviewUnitOfWork};
use crate::domain::review::{NewReview, ReviewView};
use crate::schema::{products, reviews};

use super::catalog_repo::load_product_view;
use super::models::{NewReviewRow, ReviewRow};

struct PgReviewUnitOfWork<'a> {
    conn: &'a mut PgConnection,
}

impl ReviewUnitOfWork for PgReviewUnitOfWork<'_> {
    fn lock_product(&mut self, id: Uuid) -> Result<bool, DomainError> {
        let locked = products::table
            .find(id)
            .select(products::id)
            .for_update()
            .first::<Uuid>(&mut *self.conn)
            .optional()?;
        Ok(locked.is_some())
    }

    fn find_review(
        &mut self,
        product_id: Uuid,
        review_id: Uuid,
    ) -> Result<Option<ReviewView>, DomainError> {
        let review = reviews::table
            .filter(reviews::id.eq(review_id))
            .filter(reviews::product_id.eq(product_id))
            .select(ReviewRow::as_select())
            .first(&mut *self.conn)
            .optional()?;
        Ok(review.map(ReviewView::from))
    }

    fn find_review_by_author(
        &mut self,
        product_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ReviewView>, DomainError> {
        let review = reviews::table
            .filter(reviews::product_id.eq(product_id))
            .filter(reviews::user_id.eq(user_id))
            .select(ReviewRow::as_select())
            .first(&mut *self.conn)
            .optional()?;
        Ok(review.map(ReviewView::from))
    }

    fn insert_review(&mut self, review: NewReview) -> Result<ReviewView, DomainError> {
        let row = diesel::insert_into(reviews::table)
            .values(&NewReviewRow {
                id: Uuid::new_v4(),
                product_id: review.product_id,
                user_id: review.user_id,
                name: review.name,
                rating: review.rating,
                comment: review.comment,
            })
            .returning(ReviewRow::as_returning())
            .get_result(&mut *self.conn)
            .map_err(|e| match e {
                // The (product_id, user_id) unique key backs up the explicit check.
                DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                    DomainError::Duplicate("product already reviewed".to_string())
                }
                other => other.into(),
            })?;
        Ok(row.into())
    }

    fn delete_review(&mut self, review_id: Uuid) -> Result<(), DomainError> {
        diesel::delete(reviews::table.find(review_id)).execute(&mut *self.conn)?;
        Ok(())
    }

    fn ratings_for_product(&mut self, product_id: Uuid) -> Result<Vec<i32>, DomainError> {
        Ok(reviews::table
            .filter(reviews::product_id.eq(product_id))
            .select(reviews::rating)
            .load(&mut *self.conn)?)
    }

    fn update_rating(
        &mut self,
        product_id: Uuid,
        rating: BigDecimal,
        num_reviews: i32,
    ) -> Result<ProductView, DomainError> {
        diesel::update(products::table.find(product_id))
            .set((
                products::rating.eq(rating),
                products::num_reviews.eq(num_reviews),
                products::updated_at.eq(Utc::now()),
            ))
            .execute(&mut *self.conn)?;

        load_product_view(&mut *self.conn, product_id)?
            .ok_or_else(|| DomainError::product_not_found(product_id))
    }
}

#[derive(Clone)]
pub struct DieselReviewRepository {
    pool: DbPool,
}

impl DieselReviewRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl ReviewRepository for DieselReviewRepository {
    fn in_transaction<T, F>(&self, work: F) -> Result<T, DomainError>
    where
        F: FnOnce(&mut dyn ReviewUnitOfWork) -> Result<T, DomainError>,
    {
        let mut conn = self.pool.get()?;

        conn.transaction::<_, DomainError, _>(|conn| {
            let mut uow = PgReviewUnitOfWork { conn };
            work(&mut uow as &mut dyn ReviewUnitOfWork)
        })
    }

    fn list_for_product(&self, product_id: Uuid) -> Result<Vec<ReviewView>, DomainError> {
        let mut conn = self.pool.get()?;

        let rows = reviews::table
            .filter(reviews::product_id.eq(product_id))
            .order((reviews::created_at.desc(), reviews::id.desc()))
            .select(ReviewRow::as_select())
            .load(&mut conn)?;

        Ok(rows.into_iter().map(ReviewView::from).collect())
    }
}
