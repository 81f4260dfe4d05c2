use uuid::Uuid;

use crate::domain::catalog::ProductView;
use crate::domain::errors::DomainError;
use crate::domain::identity::Caller;
use crate::domain::ports::{AuditLog, ReviewRepository, ReviewUnitOfWork};
use crate::domain::review::{average_rating, NewReview, ReviewInput, ReviewView};

pub struct ReviewService<R, A> {
    repo: R,
    audit: A,
}

impl<R: ReviewRepository, A: AuditLog> ReviewService<R, A> {
    pub fn new(repo: R, audit: A) -> Self {
        Self { repo, audit }
    }

    pub fn add_review(
        &self,
        caller: &Caller,
        product_id: Uuid,
        input: ReviewInput,
    ) -> Result<ProductView, DomainError> {
        let product = self.repo.in_transaction(|uow| {
            if !uow.lock_product(product_id)? {
                return Err(DomainError::product_not_found(product_id));
            }
            if uow.find_review_by_author(product_id, caller.id)?.is_some() {
                return Err(DomainError::Duplicate(
                    "product already reviewed".to_string(),
                ));
            }
            let (rating, comment) = input.validate()?;

            uow.insert_review(NewReview {
                product_id,
                user_id: caller.id,
                name: caller.name.clone(),
                rating,
                comment,
            })?;
            refresh_rating(uow, product_id)
        })?;

        log::info!(
            "Review added to product {} by {}; rating now {:?} over {}",
            product_id,
            caller.id,
            product.rating,
            product.num_reviews
        );
        Ok(product)
    }

    pub fn delete_review(
        &self,
        caller: &Caller,
        product_id: Uuid,
        review_id: Uuid,
    ) -> Result<ProductView, DomainError> {
        let (product, author) = self.repo.in_transaction(|uow| {
            if !uow.lock_product(product_id)? {
                return Err(DomainError::product_not_found(product_id));
            }
            let review = uow
                .find_review(product_id, review_id)?
                .ok_or_else(|| DomainError::NotFound(format!("Review {review_id}")))?;
            if !caller.can_access(review.user_id) {
                return Err(DomainError::Forbidden(
                    "not authorized to delete this review".to_string(),
                ));
            }

            uow.delete_review(review_id)?;
            Ok((refresh_rating(uow, product_id)?, review.user_id))
        })?;

        if author != caller.id {
            self.audit.record(
                caller.id,
                &format!("Deleted review {review_id} on product {product_id}"),
            );
        }
        log::info!(
            "Review {} removed from product {} by {}",
            review_id,
            product_id,
            caller.id
        );
        Ok(product)
    }

    pub fn reviews_for(&self, product_id: Uuid) -> Result<Vec<ReviewView>, DomainError> {
        self.repo.list_for_product(product_id)
    }
}

/// Recomputes the aggregate from whatever reviews are persisted right now.
fn refresh_rating(
    uow: &mut dyn ReviewUnitOfWork,
    product_id: Uuid,
) -> Result<ProductView, DomainError> {
    let ratings = uow.ratings_for_product(product_id)?;
    let num_reviews = i32::try_from(ratings.len())
        .map_err(|_| DomainError::Internal("review count overflow".to_string()))?;
    uow.update_rating(product_id, average_rating(&ratings), num_reviews)
}
