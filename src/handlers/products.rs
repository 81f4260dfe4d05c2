use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{CatalogData, ReviewServiceData};
use crate::auth::AuthenticatedCaller;
use crate::domain::catalog::{ProductView, ShoeSize};
use crate::domain::errors::DomainError;
use crate::domain::ports::CatalogRepository;
use crate::domain::review::{ReviewInput, ReviewView};
use crate::errors::AppError;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    /// 1 to 5
    pub rating: Option<i32>,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ShoeSizeResponse {
    pub id: Uuid,
    pub size: i32,
}

impl From<ShoeSize> for ShoeSizeResponse {
    fn from(s: ShoeSize) -> Self {
        Self {
            id: s.id,
            size: s.size,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub name: String,
    pub rating: i32,
    pub comment: String,
    pub created_at: String,
}

impl From<ReviewView> for ReviewResponse {
    fn from(r: ReviewView) -> Self {
        Self {
            id: r.id,
            user: r.user_id,
            name: r.name,
            rating: r.rating,
            comment: r.comment,
            created_at: r.created_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProductResponse {
    pub id: Uuid,
    pub name: String,
    pub category: Option<Uuid>,
    pub description: Option<String>,
    pub price: String,
    pub count_in_stock: i32,
    /// Average rating with two decimals; "0.00" while there are no reviews
    pub rating: String,
    pub num_reviews: i32,
    pub visible: bool,
    pub sizes: Vec<ShoeSizeResponse>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews: Option<Vec<ReviewResponse>>,
}

impl From<ProductView> for ProductResponse {
    fn from(p: ProductView) -> Self {
        Self {
            id: p.id,
            name: p.name,
            category: p.category_id,
            description: p.description,
            price: p.price.to_string(),
            count_in_stock: p.count_in_stock,
            rating: p.rating.with_scale(2).to_string(),
            num_reviews: p.num_reviews,
            visible: p.visible,
            sizes: p.sizes.into_iter().map(Into::into).collect(),
            created_at: p.created_at.to_rfc3339(),
            reviews: None,
        }
    }
}

/// GET /products/{id}
///
/// Returns the product with its sizes and reviews, newest review first.
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = Uuid, Path, description = "Product UUID")),
    responses(
        (status = 200, description = "Product found", body = ProductResponse),
        (status = 404, description = "Product not found"),
    ),
    tag = "products"
)]
pub async fn get_product(
    catalog: CatalogData,
    review_service: ReviewServiceData,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let (product, reviews) = web::block(move || {
        let product = catalog
            .get_product(id)?
            .ok_or_else(|| DomainError::product_not_found(id))?;
        let reviews = review_service.reviews_for(id)?;
        Ok::<_, DomainError>((product, reviews))
    })
    .await??;

    let mut body = ProductResponse::from(product);
    body.reviews = Some(reviews.into_iter().map(Into::into).collect());
    Ok(HttpResponse::Ok().json(body))
}

/// POST /products/{id}/reviews
#[utoipa::path(
    post,
    path = "/products/{id}/reviews",
    params(("id" = Uuid, Path, description = "Product UUID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review added; returns the updated product", body = ProductResponse),
        (status = 400, description = "Invalid review or product already reviewed"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Product not found"),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn create_review(
    service: ReviewServiceData,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    path: web::Path<Uuid>,
    body: web::Json<CreateReviewRequest>,
) -> Result<HttpResponse, AppError> {
    let product_id = path.into_inner();
    let body = body.into_inner();
    let input = ReviewInput {
        rating: body.rating,
        comment: body.comment,
    };

    let product = web::block(move || service.add_review(&caller, product_id, input)).await??;

    Ok(HttpResponse::Created().json(ProductResponse::from(product)))
}

/// DELETE /products/{id}/reviews/{review_id}
#[utoipa::path(
    delete,
    path = "/products/{id}/reviews/{review_id}",
    params(
        ("id" = Uuid, Path, description = "Product UUID"),
        ("review_id" = Uuid, Path, description = "Review UUID"),
    ),
    responses(
        (status = 200, description = "Review deleted; returns the updated product", body = ProductResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is neither the author nor an admin"),
        (status = 404, description = "Product or review not found"),
    ),
    security(("bearer" = [])),
    tag = "products"
)]
pub async fn delete_review(
    service: ReviewServiceData,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    path: web::Path<(Uuid, Uuid)>,
) -> Result<HttpResponse, AppError> {
    let (product_id, review_id) = path.into_inner();

    let product =
        web::block(move || service.delete_review(&caller, product_id, review_id)).await??;

    Ok(HttpResponse::Ok().json(ProductResponse::from(product)))
}
