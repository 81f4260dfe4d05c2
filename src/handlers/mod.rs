pub mod action_logs;
pub mod orders;
pub mod products;

use actix_web::web;

use crate::application::order_service::OrderService;
use crate::application::review_service::ReviewService;
use crate::infrastructure::audit_log::DieselAuditLog;
use crate::infrastructure::catalog_repo::DieselCatalogRepository;
use crate::infrastructure::order_repo::DieselOrderRepository;
use crate::infrastructure::review_repo::DieselReviewRepository;

pub type Orders = OrderService<DieselOrderRepository, DieselAuditLog>;
pub type Reviews = ReviewService<DieselReviewRepository, DieselAuditLog>;

pub type OrderServiceData = web::Data<Orders>;
pub type ReviewServiceData = web::Data<Reviews>;
pub type CatalogData = web::Data<DieselCatalogRepository>;
pub type AuditData = web::Data<DieselAuditLog>;
