use std::collections::BTreeMap;
use std::str::FromStr;

use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::OrderServiceData;
use crate::auth::AuthenticatedCaller;
use crate::domain::errors::DomainError;
use crate::domain::order::{
    CartLine, ListResult, OrderItemView, OrderView, PlaceOrder, ShippingAddressInput,
    ShippingAddressView,
};
use crate::errors::AppError;

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct SizeRef {
    pub id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    /// Product id
    pub product: Uuid,
    pub name: String,
    /// Unit price, as a JSON number or a decimal string, e.g. 9.99 or "9.99"
    #[schema(value_type = String, example = "9.99")]
    pub price: Amount,
    pub image: String,
    pub size: Option<SizeRef>,
    /// Chosen color per mesh
    #[serde(default)]
    pub colors: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressRequest {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub order_items: Vec<OrderItemRequest>,
    pub shipping_address: ShippingAddressRequest,
    pub payment_method: String,
    #[schema(value_type = String, example = "5.00")]
    pub tax_price: Amount,
    #[schema(value_type = String, example = "2.00")]
    pub shipping_price: Amount,
    #[schema(value_type = String, example = "37.00")]
    pub total_price: Amount,
}

/// A decimal amount sent either as a JSON number or as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(serde_json::Number),
    Text(String),
}

impl Amount {
    fn parse(&self, field: &str) -> Result<BigDecimal, DomainError> {
        let raw = match self {
            Amount::Number(n) => n.to_string(),
            Amount::Text(s) => s.trim().to_string(),
        };
        BigDecimal::from_str(&raw)
            .map_err(|_| DomainError::Validation(format!("{field} '{raw}' is not a decimal amount")))
    }
}

impl TryFrom<CreateOrderRequest> for PlaceOrder {
    type Error = DomainError;

    fn try_from(req: CreateOrderRequest) -> Result<Self, Self::Error> {
        let lines = req
            .order_items
            .into_iter()
            .map(|item| {
                Ok(CartLine {
                    product_id: item.product,
                    price: item.price.parse("price")?,
                    name: item.name,
                    image: item.image,
                    size_id: item.size.map(|s| s.id),
                    colors: item.colors,
                })
            })
            .collect::<Result<Vec<_>, DomainError>>()?;

        Ok(PlaceOrder {
            tax_price: req.tax_price.parse("taxPrice")?,
            shipping_price: req.shipping_price.parse("shippingPrice")?,
            total_price: req.total_price.parse("totalPrice")?,
            payment_method: req.payment_method,
            shipping_address: ShippingAddressInput {
                address: req.shipping_address.address,
                city: req.shipping_address.city,
                postal_code: req.shipping_address.postal_code,
                country: req.shipping_address.country,
            },
            lines,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemResponse {
    pub id: Uuid,
    pub product: Uuid,
    pub name: String,
    pub price: String,
    pub image: String,
    pub size: Option<Uuid>,
    pub colors: BTreeMap<String, String>,
}

impl From<OrderItemView> for OrderItemResponse {
    fn from(item: OrderItemView) -> Self {
        Self {
            id: item.id,
            product: item.product_id,
            name: item.name,
            price: item.price.to_string(),
            image: item.image,
            size: item.size_id,
            colors: item.colors,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddressResponse {
    pub id: Uuid,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
}

impl From<ShippingAddressView> for ShippingAddressResponse {
    fn from(a: ShippingAddressView) -> Self {
        Self {
            id: a.id,
            address: a.address,
            city: a.city,
            postal_code: a.postal_code,
            country: a.country,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: Uuid,
    pub user: Uuid,
    pub payment_method: String,
    pub tax_price: String,
    pub shipping_price: String,
    pub total_price: String,
    pub is_paid: bool,
    pub paid_at: Option<String>,
    pub is_shipped: bool,
    pub shipped_at: Option<String>,
    pub is_delivered: bool,
    pub delivered_at: Option<String>,
    pub created_at: String,
    pub shipping_address: Option<ShippingAddressResponse>,
    pub order_items: Vec<OrderItemResponse>,
}

impl From<OrderView> for OrderResponse {
    fn from(o: OrderView) -> Self {
        Self {
            id: o.id,
            user: o.user_id,
            payment_method: o.payment_method,
            tax_price: o.tax_price.to_string(),
            shipping_price: o.shipping_price.to_string(),
            total_price: o.total_price.to_string(),
            is_paid: o.is_paid,
            paid_at: o.paid_at.map(|t| t.to_rfc3339()),
            is_shipped: o.is_shipped,
            shipped_at: o.shipped_at.map(|t| t.to_rfc3339()),
            is_delivered: o.is_delivered,
            delivered_at: o.delivered_at.map(|t| t.to_rfc3339()),
            created_at: o.created_at.to_rfc3339(),
            shipping_address: o.shipping_address.map(Into::into),
            order_items: o.items.into_iter().map(Into::into).collect(),
        }
    }
}

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Places an order for the signed-in caller. Stock is checked and decremented
/// under row locks in the same transaction that writes the order, its
/// shipping address and its items.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Invalid cart or insufficient stock"),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "Unknown product or shoe size"),
        (status = 500, description = "Internal server error"),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn create_order(
    service: OrderServiceData,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let order = PlaceOrder::try_from(body.into_inner())?;

    let placed = web::block(move || service.place_order(&caller, order)).await??;

    Ok(HttpResponse::Created().json(OrderResponse::from(placed)))
}

/// GET /orders/mine
#[utoipa::path(
    get,
    path = "/orders/mine",
    responses(
        (status = 200, description = "Orders placed by the caller", body = [OrderResponse]),
        (status = 401, description = "Missing or invalid token"),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn my_orders(
    service: OrderServiceData,
    AuthenticatedCaller(caller): AuthenticatedCaller,
) -> Result<HttpResponse, AppError> {
    let orders = web::block(move || service.list_my_orders(&caller)).await??;

    let body: Vec<OrderResponse> = orders.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(body))
}

/// GET /orders
///
/// Returns a paginated list of all orders. Admin only.
#[utoipa::path(
    get,
    path = "/orders",
    params(ListOrdersParams),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller is not an admin"),
        (status = 500, description = "Internal server error"),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn list_orders(
    service: OrderServiceData,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let ListResult { items, total } =
        web::block(move || service.list_orders(&caller, page, limit)).await??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: items.into_iter().map(Into::into).collect(),
        total,
        page,
        limit,
    }))
}

/// GET /orders/{id}
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller neither owns the order nor is an admin"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn get_order(
    service: OrderServiceData,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let order = web::block(move || service.get_order(&caller, id)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PUT /orders/{id}/pay
#[utoipa::path(
    put,
    path = "/orders/{id}/pay",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order marked as paid", body = OrderResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 403, description = "Caller neither owns the order nor is an admin"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn pay_order(
    service: OrderServiceData,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();

    let order = web::block(move || service.mark_paid(&caller, id)).await??;

    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PUT /orders/{id}/shipped
#[utoipa::path(
    put,
    path = "/orders/{id}/shipped",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order marked as shipped", body = OrderResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn ship_order(
    service: OrderServiceData,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let order = web::block(move || service.mark_shipped(&caller, id)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PUT /orders/{id}/unshipped
#[utoipa::path(
    put,
    path = "/orders/{id}/unshipped",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Shipping cleared", body = OrderResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn unship_order(
    service: OrderServiceData,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let order = web::block(move || service.reset_shipped(&caller, id)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PUT /orders/{id}/delivered
#[utoipa::path(
    put,
    path = "/orders/{id}/delivered",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Order marked as delivered", body = OrderResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn deliver_order(
    service: OrderServiceData,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let order = web::block(move || service.mark_delivered(&caller, id)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

/// PUT /orders/{id}/undelivered
#[utoipa::path(
    put,
    path = "/orders/{id}/undelivered",
    params(("id" = Uuid, Path, description = "Order UUID")),
    responses(
        (status = 200, description = "Delivery cleared", body = OrderResponse),
        (status = 403, description = "Caller is not an admin"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer" = [])),
    tag = "orders"
)]
pub async fn undeliver_order(
    service: OrderServiceData,
    AuthenticatedCaller(caller): AuthenticatedCaller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let order = web::block(move || service.reset_delivered(&caller, id)).await??;
    Ok(HttpResponse::Ok().json(OrderResponse::from(order)))
}

#[cfg(test)]
mod tests {
    use actix_web::ResponseError;

    use super::*;

    fn request(json: serde_json::Value) -> CreateOrderRequest {
        serde_json::from_value(json).expect("request should deserialize")
    }

    fn body(items: serde_json::Value, tax: &str) -> serde_json::Value {
        serde_json::json!({
            "orderItems": items,
            "shippingAddress": {
                "address": "123 Test St",
                "city": "Test City",
                "postalCode": "12345",
                "country": "Testland"
            },
            "paymentMethod": "PayPal",
            "taxPrice": tax,
            "shippingPrice": "2.00",
            "totalPrice": "37.00"
        })
    }

    #[test]
    fn camel_case_request_maps_to_cart() {
        let product = Uuid::new_v4();
        let size = Uuid::new_v4();
        let req = request(body(
            serde_json::json!([
                {"product": product, "name": "Runner", "price": "10.00", "image": "img",
                 "size": {"id": size}, "colors": {"sole": "#FFFFFF"}},
                {"product": product, "name": "Runner", "price": "10.00", "image": "img"}
            ]),
            "5.00",
        ));

        let order = PlaceOrder::try_from(req).unwrap();

        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].size_id, Some(size));
        assert_eq!(order.lines[0].colors["sole"], "#FFFFFF");
        assert!(order.lines[1].colors.is_empty());
        assert_eq!(order.shipping_address.postal_code, "12345");
        assert_eq!(order.tax_price, BigDecimal::from_str("5.00").unwrap());
    }

    #[test]
    fn missing_order_items_becomes_an_empty_cart() {
        let mut json = body(serde_json::json!([]), "5.00");
        json.as_object_mut().unwrap().remove("orderItems");

        let order = PlaceOrder::try_from(request(json)).unwrap();

        assert!(matches!(order.validate(), Err(DomainError::Validation(msg)) if msg == "empty cart"));
    }

    #[test]
    fn numeric_money_from_the_storefront_client_is_accepted() {
        let product = Uuid::new_v4();
        let size = Uuid::new_v4();
        let req = request(serde_json::json!({
            "orderItems": [
                {"product": product, "name": "Test Product 1", "price": 10.00,
                 "image": "image_url", "size": {"id": size}, "colors": {}}
            ],
            "shippingAddress": {
                "address": "123 Test St",
                "city": "Test City",
                "postalCode": "12345",
                "country": "Testland"
            },
            "paymentMethod": "PayPal",
            "taxPrice": 5.00,
            "shippingPrice": 2.00,
            "totalPrice": 17.99
        }));

        let order = PlaceOrder::try_from(req).unwrap();

        assert_eq!(order.lines[0].price, BigDecimal::from(10));
        assert_eq!(order.tax_price, BigDecimal::from(5));
        assert_eq!(order.total_price, BigDecimal::from_str("17.99").unwrap());
        assert!(order.validate().is_ok());
    }

    #[test]
    fn missing_image_is_rejected() {
        let json = body(
            serde_json::json!([{"product": Uuid::new_v4(), "name": "Runner", "price": "10.00"}]),
            "5.00",
        );
        let err = serde_json::from_value::<CreateOrderRequest>(json).unwrap_err();
        assert!(err.to_string().contains("image"), "{err}");
    }

    #[test]
    fn oversized_amount_is_a_validation_error() {
        let req = request(body(
            serde_json::json!([{"product": Uuid::new_v4(), "name": "Runner",
                                "price": 123456.789, "image": "img"}]),
            "5.00",
        ));
        let order = PlaceOrder::try_from(req).unwrap();
        let err = AppError::from(order.validate().unwrap_err());
        assert_eq!(err.status_code(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[test]
    fn malformed_money_is_a_validation_error() {
        let req = request(body(serde_json::json!([]), "five"));
        assert!(matches!(
            PlaceOrder::try_from(req),
            Err(DomainError::Validation(_))
        ));
    }
}
