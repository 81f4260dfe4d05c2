use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::handlers::{action_logs, orders, products};

#[derive(OpenApi)]
#[openapi(
    paths(
        orders::create_order,
        orders::my_orders,
        orders::list_orders,
        orders::get_order,
        orders::pay_order,
        orders::ship_order,
        orders::unship_order,
        orders::deliver_order,
        orders::undeliver_order,
        products::get_product,
        products::create_review,
        products::delete_review,
        action_logs::list_action_logs,
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "orders", description = "Checkout and order fulfilment"),
        (name = "products", description = "Product detail and reviews"),
        (name = "action-logs", description = "Admin audit trail"),
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
