//! Route definitions for the StockPilot backend

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        // Product catalog
        .nest("/products", product_routes())
        // Warehouses
        .nest("/warehouses", warehouse_routes())
        // End-user purchases and sales reporting
        .nest("/purchases", sales_routes())
        // Restocking purchase orders
        .nest("/purchase-orders", purchase_order_routes())
        // Restock recommendations
        .nest("/restock", restock_routes())
        // Demand forecast
        .nest("/forecast", forecast_routes())
        // Analytics dashboard and exports
        .nest("/analytics", analytics_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        // Auth routes (public)
        .nest("/auth", auth_routes())
        .merge(protected)
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route(
            "/:product_id",
            get(handlers::get_product).put(handlers::update_product),
        )
}

fn warehouse_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(handlers::list_warehouses).post(handlers::create_warehouse),
    )
}

fn sales_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::purchase_product))
        .route("/history", get(handlers::my_purchase_history))
        .route("/summary", get(handlers::sales_summary))
        .route("/warehouse-report", get(handlers::warehouse_sales_report))
}

fn purchase_order_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(handlers::list_purchase_orders).post(handlers::create_purchase_order),
    )
}

fn restock_routes() -> Router<AppState> {
    Router::new().route("/recommendations", get(handlers::restock_recommendations))
}

fn forecast_routes() -> Router<AppState> {
    Router::new().route("/", get(handlers::demand_forecast))
}

fn analytics_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(handlers::analytics_dashboard))
        .route("/export.csv", get(handlers::export_analytics_csv))
}
