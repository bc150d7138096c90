pub mod auth;
pub mod db;
pub mod inventory;
pub mod orders;
pub mod payments;
pub mod shifts;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};

use inventory::{InventoryRepository, InventoryService};
use orders::repository::{OrdersRepository, VariantRepository};
use orders::OrderService;
use payments::{GatewayConfig, PaymentGateway, PaymentService, PaymentsRepository};
use shifts::{ShiftService, ShiftsRepository};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub order_service: OrderService,
    pub inventory_service: InventoryService,
    pub shift_service: ShiftService,
    pub payment_service: PaymentService,
}

impl AppState {
    pub fn new(db: PgPool, gateway: Option<PaymentGateway>) -> Self {
        let inventory_service = InventoryService::new(InventoryRepository::new(db.clone()));
        let shift_service = ShiftService::new(ShiftsRepository::new(db.clone()));
        let order_service = OrderService::new(
            OrdersRepository::new(db.clone()),
            VariantRepository::new(db.clone()),
            inventory_service.clone(),
        );
        let payment_service = PaymentService::new(
            PaymentsRepository::new(db.clone()),
            order_service.clone(),
            shift_service.clone(),
            gateway,
        );

        Self {
            db,
            order_service,
            inventory_service,
            shift_service,
            payment_service,
        }
    }
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds CORS middleware
pub fn create_router(state: AppState) -> Router {
    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Orders
        .route("/api/orders", post(orders::handlers::create_order))
        .route("/api/orders", get(orders::handlers::get_orders))
        .route("/api/orders/:id", get(orders::handlers::get_order))
        .route("/api/orders/:id", patch(orders::handlers::update_order))
        .route("/api/orders/:id/items", post(orders::handlers::add_item))
        .route(
            "/api/orders/:id/items/barcode",
            post(orders::handlers::add_item_by_barcode),
        )
        .route(
            "/api/orders/:id/items/:item_id",
            patch(orders::handlers::update_item),
        )
        .route(
            "/api/orders/:id/items/:item_id",
            delete(orders::handlers::remove_item),
        )
        .route(
            "/api/orders/:id/confirm",
            post(orders::handlers::confirm_order),
        )
        .route(
            "/api/orders/:id/cancel",
            post(orders::handlers::cancel_order),
        )
        .route(
            "/api/orders/:id/return",
            post(orders::handlers::create_return),
        )
        .route("/api/orders/:id/void", post(orders::handlers::void_order))
        .route(
            "/api/orders/:id/payments",
            get(payments::handlers::get_order_payments),
        )
        .route(
            "/api/orders/:id/payments/summary",
            get(payments::handlers::get_order_payment_summary),
        )
        // Payments
        .route("/api/payments", post(payments::handlers::create_payment))
        .route("/api/payments", get(payments::handlers::get_payments))
        .route(
            "/api/payments/webhook",
            post(payments::handlers::payment_webhook),
        )
        .route("/api/payments/:id", get(payments::handlers::get_payment))
        .route(
            "/api/payments/:id/refund",
            post(payments::handlers::refund_payment),
        )
        // Shifts
        .route("/api/shifts", get(shifts::handlers::get_shifts))
        .route("/api/shifts/open", post(shifts::handlers::open_shift))
        .route("/api/shifts/close", post(shifts::handlers::close_shift))
        .route(
            "/api/shifts/current",
            get(shifts::handlers::current_shift),
        )
        .route("/api/shifts/:id", get(shifts::handlers::get_shift))
        .route(
            "/api/shifts/:id/payments/summary",
            get(payments::handlers::get_shift_payment_summary),
        )
        // Inventory
        .route(
            "/api/inventory/adjust",
            post(inventory::handlers::adjust_inventory),
        )
        .route(
            "/api/inventory/stores/:store_id",
            get(inventory::handlers::get_store_inventory),
        )
        .route(
            "/api/inventory/stores/:store_id/low-stock",
            get(inventory::handlers::get_low_stock),
        )
        .route(
            "/api/inventory/:id",
            get(inventory::handlers::get_inventory_record),
        )
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    tracing::info!("POS API - Starting...");

    // Get configuration from environment variables
    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");
    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT").unwrap_or_else(|_| "8080".to_string());

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::create_pool(&database_url)
        .await
        .expect("Failed to create database pool");

    // Run SQLx migrations on startup
    tracing::info!("Running database migrations...");
    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations completed successfully");

    // Gateway config is optional: without it, card and wallet payments are
    // rejected at request time while cash keeps working.
    let gateway = match GatewayConfig::from_env() {
        Ok(config) => Some(PaymentGateway::new(config).expect("Failed to build gateway client")),
        Err(reason) => {
            tracing::warn!("Payment gateway disabled: {}", reason);
            None
        }
    };

    let state = AppState::new(db_pool, gateway);
    let app = create_router(state);

    // Start the Axum server
    let addr = format!("{}:{}", host, port);
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("POS API is running on http://{}", addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}
