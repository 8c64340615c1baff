use crate::config::Config;
use crate::error::AppError;
use crate::handlers::{clients, invoices, items, pools, settings};
use crate::services::{Database, InvoiceCoordinator};
use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, patch, put},
    Json, Router,
};
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub coordinator: InvoiceCoordinator,
}

pub struct Application {
    listener: TcpListener,
    router: Router,
    port: u16,
}

impl Application {
    pub async fn build(config: Config) -> Result<Self, AppError> {
        let db = Database::new(
            &config.database.url,
            config.database.max_connections,
        )
        .await?;
        db.run_migrations().await?;

        let coordinator = InvoiceCoordinator::new(db.clone());
        let state = AppState { db, coordinator };
        let router = build_router(state);

        let address = format!("{}:{}", config.server.host, config.server.port);
        let listener = TcpListener::bind(&address).await?;
        let port = listener.local_addr()?.port();

        info!(%address, "Server listening");

        Ok(Self {
            listener,
            router,
            port,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> Result<(), AppError> {
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }
}

/// Build the full route table. Shared with the integration tests, which
/// drive the router directly instead of binding a port.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/settings", get(settings::get_settings).put(settings::update_settings))
        .route("/clients", get(clients::list_clients).post(clients::create_client))
        .route("/clients/search", get(clients::search_clients))
        .route(
            "/clients/:id",
            put(clients::update_client).delete(clients::delete_client),
        )
        .route("/items", get(items::list_items).post(items::create_item))
        .route("/items/search", get(items::search_items))
        .route("/items/:id", put(items::update_item).delete(items::delete_item))
        .route("/items/:id/active", patch(items::set_item_active))
        .route("/inventory", get(pools::list_pools).post(pools::create_pool))
        .route("/inventory/:id", put(pools::update_pool).delete(pools::delete_pool))
        .route(
            "/invoices",
            get(invoices::list_invoices).post(invoices::create_invoice),
        )
        .route(
            "/invoices/:id",
            get(invoices::get_invoice)
                .put(invoices::replace_invoice)
                .delete(invoices::delete_invoice),
        )
        .route("/invoices/:id/payment", patch(invoices::update_payment))
        .route("/invoices/:id/void", patch(invoices::void_invoice))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    state.db.health_check().await?;
    Ok(Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    })))
}
