//! Application router configuration.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use serde::Serialize;

use crate::{
    AppState, endpoints,
    transaction::{
        category_summary_endpoint, create_transaction_endpoint, delete_transaction_endpoint,
        list_transactions_endpoint, monthly_summary_endpoint, update_transaction_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(endpoints::ROOT, get(get_api_banner))
        .route(endpoints::HEALTH, get(get_health))
        .route(
            endpoints::TRANSACTIONS,
            get(list_transactions_endpoint).post(create_transaction_endpoint),
        )
        .route(
            endpoints::TRANSACTION,
            axum::routing::put(update_transaction_endpoint).delete(delete_transaction_endpoint),
        )
        .route(endpoints::SUMMARY_BY_CATEGORY, get(category_summary_endpoint))
        .route(endpoints::SUMMARY_BY_MONTH, get(monthly_summary_endpoint))
        .fallback(get_route_not_found)
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ApiBanner {
    message: &'static str,
    version: &'static str,
    status: &'static str,
}

/// The root route reports the API name and version.
async fn get_api_banner() -> Json<ApiBanner> {
    Json(ApiBanner {
        message: "Expenseur API is running",
        version: env!("CARGO_PKG_VERSION"),
        status: "healthy",
    })
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: &'static str,
    database: &'static str,
}

/// The health check runs a trivial query to confirm the database answers.
async fn get_health(State(state): State<AppState>) -> Json<HealthStatus> {
    let database = match state.db_connection.lock() {
        Ok(connection) => match connection.query_row("SELECT 1", [], |_| Ok(())) {
            Ok(()) => "connected",
            Err(_) => "error",
        },
        Err(_) => "error",
    };

    Json(HealthStatus {
        status: "ok",
        database,
    })
}

#[derive(Debug, Serialize)]
struct RouteNotFound {
    message: &'static str,
}

async fn get_route_not_found() -> (StatusCode, Json<RouteNotFound>) {
    (
        StatusCode::NOT_FOUND,
        Json(RouteNotFound {
            message: "Route not found",
        }),
    )
}
