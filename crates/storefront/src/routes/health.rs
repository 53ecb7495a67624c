//! Health check endpoints.

use axum::{extract::State, http::StatusCode};

use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// With `PostgreSQL`, verifies database connectivity and returns 503 when it
/// is not reachable. The in-memory store is always ready.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    let Some(pool) = state.pool() else {
        return StatusCode::OK;
    };

    match sqlx::query("SELECT 1").fetch_one(pool).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::StatusCode;

    use crate::routes::test_support::{body_text, get, harness};
    use crate::services::FixedOutcome;
    use alpaca_core::PaymentStatus;

    #[tokio::test]
    async fn test_health_endpoints() {
        let h = harness(FixedOutcome(PaymentStatus::Approved)).await;

        let response = h.send(get("/health")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "ok");

        let response = h.send(get("/health/ready")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
