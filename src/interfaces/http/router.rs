//! API Router with Swagger UI

use std::sync::Arc;
use std::time::Instant;

use axum::{middleware, routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::application::services::PricingService;
use crate::interfaces::http::common::ApiResponse;
use crate::interfaces::http::modules::{health, metrics, pricing};

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        pricing::get_schedule,
        pricing::estimate,
        pricing::quick_estimates,
        pricing::quote,
        pricing::cost,
    ),
    components(
        schemas(
            ApiResponse<String>,
            health::HealthResponse,
            pricing::TierDto,
            pricing::ScheduleResponse,
            pricing::EstimateResponse,
            pricing::QuickEstimateDto,
            pricing::QuoteRequest,
            pricing::CostResponse,
        )
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Pricing", description = "Tiered tariff estimates: payment amount to whole kWh units and back"),
    ),
    info(
        title = "ZETDC Top-up Pricing API",
        version = "1.0.0",
        description = "Converts prepaid electricity payments into unit estimates using the cumulative tariff schedule",
        license(name = "MIT")
    )
)]
pub struct ApiDoc;

/// Create the API router with all routes
pub fn create_api_router(
    pricing_service: PricingService,
    prometheus: PrometheusHandle,
    started_at: Instant,
) -> Router {
    let health_state = health::HealthState {
        started_at: Arc::new(started_at),
        tiers: pricing_service.schedule().tiers().len(),
    };

    let pricing_routes = Router::new()
        .route("/schedule", get(pricing::get_schedule))
        .route("/estimate", get(pricing::estimate))
        .route("/quick-estimates", get(pricing::quick_estimates))
        .route("/quote", post(pricing::quote))
        .route("/cost", get(pricing::cost))
        .with_state(pricing::PricingState {
            pricing: pricing_service,
        });

    let health_routes = Router::new()
        .route("/health", get(health::health_check))
        .with_state(health_state);

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics::prometheus_metrics))
        .with_state(metrics::MetricsState { handle: prometheus });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let swagger_routes = SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi());

    Router::new()
        .merge(swagger_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .nest("/api/v1/pricing", pricing_routes)
        .layer(middleware::from_fn(metrics::http_metrics_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ── Tests ──────────────────────────────────────────────────────
