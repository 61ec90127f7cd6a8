//! Pricing REST API handlers

use axum::{
    extract::{Query, State},
    Json,
};
use rust_decimal::Decimal;

use super::dto::{
    CostParams, CostResponse, EstimateParams, EstimateResponse, QuickEstimateDto, QuoteRequest,
    ScheduleResponse,
};
use crate::application::services::PricingService;
use crate::interfaces::http::common::{bad_request, ApiError, ApiResponse, ValidatedJson};

/// State shared by the pricing routes
#[derive(Clone)]
pub struct PricingState {
    pub pricing: PricingService,
}

#[utoipa::path(
    get,
    path = "/api/v1/pricing/schedule",
    tag = "Pricing",
    responses(
        (status = 200, description = "Active tariff schedule", body = ApiResponse<ScheduleResponse>)
    )
)]
pub async fn get_schedule(State(state): State<PricingState>) -> Json<ApiResponse<ScheduleResponse>> {
    Json(ApiResponse::success(ScheduleResponse::from(&state.pricing)))
}

#[utoipa::path(
    get,
    path = "/api/v1/pricing/estimate",
    tag = "Pricing",
    params(EstimateParams),
    responses(
        (status = 200, description = "Units affordable for the amount", body = ApiResponse<EstimateResponse>),
        (status = 400, description = "Amount is not a number")
    )
)]
pub async fn estimate(
    State(state): State<PricingState>,
    Query(params): Query<EstimateParams>,
) -> Json<ApiResponse<EstimateResponse>> {
    let quote = state.pricing.quote(params.amount);
    Json(ApiResponse::success(EstimateResponse::new(params.amount, quote)))
}

#[utoipa::path(
    get,
    path = "/api/v1/pricing/quick-estimates",
    tag = "Pricing",
    responses(
        (status = 200, description = "Estimates for the quick-purchase amounts", body = ApiResponse<Vec<QuickEstimateDto>>)
    )
)]
pub async fn quick_estimates(
    State(state): State<PricingState>,
) -> Json<ApiResponse<Vec<QuickEstimateDto>>> {
    let estimates = state
        .pricing
        .quick_estimates()
        .into_iter()
        .map(Into::into)
        .collect();
    Json(ApiResponse::success(estimates))
}

#[utoipa::path(
    post,
    path = "/api/v1/pricing/quote",
    tag = "Pricing",
    request_body = QuoteRequest,
    responses(
        (status = 200, description = "One estimate per requested amount", body = ApiResponse<Vec<EstimateResponse>>),
        (status = 400, description = "Malformed JSON"),
        (status = 422, description = "Too few or too many amounts")
    )
)]
pub async fn quote(
    State(state): State<PricingState>,
    ValidatedJson(req): ValidatedJson<QuoteRequest>,
) -> Json<ApiResponse<Vec<EstimateResponse>>> {
    let estimates = req
        .amounts
        .into_iter()
        .map(|amount| EstimateResponse::new(amount, state.pricing.quote(amount)))
        .collect();
    Json(ApiResponse::success(estimates))
}

#[utoipa::path(
    get,
    path = "/api/v1/pricing/cost",
    tag = "Pricing",
    params(CostParams),
    responses(
        (status = 200, description = "Cost of the requested units", body = ApiResponse<CostResponse>),
        (status = 400, description = "Negative or malformed units")
    )
)]
pub async fn cost(
    State(state): State<PricingState>,
    Query(params): Query<CostParams>,
) -> Result<Json<ApiResponse<CostResponse>>, ApiError> {
    if params.units < Decimal::ZERO {
        return Err(bad_request("units must be non-negative"));
    }

    Ok(Json(ApiResponse::success(CostResponse {
        units: params.units,
        cost: state.pricing.cost_for_units(params.units),
        amount: state.pricing.amount_for_units(params.units),
        billing_currency: state.pricing.billing_currency().to_string(),
        input_currency: state.pricing.input_currency().to_string(),
    })))
}
