use std::sync::Arc;

use axum::{
    Router,
    extract::{Json, Request, State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, Method, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpListener;
use tracing::{debug, info};

use crate::config::ServerConfig;
use crate::core::{
    BudgetSession, CalculationResult, IncomeInput, LedgerEntry, ProjectionHorizon,
    ProjectionPoint, TaxConfig, calculate, parse_start_balance, sanitize_start_balance,
    tax::{
        ALLOWANCE_TAPER_START, ALLOWANCE_ZERO_AT, BASIC_RATE_LIMIT, HIGHER_RATE_LIMIT,
        PERSONAL_ALLOWANCE, TAX_YEAR, tax_breakdown,
    },
};
use crate::error::BudgetError;

const MAX_HOURS_PER_WEEK: f64 = 168.0;
const HOURLY_FORMULA: &str = "(hourly_rate * hours_per_week * 52) / 12";
const ANNUAL_FORMULA: &str = "annual_salary / 12";

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
enum ApiIncomeType {
    #[serde(alias = "Hourly")]
    Hourly,
    #[serde(alias = "Annual", alias = "salary")]
    Annual,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct IncomePayload {
    income_type: Option<ApiIncomeType>,
    hourly_rate: Option<f64>,
    hours_per_week: Option<f64>,
    annual_salary: Option<f64>,
    tax_enabled: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LedgerItemPayload {
    name: Option<String>,
    amount: Option<Value>,
}

impl LedgerItemPayload {
    fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Missing or non-numeric amounts come back as NaN so the ledger rejects them.
    fn amount(&self) -> f64 {
        match &self.amount {
            Some(Value::Number(number)) => number.as_f64().unwrap_or(f64::NAN),
            Some(Value::String(text)) => text.trim().parse().unwrap_or(f64::NAN),
            _ => f64::NAN,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BudgetPayload {
    income: IncomePayload,
    subscriptions: Vec<LedgerItemPayload>,
    annual_costs: Vec<LedgerItemPayload>,
    current_balance: Option<Value>,
    horizon_months: Option<u32>,
}

#[derive(Copy, Clone, Debug)]
struct IncomeRequest {
    income_type: ApiIncomeType,
    income: IncomeInput,
    tax: TaxConfig,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct CalculationDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    hourly_rate: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hours_per_week: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weekly_income: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annual_equivalent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annual_salary: Option<f64>,
    formula: &'static str,
    tax_year: &'static str,
    personal_allowance: f64,
    personal_allowance_taper_start: f64,
    personal_allowance_zero_at: f64,
    basic_rate_limit: f64,
    higher_rate_limit: f64,
    income_tax_annual: f64,
    national_insurance_annual: f64,
    tax_enabled: bool,
}

#[derive(Debug, Serialize)]
struct IncomeResponse {
    gross_annual_income: f64,
    gross_monthly_income: f64,
    estimated_monthly_tax: f64,
    net_monthly_income: f64,
    tax_enabled: bool,
    income_type: ApiIncomeType,
    calculation_details: CalculationDetails,
}

#[derive(Debug, Serialize)]
struct SummaryResponse {
    gross_annual_income: f64,
    gross_monthly_income: f64,
    estimated_monthly_tax: f64,
    net_monthly_income: f64,
    subscriptions_monthly: f64,
    annual_costs_monthly: f64,
    disposable_monthly_income: f64,
}

#[derive(Debug, Serialize)]
struct BudgetResponse {
    tax_enabled: bool,
    horizon_months: u32,
    current_balance: f64,
    subscriptions: Vec<LedgerEntry>,
    annual_costs: Vec<LedgerEntry>,
    subscriptions_total: f64,
    annual_costs_total: f64,
    rejected_items: usize,
    summary: Option<SummaryResponse>,
    projection: Vec<ProjectionPoint>,
    projection_end_balance: Option<f64>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Clone)]
struct AppState {
    config: Arc<ServerConfig>,
}

impl IntoResponse for BudgetError {
    fn into_response(self) -> Response {
        let status = match self {
            BudgetError::Validation(_) | BudgetError::InvalidHorizon(_) | BudgetError::Serde(_) => {
                StatusCode::BAD_REQUEST
            }
            BudgetError::InsufficientIncome => StatusCode::UNPROCESSABLE_ENTITY,
            BudgetError::InvalidAddress(_) | BudgetError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        error_response(status, &self.to_string())
    }
}

pub fn router(config: ServerConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };
    Router::new()
        .route("/", get(health_handler))
        .route("/calculate-income", post(calculate_income_handler))
        .route("/api/budget", post(budget_handler))
        .fallback(not_found_handler)
        .layer(middleware::from_fn_with_state(state, cors_middleware))
}

pub async fn run_http_server(config: ServerConfig) -> crate::Result<()> {
    let addr = config.addr;
    let app = router(config);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "budget HTTP API listening");
    info!("Local access: http://127.0.0.1:{}/", addr.port());

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health_handler() -> Response {
    json_response(
        StatusCode::OK,
        StatusResponse {
            status: "ok",
            message: "Budgeting App API is running",
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn calculate_income_handler(
    payload: Result<Json<IncomePayload>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };
    match calculate_income(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => err.into_response(),
    }
}

async fn budget_handler(payload: Result<Json<BudgetPayload>, JsonRejection>) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, &rejection.body_text()),
    };
    match build_budget(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => err.into_response(),
    }
}

fn calculate_income(payload: IncomePayload) -> Result<IncomeResponse, BudgetError> {
    let request = income_request_from_payload(payload)?;
    let result = calculate(&request.income, request.tax).ok_or(BudgetError::InsufficientIncome)?;
    debug!(
        income_type = ?request.income_type,
        gross_annual = result.gross_annual,
        tax_enabled = result.tax_enabled,
        "calculated income"
    );
    Ok(build_income_response(&request, &result))
}

fn income_request_from_payload(payload: IncomePayload) -> Result<IncomeRequest, BudgetError> {
    let Some(income_type) = payload.income_type else {
        return Err(BudgetError::validation(
            "income_type is required ('hourly' or 'annual')",
        ));
    };

    let income = match income_type {
        ApiIncomeType::Hourly => {
            let Some(rate) = payload.hourly_rate else {
                return Err(BudgetError::validation(
                    "hourly_rate is required when income_type is 'hourly'",
                ));
            };
            let Some(hours_per_week) = payload.hours_per_week else {
                return Err(BudgetError::validation(
                    "hours_per_week is required when income_type is 'hourly'",
                ));
            };
            ensure_non_negative("hourly_rate", rate)?;
            ensure_non_negative("hours_per_week", hours_per_week)?;
            if hours_per_week > MAX_HOURS_PER_WEEK {
                return Err(BudgetError::validation(format!(
                    "hours_per_week must be <= {MAX_HOURS_PER_WEEK}"
                )));
            }
            IncomeInput::Hourly {
                rate,
                hours_per_week,
            }
        }
        ApiIncomeType::Annual => {
            let Some(amount) = payload.annual_salary else {
                return Err(BudgetError::validation(
                    "annual_salary is required when income_type is 'annual'",
                ));
            };
            ensure_non_negative("annual_salary", amount)?;
            IncomeInput::Annual { amount }
        }
    };

    Ok(IncomeRequest {
        income_type,
        income,
        tax: TaxConfig {
            enabled: payload.tax_enabled.unwrap_or(true),
        },
    })
}

/// Balances arrive from free-text fields, so numeric strings are accepted too.
fn start_balance_from_json(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().map(sanitize_start_balance).unwrap_or(0.0),
        Value::String(text) => parse_start_balance(text),
        _ => 0.0,
    }
}

fn ensure_non_negative(field: &str, value: f64) -> Result<(), BudgetError> {
    if !value.is_finite() || value < 0.0 {
        return Err(BudgetError::validation(format!("{field} must be >= 0")));
    }
    Ok(())
}

fn build_income_response(request: &IncomeRequest, result: &CalculationResult) -> IncomeResponse {
    let breakdown = tax_breakdown(result.gross_annual);
    let (income_tax_annual, national_insurance_annual) = if result.tax_enabled {
        (breakdown.income_tax, breakdown.national_insurance)
    } else {
        (0.0, 0.0)
    };

    let mut details = CalculationDetails {
        hourly_rate: None,
        hours_per_week: None,
        weekly_income: None,
        annual_equivalent: None,
        annual_salary: None,
        formula: ANNUAL_FORMULA,
        tax_year: TAX_YEAR,
        personal_allowance: PERSONAL_ALLOWANCE,
        personal_allowance_taper_start: ALLOWANCE_TAPER_START,
        personal_allowance_zero_at: ALLOWANCE_ZERO_AT,
        basic_rate_limit: BASIC_RATE_LIMIT,
        higher_rate_limit: HIGHER_RATE_LIMIT,
        income_tax_annual: round_money(income_tax_annual),
        national_insurance_annual: round_money(national_insurance_annual),
        tax_enabled: result.tax_enabled,
    };
    match request.income {
        IncomeInput::Hourly {
            rate,
            hours_per_week,
        } => {
            details.hourly_rate = Some(rate);
            details.hours_per_week = Some(hours_per_week);
            details.weekly_income = Some(round_money(rate * hours_per_week));
            details.annual_equivalent = Some(round_money(result.gross_annual));
            details.formula = HOURLY_FORMULA;
        }
        IncomeInput::Annual { amount } => {
            details.annual_salary = Some(amount);
        }
    }

    IncomeResponse {
        gross_annual_income: round_money(result.gross_annual),
        gross_monthly_income: round_money(result.gross_monthly),
        estimated_monthly_tax: round_money(result.monthly_tax),
        net_monthly_income: round_money(result.net_monthly),
        tax_enabled: result.tax_enabled,
        income_type: request.income_type,
        calculation_details: details,
    }
}

fn build_budget(payload: BudgetPayload) -> Result<BudgetResponse, BudgetError> {
    let request = income_request_from_payload(payload.income)?;
    let horizon_months = payload
        .horizon_months
        .unwrap_or(ProjectionHorizon::default().months());
    let horizon = ProjectionHorizon::from_months(horizon_months)
        .ok_or(BudgetError::InvalidHorizon(horizon_months))?;

    let mut session = BudgetSession::new();
    session.set_tax_enabled(request.tax.enabled);
    session.set_income(request.income);
    session.set_horizon(horizon);
    session.set_start_balance(
        payload
            .current_balance
            .as_ref()
            .map(start_balance_from_json)
            .unwrap_or(0.0),
    );

    let mut rejected_items = 0;
    for item in &payload.subscriptions {
        if session.add_subscription(item.name(), item.amount()).is_none() {
            rejected_items += 1;
        }
    }
    for item in &payload.annual_costs {
        if session.add_annual_cost(item.name(), item.amount()).is_none() {
            rejected_items += 1;
        }
    }

    let outcome = session.outcome();
    let summary = outcome.summary.map(|summary| SummaryResponse {
        gross_annual_income: round_money(summary.calculation.gross_annual),
        gross_monthly_income: round_money(summary.calculation.gross_monthly),
        estimated_monthly_tax: round_money(summary.calculation.monthly_tax),
        net_monthly_income: round_money(summary.calculation.net_monthly),
        subscriptions_monthly: round_money(summary.subscriptions_monthly),
        annual_costs_monthly: round_money(summary.annual_costs_monthly),
        disposable_monthly_income: round_money(summary.disposable_monthly),
    });
    let projection = outcome
        .projection
        .iter()
        .map(|point| ProjectionPoint {
            month: point.month,
            balance: round_money(point.balance),
        })
        .collect();

    debug!(
        revision = outcome.revision,
        rejected_items,
        has_summary = summary.is_some(),
        "calculated budget"
    );

    Ok(BudgetResponse {
        tax_enabled: session.tax().enabled,
        horizon_months,
        current_balance: round_money(session.start_balance()),
        subscriptions: session.subscriptions().entries().to_vec(),
        annual_costs: session.annual_costs().entries().to_vec(),
        subscriptions_total: round_money(session.subscriptions().total()),
        annual_costs_total: round_money(session.annual_costs().total()),
        rejected_items,
        summary,
        projection,
        projection_end_balance: outcome.projected_balance.map(round_money),
    })
}

async fn cors_middleware(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let origin = request
        .headers()
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .filter(|origin| state.config.allows_origin(origin))
        .map(str::to_owned);

    if request.method() == Method::OPTIONS {
        let requested_headers = request
            .headers()
            .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
            .cloned();
        let mut response = StatusCode::NO_CONTENT.into_response();
        if let Some(origin) = &origin {
            apply_cors_headers(response.headers_mut(), origin);
            response.headers_mut().insert(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                requested_headers.unwrap_or(HeaderValue::from_static("content-type")),
            );
        }
        return response;
    }

    let mut response = next.run(request).await;
    if let Some(origin) = &origin {
        apply_cors_headers(response.headers_mut(), origin);
    }
    response
}

fn apply_cors_headers(headers: &mut HeaderMap, origin: &str) {
    let Ok(origin) = HeaderValue::from_str(origin) else {
        return;
    };
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_CREDENTIALS,
        HeaderValue::from_static("true"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST"),
    );
    headers.insert(header::VARY, HeaderValue::from_static("Origin"));
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

/// Money is reported to the penny; calculations upstream stay unrounded.
fn round_money(value: f64) -> f64 {
    let pennies = (value * 100.0).round();
    if pennies.is_finite() {
        pennies / 100.0
    } else {
        value
    }
}
