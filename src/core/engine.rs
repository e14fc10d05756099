use super::tax::annual_tax;
use super::types::{
    BudgetOutcome, BudgetSummary, CalculationResult, IncomeInput, ProjectionPoint, TaxConfig,
};

pub const WEEKS_PER_YEAR: f64 = 52.0;
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Annual gross income, or `None` when the input cannot describe any income.
pub fn resolve_annual_income(input: &IncomeInput) -> Option<f64> {
    let annual = match *input {
        IncomeInput::Hourly {
            rate,
            hours_per_week,
        } => {
            if !is_positive(rate) || !is_positive(hours_per_week) {
                return None;
            }
            rate * hours_per_week * WEEKS_PER_YEAR
        }
        IncomeInput::Annual { amount } => {
            if !is_positive(amount) {
                return None;
            }
            amount
        }
    };
    is_positive(annual).then_some(annual)
}

pub fn calculate(income: &IncomeInput, tax: TaxConfig) -> Option<CalculationResult> {
    let gross_annual = resolve_annual_income(income)?;
    let gross_monthly = gross_annual / MONTHS_PER_YEAR;
    let monthly_tax = if tax.enabled {
        annual_tax(gross_annual) / MONTHS_PER_YEAR
    } else {
        0.0
    };

    Some(CalculationResult {
        gross_annual,
        gross_monthly,
        monthly_tax,
        net_monthly: gross_monthly - monthly_tax,
        tax_enabled: tax.enabled,
    })
}

pub fn disposable_monthly(
    result: &CalculationResult,
    subscriptions_total: f64,
    annual_costs_monthly: f64,
) -> f64 {
    result.net_monthly - subscriptions_total - annual_costs_monthly
}

pub fn summarize(
    income: &IncomeInput,
    tax: TaxConfig,
    subscriptions_total: f64,
    annual_costs_monthly: f64,
) -> Option<BudgetSummary> {
    let calculation = calculate(income, tax)?;
    Some(BudgetSummary {
        calculation,
        subscriptions_monthly: subscriptions_total,
        annual_costs_monthly,
        disposable_monthly: disposable_monthly(
            &calculation,
            subscriptions_total,
            annual_costs_monthly,
        ),
    })
}

/// Linear balance path for months `0..=horizon_months`.
pub fn project(start_balance: f64, monthly_delta: f64, horizon_months: u32) -> Vec<ProjectionPoint> {
    (0..=horizon_months)
        .map(|month| ProjectionPoint {
            month,
            balance: start_balance + monthly_delta * f64::from(month),
        })
        .collect()
}

/// Current-balance entries below zero or not numbers at all count as zero.
pub fn sanitize_start_balance(raw: f64) -> f64 {
    if raw.is_finite() { raw.max(0.0) } else { 0.0 }
}

pub fn parse_start_balance(raw: &str) -> f64 {
    raw.trim()
        .parse::<f64>()
        .map(sanitize_start_balance)
        .unwrap_or(0.0)
}

pub fn build_outcome(
    revision: u64,
    summary: Option<BudgetSummary>,
    start_balance: f64,
    horizon_months: u32,
) -> BudgetOutcome {
    let projection = match summary {
        Some(summary) => project(start_balance, summary.disposable_monthly, horizon_months),
        None => Vec::new(),
    };
    let projected_balance = projection.last().map(|point| point.balance);

    BudgetOutcome {
        revision,
        summary,
        projection,
        projected_balance,
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}
