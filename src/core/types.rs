use serde::Serialize;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum IncomeInput {
    Hourly { rate: f64, hours_per_week: f64 },
    Annual { amount: f64 },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TaxConfig {
    pub enabled: bool,
}

impl Default for TaxConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct CalculationResult {
    pub gross_annual: f64,
    pub gross_monthly: f64,
    pub monthly_tax: f64,
    pub net_monthly: f64,
    pub tax_enabled: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct BudgetSummary {
    pub calculation: CalculationResult,
    pub subscriptions_monthly: f64,
    pub annual_costs_monthly: f64,
    pub disposable_monthly: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct TaxBreakdown {
    pub personal_allowance: f64,
    pub income_tax: f64,
    pub national_insurance: f64,
    pub total: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ProjectionPoint {
    pub month: u32,
    pub balance: f64,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub enum ProjectionHorizon {
    OneMonth,
    #[default]
    ThreeMonths,
    SixMonths,
    OneYear,
    TwoYears,
    ThreeYears,
}

impl ProjectionHorizon {
    pub const ALL: [ProjectionHorizon; 6] = [
        ProjectionHorizon::OneMonth,
        ProjectionHorizon::ThreeMonths,
        ProjectionHorizon::SixMonths,
        ProjectionHorizon::OneYear,
        ProjectionHorizon::TwoYears,
        ProjectionHorizon::ThreeYears,
    ];

    pub fn months(self) -> u32 {
        match self {
            ProjectionHorizon::OneMonth => 1,
            ProjectionHorizon::ThreeMonths => 3,
            ProjectionHorizon::SixMonths => 6,
            ProjectionHorizon::OneYear => 12,
            ProjectionHorizon::TwoYears => 24,
            ProjectionHorizon::ThreeYears => 36,
        }
    }

    pub fn from_months(months: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|h| h.months() == months)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BudgetOutcome {
    pub revision: u64,
    pub summary: Option<BudgetSummary>,
    pub projection: Vec<ProjectionPoint>,
    pub projected_balance: Option<f64>,
}
