mod engine;
mod ledger;
mod session;
pub mod tax;
mod types;

pub use engine::{
    build_outcome, calculate, disposable_monthly, parse_start_balance, project,
    resolve_annual_income, sanitize_start_balance, summarize,
};
pub use ledger::{EntryId, Ledger, LedgerEntry, LedgerKind};
pub use session::{BudgetSession, RemoteTicket};
pub use tax::{annual_tax, tax_breakdown};
pub use types::{
    BudgetOutcome, BudgetSummary, CalculationResult, IncomeInput, ProjectionHorizon,
    ProjectionPoint, TaxBreakdown, TaxConfig,
};
