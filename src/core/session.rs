use std::fmt;

use tracing::debug;

use super::engine::{build_outcome, disposable_monthly, sanitize_start_balance, summarize};
use super::ledger::{EntryId, Ledger};
use super::types::{
    BudgetOutcome, BudgetSummary, CalculationResult, IncomeInput, ProjectionHorizon, TaxConfig,
};

type Listener = Box<dyn FnMut(&BudgetOutcome)>;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RemoteTicket {
    revision: u64,
}

impl RemoteTicket {
    pub fn revision(self) -> u64 {
        self.revision
    }
}

pub struct BudgetSession {
    income: Option<IncomeInput>,
    tax: TaxConfig,
    subscriptions: Ledger,
    annual_costs: Ledger,
    start_balance: f64,
    horizon: ProjectionHorizon,
    revision: u64,
    outcome: BudgetOutcome,
    listeners: Vec<Listener>,
}

impl Default for BudgetSession {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BudgetSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BudgetSession")
            .field("income", &self.income)
            .field("tax", &self.tax)
            .field("subscriptions", &self.subscriptions)
            .field("annual_costs", &self.annual_costs)
            .field("start_balance", &self.start_balance)
            .field("horizon", &self.horizon)
            .field("revision", &self.revision)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl BudgetSession {
    pub fn new() -> Self {
        Self {
            income: None,
            tax: TaxConfig::default(),
            subscriptions: Ledger::subscriptions(),
            annual_costs: Ledger::annual_costs(),
            start_balance: 0.0,
            horizon: ProjectionHorizon::default(),
            revision: 0,
            outcome: build_outcome(0, None, 0.0, ProjectionHorizon::default().months()),
            listeners: Vec::new(),
        }
    }

    pub fn on_change<F>(&mut self, listener: F)
    where
        F: FnMut(&BudgetOutcome) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn outcome(&self) -> &BudgetOutcome {
        &self.outcome
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn income(&self) -> Option<IncomeInput> {
        self.income
    }

    pub fn tax(&self) -> TaxConfig {
        self.tax
    }

    pub fn start_balance(&self) -> f64 {
        self.start_balance
    }

    pub fn horizon(&self) -> ProjectionHorizon {
        self.horizon
    }

    pub fn subscriptions(&self) -> &Ledger {
        &self.subscriptions
    }

    pub fn annual_costs(&self) -> &Ledger {
        &self.annual_costs
    }

    pub fn set_income(&mut self, income: IncomeInput) {
        if self.income == Some(income) {
            return;
        }
        self.income = Some(income);
        self.changed();
    }

    pub fn clear_income(&mut self) {
        if self.income.take().is_some() {
            self.changed();
        }
    }

    pub fn set_tax_enabled(&mut self, enabled: bool) {
        if self.tax.enabled != enabled {
            self.tax.enabled = enabled;
            self.changed();
        }
    }

    pub fn set_start_balance(&mut self, raw: f64) {
        let balance = sanitize_start_balance(raw);
        if balance != self.start_balance {
            self.start_balance = balance;
            self.changed();
        }
    }

    pub fn set_horizon(&mut self, horizon: ProjectionHorizon) {
        if self.horizon != horizon {
            self.horizon = horizon;
            self.changed();
        }
    }

    pub fn add_subscription(&mut self, name: &str, amount: f64) -> Option<EntryId> {
        let id = self.subscriptions.add(name, amount);
        self.after_add(id, "subscription", name, amount)
    }

    pub fn remove_subscription(&mut self, id: EntryId) -> bool {
        let removed = self.subscriptions.remove(id);
        self.after_remove(removed, "subscription", id)
    }

    pub fn add_annual_cost(&mut self, name: &str, amount: f64) -> Option<EntryId> {
        let id = self.annual_costs.add(name, amount);
        self.after_add(id, "annual cost", name, amount)
    }

    pub fn remove_annual_cost(&mut self, id: EntryId) -> bool {
        let removed = self.annual_costs.remove(id);
        self.after_remove(removed, "annual cost", id)
    }

    pub fn summary(&self) -> Option<BudgetSummary> {
        let income = self.income.as_ref()?;
        summarize(
            income,
            self.tax,
            self.subscriptions.monthly_equivalent(),
            self.annual_costs.monthly_equivalent(),
        )
    }

    pub fn recompute(&mut self) -> &BudgetOutcome {
        self.outcome = build_outcome(
            self.revision,
            self.summary(),
            self.start_balance,
            self.horizon.months(),
        );
        for listener in &mut self.listeners {
            listener(&self.outcome);
        }
        &self.outcome
    }

    pub fn remote_ticket(&self) -> RemoteTicket {
        RemoteTicket {
            revision: self.revision,
        }
    }

    /// Returns false and leaves the outcome alone when inputs changed since the ticket.
    pub fn accept_remote(&mut self, ticket: RemoteTicket, result: CalculationResult) -> bool {
        if ticket.revision != self.revision {
            debug!(
                ticket = ticket.revision,
                current = self.revision,
                "dropping stale remote calculation"
            );
            return false;
        }

        let subscriptions_monthly = self.subscriptions.monthly_equivalent();
        let annual_costs_monthly = self.annual_costs.monthly_equivalent();
        let summary = BudgetSummary {
            calculation: result,
            subscriptions_monthly,
            annual_costs_monthly,
            disposable_monthly: disposable_monthly(
                &result,
                subscriptions_monthly,
                annual_costs_monthly,
            ),
        };
        self.outcome = build_outcome(
            self.revision,
            Some(summary),
            self.start_balance,
            self.horizon.months(),
        );
        for listener in &mut self.listeners {
            listener(&self.outcome);
        }
        true
    }

    fn after_add(
        &mut self,
        id: Option<EntryId>,
        ledger: &str,
        name: &str,
        amount: f64,
    ) -> Option<EntryId> {
        match id {
            Some(id) => {
                debug!(ledger, %id, amount, "added entry");
                self.changed();
            }
            None => debug!(ledger, name, amount, "rejected entry"),
        }
        id
    }

    fn after_remove(&mut self, removed: bool, ledger: &str, id: EntryId) -> bool {
        if removed {
            debug!(ledger, %id, "removed entry");
            self.changed();
        } else {
            debug!(ledger, %id, "no entry to remove");
        }
        removed
    }

    fn changed(&mut self) {
        self.revision += 1;
        self.recompute();
    }
}
