use std::fmt;

use serde::Serialize;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct EntryId(pub(crate) u64);

impl EntryId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    Subscriptions,
    AnnualCosts,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LedgerEntry {
    pub id: EntryId,
    pub name: String,
    pub amount: f64,
}

/// Ids are never handed out twice, even after removal.
#[derive(Clone, Debug)]
pub struct Ledger {
    kind: LedgerKind,
    entries: Vec<LedgerEntry>,
    next_id: u64,
}

impl Ledger {
    pub fn new(kind: LedgerKind) -> Self {
        Self {
            kind,
            entries: Vec::new(),
            next_id: 1,
        }
    }

    pub fn subscriptions() -> Self {
        Self::new(LedgerKind::Subscriptions)
    }

    pub fn annual_costs() -> Self {
        Self::new(LedgerKind::AnnualCosts)
    }

    pub fn kind(&self) -> LedgerKind {
        self.kind
    }

    pub fn add(&mut self, name: &str, amount: f64) -> Option<EntryId> {
        let name = name.trim();
        if name.is_empty() || !amount.is_finite() || amount <= 0.0 {
            return None;
        }

        let id = EntryId(self.next_id);
        self.next_id += 1;
        self.entries.push(LedgerEntry {
            id,
            name: name.to_string(),
            amount,
        });
        Some(id)
    }

    pub fn remove(&mut self, id: EntryId) -> bool {
        match self.entries.iter().position(|entry| entry.id == id) {
            Some(idx) => {
                self.entries.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: EntryId) -> Option<&LedgerEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.amount).sum()
    }

    pub fn monthly_equivalent(&self) -> f64 {
        match self.kind {
            LedgerKind::Subscriptions => self.total(),
            LedgerKind::AnnualCosts => self.total() / 12.0,
        }
    }
}
