//! Session context and the in-memory caches mirroring server state.
//!
//! Every write to a cache is stamped with a generation taken from a single
//! monotonically increasing counter. A fetch remembers the generation it was
//! issued with and is only applied when nothing newer has been written to the
//! cache in the meantime, and only for the session that issued it.
//! Unconfirmed placeholders do not count as writes: a refresh landing after
//! one replaces it.

use api_types::{
    TransactionId, UserId,
    budget::Budget,
    transaction::{Transaction, TransactionType},
};
use rust_decimal::Decimal;

use crate::summary::Summary;

/// Issued when a refresh starts, presented again when its responses land.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FetchTicket {
    pub user_id: UserId,
    epoch: u64,
    generation: u64,
}

/// Identifies one unconfirmed placeholder, independently of its visible id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlaceholderKey(u64);

#[derive(Clone, Debug)]
struct CachedTransaction {
    record: Transaction,
    /// Set while the record is a local placeholder awaiting the server.
    pending: Option<PlaceholderKey>,
}

impl CachedTransaction {
    fn confirmed(record: Transaction) -> Self {
        Self {
            record,
            pending: None,
        }
    }

    fn is_confirmed(&self) -> bool {
        self.pending.is_none()
    }
}

#[derive(Debug, Default)]
struct TransactionCache {
    entries: Vec<CachedTransaction>,
    applied: u64,
}

#[derive(Debug, Default)]
struct BudgetCache {
    budget: Option<Budget>,
    applied: u64,
}

/// What observers see after every cache write.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub user_id: Option<UserId>,
    pub transactions: Vec<Transaction>,
    pub budget: Option<Budget>,
    pub summary: Summary,
}

#[derive(Debug, Default)]
pub struct SessionState {
    user_id: Option<UserId>,
    epoch: u64,
    issued: u64,
    transactions: TransactionCache,
    budget: BudgetCache,
}

impl SessionState {
    pub fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Replaces whatever session was active. Caches start empty.
    pub fn start_session(&mut self, user_id: UserId) {
        self.epoch += 1;
        self.user_id = Some(user_id);
        let generation = self.next_generation();
        self.transactions = TransactionCache {
            entries: Vec::new(),
            applied: generation,
        };
        self.budget = BudgetCache {
            budget: None,
            applied: generation,
        };
    }

    fn next_generation(&mut self) -> u64 {
        self.issued += 1;
        self.issued
    }

    pub fn ticket(&mut self) -> Option<FetchTicket> {
        let user_id = self.user_id?;
        Some(FetchTicket {
            user_id,
            epoch: self.epoch,
            generation: self.next_generation(),
        })
    }

    fn accepts(&self, ticket: &FetchTicket, applied: u64) -> bool {
        ticket.epoch == self.epoch
            && self.user_id == Some(ticket.user_id)
            && ticket.generation > applied
    }

    /// Replaces the transaction cache wholesale. Returns false when the
    /// ticket is stale and the list was discarded.
    pub fn apply_transactions(&mut self, ticket: &FetchTicket, list: Vec<Transaction>) -> bool {
        if !self.accepts(ticket, self.transactions.applied) {
            return false;
        }

        let total = list.len();
        let entries: Vec<CachedTransaction> = list
            .into_iter()
            .filter(|tx| tx.user_id == ticket.user_id)
            .map(CachedTransaction::confirmed)
            .collect();
        if entries.len() != total {
            tracing::warn!(
                "dropped {} transactions not owned by user {}",
                total - entries.len(),
                ticket.user_id
            );
        }

        self.transactions = TransactionCache {
            entries,
            applied: ticket.generation,
        };
        true
    }

    pub fn apply_budget(&mut self, ticket: &FetchTicket, budget: Budget) -> bool {
        if !self.accepts(ticket, self.budget.applied) {
            return false;
        }
        if budget.user_id != ticket.user_id {
            tracing::warn!(
                "ignoring budget for user {} in session of user {}",
                budget.user_id,
                ticket.user_id
            );
            return false;
        }
        self.budget = BudgetCache {
            budget: Some(budget),
            applied: ticket.generation,
        };
        true
    }

    /// Appends an unconfirmed Expense whose id is the cache size plus one.
    ///
    /// The cache generation is left alone, so a fetch already in flight
    /// still replaces the list when it lands.
    pub fn push_placeholder(
        &mut self,
        amount: Decimal,
        category_id: i32,
        description: &str,
        date: &str,
    ) -> Option<(PlaceholderKey, Transaction)> {
        let user_id = self.user_id?;
        let key = PlaceholderKey(self.next_generation());
        let record = Transaction {
            id: self.placeholder_id(),
            user_id,
            category_id,
            amount,
            date: date.to_string(),
            description: description.to_string(),
            kind: TransactionType::Expense,
        };
        self.transactions.entries.push(CachedTransaction {
            record: record.clone(),
            pending: Some(key),
        });
        Some((key, record))
    }

    fn placeholder_id(&self) -> TransactionId {
        TransactionId::try_from(self.transactions.entries.len())
            .map_or(TransactionId::MAX, |len| len.saturating_add(1))
    }

    /// Swaps a placeholder for the record the server created.
    ///
    /// If a refresh already replaced the cache, the record is appended unless
    /// the refreshed list contains it.
    pub fn confirm_placeholder(&mut self, key: PlaceholderKey, record: Transaction) {
        let position = self
            .transactions
            .entries
            .iter()
            .position(|entry| entry.pending == Some(key));

        match position {
            Some(index) => {
                self.transactions.entries[index] = CachedTransaction::confirmed(record);
            }
            None => {
                if !self
                    .transactions
                    .entries
                    .iter()
                    .any(|entry| entry.record.id == record.id)
                {
                    self.transactions
                        .entries
                        .push(CachedTransaction::confirmed(record));
                }
            }
        }
        self.transactions.applied = self.next_generation();
    }

    /// Drops a placeholder the server refused. Like pushing it, this is not a
    /// confirmed write and leaves the cache generation alone.
    pub fn discard_placeholder(&mut self, key: PlaceholderKey) -> bool {
        let before = self.transactions.entries.len();
        self.transactions
            .entries
            .retain(|entry| entry.pending != Some(key));
        self.transactions.entries.len() != before
    }

    /// Replaces the confirmed entry with the same id. Returns false when the
    /// id is not cached.
    pub fn replace_transaction(&mut self, record: Transaction) -> bool {
        if self.user_id != Some(record.user_id) {
            tracing::warn!(
                "not caching transaction {} owned by user {}",
                record.id,
                record.user_id
            );
            return false;
        }
        let Some(entry) = self
            .transactions
            .entries
            .iter_mut()
            .find(|entry| entry.is_confirmed() && entry.record.id == record.id)
        else {
            return false;
        };
        entry.record = record;
        self.transactions.applied = self.next_generation();
        true
    }

    pub fn remove_transaction(&mut self, id: TransactionId) -> bool {
        let before = self.transactions.entries.len();
        self.transactions
            .entries
            .retain(|entry| !(entry.is_confirmed() && entry.record.id == id));
        let removed = self.transactions.entries.len() != before;
        if removed {
            self.transactions.applied = self.next_generation();
        }
        removed
    }

    pub fn set_budget(&mut self, budget: Budget) {
        self.budget = BudgetCache {
            budget: Some(budget),
            applied: self.next_generation(),
        };
    }

    pub fn transactions(&self) -> Vec<Transaction> {
        self.transactions
            .entries
            .iter()
            .map(|entry| entry.record.clone())
            .collect()
    }

    pub fn pending(&self) -> usize {
        self.transactions
            .entries
            .iter()
            .filter(|entry| !entry.is_confirmed())
            .count()
    }

    pub fn budget(&self) -> Option<&Budget> {
        self.budget.budget.as_ref()
    }

    pub fn summary(&self) -> Summary {
        Summary::compute(&self.transactions(), self.budget())
    }

    pub fn snapshot(&self) -> Snapshot {
        let transactions = self.transactions();
        let summary = Summary::compute(&transactions, self.budget());
        Snapshot {
            user_id: self.user_id,
            transactions,
            budget: self.budget.budget.clone(),
            summary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(id: TransactionId, user_id: UserId, amount: i64) -> Transaction {
        Transaction {
            id,
            user_id,
            category_id: 1,
            amount: Decimal::from(amount),
            date: "2024-01-05".to_string(),
            description: format!("tx {id}"),
            kind: TransactionType::Expense,
        }
    }

    fn budget(user_id: UserId, amount: i64) -> Budget {
        Budget {
            user_id,
            start_date: "2024-01-01".to_string(),
            end_date: "2024-01-31".to_string(),
            amount: Decimal::from(amount),
        }
    }

    #[test]
    fn no_ticket_without_session() {
        let mut state = SessionState::default();
        assert!(state.ticket().is_none());
        assert!(state.push_placeholder(Decimal::ONE, 1, "x", "2024-01-01").is_none());
    }

    #[test]
    fn latest_fetch_wins_and_older_one_is_discarded() {
        let mut state = SessionState::default();
        state.start_session(1);
        let first = state.ticket().unwrap();
        let second = state.ticket().unwrap();

        assert!(state.apply_transactions(&second, vec![tx(2, 1, 20)]));
        assert!(!state.apply_transactions(&first, vec![tx(1, 1, 10)]));
        assert_eq!(state.transactions(), vec![tx(2, 1, 20)]);
    }

    #[test]
    fn fetch_issued_before_local_write_is_discarded() {
        let mut state = SessionState::default();
        state.start_session(1);
        let ticket = state.ticket().unwrap();
        state.set_budget(budget(1, 300));

        assert!(!state.apply_budget(&ticket, budget(1, 100)));
        assert_eq!(state.budget().unwrap().amount, Decimal::from(300));
        // The transaction cache was not written, so the same ticket still applies there.
        assert!(state.apply_transactions(&ticket, vec![tx(1, 1, 5)]));
    }

    #[test]
    fn fetch_from_previous_session_is_discarded() {
        let mut state = SessionState::default();
        state.start_session(1);
        let ticket = state.ticket().unwrap();
        state.start_session(2);

        assert!(!state.apply_transactions(&ticket, vec![tx(1, 1, 5)]));
        assert!(state.transactions().is_empty());
        assert_eq!(state.user_id(), Some(2));
    }

    #[test]
    fn records_of_other_users_are_dropped() {
        let mut state = SessionState::default();
        state.start_session(1);
        let ticket = state.ticket().unwrap();
        assert!(state.apply_transactions(&ticket, vec![tx(1, 1, 5), tx(2, 9, 7)]));
        assert_eq!(state.transactions(), vec![tx(1, 1, 5)]);
        assert!(!state.apply_budget(&ticket, budget(9, 100)));
    }

    #[test]
    fn placeholder_id_is_cache_size_plus_one_and_can_be_confirmed() {
        let mut state = SessionState::default();
        state.start_session(1);
        let ticket = state.ticket().unwrap();
        state.apply_transactions(&ticket, vec![tx(10, 1, 5), tx(11, 1, 6)]);

        let (key, placeholder) = state
            .push_placeholder(Decimal::from(50), 2, "lunch", "2024-01-05")
            .unwrap();
        assert_eq!(placeholder.id, 3);
        assert_eq!(placeholder.kind, TransactionType::Expense);
        assert_eq!(state.pending(), 1);

        let mut created = placeholder.clone();
        created.id = 42;
        state.confirm_placeholder(key, created.clone());
        assert_eq!(state.pending(), 0);
        assert_eq!(state.transactions().last(), Some(&created));
        assert_eq!(state.transactions().len(), 3);
    }

    #[test]
    fn confirm_after_refresh_does_not_duplicate() {
        let mut state = SessionState::default();
        state.start_session(1);
        let (key, _) = state
            .push_placeholder(Decimal::from(50), 2, "lunch", "2024-01-05")
            .unwrap();
        let ticket = state.ticket().unwrap();
        state.apply_transactions(&ticket, vec![tx(42, 1, 50)]);

        state.confirm_placeholder(key, tx(42, 1, 50));
        assert_eq!(state.transactions(), vec![tx(42, 1, 50)]);
    }

    #[test]
    fn discarded_placeholder_leaves_confirmed_entries() {
        let mut state = SessionState::default();
        state.start_session(1);
        let ticket = state.ticket().unwrap();
        state.apply_transactions(&ticket, vec![tx(2, 1, 5)]);
        let (key, placeholder) = state
            .push_placeholder(Decimal::from(1), 1, "x", "2024-01-05")
            .unwrap();
        assert_eq!(placeholder.id, 2);

        assert!(state.discard_placeholder(key));
        assert!(!state.discard_placeholder(key));
        assert_eq!(state.transactions(), vec![tx(2, 1, 5)]);
    }

    #[test]
    fn fetch_in_flight_replaces_later_placeholders() {
        let mut state = SessionState::default();
        state.start_session(1);
        let ticket = state.ticket().unwrap();
        state.push_placeholder(Decimal::from(1), 1, "gum", "2024-01-05");
        let (refused, _) = state
            .push_placeholder(Decimal::from(2), 1, "tea", "2024-01-05")
            .unwrap();
        assert!(state.discard_placeholder(refused));

        assert!(state.apply_transactions(&ticket, vec![tx(7, 1, 5), tx(8, 1, 6)]));
        assert_eq!(state.transactions(), vec![tx(7, 1, 5), tx(8, 1, 6)]);
        assert_eq!(state.pending(), 0);
    }

    #[test]
    fn fetch_issued_before_confirmation_is_discarded() {
        let mut state = SessionState::default();
        state.start_session(1);
        let ticket = state.ticket().unwrap();
        let (key, _) = state
            .push_placeholder(Decimal::from(5), 1, "bus", "2024-01-05")
            .unwrap();
        state.confirm_placeholder(key, tx(3, 1, 5));

        assert!(!state.apply_transactions(&ticket, Vec::new()));
        assert_eq!(state.transactions(), vec![tx(3, 1, 5)]);
    }

    #[test]
    fn placeholders_sharing_an_id_are_settled_separately() {
        let mut state = SessionState::default();
        state.start_session(1);
        let (first, first_record) = state
            .push_placeholder(Decimal::from(1), 1, "gum", "2024-01-05")
            .unwrap();
        // A refresh lands while the first create is in flight.
        let ticket = state.ticket().unwrap();
        state.apply_transactions(&ticket, vec![tx(9, 1, 4)]);
        let (second, second_record) = state
            .push_placeholder(Decimal::from(2), 1, "tea", "2024-01-05")
            .unwrap();
        assert_eq!(first_record.id, 1);
        assert_eq!(second_record.id, 2);

        // Dropping the refreshed row makes the next placeholder reuse id 2.
        assert!(state.remove_transaction(9));
        let (third, third_record) = state
            .push_placeholder(Decimal::from(3), 1, "cake", "2024-01-05")
            .unwrap();
        assert_eq!(third_record.id, second_record.id);

        assert!(!state.discard_placeholder(first));
        assert!(state.discard_placeholder(third));
        assert_eq!(state.transactions(), vec![second_record.clone()]);

        state.confirm_placeholder(second, tx(20, 1, 2));
        assert_eq!(state.transactions(), vec![tx(20, 1, 2)]);
        assert_eq!(state.pending(), 0);
    }

    #[test]
    fn replace_and_remove_only_touch_matching_ids() {
        let mut state = SessionState::default();
        state.start_session(1);
        let ticket = state.ticket().unwrap();
        state.apply_transactions(&ticket, vec![tx(1, 1, 5), tx(2, 1, 6)]);

        assert!(state.replace_transaction(tx(2, 1, 60)));
        assert!(!state.replace_transaction(tx(3, 1, 60)));
        assert!(!state.remove_transaction(99));
        assert!(state.remove_transaction(1));
        assert_eq!(state.transactions(), vec![tx(2, 1, 60)]);
    }

    #[test]
    fn snapshot_carries_summary() {
        let mut state = SessionState::default();
        state.start_session(1);
        state.set_budget(budget(1, 4));
        let ticket = state.ticket().unwrap();
        state.apply_transactions(&ticket, vec![tx(1, 1, 5)]);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.user_id, Some(1));
        assert!(snapshot.summary.budget_exceeded);
        assert_eq!(snapshot.summary.total_spending, Decimal::from(5));
    }
}
