//! Event replay engine
//!
//! This module provides the `LedgerEngine` that routes replayed bankroll events
//! to the bet service. It owns no state of its own; everything lives in the
//! store, so the same engine runs over the mutex-backed store (sync strategy)
//! and the DashMap-backed store (async strategy).

use crate::core::bet_service::BetService;
use crate::core::collaborators::Collaborators;
use crate::core::traits::{BetStore, LedgerStore};
use crate::types::{BetEvent, LedgerError, Money, UserId};
use std::sync::Arc;
use tracing::trace;

/// Final state of one platform, as written by the replay CLI
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformReport {
    pub user: UserId,
    pub name: String,
    pub initial_balance: Money,
    pub current_balance: Money,

    /// Number of live ledger transactions
    pub transactions: usize,
}

/// Replays bankroll events against a store
///
/// Cheap to clone; clones share the store.
pub struct LedgerEngine<S> {
    service: BetService<S>,
}

impl<S> Clone for LedgerEngine<S> {
    fn clone(&self) -> Self {
        LedgerEngine {
            service: self.service.clone(),
        }
    }
}

impl<S> std::fmt::Debug for LedgerEngine<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerEngine")
            .field("service", &self.service)
            .finish()
    }
}

impl<S: LedgerStore + BetStore> LedgerEngine<S> {
    /// Create an engine with no-op collaborators
    pub fn new(store: Arc<S>) -> Self {
        Self::with_collaborators(store, Collaborators::default())
    }

    pub fn with_collaborators(store: Arc<S>, collaborators: Collaborators) -> Self {
        LedgerEngine {
            service: BetService::with_collaborators(store, collaborators),
        }
    }

    /// The bet service events are routed to
    pub fn service(&self) -> &BetService<S> {
        &self.service
    }

    /// Process a single event
    ///
    /// # Errors
    ///
    /// Whatever the underlying bet service operation returns. A failed event
    /// changes nothing, so the caller may log it and carry on with the next one.
    pub fn process(&self, event: BetEvent) -> Result<(), LedgerError> {
        trace!(user = event.user(), kind = event.kind(), "processing event");

        match event {
            BetEvent::OpenPlatform {
                user,
                name,
                category,
                initial_balance,
            } => self
                .service
                .open_platform(user, &name, category, initial_balance)
                .map(|_| ()),
            BetEvent::SetMode { user, mode } => {
                self.service.set_bankroll_mode(user, mode);
                Ok(())
            }
            BetEvent::Create { user, input } => {
                self.service.create_bet(user, input).map(|_| ())
            }
            BetEvent::Update { user, bet, update } => {
                self.service.update_bet(user, bet, update).map(|_| ())
            }
            BetEvent::Result { user, bet, result } => {
                self.service.update_bet_result(user, bet, result).map(|_| ())
            }
        }
    }

    /// Final state of every platform, sorted by user then platform name
    pub fn platform_reports(&self) -> Vec<PlatformReport> {
        let store = self.service.store();

        store
            .all_platforms()
            .into_iter()
            .map(|platform| PlatformReport {
                transactions: store.transactions_for_platform(platform.id).len(),
                user: platform.user,
                initial_balance: platform.initial_balance(),
                current_balance: platform.current_balance(),
                name: platform.name,
            })
            .collect()
    }
}
