//! Capabilities the bet service calls out to
//!
//! Notification delivery, audit logging, subscription limits and statistics
//! enrichment live outside this crate. Each is a trait with a no-op
//! implementation, so a deployment without the collaborator plugs in the no-op
//! instead of the service checking for a missing dependency at runtime.

use crate::types::{Bet, UserId};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// Monthly bet allowance of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BetQuota {
    Limited(u32),
    Unlimited,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, user: UserId, severity: Severity, title: &str, message: &str, link: &str);
}

/// Write-only compliance sink
pub trait AuditSink: Send + Sync {
    fn record(
        &self,
        user: UserId,
        action: &str,
        entity_type: &str,
        entity_id: &str,
        payload: Value,
    );
}

pub trait QuotaPolicy: Send + Sync {
    fn monthly_limit(&self, user: UserId) -> BetQuota;
}

/// Statistics enrichment hook, invoked after a bet is created
pub trait BetEnricher: Send + Sync {
    fn enrich(&self, bet: &Bet);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _user: UserId, _severity: Severity, _title: &str, _message: &str, _link: &str) {
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(
        &self,
        _user: UserId,
        _action: &str,
        _entity_type: &str,
        _entity_id: &str,
        _payload: Value,
    ) {
    }
}

/// Every user may place any number of bets
#[derive(Debug, Clone, Copy, Default)]
pub struct UnlimitedQuota;

impl QuotaPolicy for UnlimitedQuota {
    fn monthly_limit(&self, _user: UserId) -> BetQuota {
        BetQuota::Unlimited
    }
}

/// Same monthly limit for every user
#[derive(Debug, Clone, Copy)]
pub struct FixedQuota(pub u32);

impl QuotaPolicy for FixedQuota {
    fn monthly_limit(&self, _user: UserId) -> BetQuota {
        BetQuota::Limited(self.0)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopEnricher;

impl BetEnricher for NoopEnricher {
    fn enrich(&self, _bet: &Bet) {}
}

/// Logs notifications instead of delivering them
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, user: UserId, severity: Severity, title: &str, message: &str, link: &str) {
        info!(target: "bankroll::notify", user, %severity, title, message, link, "notification");
    }
}

/// Logs audit entries as structured events
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(
        &self,
        user: UserId,
        action: &str,
        entity_type: &str,
        entity_id: &str,
        payload: Value,
    ) {
        info!(target: "bankroll::audit", user, action, entity_type, entity_id, %payload, "audit");
    }
}

/// The set of collaborators a bet service talks to
#[derive(Clone)]
pub struct Collaborators {
    pub notifier: Arc<dyn Notifier>,
    pub audit: Arc<dyn AuditSink>,
    pub quota: Arc<dyn QuotaPolicy>,
    pub enricher: Arc<dyn BetEnricher>,
}

impl Collaborators {
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_quota(mut self, quota: Arc<dyn QuotaPolicy>) -> Self {
        self.quota = quota;
        self
    }

    pub fn with_enricher(mut self, enricher: Arc<dyn BetEnricher>) -> Self {
        self.enricher = enricher;
        self
    }

    /// Log-only notifier and audit sink, no quota
    pub fn tracing() -> Self {
        Self::default()
            .with_notifier(Arc::new(TracingNotifier))
            .with_audit(Arc::new(TracingAuditSink))
    }
}

impl Default for Collaborators {
    fn default() -> Self {
        Collaborators {
            notifier: Arc::new(NoopNotifier),
            audit: Arc::new(NoopAuditSink),
            quota: Arc::new(UnlimitedQuota),
            enricher: Arc::new(NoopEnricher),
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
