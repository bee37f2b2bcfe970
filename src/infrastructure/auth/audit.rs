//! Audit-log gating for mutating actions
//!
//! The gate decides whether a compliance record is written; it never blocks
//! the underlying business action. Suppressions are successful actions with
//! a logged anomaly: a misconfigured account keeps working while the gap
//! stays visible for remediation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::error::Result;
use crate::domain::model::{AuditLogEntry, UserId};
use crate::domain::principal::Principal;

/// Gate verdict for one principal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditDecision {
    pub allow: bool,
    pub reason: Option<&'static str>,
}

impl AuditDecision {
    fn allow() -> Self {
        Self {
            allow: true,
            reason: None,
        }
    }

    fn suppress(reason: &'static str) -> Self {
        Self {
            allow: false,
            reason: Some(reason),
        }
    }
}

/// Destination for persisted audit records
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, entry: AuditLogEntry) -> Result<()>;
}

/// In-memory audit sink
#[derive(Default)]
pub struct InMemoryAuditSink {
    entries: RwLock<Vec<AuditLogEntry>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn entries(&self) -> Vec<AuditLogEntry> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn append(&self, entry: AuditLogEntry) -> Result<()> {
        self.entries.write().await.push(entry);
        Ok(())
    }
}

/// Decides, per mutating action, whether to persist an audit record
pub struct AuditGate {
    fallback_principal_id: UserId,
    sink: Arc<dyn AuditSink>,
}

impl AuditGate {
    pub fn new(fallback_principal_id: UserId, sink: Arc<dyn AuditSink>) -> Self {
        Self {
            fallback_principal_id,
            sink,
        }
    }

    /// Gate rules, evaluated in order: the reserved fallback principal is
    /// never an audit subject; a principal with no role assignment is
    /// excluded from attribution until fixed.
    pub fn should_log(&self, principal: &Principal) -> AuditDecision {
        if principal.id == self.fallback_principal_id {
            return AuditDecision::suppress("fallback principal");
        }
        if principal.role_id.is_none() {
            return AuditDecision::suppress("no role assigned");
        }
        AuditDecision::allow()
    }

    /// Persist an audit record when the gate allows it
    ///
    /// Returns whether a record was written. A suppression emits exactly one
    /// warning naming the action and the actor, and no audit row.
    pub async fn record(&self, principal: &Principal, action: &str, entity: &str) -> Result<bool> {
        let decision = self.should_log(principal);
        let Some(reason) = decision.reason else {
            self.sink
                .append(AuditLogEntry {
                    id: Uuid::new_v4().to_string(),
                    actor_id: principal.id,
                    action: action.to_string(),
                    entity: entity.to_string(),
                    timestamp: Utc::now(),
                    organization_id: principal.effective_organization(),
                })
                .await?;
            return Ok(true);
        };

        tracing::warn!(
            actor = principal.id,
            username = %principal.username,
            action,
            entity,
            reason,
            "audit record suppressed"
        );
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(id: UserId, role_id: Option<i64>) -> Principal {
        Principal {
            id,
            username: "u".to_string(),
            role: "doctor".to_string(),
            role_id,
            organization_id: Some(2),
            current_organization_id: None,
        }
    }

    fn gate() -> (AuditGate, Arc<InMemoryAuditSink>) {
        let sink = Arc::new(InMemoryAuditSink::new());
        (AuditGate::new(0, sink.clone()), sink)
    }

    #[tokio::test]
    async fn test_normal_principal_is_audited() {
        let (gate, sink) = gate();
        let written = gate
            .record(&principal(8, Some(3)), "update", "patient")
            .await
            .unwrap();

        assert!(written);
        let entries = sink.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].actor_id, 8);
        assert_eq!(entries[0].action, "update");
        assert_eq!(entries[0].organization_id, Some(2));
    }

    #[tokio::test]
    async fn test_fallback_principal_is_never_audited() {
        let (gate, sink) = gate();
        let decision = gate.should_log(&principal(0, Some(3)));
        assert_eq!(decision.reason, Some("fallback principal"));

        let written = gate
            .record(&principal(0, Some(3)), "update", "patient")
            .await
            .unwrap();
        assert!(!written);
        assert!(sink.is_empty().await);
    }

    #[tokio::test]
    async fn test_missing_role_suppresses_with_reason() {
        let (gate, sink) = gate();
        let decision = gate.should_log(&principal(8, None));
        assert_eq!(decision.reason, Some("no role assigned"));

        let written = gate
            .record(&principal(8, None), "delete", "visit")
            .await
            .unwrap();
        assert!(!written);
        assert!(sink.is_empty().await);
    }

    #[tokio::test]
    async fn test_fallback_rule_wins_over_missing_role() {
        let (gate, _) = gate();
        let decision = gate.should_log(&principal(0, None));
        assert_eq!(decision.reason, Some("fallback principal"));
    }
}
