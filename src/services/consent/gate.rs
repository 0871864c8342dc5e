use std::sync::Arc;

use chrono::Utc;

use crate::config::ConsentPersistPolicy;
use crate::error::ConsentError;
use crate::repos::ConsentStore;

use super::types::{ConsentCategory, ConsentExport, ConsentOutcome, ConsentRecord, ConsentSelections};

pub struct ConsentGate {
    store: Arc<dyn ConsentStore>,
    policy: ConsentPersistPolicy,
    record: Option<ConsentRecord>,
}

impl std::fmt::Debug for ConsentGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsentGate")
            .field("store", &self.store.backend_name())
            .field("policy", &self.policy)
            .field("record", &self.record)
            .finish()
    }
}

impl ConsentGate {
    pub fn new(store: Arc<dyn ConsentStore>, policy: ConsentPersistPolicy) -> Self {
        Self {
            store,
            policy,
            record: None,
        }
    }

    /// Picks up a record persisted by an earlier run.
    ///
    /// A malformed record is logged and ignored, which puts the user back in front of the gate.
    pub async fn load(&mut self) -> Result<(), ConsentError> {
        match self.store.load().await {
            Ok(record) => {
                self.record = record;
                Ok(())
            }
            Err(crate::repos::error::RepoError::Malformed(e)) => {
                tracing::warn!(error = %e, "stored consent is malformed, asking again");
                self.record = None;
                Ok(())
            }
            Err(e) => Err(ConsentError::Persist(e)),
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.record.is_some()
    }

    pub fn record(&self) -> Option<&ConsentRecord> {
        self.record.as_ref()
    }

    pub fn policy(&self) -> ConsentPersistPolicy {
        self.policy
    }

    /// Records the user's choices with `necessary` forced on.
    ///
    /// Under `FailOpen` a storage failure is logged and the gate opens with the in-memory
    /// record (`persisted == false`). Under `FailClosed` the error is returned and the gate
    /// stays shut.
    pub async fn accept(
        &mut self,
        selections: ConsentSelections,
    ) -> Result<ConsentOutcome, ConsentError> {
        let record = ConsentRecord::from_selections(selections);

        let persisted = match self.store.save(&record).await {
            Ok(()) => true,
            Err(e) => match self.policy {
                ConsentPersistPolicy::FailOpen => {
                    tracing::warn!(
                        error = %e,
                        store = self.store.backend_name(),
                        "failed to persist consent, continuing with in-memory record"
                    );
                    false
                }
                ConsentPersistPolicy::FailClosed => {
                    tracing::error!(
                        error = %e,
                        store = self.store.backend_name(),
                        "failed to persist consent"
                    );
                    return Err(ConsentError::Persist(e));
                }
            },
        };

        self.record = Some(record);
        tracing::info!(persisted, "consent recorded");
        Ok(ConsentOutcome { record, persisted })
    }

    /// Sets one optional category. The in-memory record only changes once storage accepted it.
    ///
    /// `Necessary` is refused without error: the current record is returned unchanged.
    pub async fn update(
        &mut self,
        category: ConsentCategory,
        value: bool,
    ) -> Result<ConsentRecord, ConsentError> {
        let current = self.record.ok_or(ConsentError::NotRecorded)?;

        if category == ConsentCategory::Necessary {
            tracing::warn!("necessary consent cannot be changed");
            return Ok(current);
        }

        let updated = current.with(category, value);
        self.store.save(&updated).await.inspect_err(|e| {
            tracing::warn!(error = %e, %category, "failed to persist consent change");
        })?;

        self.record = Some(updated);
        Ok(updated)
    }

    pub async fn toggle(&mut self, category: ConsentCategory) -> Result<ConsentRecord, ConsentError> {
        let current = self.record.ok_or(ConsentError::NotRecorded)?;
        self.update(category, !current.get(category)).await
    }

    pub fn has_consent_for(&self, category: ConsentCategory) -> bool {
        self.record.is_some_and(|r| r.get(category))
    }

    pub fn export(&self) -> Option<ConsentExport> {
        self.record.map(|consents| ConsentExport {
            consents,
            exported_at: Utc::now(),
            version: "1.0",
        })
    }

    /// Forgets the consent in memory and in storage (logout, account deletion).
    ///
    /// Memory is cleared first so the gate is shut even when storage refuses the delete.
    pub async fn reset(&mut self) -> Result<(), ConsentError> {
        self.record = None;
        self.store.clear().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to clear stored consent");
            ConsentError::Persist(e)
        })
    }

    /// Withdraws every consent. Same effect as `reset`.
    pub async fn revoke_all(&mut self) -> Result<(), ConsentError> {
        tracing::info!("all consents revoked");
        self.reset().await
    }
}
