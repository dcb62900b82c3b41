//! Persistence gate: validates before writing, then talks to the backend.
//!
//! `save` never reaches the backend with a structurally invalid automation.
//! Network failures leave local state as it was, except for `toggle`, which
//! is applied optimistically and rolled back when the backend refuses.

use crate::backend::AutomationBackend;
use crate::error::StoreError;
use af_core::model::Automation;
use af_core::validate::validate_structure;

pub struct PersistenceGate<B> {
    backend: B,
    user_email: String,
}

impl<B: AutomationBackend> PersistenceGate<B> {
    pub fn new(backend: B, user_email: impl Into<String>) -> Self {
        Self {
            backend,
            user_email: user_email.into(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn user_email(&self) -> &str {
        &self.user_email
    }

    /// Validate, then write the whole automation in one call.
    pub async fn save(&self, automation: &Automation) -> Result<(), StoreError> {
        if let Err(e) = validate_structure(&automation.graph) {
            log::info!("save of {} blocked: {e}", automation.id);
            return Err(e.into());
        }
        self.backend.save(automation, &self.user_email).await
    }

    /// Fetch one automation by id. Unknown block types are preserved.
    pub async fn load(&self, id: &str) -> Result<Automation, StoreError> {
        self.list()
            .await?
            .into_iter()
            .find(|a| a.id == id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub async fn list(&self) -> Result<Vec<Automation>, StoreError> {
        self.backend.list(&self.user_email).await
    }

    /// Set `active` locally, then confirm with the backend. On failure the
    /// previous value is restored and the error returned.
    pub async fn toggle(&self, automation: &mut Automation, active: bool) -> Result<(), StoreError> {
        let previous = std::mem::replace(&mut automation.active, active);
        if let Err(e) = self.backend.toggle(&automation.id, active).await {
            log::warn!("toggle of {} failed, rolling back: {e}", automation.id);
            automation.active = previous;
            return Err(e);
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.backend.delete(id).await?;
        log::info!("deleted automation {id}");
        Ok(())
    }
}
