//! Automation storage backends.
//!
//! [`HttpBackend`] speaks the JSON API; [`MemoryBackend`] keeps everything
//! in process and is used by tests and offline tooling.

use crate::config::BackendConfig;
use crate::error::StoreError;
use crate::wire::{DeleteRequest, SaveRequest, SaveResponse, ToggleRequest};
use af_core::model::Automation;
use reqwest::{Client, Response};
use serde_json::Value;
use std::future::Future;
use std::sync::{Mutex, MutexGuard};

/// Where automations are persisted.
///
/// No call retries or times out; callers decide whether to try again.
pub trait AutomationBackend {
    /// Write the whole automation, replacing any stored copy with the same id.
    fn save(
        &self,
        automation: &Automation,
        user_email: &str,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Every automation owned by `user_email`.
    fn list(&self, user_email: &str) -> impl Future<Output = Result<Vec<Automation>, StoreError>> + Send;

    fn toggle(&self, id: &str, active: bool) -> impl Future<Output = Result<(), StoreError>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = Result<(), StoreError>> + Send;
}

// ─── HTTP ────────────────────────────────────────────────────────────────

pub struct HttpBackend {
    client: Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Turn non-2xx replies into [`StoreError::Status`].
fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if !status.is_success() {
        log::warn!("{} -> HTTP {}", response.url(), status.as_u16());
        return Err(StoreError::Status(status.as_u16()));
    }
    Ok(response)
}

impl AutomationBackend for HttpBackend {
    async fn save(&self, automation: &Automation, user_email: &str) -> Result<(), StoreError> {
        let body = SaveRequest {
            automation,
            user_email,
        };
        let response = self
            .client
            .post(self.url("/automations/save"))
            .json(&body)
            .send()
            .await?;
        let text = check_status(response)?.text().await?;
        let reply: SaveResponse = serde_json::from_str(&text)?;
        log::info!("saved automation {}: {}", automation.id, reply.status);
        Ok(())
    }

    async fn list(&self, user_email: &str) -> Result<Vec<Automation>, StoreError> {
        let response = self
            .client
            .get(self.url("/automations"))
            .query(&[("email", user_email)])
            .send()
            .await?;
        let text = check_status(response)?.text().await?;
        let automations: Vec<Automation> = serde_json::from_str(&text)?;
        log::debug!("listed {} automation(s)", automations.len());
        Ok(automations)
    }

    async fn toggle(&self, id: &str, active: bool) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.url("/automations/toggle"))
            .json(&ToggleRequest { id, active })
            .send()
            .await?;
        check_status(response)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let response = self
            .client
            .post(self.url("/automations/delete"))
            .json(&DeleteRequest { id })
            .send()
            .await?;
        check_status(response)?;
        Ok(())
    }
}

// ─── In-memory ───────────────────────────────────────────────────────────

/// One stored automation, held as the JSON body the HTTP API would receive.
#[derive(Debug)]
struct StoredRow {
    owner: String,
    id: String,
    json: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    /// Rows in insertion order.
    rows: Vec<StoredRow>,
    calls: usize,
    /// HTTP status the next call fails with.
    fail_next: Option<u16>,
}

impl MemoryState {
    fn row_mut(&mut self, id: &str) -> Option<&mut StoredRow> {
        self.rows.iter_mut().find(|r| r.id == id)
    }
}

/// Process-local backend. Counts calls and can be told to fail.
///
/// Automations go through the same JSON encoding as over HTTP: `save`
/// stores the request body and `list` decodes the stored rows.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of backend calls made so far, including failed ones.
    pub fn calls(&self) -> usize {
        self.lock().calls
    }

    /// Make the next call fail with HTTP `status`.
    pub fn fail_next(&self, status: u16) {
        self.lock().fail_next = Some(status);
    }

    /// Store a raw row for `user_email`, as if another client had saved it.
    /// Not counted as a call.
    pub fn insert_json(&self, user_email: &str, row: &Value) -> Result<(), StoreError> {
        let id = row.get("id").and_then(Value::as_str).unwrap_or_default().to_string();
        let json = serde_json::to_string(row)?;
        self.upsert(StoredRow {
            owner: user_email.to_string(),
            id,
            json,
        });
        Ok(())
    }

    /// The stored JSON row of `id`, if any.
    pub fn stored_json(&self, id: &str) -> Option<Value> {
        let state = self.lock();
        let row = state.rows.iter().find(|r| r.id == id)?;
        serde_json::from_str(&row.json).ok()
    }

    /// The stored copy of `id`, decoded, if any.
    pub fn stored(&self, id: &str) -> Option<Automation> {
        serde_json::from_value(self.stored_json(id)?).ok()
    }

    fn upsert(&self, row: StoredRow) {
        let mut state = self.lock();
        match state.row_mut(&row.id) {
            Some(existing) => *existing = row,
            None => state.rows.push(row),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        // Every update is a single assignment, so poisoned state is still whole.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Count the call and consume an injected failure.
    fn begin(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        let mut state = self.lock();
        state.calls += 1;
        match state.fail_next.take() {
            Some(status) => Err(StoreError::Status(status)),
            None => Ok(state),
        }
    }
}

impl AutomationBackend for MemoryBackend {
    async fn save(&self, automation: &Automation, user_email: &str) -> Result<(), StoreError> {
        drop(self.begin()?);
        let body = SaveRequest {
            automation,
            user_email,
        };
        self.upsert(StoredRow {
            owner: user_email.to_string(),
            id: automation.id.clone(),
            json: serde_json::to_string(&body)?,
        });
        Ok(())
    }

    async fn list(&self, user_email: &str) -> Result<Vec<Automation>, StoreError> {
        let state = self.begin()?;
        let rows: Vec<&str> = state
            .rows
            .iter()
            .filter(|r| r.owner == user_email)
            .map(|r| r.json.as_str())
            .collect();
        let text = format!("[{}]", rows.join(","));
        Ok(serde_json::from_str(&text)?)
    }

    async fn toggle(&self, id: &str, active: bool) -> Result<(), StoreError> {
        let mut state = self.begin()?;
        let row = state
            .row_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        let mut value: Value = serde_json::from_str(&row.json)?;
        if let Some(object) = value.as_object_mut() {
            object.insert("active".to_string(), Value::Bool(active));
        }
        row.json = serde_json::to_string(&value)?;
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let mut state = self.begin()?;
        state.rows.retain(|r| r.id != id);
        Ok(())
    }
}
