pub mod backend;
pub mod config;
pub mod error;
pub mod gate;
pub mod wire;

pub use backend::{AutomationBackend, HttpBackend, MemoryBackend};
pub use config::BackendConfig;
pub use error::StoreError;
pub use gate::PersistenceGate;
