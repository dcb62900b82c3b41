pub mod commands;
pub mod config;
pub mod connect;
pub mod editor;
pub mod engine;
pub mod error;
pub mod input;
pub mod notice;
pub mod shortcuts;
pub mod tools;
pub mod viewport;

pub use config::EditorConfig;
pub use connect::{ConnectOutcome, PendingConnection};
pub use editor::{Editor, Interaction, Selection};
pub use engine::GraphMutation;
pub use error::{ConfigError, EditError};
pub use input::{InputEvent, Modifiers};
pub use tools::ToolKind;
pub use viewport::Viewport;
