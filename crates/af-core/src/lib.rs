pub mod data;
pub mod error;
pub mod geometry;
pub mod handle;
pub mod id;
pub mod lint;
pub mod model;
pub mod validate;

pub use data::{Category, NodeData, NodeType};
pub use error::{ConnectionError, GraphError, StructureError};
pub use geometry::{HandleResolver, Size};
pub use handle::HandleId;
pub use id::{EdgeId, NodeId};
pub use lint::{LintDiagnostic, LintSeverity, lint_graph};
pub use model::*;
pub use validate::{Verdict, check_connection, validate_structure};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::graph::NodeIndex;
