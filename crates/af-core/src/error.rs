use thiserror::Error;

/// Errors raised by graph model operations that take untyped input.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unknown block type `{0}`")]
    UnknownNodeType(String),

    #[error("Invalid handle id `{0}`")]
    InvalidHandle(String),
}

/// Why a proposed edge was refused.
///
/// The `Display` text is shown to the user as a transient notice.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Action blocks cannot have outgoing connections")]
    ActionSource,

    #[error(
        "{from} blocks cannot be connected to {to} blocks. Conditional blocks can only connect to Action or Logic blocks"
    )]
    ConditionalTarget { from: String, to: String },

    #[error(
        "{from} blocks cannot be connected to {to} blocks. Logic blocks can only connect to Action or Logic blocks"
    )]
    LogicTarget { from: String, to: String },

    #[error(
        "{from} blocks cannot be connected to {to} blocks. Info blocks can only connect to Action blocks"
    )]
    InfoTarget { from: String, to: String },

    #[error("Unrecognized block type `{0}` cannot be connected")]
    UnknownType(String),

    #[error("{node_type} blocks do not have a `{handle}` handle")]
    MissingHandle { node_type: String, handle: String },

    #[error("`{0}` is an input handle and cannot start a connection")]
    InputAsSource(String),

    #[error("`{0}` is an output handle and cannot end a connection")]
    OutputAsTarget(String),

    #[error("Block `{0}` no longer exists")]
    MissingNode(String),
}

/// Structural problems that block a save. No network call is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("Automation must have a Conditional block")]
    MissingConditional,

    #[error("Automation must have an Action block")]
    MissingAction,

    #[error("Connection {index} references missing block `{node_id}`")]
    DanglingEdge { index: usize, node_id: String },

    #[error("Connection {index} connects block `{node_id}` to itself")]
    SelfLoop { index: usize, node_id: String },
}
