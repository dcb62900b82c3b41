//! Click-to-connect protocol.
//!
//! The first handle click records a pending connection; the second click on
//! a handle of another block resolves it through the connection validator.
//! Whatever the outcome, the pending connection is gone afterwards.

use af_core::error::ConnectionError;
use af_core::handle::HandleId;
use af_core::id::NodeId;
use af_core::model::{Edge, FlowGraph, Point};
use af_core::validate::{Verdict, check_connection};

/// A connection waiting for its target handle.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingConnection {
    pub node: NodeId,
    pub handle: HandleId,
    /// World position of the first click; the dashed line starts here.
    pub start: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectOutcome {
    /// First click: a pending connection was recorded.
    Started,
    /// Second click passed validation. The edge is not yet in the graph.
    Connected(Edge),
    /// Second click failed validation.
    Rejected(ConnectionError),
    /// Pending connection dropped silently.
    Cancelled,
}

#[derive(Debug, Default)]
pub struct Connector {
    pending: Option<PendingConnection>,
}

impl Connector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&PendingConnection> {
        self.pending.as_ref()
    }

    pub fn is_connecting(&self) -> bool {
        self.pending.is_some()
    }

    /// A handle was clicked at world position `at`.
    pub fn click_handle(
        &mut self,
        graph: &FlowGraph,
        node: NodeId,
        handle: HandleId,
        at: Point,
    ) -> ConnectOutcome {
        let Some(pending) = self.pending.take() else {
            log::debug!("connect from {node}.{handle}");
            self.pending = Some(PendingConnection {
                node,
                handle,
                start: at,
            });
            return ConnectOutcome::Started;
        };
        match check_connection(graph, pending.node, &pending.handle, node, &handle) {
            Verdict::Allow => {
                ConnectOutcome::Connected(Edge::new(pending.node, pending.handle, node, handle))
            }
            Verdict::Ignore => ConnectOutcome::Cancelled,
            Verdict::Reject(e) => ConnectOutcome::Rejected(e),
        }
    }

    /// Drop the pending connection. Returns whether one existed.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}
