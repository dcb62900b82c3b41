//! Handle anchor geometry.
//!
//! Every node type declares its size (fixed, or computed from `data` for
//! nodes with condition rows). A renderer that measures nodes after layout
//! can record the measured size, which then takes precedence.

use crate::data::{NodeData, NodeType};
use crate::handle::HandleId;
use crate::id::NodeId;
use crate::model::{Node, Point};
use smallvec::SmallVec;
use std::collections::HashMap;

/// Height of the title bar above the first condition row.
pub const HEADER_HEIGHT: f64 = 45.0;
/// Height of one condition row.
pub const ROW_HEIGHT: f64 = 40.0;
/// Size used when nothing more specific is known.
pub const FALLBACK_SIZE: Size = Size::new(320.0, 100.0);

const LOGIC_GATE_SIZE: Size = Size::new(220.0, 90.0);
const INFO_SIZE: Size = Size::new(280.0, 100.0);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Handle list of one node. Four fixed handles, or `2N + 1` row handles.
pub type HandleList = SmallVec<[HandleId; 8]>;

impl NodeData {
    /// Size the node renders at, derived from its type and data.
    pub fn declared_size(&self) -> Size {
        if let Some(conditions) = self.condition_count() {
            let rows = conditions + 1;
            return Size::new(FALLBACK_SIZE.width, HEADER_HEIGHT + rows as f64 * ROW_HEIGHT);
        }
        match self.node_type() {
            Some(NodeType::LogicGate) => LOGIC_GATE_SIZE,
            Some(NodeType::EmailInfo | NodeType::RhInfo) => INFO_SIZE,
            _ => FALLBACK_SIZE,
        }
    }
}

/// Handles a node exposes, in drawing order.
pub fn handles(node: &Node) -> HandleList {
    match node.data.condition_count() {
        Some(rows) => {
            let mut list = HandleList::new();
            for row in 0..rows {
                list.push(HandleId::In(row));
                list.push(HandleId::Out(row));
            }
            list.push(HandleId::OutElse);
            list
        }
        None => HandleId::FIXED.iter().cloned().collect(),
    }
}

/// Whether `node` renders `handle`. Fixed handles are accepted on every node.
pub fn has_handle(node: &Node, handle: &HandleId) -> bool {
    match (handle, node.data.condition_count()) {
        (HandleId::Top | HandleId::Bottom | HandleId::Left | HandleId::Right, _) => true,
        (HandleId::In(row) | HandleId::Out(row), Some(rows)) => *row < rows,
        (HandleId::OutElse, Some(_)) => true,
        (_, None) => false,
    }
}

/// Resolves handle anchor points in world coordinates.
#[derive(Debug, Clone, Default)]
pub struct HandleResolver {
    measured: HashMap<NodeId, Size>,
}

impl HandleResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a size measured by the renderer. Overrides the declared size.
    pub fn record_size(&mut self, id: NodeId, size: Size) {
        self.measured.insert(id, size);
    }

    pub fn forget(&mut self, id: NodeId) {
        self.measured.remove(&id);
    }

    pub fn clear(&mut self) {
        self.measured.clear();
    }

    pub fn size_of(&self, node: &Node) -> Size {
        self.measured
            .get(&node.id)
            .copied()
            .unwrap_or_else(|| node.data.declared_size())
    }

    /// Anchor point of `handle` on `node`.
    pub fn anchor(&self, node: &Node, handle: &HandleId) -> Point {
        let Size { width: w, height: h } = self.size_of(node);
        let Point { x, y } = node.position;
        match handle {
            HandleId::Top => Point::new(x + w / 2.0, y),
            HandleId::Bottom => Point::new(x + w / 2.0, y + h),
            HandleId::Left => Point::new(x, y + h / 2.0),
            HandleId::Right => Point::new(x + w, y + h / 2.0),
            HandleId::In(row) => Point::new(x, y + row_center(*row)),
            HandleId::Out(row) => Point::new(x + w, y + row_center(*row)),
            HandleId::OutElse => {
                let row = node.data.condition_count().unwrap_or(0);
                Point::new(x + w, y + row_center(row))
            }
        }
    }
}

/// Offset from the node's top edge to the middle of row `row`.
pub fn row_center(row: usize) -> f64 {
    HEADER_HEIGHT + row as f64 * ROW_HEIGHT + ROW_HEIGHT / 2.0
}
