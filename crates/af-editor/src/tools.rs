//! Tool system for canvas interactions.
//!
//! Each tool translates pointer events into `ToolAction`s that the editor
//! applies: graph mutations go through the command stack, pans go to the
//! viewport. Handle clicks never reach a tool; the editor resolves them
//! first.
//!
//! | Tool     | Pointer-down on block | Pointer-down on canvas |
//! |----------|-----------------------|------------------------|
//! | Select   | drag the block        | clear selection        |
//! | Pan      | nothing               | pan the canvas         |
//!
//! A pointer-down on an edge counts as neither.

use crate::engine::GraphMutation;
use crate::input::InputEvent;
use af_core::id::NodeId;
use af_core::model::{Node, Point};

/// The active tool determines how pointer events are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    Select,
    Pan,
}

impl ToolKind {
    pub fn name(self) -> &'static str {
        match self {
            ToolKind::Select => "select",
            ToolKind::Pan => "pan",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "select" => Some(ToolKind::Select),
            "pan" => Some(ToolKind::Pan),
            _ => None,
        }
    }
}

/// What a tool asks the editor to do.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolAction {
    Mutate(GraphMutation),
    /// Translate the viewport by a raw screen delta.
    Pan { dx: f64, dy: f64 },
    /// A gesture that should become one undo step has started.
    BeginGesture,
    /// The current gesture ended.
    EndGesture,
}

/// Per-event context the editor resolves before dispatching to a tool.
#[derive(Debug, Clone, Copy)]
pub struct PointerContext<'a> {
    /// Pointer position in world coordinates.
    pub world: Point,
    /// Topmost block under the pointer, if any.
    pub hit: Option<&'a Node>,
    /// Nothing at all (block, handle or edge) is under the pointer.
    pub on_canvas: bool,
}

/// Trait for tools that handle input and produce actions.
pub trait Tool {
    fn kind(&self) -> ToolKind;

    /// Handle an input event, returning zero or more actions.
    fn handle(&mut self, event: &InputEvent, ctx: PointerContext<'_>) -> Vec<ToolAction>;

    /// Whether a gesture is in progress.
    fn is_active(&self) -> bool;

    /// Abort the gesture without producing further actions.
    fn reset(&mut self);
}

// ─── Select Tool ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    node: NodeId,
    /// `world_pointer - node.position` at grab time.
    offset: Point,
}

#[derive(Debug, Default)]
pub struct SelectTool {
    drag: Option<Drag>,
}

impl SelectTool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The block being dragged.
    pub fn dragging(&self) -> Option<NodeId> {
        self.drag.map(|d| d.node)
    }
}

impl Tool for SelectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn handle(&mut self, event: &InputEvent, ctx: PointerContext<'_>) -> Vec<ToolAction> {
        match event {
            InputEvent::PointerDown { .. } => {
                let Some(node) = ctx.hit else {
                    self.drag = None;
                    return vec![];
                };
                self.drag = Some(Drag {
                    node: node.id,
                    offset: ctx.world - node.position,
                });
                vec![ToolAction::BeginGesture]
            }
            InputEvent::PointerMove { .. } => {
                let Some(drag) = self.drag else {
                    return vec![];
                };
                vec![ToolAction::Mutate(GraphMutation::MoveNode {
                    id: drag.node,
                    position: ctx.world - drag.offset,
                })]
            }
            InputEvent::PointerUp { .. } => match self.drag.take() {
                Some(_) => vec![ToolAction::EndGesture],
                None => vec![],
            },
            InputEvent::Key { .. } => vec![],
        }
    }

    fn is_active(&self) -> bool {
        self.drag.is_some()
    }

    fn reset(&mut self) {
        self.drag = None;
    }
}

// ─── Pan Tool ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct PanTool {
    /// Last pointer position in screen coordinates while panning.
    last: Option<(f64, f64)>,
}

impl PanTool {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Tool for PanTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Pan
    }

    fn handle(&mut self, event: &InputEvent, ctx: PointerContext<'_>) -> Vec<ToolAction> {
        match event {
            InputEvent::PointerDown { x, y, .. } => {
                self.last = ctx.on_canvas.then_some((*x, *y));
                vec![]
            }
            InputEvent::PointerMove { x, y, .. } => {
                let Some((lx, ly)) = self.last else {
                    return vec![];
                };
                self.last = Some((*x, *y));
                vec![ToolAction::Pan {
                    dx: x - lx,
                    dy: y - ly,
                }]
            }
            InputEvent::PointerUp { .. } => {
                self.last = None;
                vec![]
            }
            InputEvent::Key { .. } => vec![],
        }
    }

    fn is_active(&self) -> bool {
        self.last.is_some()
    }

    fn reset(&mut self) {
        self.last = None;
    }
}
