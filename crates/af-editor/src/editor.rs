//! Canvas editor: the interaction state machine.
//!
//! Holds the mutation engine, command stack, viewport and active tool. All
//! host input funnels through [`Editor::handle_event`]. Pointer events are
//! resolved in this order:
//!
//! 1. Handle hits go to the connector and stop there.
//! 2. Any other click while a connection is pending cancels it.
//! 3. Everything else is dispatched to the active tool.
//!
//! Only one of Panning, Dragging and Connecting is active at a time.

use crate::commands::CommandStack;
use crate::config::EditorConfig;
use crate::connect::{ConnectOutcome, Connector, PendingConnection};
use crate::engine::{EditorEngine, GraphMutation};
use crate::error::EditError;
use crate::input::{InputEvent, Modifiers};
use crate::notice::{Notice, Notices};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use crate::tools::{PanTool, PointerContext, SelectTool, Tool, ToolAction, ToolKind};
use crate::viewport::Viewport;
use af_core::data::{NodeData, NodeType};
use af_core::geometry::{HandleResolver, Size};
use af_core::id::{EdgeId, NodeId};
use af_core::model::{Automation, Node, Point};
use af_render::{CubicBez, Hit, Line, edge_curve, hit_test, pending_line};
use serde_json::{Map, Value};
use std::time::Duration;

/// What is currently selected on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection {
    #[default]
    None,
    Node(NodeId),
    Edge(EdgeId),
}

/// The interaction state derived from the editor's parts.
#[derive(Debug, Clone, PartialEq)]
pub enum Interaction {
    Idle,
    Panning,
    Dragging(NodeId),
    Connecting(PendingConnection),
}

pub struct Editor {
    engine: EditorEngine,
    commands: CommandStack,
    viewport: Viewport,
    resolver: HandleResolver,
    connector: Connector,
    notices: Notices,
    active_tool: ToolKind,
    select_tool: SelectTool,
    pan_tool: PanTool,
    selection: Selection,
    /// Last pointer position in world coordinates.
    pointer: Point,
    /// Host clock, advanced by [`tick`](Self::tick).
    now: Duration,
    config: EditorConfig,
}

impl Editor {
    pub fn new(automation: Automation, config: EditorConfig) -> Self {
        Self {
            engine: EditorEngine::new(automation),
            commands: CommandStack::new(config.undo_depth),
            viewport: Viewport::new(&config),
            resolver: HandleResolver::new(),
            connector: Connector::new(),
            notices: Notices::new(config.notice_ttl()),
            active_tool: ToolKind::Select,
            select_tool: SelectTool::new(),
            pan_tool: PanTool::new(),
            selection: Selection::None,
            pointer: Point::default(),
            now: Duration::ZERO,
            config,
        }
    }

    /// Replace the automation being edited, dropping history and transient state.
    pub fn load(&mut self, automation: Automation) {
        self.engine.load(automation);
        self.commands.clear();
        self.connector.cancel();
        self.select_tool.reset();
        self.pan_tool.reset();
        self.resolver.clear();
        self.selection = Selection::None;
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn automation(&self) -> &Automation {
        &self.engine.automation
    }

    pub fn is_dirty(&self) -> bool {
        self.engine.is_dirty()
    }

    pub fn mark_saved(&mut self) {
        self.engine.mark_saved();
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Tell the editor where the canvas element sits on screen.
    pub fn set_canvas_origin(&mut self, origin: Point) {
        self.viewport.set_origin(origin);
    }

    pub fn resolver(&self) -> &HandleResolver {
        &self.resolver
    }

    /// Record a block's rendered size; anchors follow it from now on.
    pub fn record_size(&mut self, id: NodeId, size: Size) {
        self.resolver.record_size(id, size);
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    pub fn active_tool(&self) -> ToolKind {
        self.active_tool
    }

    pub fn interaction(&self) -> Interaction {
        if let Some(pending) = self.connector.pending() {
            Interaction::Connecting(pending.clone())
        } else if let Some(id) = self.select_tool.dragging() {
            Interaction::Dragging(id)
        } else if self.pan_tool.is_active() {
            Interaction::Panning
        } else {
            Interaction::Idle
        }
    }

    /// Notices visible right now.
    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.active(self.now)
    }

    /// Advance the host clock. Returns whether any notice expired.
    pub fn tick(&mut self, now: Duration) -> bool {
        self.now = now;
        self.notices.prune(now)
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// The dashed line from the first handle click to the pointer.
    pub fn pending_line(&self) -> Option<Line> {
        self.connector
            .pending()
            .map(|p| pending_line(p.start, self.pointer))
    }

    /// Curves for every drawable edge.
    pub fn edge_curves(&self) -> Vec<(EdgeId, CubicBez)> {
        let graph = self.engine.graph();
        graph
            .edges
            .iter()
            .filter_map(|e| edge_curve(graph, &self.resolver, e).map(|c| (e.id, c)))
            .collect()
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Feed one host event. Returns whether a re-render is needed.
    pub fn handle_event(&mut self, event: &InputEvent) -> Result<bool, EditError> {
        match event {
            InputEvent::PointerDown { x, y, .. } => self.pointer_down(event, *x, *y),
            InputEvent::PointerMove { x, y, .. } => {
                self.pointer = self.viewport.to_world(*x, *y);
                let actions = self.dispatch(event, None, false);
                let changed = self.apply_actions(actions)?;
                Ok(changed || self.connector.is_connecting())
            }
            InputEvent::PointerUp { x, y, .. } => {
                self.pointer = self.viewport.to_world(*x, *y);
                let actions = self.dispatch(event, None, false);
                self.apply_actions(actions)
            }
            InputEvent::Key { key, modifiers } => self.handle_key(key, *modifiers),
        }
    }

    fn pointer_down(&mut self, event: &InputEvent, x: f64, y: f64) -> Result<bool, EditError> {
        let world = self.viewport.to_world(x, y);
        self.pointer = world;
        let tolerance = self.config.hit_tolerance / self.viewport.scale;
        let hit = hit_test(self.engine.graph(), &self.resolver, world, tolerance);

        if let Hit::Handle { node, handle } = hit {
            let outcome = self
                .connector
                .click_handle(self.engine.graph(), node, handle, world);
            return self.resolve_connection(outcome);
        }

        if self.connector.cancel() {
            log::debug!("pending connection cancelled by {hit:?}");
            return Ok(true);
        }

        let hit_node = match hit {
            Hit::Node(id) => Some(id),
            _ => None,
        };
        let on_canvas = hit == Hit::Canvas;
        if self.active_tool == ToolKind::Select {
            self.selection = match hit {
                Hit::Node(id) => Selection::Node(id),
                Hit::Edge(id) => Selection::Edge(id),
                Hit::Canvas | Hit::Handle { .. } => Selection::None,
            };
        }
        let actions = self.dispatch(event, hit_node, on_canvas);
        self.apply_actions(actions)?;
        Ok(true)
    }

    fn resolve_connection(&mut self, outcome: ConnectOutcome) -> Result<bool, EditError> {
        match outcome {
            ConnectOutcome::Started | ConnectOutcome::Cancelled => Ok(true),
            ConnectOutcome::Connected(edge) => {
                self.selection = Selection::Edge(edge.id);
                self.commands
                    .execute(&mut self.engine, GraphMutation::AddEdge { edge }, "Connect blocks")?;
                Ok(true)
            }
            ConnectOutcome::Rejected(e) => {
                self.notices.push(e.to_string(), self.now);
                Ok(true)
            }
        }
    }

    fn dispatch(
        &mut self,
        event: &InputEvent,
        hit_node: Option<NodeId>,
        on_canvas: bool,
    ) -> Vec<ToolAction> {
        let hit = hit_node.and_then(|id| self.engine.automation.graph.node(id));
        let ctx = PointerContext {
            world: self.pointer,
            hit,
            on_canvas,
        };
        match self.active_tool {
            ToolKind::Select => self.select_tool.handle(event, ctx),
            ToolKind::Pan => self.pan_tool.handle(event, ctx),
        }
    }

    fn apply_actions(&mut self, actions: Vec<ToolAction>) -> Result<bool, EditError> {
        let mut changed = false;
        for action in actions {
            match action {
                ToolAction::Mutate(mutation) => {
                    changed |= self
                        .commands
                        .execute(&mut self.engine, mutation, "Move block")?;
                }
                ToolAction::Pan { dx, dy } => {
                    self.viewport.pan_by(dx, dy);
                    changed = true;
                }
                ToolAction::BeginGesture => self.commands.begin_batch(&self.engine)?,
                ToolAction::EndGesture => self.commands.end_batch(&self.engine, "Move block")?,
            }
        }
        Ok(changed)
    }

    fn handle_key(&mut self, key: &str, modifiers: Modifiers) -> Result<bool, EditError> {
        match ShortcutMap::resolve(key, modifiers) {
            Some(action) => self.dispatch_action(action),
            None => Ok(false),
        }
    }

    /// Run a shortcut action. Returns whether anything visible changed.
    pub fn dispatch_action(&mut self, action: ShortcutAction) -> Result<bool, EditError> {
        log::trace!("shortcut {}", action.name());
        match action {
            ShortcutAction::ToolSelect => Ok(self.set_tool(ToolKind::Select)),
            ShortcutAction::ToolPan => Ok(self.set_tool(ToolKind::Pan)),
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => self.delete_selected(),
            ShortcutAction::ZoomIn => {
                self.viewport.zoom_in();
                Ok(true)
            }
            ShortcutAction::ZoomOut => {
                self.viewport.zoom_out();
                Ok(true)
            }
            ShortcutAction::ZoomReset => {
                self.viewport.reset();
                Ok(true)
            }
            ShortcutAction::Escape => {
                if self.connector.cancel() {
                    return Ok(true);
                }
                let had = self.selection != Selection::None;
                self.selection = Selection::None;
                Ok(had)
            }
        }
    }

    // ─── Tools and view ──────────────────────────────────────────────────

    /// Switch the active tool. An in-progress drag or pan is ended.
    pub fn set_tool(&mut self, tool: ToolKind) -> bool {
        if tool == self.active_tool {
            return false;
        }
        if self.select_tool.is_active() {
            self.select_tool.reset();
            if let Err(e) = self.commands.end_batch(&self.engine, "Move block") {
                log::warn!("drag interrupted by tool switch: {e}");
            }
        }
        self.pan_tool.reset();
        log::debug!("tool {} -> {}", self.active_tool.name(), tool.name());
        self.active_tool = tool;
        true
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    // ─── Edits ───────────────────────────────────────────────────────────

    /// Add a block of `node_type` at a world position.
    pub fn add_node(&mut self, node_type: NodeType, position: Point) -> Result<NodeId, EditError> {
        let mut id = NodeId::generate();
        while self.engine.graph().contains(id) {
            id = NodeId::generate();
        }
        let node = Node::new(id, node_type, position);
        self.commands.execute(
            &mut self.engine,
            GraphMutation::AddNode {
                node: Box::new(node),
            },
            "Add block",
        )?;
        self.selection = Selection::Node(id);
        Ok(id)
    }

    /// Like [`add_node`](Self::add_node) for a type name from the palette.
    pub fn add_node_by_name(&mut self, type_name: &str, position: Point) -> Result<NodeId, EditError> {
        let node_type = NodeType::parse(type_name)?;
        self.add_node(node_type, position)
    }

    /// Shallow-merge `partial` into a block's data.
    pub fn update_node_data(
        &mut self,
        id: NodeId,
        partial: Map<String, Value>,
    ) -> Result<bool, EditError> {
        self.commands.execute(
            &mut self.engine,
            GraphMutation::UpdateNodeData { id, partial },
            "Edit block",
        )
    }

    /// Append a condition row to an `if_gate` block.
    pub fn add_condition(&mut self, id: NodeId) -> Result<bool, EditError> {
        let Some(NodeData::IfGate(config)) = self.engine.graph().node(id).map(|n| &n.data) else {
            return Ok(false);
        };
        let mut config = config.clone();
        config.push_condition();
        self.commands.execute(
            &mut self.engine,
            GraphMutation::SetNodeData {
                id,
                data: Box::new(NodeData::IfGate(config)),
            },
            "Add condition",
        )
    }

    pub fn rename(&mut self, name: &str) -> Result<bool, EditError> {
        self.commands.execute(
            &mut self.engine,
            GraphMutation::Rename {
                name: name.to_string(),
            },
            "Rename automation",
        )
    }

    pub fn select(&mut self, selection: Selection) {
        self.selection = selection;
    }

    /// Delete the selected block (with its edges) or edge.
    pub fn delete_selected(&mut self) -> Result<bool, EditError> {
        let changed = match self.selection {
            Selection::None => return Ok(false),
            Selection::Node(id) => {
                self.resolver.forget(id);
                self.commands
                    .execute(&mut self.engine, GraphMutation::RemoveNode { id }, "Delete block")?
            }
            Selection::Edge(id) => self.commands.execute(
                &mut self.engine,
                GraphMutation::RemoveEdge { id },
                "Delete connection",
            )?,
        };
        self.selection = Selection::None;
        Ok(changed)
    }

    pub fn undo(&mut self) -> Result<bool, EditError> {
        let result = self.commands.undo(&mut self.engine)?;
        self.drop_stale_selection();
        Ok(result.is_some())
    }

    pub fn redo(&mut self) -> Result<bool, EditError> {
        let result = self.commands.redo(&mut self.engine)?;
        self.drop_stale_selection();
        Ok(result.is_some())
    }

    pub fn can_undo(&self) -> bool {
        self.commands.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.commands.can_redo()
    }

    fn drop_stale_selection(&mut self) {
        let graph = self.engine.graph();
        let stale = match self.selection {
            Selection::None => false,
            Selection::Node(id) => !graph.contains(id),
            Selection::Edge(id) => graph.edge(id).is_none(),
        };
        if stale {
            self.selection = Selection::None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn editor() -> Editor {
        Editor::new(Automation::new("test"), EditorConfig::default())
    }

    #[test]
    fn starts_idle_in_select_mode() {
        let ed = editor();
        assert_eq!(ed.interaction(), Interaction::Idle);
        assert_eq!(ed.active_tool(), ToolKind::Select);
        assert!(ed.pending_line().is_none());
    }

    #[test]
    fn add_condition_grows_if_gate() {
        let mut ed = editor();
        let id = ed.add_node(NodeType::IfGate, Point::default()).unwrap();
        assert!(ed.add_condition(id).unwrap());
        let node = ed.automation().graph.node(id).unwrap();
        assert_eq!(node.data.condition_count(), Some(2));

        let other = ed.add_node(NodeType::Price, Point::new(500.0, 0.0)).unwrap();
        assert!(!ed.add_condition(other).unwrap());
    }

    #[test]
    fn add_node_by_name_rejects_unknown() {
        let mut ed = editor();
        match ed.add_node_by_name("teleport", Point::default()) {
            Err(EditError::Graph(_)) => {}
            other => panic!("expected graph error, got {other:?}"),
        }
        assert!(ed.automation().graph.nodes.is_empty());
        assert!(!ed.can_undo());
    }

    #[test]
    fn escape_clears_selection() {
        let mut ed = editor();
        ed.add_node(NodeType::Risk, Point::default()).unwrap();
        assert!(matches!(ed.selection(), Selection::Node(_)));
        assert!(ed.handle_event(&InputEvent::key("Escape")).unwrap());
        assert_eq!(ed.selection(), Selection::None);
    }

    #[test]
    fn undo_of_add_drops_selection() {
        let mut ed = editor();
        ed.add_node(NodeType::Risk, Point::default()).unwrap();
        assert!(ed.undo().unwrap());
        assert_eq!(ed.selection(), Selection::None);
        assert!(ed.automation().graph.nodes.is_empty());
    }
}
