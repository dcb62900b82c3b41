//! Undo/Redo command stack.
//!
//! Every mutation is wrapped in a reversible `Command`. Cheap mutations
//! record their inverse mutation; destructive ones (node and edge removal)
//! record graph snapshots before and after.
//!
//! Drag gestures use **snapshot batching**: the graph is captured at the
//! start and end of the gesture, so undo/redo restores the whole graph in
//! a single step instead of replaying every pointer-move.

use crate::engine::{EditorEngine, GraphMutation, Snapshot};
use crate::error::EditError;

/// A command that can be undone and redone.
#[derive(Debug, Clone)]
pub enum Command {
    /// Single mutation with its inverse.
    Single {
        forward: Box<GraphMutation>,
        inverse: Box<GraphMutation>,
        description: String,
    },
    /// Whole-graph states before and after.
    Snapshot {
        before: Snapshot,
        after: Snapshot,
        description: String,
    },
}

impl Command {
    pub fn description(&self) -> &str {
        match self {
            Command::Single { description, .. } | Command::Snapshot { description, .. } => {
                description
            }
        }
    }
}

/// Manages undo/redo stacks with batch grouping for drag gestures.
pub struct CommandStack {
    undo_stack: Vec<Command>,
    redo_stack: Vec<Command>,
    max_depth: usize,
    /// Batch nesting depth (0 = not batching).
    batch_depth: usize,
    batch_snapshot: Option<Snapshot>,
    batch_dirty: bool,
}

impl CommandStack {
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            max_depth,
            batch_depth: 0,
            batch_snapshot: None,
            batch_dirty: false,
        }
    }

    /// Start a batch group. Mutations until the matching `end_batch()` are
    /// applied live but recorded as one undo step.
    pub fn begin_batch(&mut self, engine: &EditorEngine) -> Result<(), EditError> {
        if self.batch_depth == 0 {
            self.batch_snapshot = Some(engine.snapshot()?);
            self.batch_dirty = false;
        }
        self.batch_depth += 1;
        Ok(())
    }

    /// End a batch group. When the outermost batch closes and something
    /// changed, one snapshot command is pushed.
    pub fn end_batch(&mut self, engine: &EditorEngine, description: &str) -> Result<(), EditError> {
        if self.batch_depth == 0 {
            return Ok(());
        }
        self.batch_depth -= 1;
        if self.batch_depth > 0 {
            return Ok(());
        }
        let before = self.batch_snapshot.take();
        let dirty = std::mem::take(&mut self.batch_dirty);
        if let Some(before) = before
            && dirty
        {
            let after = engine.snapshot()?;
            if before != after {
                self.push(Command::Snapshot {
                    before,
                    after,
                    description: description.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn in_batch(&self) -> bool {
        self.batch_depth > 0
    }

    /// Apply a mutation and record it. Returns whether anything changed.
    ///
    /// Mutations that change nothing leave the stacks untouched.
    pub fn execute(
        &mut self,
        engine: &mut EditorEngine,
        mutation: GraphMutation,
        description: &str,
    ) -> Result<bool, EditError> {
        if self.batch_depth > 0 {
            let changed = engine.apply_mutation(mutation);
            self.batch_dirty |= changed;
            return Ok(changed);
        }

        if mutation.is_destructive() {
            let before = engine.snapshot()?;
            if !engine.apply_mutation(mutation) {
                return Ok(false);
            }
            let after = engine.snapshot()?;
            self.push(Command::Snapshot {
                before,
                after,
                description: description.to_string(),
            });
            return Ok(true);
        }

        let Some(inverse) = compute_inverse(engine, &mutation) else {
            return Ok(false);
        };
        if !engine.apply_mutation(mutation.clone()) {
            return Ok(false);
        }
        self.push(Command::Single {
            forward: Box::new(mutation),
            inverse: Box::new(inverse),
            description: description.to_string(),
        });
        Ok(true)
    }

    /// Undo the last command. Returns its description.
    pub fn undo(&mut self, engine: &mut EditorEngine) -> Result<Option<String>, EditError> {
        let Some(cmd) = self.undo_stack.pop() else {
            return Ok(None);
        };
        match &cmd {
            Command::Single { inverse, .. } => {
                engine.apply_mutation(*inverse.clone());
            }
            Command::Snapshot { before, .. } => engine.restore(before)?,
        }
        let desc = cmd.description().to_string();
        log::debug!("undo: {desc}");
        self.redo_stack.push(cmd);
        Ok(Some(desc))
    }

    /// Redo the last undone command. Returns its description.
    pub fn redo(&mut self, engine: &mut EditorEngine) -> Result<Option<String>, EditError> {
        let Some(cmd) = self.redo_stack.pop() else {
            return Ok(None);
        };
        match &cmd {
            Command::Single { forward, .. } => {
                engine.apply_mutation(*forward.clone());
            }
            Command::Snapshot { after, .. } => engine.restore(after)?,
        }
        let desc = cmd.description().to_string();
        log::debug!("redo: {desc}");
        self.undo_stack.push(cmd);
        Ok(Some(desc))
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Forget all history (after loading a different automation).
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.batch_depth = 0;
        self.batch_snapshot = None;
        self.batch_dirty = false;
    }

    fn push(&mut self, cmd: Command) {
        self.undo_stack.push(cmd);
        if self.undo_stack.len() > self.max_depth {
            self.undo_stack.remove(0);
        }
        self.redo_stack.clear();
    }
}

/// Compute the mutation that undoes `mutation`, from the state before it is
/// applied. `None` when the target does not exist.
fn compute_inverse(engine: &EditorEngine, mutation: &GraphMutation) -> Option<GraphMutation> {
    let graph = engine.graph();
    match mutation {
        GraphMutation::AddNode { node } => Some(match graph.node(node.id) {
            Some(existing) => GraphMutation::AddNode {
                node: Box::new(existing.clone()),
            },
            None => GraphMutation::RemoveNode { id: node.id },
        }),
        GraphMutation::MoveNode { id, .. } => graph.node(*id).map(|n| GraphMutation::MoveNode {
            id: *id,
            position: n.position,
        }),
        GraphMutation::UpdateNodeData { id, .. } | GraphMutation::SetNodeData { id, .. } => {
            graph.node(*id).map(|n| GraphMutation::SetNodeData {
                id: *id,
                data: Box::new(n.data.clone()),
            })
        }
        GraphMutation::AddEdge { edge } => Some(GraphMutation::RemoveEdge { id: edge.id }),
        GraphMutation::Rename { .. } => Some(GraphMutation::Rename {
            name: engine.automation.name.clone(),
        }),
        // Destructive mutations are recorded as snapshots.
        GraphMutation::RemoveNode { .. } | GraphMutation::RemoveEdge { .. } => None,
    }
}
