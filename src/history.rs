//! Undo/redo. Simple edits are recorded as invertible op diffs; structural
//! surgery (splits) is recorded as a whole-scene before/after snapshot pair.
//! A restoring flag suppresses recording while history itself mutates the
//! scene, so replay never records.

use crate::json::SceneDoc;
use crate::model::{Edge, EdgeId, End, EndpointRef, Label, Node, NodeId, Vec2};
use crate::Scene;
use log::{debug, warn};

/// One invertible primitive mutation. Removal ops carry the removed entity
/// so undo can recreate it at its original id.
#[derive(Clone, Debug, PartialEq)]
pub enum Op {
    AddNode { id: NodeId, node: Node },
    RemoveNode { id: NodeId, node: Node },
    AddEdge { id: EdgeId, edge: Edge },
    RemoveEdge { id: EdgeId, edge: Edge },
    MoveNode { id: NodeId, from: Vec2, to: Vec2 },
    EditVertices { id: EdgeId, from: Vec<Vec2>, to: Vec<Vec2> },
    EditLabel { id: EdgeId, index: usize, from: Label, to: Label },
    ChangeEndpoint { id: EdgeId, end: End, from: EndpointRef, to: EndpointRef },
    MoveAttachment { id: NodeId, from: f32, to: f32 },
}

/// One undoable unit: a batch of op diffs, or a snapshot pair.
#[derive(Clone, Debug, PartialEq)]
pub enum Transaction {
    Diff(Vec<Op>),
    Snapshot { before: SceneDoc, after: SceneDoc },
}

#[derive(Default)]
pub struct History {
    undo: Vec<Transaction>,
    redo: Vec<Transaction>,
    pending: Vec<Op>,
    batch_depth: u32,
    restoring: bool,
}

impl History {
    pub fn new() -> History {
        History::default()
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    pub fn is_restoring(&self) -> bool {
        self.restoring
    }

    pub(crate) fn set_restoring(&mut self, on: bool) {
        self.restoring = on;
    }

    /// Open a batch; ops recorded until the matching `end_batch` collapse
    /// into one transaction. Batches nest, only the outermost commits.
    pub fn begin_batch(&mut self) {
        self.batch_depth += 1;
    }

    pub fn end_batch(&mut self) {
        if self.batch_depth == 0 {
            warn!("end_batch without begin_batch");
            return;
        }
        self.batch_depth -= 1;
        if self.batch_depth == 0 && !self.pending.is_empty() {
            let ops = std::mem::take(&mut self.pending);
            self.commit(Transaction::Diff(ops));
        }
    }

    /// Record one op. Dropped while history itself is mutating the scene.
    /// Outside a batch the op commits immediately as its own transaction.
    pub(crate) fn record(&mut self, op: Op) {
        if self.restoring {
            return;
        }
        self.pending.push(op);
        if self.batch_depth == 0 {
            let ops = std::mem::take(&mut self.pending);
            self.commit(Transaction::Diff(ops));
        }
    }

    pub(crate) fn push_snapshot(&mut self, before: SceneDoc, after: SceneDoc) {
        if self.restoring {
            return;
        }
        self.commit(Transaction::Snapshot { before, after });
    }

    fn commit(&mut self, tx: Transaction) {
        debug!("commit transaction, undo depth {}", self.undo.len() + 1);
        self.undo.push(tx);
        self.redo.clear();
    }

    pub(crate) fn pop_undo(&mut self) -> Option<Transaction> {
        self.undo.pop()
    }

    pub(crate) fn pop_redo(&mut self) -> Option<Transaction> {
        self.redo.pop()
    }

    pub(crate) fn push_undone(&mut self, tx: Transaction) {
        self.redo.push(tx);
    }

    pub(crate) fn push_redone(&mut self, tx: Transaction) {
        self.undo.push(tx);
    }
}

/// Replay one op against the scene, forward or inverted. Replay of a
/// well-formed transaction always targets live ids; a miss means the stacks
/// and the scene have diverged, which is a bug upstream.
pub(crate) fn apply_op(scene: &mut Scene, op: &Op, forward: bool) {
    let ok = match op {
        Op::AddNode { id, node } => {
            if forward {
                scene.add_node_at(*id, node.clone())
            } else {
                scene.remove_node(*id).is_some()
            }
        }
        Op::RemoveNode { id, node } => {
            if forward {
                scene.remove_node(*id).is_some()
            } else {
                scene.add_node_at(*id, node.clone())
            }
        }
        Op::AddEdge { id, edge } => {
            if forward {
                scene.add_edge_at(*id, edge.clone())
            } else {
                scene.remove_edge(*id).is_some()
            }
        }
        Op::RemoveEdge { id, edge } => {
            if forward {
                scene.remove_edge(*id).is_some()
            } else {
                scene.add_edge_at(*id, edge.clone())
            }
        }
        Op::MoveNode { id, from, to } => {
            let p = if forward { to } else { from };
            scene.set_node_position(*id, p.x, p.y)
        }
        Op::EditVertices { id, from, to } => {
            let v = if forward { to } else { from };
            scene.set_vertices(*id, v.clone())
        }
        Op::EditLabel { id, index, from, to } => {
            let l = if forward { to } else { from };
            scene.set_label(*id, *index, l.clone())
        }
        Op::ChangeEndpoint { id, end, from, to } => {
            let r = if forward { to } else { from };
            scene.set_endpoint(*id, *end, *r)
        }
        Op::MoveAttachment { id, from, to } => {
            let r = if forward { *to } else { *from };
            scene.set_attachment_ratio(*id, r)
        }
    };
    if !ok {
        warn!("history replay missed its target: {:?}", op);
    }
}
