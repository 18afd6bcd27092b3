//! The recorded mutation surface. Every edit validates against the current
//! scene first, then mutates, then records; nothing is recorded for an edit
//! that fails, so the undo stack never holds a partial transaction.

use crate::algorithms::anchor::would_cycle;
use crate::algorithms::attach;
use crate::algorithms::split::{self, SplitOutcome, SplitSpec};
use crate::command::{Applied, Command};
use crate::error::{EditError, ResolutionError};
use crate::geometry::tolerance::clamp01;
use crate::history::{apply_op, History, Op, Transaction};
use crate::json;
use crate::model::{Edge, EdgeId, End, EndpointRef, Label, Node, NodeId, Vec2};
use crate::view::View;
use crate::Scene;
use log::debug;

/// An in-progress decoration drag. Intermediate ratios are written live but
/// unrecorded; only the start-to-end move lands in history.
#[derive(Clone, Copy, Debug)]
pub struct AttachmentDrag {
    node: NodeId,
    start: f32,
}

#[derive(Default)]
pub struct Editor {
    scene: Scene,
    history: History,
}

impl Editor {
    pub fn new() -> Editor {
        Editor::default()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Group the edits until the matching `end_batch` into one undo step.
    pub fn begin_batch(&mut self) {
        self.history.begin_batch();
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    // Entity edits

    pub fn add_node(&mut self, node: Node) -> Result<NodeId, EditError> {
        if let Some(a) = &node.attachment {
            if self.scene.edge(a.host).is_none() {
                return Err(EditError::UnknownEdge(a.host));
            }
        }
        let id = self.scene.add_node(node);
        let stored = self.scene.node(id).cloned();
        if let Some(stored) = stored {
            self.history.record(Op::AddNode { id, node: stored });
        }
        Ok(id)
    }

    pub fn add_edge(&mut self, edge: Edge) -> Result<EdgeId, EditError> {
        self.check_ref(&edge.source)?;
        self.check_ref(&edge.target)?;
        let id = self.scene.add_edge(edge);
        let stored = self.scene.edge(id).cloned();
        if let Some(stored) = stored {
            self.history.record(Op::AddEdge { id, edge: stored });
        }
        Ok(id)
    }

    /// Remove a node and everything that can no longer resolve without it:
    /// edges anchored to the node, then their own dependents, recursively.
    /// The whole cascade is one undo step.
    pub fn remove_node(&mut self, id: NodeId) -> Result<(), EditError> {
        if self.scene.node(id).is_none() {
            return Err(EditError::UnknownNode(id));
        }
        self.begin_batch();
        self.remove_node_cascade(id);
        self.end_batch();
        Ok(())
    }

    /// Remove an edge, the edges ratio-anchored to it, and the decorations
    /// riding on it, recursively, as one undo step.
    pub fn remove_edge(&mut self, id: EdgeId) -> Result<(), EditError> {
        if self.scene.edge(id).is_none() {
            return Err(EditError::UnknownEdge(id));
        }
        self.begin_batch();
        self.remove_edge_cascade(id);
        self.end_batch();
        Ok(())
    }

    // The entity comes out of the scene before its dependents are visited,
    // so the walk terminates even on a malformed reference graph. Its removal
    // op is recorded after the cascade: undo replays inverses in reverse
    // order, so the entity reappears before anything that depends on it.

    fn remove_node_cascade(&mut self, id: NodeId) {
        let Some(node) = self.scene.remove_node(id) else {
            return;
        };
        for (eid, _) in self.scene.edges_anchored_to_node(id) {
            self.remove_edge_cascade(eid);
        }
        debug!("cascade removed node {}", id);
        self.history.record(Op::RemoveNode { id, node });
    }

    fn remove_edge_cascade(&mut self, id: EdgeId) {
        let Some(edge) = self.scene.remove_edge(id) else {
            return;
        };
        for (eid, _) in self.scene.edges_referencing(id) {
            self.remove_edge_cascade(eid);
        }
        for nid in self.scene.attachments_on(id) {
            self.remove_node_cascade(nid);
        }
        debug!("cascade removed edge {}", id);
        self.history.record(Op::RemoveEdge { id, edge });
    }

    pub fn move_node(&mut self, id: NodeId, to: Vec2) -> Result<(), EditError> {
        let n = self.scene.node(id).ok_or(EditError::UnknownNode(id))?;
        if !to.is_finite() {
            return Err(ResolutionError::NonFinite.into());
        }
        let from = Vec2::new(n.x, n.y);
        if from == to {
            return Ok(());
        }
        self.scene.set_node_position(id, to.x, to.y);
        self.history.record(Op::MoveNode { id, from, to });
        Ok(())
    }

    pub fn edit_vertices(&mut self, id: EdgeId, to: Vec<Vec2>) -> Result<(), EditError> {
        let e = self.scene.edge(id).ok_or(EditError::UnknownEdge(id))?;
        if to.iter().any(|v| !v.is_finite()) {
            return Err(ResolutionError::NonFinite.into());
        }
        let from = e.vertices.clone();
        if from == to {
            return Ok(());
        }
        self.scene.set_vertices(id, to.clone());
        self.history.record(Op::EditVertices { id, from, to });
        Ok(())
    }

    pub fn edit_label(&mut self, id: EdgeId, index: usize, mut to: Label) -> Result<(), EditError> {
        let e = self.scene.edge(id).ok_or(EditError::UnknownEdge(id))?;
        let from = e
            .labels
            .get(index)
            .cloned()
            .ok_or(EditError::LabelOutOfRange { edge: id, index })?;
        to.distance = clamp01(to.distance);
        if from == to {
            return Ok(());
        }
        self.scene.set_label(id, index, to.clone());
        self.history.record(Op::EditLabel { id, index, from, to });
        Ok(())
    }

    pub fn change_endpoint(
        &mut self,
        id: EdgeId,
        end: End,
        mut to: EndpointRef,
    ) -> Result<(), EditError> {
        let e = self.scene.edge(id).ok_or(EditError::UnknownEdge(id))?;
        let from = *e.endpoint(end);
        self.check_ref(&to)?;
        if let EndpointRef::EdgeRatio { ratio, .. } = &mut to {
            *ratio = clamp01(*ratio);
        }
        if would_cycle(&self.scene, id, &to) {
            return Err(EditError::WouldCycle);
        }
        if from == to {
            return Ok(());
        }
        self.scene.set_endpoint(id, end, to);
        self.history.record(Op::ChangeEndpoint { id, end, from, to });
        Ok(())
    }

    pub fn move_attachment(&mut self, id: NodeId, to: f32) -> Result<(), EditError> {
        let n = self.scene.node(id).ok_or(EditError::UnknownNode(id))?;
        let a = n.attachment.ok_or(EditError::NoAttachment(id))?;
        let to = clamp01(to);
        if a.ratio == to {
            return Ok(());
        }
        self.scene.set_attachment_ratio(id, to);
        self.history.record(Op::MoveAttachment { id, from: a.ratio, to });
        Ok(())
    }

    // Attachment drags

    pub fn begin_attachment_drag(&self, node: NodeId) -> Result<AttachmentDrag, EditError> {
        let n = self.scene.node(node).ok_or(EditError::UnknownNode(node))?;
        let a = n.attachment.ok_or(EditError::NoAttachment(node))?;
        Ok(AttachmentDrag { node, start: a.ratio })
    }

    /// Live update during a drag: writes the ratio and reprojects the
    /// decoration without recording anything.
    pub fn drag_attachment<V: View + ?Sized>(
        &mut self,
        view: &V,
        drag: &AttachmentDrag,
        ratio: f32,
    ) -> Result<(), EditError> {
        if !self.scene.set_attachment_ratio(drag.node, ratio) {
            return Err(EditError::NoAttachment(drag.node));
        }
        let placement = attach::project(&self.scene, view, drag.node)?;
        attach::apply_placement(&mut self.scene, drag.node, &placement);
        Ok(())
    }

    /// Close a drag: one `MoveAttachment` from the pre-drag ratio to the
    /// final one, or nothing if the decoration ended where it started.
    pub fn end_attachment_drag(&mut self, drag: AttachmentDrag) -> Result<(), EditError> {
        let n = self.scene.node(drag.node).ok_or(EditError::UnknownNode(drag.node))?;
        let a = n.attachment.ok_or(EditError::NoAttachment(drag.node))?;
        if a.ratio != drag.start {
            self.history.record(Op::MoveAttachment {
                id: drag.node,
                from: drag.start,
                to: a.ratio,
            });
        }
        Ok(())
    }

    /// Reproject every decoration riding on `host` after its geometry
    /// changed. Derived poses only; nothing is recorded.
    pub fn refresh_attachments<V: View + ?Sized>(
        &mut self,
        view: &V,
        host: EdgeId,
    ) -> Result<(), EditError> {
        attach::relax_shared_host(&mut self.scene, view, host)?;
        for nid in self.scene.attachments_on(host) {
            let placement = attach::project(&self.scene, view, nid)?;
            attach::apply_placement(&mut self.scene, nid, &placement);
        }
        Ok(())
    }

    // Structural surgery

    /// Split an edge, recorded as a before/after snapshot transaction.
    pub fn split_edge<V: View + ?Sized>(
        &mut self,
        view: &V,
        edge: EdgeId,
        spec: SplitSpec,
    ) -> Result<SplitOutcome, EditError> {
        self.execute_with_snapshot(|scene| {
            split::split_edge(scene, view, edge, spec).map_err(EditError::from)
        })
    }

    /// Run an arbitrary scene mutation as one snapshot transaction. On error
    /// the scene is rolled back to the pre-call state and nothing is
    /// recorded.
    pub fn execute_with_snapshot<T>(
        &mut self,
        f: impl FnOnce(&mut Scene) -> Result<T, EditError>,
    ) -> Result<T, EditError> {
        let before = json::snapshot(&self.scene);
        match f(&mut self.scene) {
            Ok(value) => {
                let after = json::snapshot(&self.scene);
                self.history.push_snapshot(before, after);
                Ok(value)
            }
            Err(err) => {
                json::restore(&mut self.scene, &before);
                Err(err)
            }
        }
    }

    // History traversal

    pub fn undo(&mut self) -> bool {
        let Some(tx) = self.history.pop_undo() else {
            return false;
        };
        self.history.set_restoring(true);
        match &tx {
            Transaction::Diff(ops) => {
                for op in ops.iter().rev() {
                    apply_op(&mut self.scene, op, false);
                }
            }
            Transaction::Snapshot { before, .. } => json::restore(&mut self.scene, before),
        }
        self.history.set_restoring(false);
        self.history.push_undone(tx);
        true
    }

    pub fn redo(&mut self) -> bool {
        let Some(tx) = self.history.pop_redo() else {
            return false;
        };
        self.history.set_restoring(true);
        match &tx {
            Transaction::Diff(ops) => {
                for op in ops {
                    apply_op(&mut self.scene, op, true);
                }
            }
            Transaction::Snapshot { after, .. } => json::restore(&mut self.scene, after),
        }
        self.history.set_restoring(false);
        self.history.push_redone(tx);
        true
    }

    /// Dispatch one serialized command. The `from` fields carried by move
    /// and edit commands are advisory wire data; the scene's current values
    /// are what history records.
    pub fn apply<V: View + ?Sized>(
        &mut self,
        view: &V,
        cmd: Command,
    ) -> Result<Applied, EditError> {
        match cmd {
            Command::AddNode { node } => self.add_node(node).map(Applied::Node),
            Command::RemoveNode { id } => self.remove_node(id).map(|_| Applied::Done),
            Command::AddEdge { edge } => self.add_edge(edge).map(Applied::Edge),
            Command::RemoveEdge { id } => self.remove_edge(id).map(|_| Applied::Done),
            Command::MoveNode { id, to, .. } => self.move_node(id, to).map(|_| Applied::Done),
            Command::EditVertices { id, to, .. } => {
                self.edit_vertices(id, to).map(|_| Applied::Done)
            }
            Command::EditLabel { id, index, to, .. } => {
                self.edit_label(id, index, to).map(|_| Applied::Done)
            }
            Command::ChangeEndpoint { id, end, to, .. } => {
                self.change_endpoint(id, end, to).map(|_| Applied::Done)
            }
            Command::MoveAttachment { id, to, .. } => {
                self.move_attachment(id, to).map(|_| Applied::Done)
            }
            Command::SplitEdge { id, spec } => self
                .split_edge(view, id, spec)
                .map(|out| Applied::Segments(out.segments)),
        }
    }

    fn check_ref(&self, r: &EndpointRef) -> Result<(), EditError> {
        match *r {
            EndpointRef::Point { .. } => Ok(()),
            EndpointRef::Node { node } => {
                if self.scene.node(node).is_none() {
                    return Err(EditError::UnknownNode(node));
                }
                Ok(())
            }
            EndpointRef::EdgeRatio { edge, .. } => {
                if self.scene.edge(edge).is_none() {
                    return Err(EditError::UnknownEdge(edge));
                }
                Ok(())
            }
        }
    }
}
