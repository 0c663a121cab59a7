// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordinate nodes: entity nodes and trigger boundary nodes.

use alloc::vec::Vec;

use crate::types::{
    Axis, Crossing, EntityId, NodeFlags, NodeId, Position, Side, TriggerTag, in_span,
};

/// A positioned member of a [`CoordinateSystem`](crate::CoordinateSystem).
#[derive(Clone, Debug)]
pub struct CoordNode {
    pub(crate) generation: u32,
    pub(crate) position: Position,
    pub(crate) prev_position: Position,
    pub(crate) flags: NodeFlags,
    pub(crate) kind: NodeKind,
}

/// The two kinds of coordinate node.
#[derive(Clone, Debug)]
pub enum NodeKind {
    /// A node bound to an entity.
    Entity(EntityNode),
    /// One edge of a range trigger.
    Boundary(BoundaryNode),
}

/// Entity half of a [`NodeKind`].
#[derive(Clone, Debug)]
pub struct EntityNode {
    pub(crate) entity: EntityId,
    /// Boundary nodes of installed triggers whose origin is this node, in install order.
    pub(crate) watchers: Vec<NodeId>,
}

impl EntityNode {
    /// A node for `entity` with no watchers.
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            watchers: Vec::new(),
        }
    }

    /// The entity this node stands for.
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// Boundaries following this node.
    pub fn watchers(&self) -> &[NodeId] {
        &self.watchers
    }
}

/// Boundary half of a [`NodeKind`].
///
/// The boundary's coordinates are always `origin + radius` (with a signed radius), recomputed
/// whenever the origin moves or the radius changes. The previous origin and radius are kept
/// until the next reset so a pass can tell whether the other node *was* inside the square.
#[derive(Clone, Debug)]
pub struct BoundaryNode {
    pub(crate) tag: TriggerTag,
    pub(crate) side: Side,
    pub(crate) origin: NodeId,
    /// Signed: negative on the [`Side::Negative`] boundary.
    pub(crate) radius: f64,
    pub(crate) abs_radius: f64,
    pub(crate) old_radius: f64,
    pub(crate) origin_position: Position,
    pub(crate) old_origin: Position,
}

impl BoundaryNode {
    /// A boundary on `side` of `origin`, currently at `origin_position`.
    pub fn new(
        tag: TriggerTag,
        side: Side,
        origin: NodeId,
        radius: f64,
        origin_position: Position,
    ) -> Self {
        let abs_radius = if radius < 0.0 { -radius } else { radius };
        Self {
            tag,
            side,
            origin,
            radius: side.sign() * abs_radius,
            abs_radius,
            old_radius: abs_radius,
            origin_position,
            old_origin: origin_position,
        }
    }

    /// Trigger this boundary belongs to.
    pub fn tag(&self) -> TriggerTag {
        self.tag
    }

    /// Which edge of the square this is.
    pub fn side(&self) -> Side {
        self.side
    }

    /// The trigger's origin node.
    pub fn origin(&self) -> NodeId {
        self.origin
    }

    /// Signed offset from the origin.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    pub(crate) fn set_radius(&mut self, abs_radius: f64) {
        self.abs_radius = abs_radius;
        self.radius = self.side.sign() * abs_radius;
    }

    /// Where this boundary belongs given the cached origin position.
    pub(crate) fn target(&self) -> Position {
        Position::new(
            self.origin_position.x + self.radius,
            self.origin_position.y,
            self.origin_position.z + self.radius,
        )
    }

    /// Whether `p` lies inside the trigger's current square.
    pub(crate) fn contains(&self, p: Position) -> bool {
        in_span(p.x, self.origin_position.x, self.abs_radius)
            && in_span(p.z, self.origin_position.z, self.abs_radius)
    }

    /// Range check run when `subject` passes this boundary (or is passed by it) on `axis`.
    ///
    /// Z is resolved before X: an X pass whose Z status also changed reports nothing, since
    /// the Z pass of the same move reports it.
    fn check(
        &self,
        flags: NodeFlags,
        axis: Axis,
        subject: NodeId,
        node: &CoordNode,
    ) -> Option<Crossing> {
        if subject == self.origin {
            return None;
        }
        let installing = flags.contains(NodeFlags::INSTALLING);
        let was_z =
            !installing && in_span(node.prev_position.z, self.old_origin.z, self.old_radius);
        let is_z = in_span(node.position.z, self.origin_position.z, self.abs_radius);
        if axis == Axis::X && was_z != is_z {
            return None;
        }
        let was_x =
            !installing && in_span(node.prev_position.x, self.old_origin.x, self.old_radius);
        let is_x = in_span(node.position.x, self.origin_position.x, self.abs_radius);
        let was = was_x && was_z;
        let is = is_x && is_z;
        (was != is).then_some(Crossing {
            tag: self.tag,
            subject,
            entered: is,
        })
    }
}

impl CoordNode {
    pub(crate) fn new(generation: u32, kind: NodeKind, position: Position) -> Self {
        let flags = match kind {
            NodeKind::Entity(_) => NodeFlags::empty(),
            NodeKind::Boundary(_) => NodeFlags::HIDDEN,
        };
        Self {
            generation,
            position,
            prev_position: position,
            flags,
            kind,
        }
    }

    /// Current position.
    pub fn position(&self) -> Position {
        self.position
    }

    /// Position as of the last completed update.
    pub fn prev_position(&self) -> Position {
        self.prev_position
    }

    /// Lifecycle flags.
    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    /// Entity or boundary data.
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// The entity, for entity nodes.
    pub fn entity(&self) -> Option<EntityId> {
        match &self.kind {
            NodeKind::Entity(e) => Some(e.entity),
            NodeKind::Boundary(_) => None,
        }
    }

    /// The boundary data, for boundary nodes.
    pub fn boundary(&self) -> Option<&BoundaryNode> {
        match &self.kind {
            NodeKind::Boundary(b) => Some(b),
            NodeKind::Entity(_) => None,
        }
    }

    pub(crate) fn boundary_mut(&mut self) -> Option<&mut BoundaryNode> {
        match &mut self.kind {
            NodeKind::Boundary(b) => Some(b),
            NodeKind::Entity(_) => None,
        }
    }

    pub(crate) fn watchers_mut(&mut self) -> Option<&mut Vec<NodeId>> {
        match &mut self.kind {
            NodeKind::Entity(e) => Some(&mut e.watchers),
            NodeKind::Boundary(_) => None,
        }
    }

    /// Tie-break rank on an axis: negative boundaries, then entities, then positive boundaries.
    pub(crate) fn rank(&self) -> u8 {
        match &self.kind {
            NodeKind::Boundary(b) if b.side == Side::Negative => 0,
            NodeKind::Entity(_) => 1,
            NodeKind::Boundary(_) => 2,
        }
    }

    /// Sort key on `axis`.
    pub(crate) fn key(&self, axis: Axis) -> (f64, u8) {
        (self.position.on(axis), self.rank())
    }

    /// Whether passes involving this node are reported to the other node.
    pub(crate) fn is_silent(&self) -> bool {
        self.flags.intersects(NodeFlags::SILENT)
    }

    /// Pass hook: this node was passed by, or passed, `subject` on `axis`.
    pub(crate) fn on_pass(
        &self,
        axis: Axis,
        subject: NodeId,
        node: &CoordNode,
    ) -> Option<Crossing> {
        match &self.kind {
            NodeKind::Entity(_) => None,
            NodeKind::Boundary(b) => b.check(self.flags, axis, subject, node),
        }
    }

    /// Removal hook, run after the node is unlinked from both lists.
    pub(crate) fn on_remove(&mut self) {
        self.flags.remove(NodeFlags::INSTALLING | NodeFlags::PENDING);
        self.reset_old();
    }

    /// Make the current state the baseline for the next "was in range" check.
    pub(crate) fn reset_old(&mut self) {
        self.prev_position = self.position;
        if let NodeKind::Boundary(b) = &mut self.kind {
            b.old_radius = b.abs_radius;
            b.old_origin = b.origin_position;
        }
    }
}
