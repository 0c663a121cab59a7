// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Range triggers: an axis-aligned square around an origin, made of two boundary nodes.

use crate::node::{BoundaryNode, NodeKind};
use crate::system::CoordinateSystem;
use crate::types::{NodeFlags, NodeId, Placement, Position, Side, TriggerTag};

/// A square of half-width `radius` around an origin node.
///
/// The square exists in the coordinate system as two hidden boundary nodes at
/// `origin - radius` and `origin + radius`. Nodes that pass them are checked against the
/// square and produce [`Crossing`](crate::Crossing)s tagged with this trigger's [`TriggerTag`].
///
/// The trigger owns its boundary nodes. They are created on first install, kept across
/// uninstall/install cycles, and freed by [`RangeTrigger::destroy`].
#[derive(Clone, Debug)]
pub struct RangeTrigger {
    tag: TriggerTag,
    origin: NodeId,
    radius: f64,
    negative: Option<NodeId>,
    positive: Option<NodeId>,
    installed: bool,
}

impl RangeTrigger {
    /// A trigger around `origin`. Nothing is linked until [`RangeTrigger::install`].
    pub fn new(tag: TriggerTag, origin: NodeId, radius: f64) -> Self {
        Self {
            tag,
            origin,
            radius,
            negative: None,
            positive: None,
            installed: false,
        }
    }

    /// Identity of this trigger.
    pub fn tag(&self) -> TriggerTag {
        self.tag
    }

    /// The origin node.
    pub fn origin(&self) -> NodeId {
        self.origin
    }

    /// Half-width of the square.
    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Whether both boundaries are in the axis lists.
    pub fn is_installed(&self) -> bool {
        self.installed
    }

    /// The negative and positive boundary nodes, once created.
    pub fn boundaries(&self) -> Option<(NodeId, NodeId)> {
        Some((self.negative?, self.positive?))
    }

    /// Link both boundaries next to the origin and sweep them out to the radius.
    ///
    /// The negative boundary completes before the positive one starts. Each is inserted
    /// directly beside the origin and only sweeps across the near side, so every node inside
    /// the square is reported as entered exactly once. Does nothing if already installed.
    pub fn install(&mut self, sys: &mut CoordinateSystem) {
        if self.installed {
            return;
        }
        debug_assert!(self.radius > 0.0, "installing a trigger with no extent");
        assert!(
            sys.is_member(self.origin),
            "range trigger origin is not in the coordinate system"
        );
        let origin_position = sys.position(self.origin);
        self.negative = Some(self.install_side(sys, Side::Negative, origin_position));
        self.positive = Some(self.install_side(sys, Side::Positive, origin_position));
        self.installed = true;
        log::debug!(
            "installed trigger {:?} with radius {}",
            self.tag,
            self.radius
        );
    }

    fn install_side(
        &self,
        sys: &mut CoordinateSystem,
        side: Side,
        origin_position: Position,
    ) -> NodeId {
        let fresh = BoundaryNode::new(self.tag, side, self.origin, self.radius, origin_position);
        let existing = match side {
            Side::Negative => self.negative,
            Side::Positive => self.positive,
        };
        let id = match existing {
            Some(id) => {
                let node = sys.node_mut(id);
                node.kind = NodeKind::Boundary(fresh);
                id
            }
            None => sys.create_node(NodeKind::Boundary(fresh), origin_position),
        };
        let node = sys.node_mut(id);
        let target = node
            .boundary()
            .expect("trigger boundary is not a boundary node")
            .target();
        node.position = target;
        node.prev_position = Position::splat(side.sign() * f64::INFINITY);
        node.flags.insert(NodeFlags::INSTALLING);

        sys.add_watcher(self.origin, id);
        let placement = match side {
            Side::Negative => Placement::Before,
            Side::Positive => Placement::After,
        };
        sys.insert_with_ref(id, self.origin, placement);
        sys.node_mut(id).flags.remove(NodeFlags::INSTALLING);
        id
    }

    /// Unlink both boundaries. Does nothing if not installed.
    ///
    /// No crossings are produced; the owner is responsible for tearing down whatever the
    /// trigger had reported as inside.
    pub fn uninstall(&mut self, sys: &mut CoordinateSystem) {
        if !self.installed {
            return;
        }
        let negative = self
            .negative
            .expect("installed range trigger lost its negative boundary");
        let positive = self
            .positive
            .expect("installed range trigger lost its positive boundary");
        for id in [negative, positive] {
            sys.remove(id);
            sys.remove_watcher(self.origin, id);
        }
        self.installed = false;
        log::debug!("uninstalled trigger {:?}", self.tag);
    }

    /// Change the radius, moving both boundaries (negative first).
    ///
    /// Installs the trigger if it is not installed.
    pub fn update(&mut self, sys: &mut CoordinateSystem, radius: f64) {
        self.radius = radius;
        if !self.installed {
            self.install(sys);
            return;
        }
        let (negative, positive) = self
            .boundaries()
            .expect("installed range trigger lost its boundaries");
        for id in [negative, positive] {
            sys.node_mut(id)
                .boundary_mut()
                .expect("trigger boundary is not a boundary node")
                .set_radius(radius);
        }
        sys.reposition_boundary(negative);
        sys.reposition_boundary(positive);
    }

    /// Uninstall and free the boundary nodes.
    pub fn destroy(&mut self, sys: &mut CoordinateSystem) {
        self.uninstall(sys);
        for id in [self.negative.take(), self.positive.take()].into_iter().flatten() {
            sys.destroy_node(id);
        }
    }
}
