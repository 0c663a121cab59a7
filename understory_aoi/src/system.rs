// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The coordinate system: a node arena plus one sweep list per axis.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::{Drain, Vec};
use core::cmp::Ordering;
use core::fmt::Write as _;

use understory_sweep::{Direction, SweepList, SweepOrder};

use crate::node::{CoordNode, NodeKind};
use crate::types::{
    Axis, Crossing, NodeFlags, NodeId, Placement, Position, Side, TriggerRole, TriggerTag,
};

impl Default for CoordinateSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Owns coordinate nodes and keeps them sorted on X and Z.
///
/// Every structural change goes through this type. Moving a node re-sorts it locally on each
/// axis whose coordinate changed, and every boundary it overtakes (or that overtakes it) gets
/// to run its range check. The resulting [`Crossing`]s are buffered until
/// [`CoordinateSystem::drain_crossings`] is called.
#[derive(Clone)]
pub struct CoordinateSystem {
    nodes: Vec<Option<CoordNode>>, // slots
    generations: Vec<u32>,         // last generation per slot (persists across frees)
    free_list: Vec<usize>,
    x_list: SweepList,
    z_list: SweepList,
    count: usize,
    crossings: Vec<Crossing>,
}

impl core::fmt::Debug for CoordinateSystem {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("CoordinateSystem")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("members", &self.count)
            .field("free_list", &self.free_list.len())
            .field("pending_crossings", &self.crossings.len())
            .finish_non_exhaustive()
    }
}

/// Read-only view of the keys on one axis.
#[derive(Clone, Copy)]
struct AxisKeys<'a> {
    nodes: &'a [Option<CoordNode>],
    axis: Axis,
}

impl<'a> AxisKeys<'a> {
    fn node(&self, slot: usize) -> &'a CoordNode {
        self.nodes[slot]
            .as_ref()
            .expect("sweep list holds a freed node slot")
    }

    fn id(&self, slot: usize) -> NodeId {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId uses 32-bit indices by design."
        )]
        let idx = slot as u32;
        NodeId::new(idx, self.node(slot).generation)
    }

    fn compare(&self, a: usize, b: usize) -> Ordering {
        let (ka, ra) = self.node(a).key(self.axis);
        let (kb, rb) = self.node(b).key(self.axis);
        ka.partial_cmp(&kb).unwrap_or(Ordering::Equal).then(ra.cmp(&rb))
    }
}

impl SweepOrder for AxisKeys<'_> {
    fn precedes(&self, a: usize, b: usize) -> bool {
        self.compare(a, b) == Ordering::Less
    }
}

/// Re-sort context: keys plus the crossing sink fed by boundary pass hooks.
struct AxisSweep<'a> {
    keys: AxisKeys<'a>,
    crossings: &'a mut Vec<Crossing>,
}

impl SweepOrder for AxisSweep<'_> {
    fn precedes(&self, a: usize, b: usize) -> bool {
        self.keys.precedes(a, b)
    }

    fn pass(&mut self, mover: usize, passed: usize, _direction: Direction) {
        let keys = self.keys;
        let m = keys.node(mover);
        let p = keys.node(passed);
        if !m.is_silent()
            && let Some(c) = p.on_pass(keys.axis, keys.id(mover), m)
        {
            self.crossings.push(c);
        }
        if !p.is_silent()
            && let Some(c) = m.on_pass(keys.axis, keys.id(passed), p)
        {
            self.crossings.push(c);
        }
    }
}

impl CoordinateSystem {
    /// Create an empty coordinate system.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            x_list: SweepList::new(),
            z_list: SweepList::new(),
            count: 0,
            crossings: Vec::new(),
        }
    }

    /// Number of nodes currently in the axis lists (entities and boundaries).
    pub fn len(&self) -> usize {
        self.count
    }

    /// True if no node is in the axis lists.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Allocate a node. It is not a member of the axis lists until inserted.
    pub fn create_node(&mut self, kind: NodeKind, position: Position) -> NodeId {
        debug_assert!(position.is_finite(), "node positions must be finite");
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(CoordNode::new(generation, kind, position));
            (idx, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(CoordNode::new(generation, kind, position)));
            self.generations.push(generation);
            (self.nodes.len() - 1, generation)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "NodeId uses 32-bit indices by design."
        )]
        let idx = idx as u32;
        NodeId::new(idx, generation)
    }

    /// Free a node's slot. The node must not be a member.
    pub fn destroy_node(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        assert!(
            !self.is_member(id),
            "destroying a node that is still in the coordinate system"
        );
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Returns true if `id` refers to a live node (member or not).
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Returns true if `id` is live and linked into the axis lists.
    pub fn is_member(&self, id: NodeId) -> bool {
        self.is_alive(id) && self.x_list.contains(id.idx())
    }

    /// Node data, or `None` for a stale id.
    pub fn get(&self, id: NodeId) -> Option<&CoordNode> {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .filter(|n| n.generation == id.1)
    }

    /// Node data; panics if `id` is stale.
    pub fn node(&self, id: NodeId) -> &CoordNode {
        self.get(id).expect("dangling NodeId")
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut CoordNode {
        self.nodes
            .get_mut(id.idx())
            .and_then(|n| n.as_mut())
            .filter(|n| n.generation == id.1)
            .expect("dangling NodeId")
    }

    /// Current position of a node; panics if `id` is stale.
    pub fn position(&self, id: NodeId) -> Position {
        self.node(id).position
    }

    /// Flags of a node; panics if `id` is stale.
    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.node(id).flags
    }

    /// Link a node into both axis lists.
    ///
    /// The node is treated as arriving from infinitely far away: it starts at the head of both
    /// lists and is re-sorted into place, so every trigger whose square it lands in reports an
    /// enter.
    pub fn insert(&mut self, id: NodeId) {
        assert!(
            !self.is_member(id),
            "node is already in the coordinate system"
        );
        let node = self.node_mut(id);
        node.flags.remove(NodeFlags::REMOVING | NodeFlags::REMOVED | NodeFlags::PENDING);
        node.prev_position = Position::splat(f64::NEG_INFINITY);
        self.x_list.push_front(id.idx());
        self.z_list.push_front(id.idx());
        self.count += 1;
        self.resort(id, Axis::X);
        self.resort(id, Axis::Z);
        self.node_mut(id).reset_old();
    }

    /// Link a node immediately before or after `reference` on both axes, then re-sort it.
    ///
    /// The node's previous position is left as the caller set it, which lets a boundary being
    /// installed decide which side it is sweeping in from.
    pub fn insert_with_ref(&mut self, id: NodeId, reference: NodeId, placement: Placement) {
        assert!(
            self.is_member(reference),
            "insert reference is not in the coordinate system"
        );
        assert!(
            !self.is_member(id),
            "node is already in the coordinate system"
        );
        self.node_mut(id)
            .flags
            .remove(NodeFlags::REMOVING | NodeFlags::REMOVED | NodeFlags::PENDING);
        match placement {
            Placement::Before => {
                self.x_list.insert_before(id.idx(), reference.idx());
                self.z_list.insert_before(id.idx(), reference.idx());
            }
            Placement::After => {
                self.x_list.insert_after(id.idx(), reference.idx());
                self.z_list.insert_after(id.idx(), reference.idx());
            }
        }
        self.count += 1;
        self.resort(id, Axis::X);
        self.resort(id, Axis::Z);
        self.node_mut(id).reset_old();
    }

    /// Bulk insert of entity nodes that own no installed trigger.
    ///
    /// The batch is sorted per axis and merged into each list in one pass. Instead of sweeping
    /// every node in from infinity, one walk over the X list tracks the open trigger intervals
    /// and reports an enter for each new node inside a trigger's square. The result does not
    /// depend on the order of `ids`.
    pub fn insert_zero_radius_entities(&mut self, ids: &[NodeId]) {
        if ids.is_empty() {
            return;
        }
        for &id in ids {
            assert!(
                !self.is_member(id),
                "node is already in the coordinate system"
            );
            let node = self.node_mut(id);
            assert!(
                matches!(node.kind, NodeKind::Entity(_)),
                "bulk insert only accepts entity nodes"
            );
            node.flags.remove(NodeFlags::REMOVING | NodeFlags::REMOVED);
            node.flags.insert(NodeFlags::PENDING);
        }
        log::trace!("bulk insert of {} entity nodes", ids.len());

        let mut batch = ids.to_vec();
        for axis in [Axis::X, Axis::Z] {
            let keys = AxisKeys {
                nodes: &self.nodes,
                axis,
            };
            batch.sort_by(|a, b| keys.compare(a.idx(), b.idx()).then(a.cmp(b)));
            let list = match axis {
                Axis::X => &mut self.x_list,
                Axis::Z => &mut self.z_list,
            };
            let mut hint = list.head();
            for id in &batch {
                match hint {
                    Some(h) => list.insert_from(id.idx(), h, &keys),
                    None => list.push_front(id.idx()),
                }
                hint = Some(id.idx());
            }
        }
        self.count += ids.len();

        let mut open: BTreeMap<TriggerTag, usize> = BTreeMap::new();
        for slot in self.x_list.iter() {
            let node = self.nodes[slot]
                .as_ref()
                .expect("sweep list holds a freed node slot");
            match &node.kind {
                NodeKind::Boundary(b) => match b.side {
                    Side::Negative => {
                        open.insert(b.tag, slot);
                    }
                    Side::Positive => {
                        open.remove(&b.tag);
                    }
                },
                NodeKind::Entity(_) if node.flags.contains(NodeFlags::PENDING) => {
                    let subject = AxisKeys {
                        nodes: &self.nodes,
                        axis: Axis::X,
                    }
                    .id(slot);
                    for (&tag, &neg) in &open {
                        let Some(b) = self.nodes[neg].as_ref().and_then(|n| n.boundary()) else {
                            continue;
                        };
                        if b.origin != subject && b.contains(node.position) {
                            self.crossings.push(Crossing {
                                tag,
                                subject,
                                entered: true,
                            });
                        }
                    }
                }
                NodeKind::Entity(_) => {}
            }
        }

        for &id in ids {
            let node = self.node_mut(id);
            node.flags.remove(NodeFlags::PENDING);
            node.reset_old();
        }
    }

    /// Unlink a node from both axis lists.
    ///
    /// Removing a node that is already removed (or being removed) does nothing. Removing a
    /// node that was never inserted panics.
    pub fn remove(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        if node.flags.intersects(NodeFlags::REMOVING | NodeFlags::REMOVED) {
            return;
        }
        node.flags.insert(NodeFlags::REMOVING);
        assert!(
            self.x_list.contains(id.idx()),
            "removing a node that was never inserted"
        );
        self.x_list.remove(id.idx());
        self.z_list.remove(id.idx());
        let node = self.node_mut(id);
        node.flags.remove(NodeFlags::REMOVING);
        node.flags.insert(NodeFlags::REMOVED);
        node.on_remove();
        self.count -= 1;
    }

    /// Move a node. Entity nodes drag their trigger boundaries along.
    ///
    /// Each axis is re-sorted only if its coordinate changed, X before Z. Boundary nodes cannot
    /// be moved directly; they follow their origin and radius.
    pub fn update(&mut self, id: NodeId, position: Position) {
        debug_assert!(position.is_finite(), "node positions must be finite");
        let watchers = match &self.node(id).kind {
            NodeKind::Entity(e) => e.watchers.len(),
            NodeKind::Boundary(_) => {
                panic!("boundary nodes follow their origin; move the origin instead")
            }
        };
        self.move_node(id, position);
        for i in 0..watchers {
            let boundary = match &self.node(id).kind {
                NodeKind::Entity(e) => e.watchers[i],
                NodeKind::Boundary(_) => unreachable!("node kind changed during update"),
            };
            self.reposition_boundary(boundary);
        }
    }

    /// Recompute a boundary from its origin's current position and radius, and move it there.
    pub(crate) fn reposition_boundary(&mut self, id: NodeId) {
        let origin = self
            .node(id)
            .boundary()
            .expect("watcher is not a boundary node")
            .origin;
        let origin_position = self.position(origin);
        let b = self
            .node_mut(id)
            .boundary_mut()
            .expect("watcher is not a boundary node");
        b.origin_position = origin_position;
        let target = b.target();
        self.move_node(id, target);
    }

    fn move_node(&mut self, id: NodeId, position: Position) {
        assert!(
            self.is_member(id),
            "updating a node that is not in the coordinate system"
        );
        let node = self.node_mut(id);
        node.position = position;
        let prev = node.prev_position;
        if position.x != prev.x {
            self.resort(id, Axis::X);
        }
        if position.z != prev.z {
            self.resort(id, Axis::Z);
        }
        self.node_mut(id).reset_old();
    }

    fn resort(&mut self, id: NodeId, axis: Axis) -> usize {
        let mut sweep = AxisSweep {
            keys: AxisKeys {
                nodes: &self.nodes,
                axis,
            },
            crossings: &mut self.crossings,
        };
        let list = match axis {
            Axis::X => &mut self.x_list,
            Axis::Z => &mut self.z_list,
        };
        list.resort(id.idx(), &mut sweep)
    }

    /// Register `boundary` as following `origin`.
    pub(crate) fn add_watcher(&mut self, origin: NodeId, boundary: NodeId) {
        let watchers = self
            .node_mut(origin)
            .watchers_mut()
            .expect("trigger origin is not an entity node");
        if !watchers.contains(&boundary) {
            watchers.push(boundary);
        }
    }

    /// Stop `boundary` from following `origin`. A stale origin is ignored.
    pub(crate) fn remove_watcher(&mut self, origin: NodeId, boundary: NodeId) {
        if !self.is_alive(origin) {
            return;
        }
        if let Some(watchers) = self.node_mut(origin).watchers_mut() {
            watchers.retain(|w| *w != boundary);
        }
    }

    /// Take the crossings produced since the last drain, in the order they happened.
    pub fn drain_crossings(&mut self) -> Drain<'_, Crossing> {
        self.crossings.drain(..)
    }

    /// Member ids in X order.
    pub fn x_order(&self) -> Vec<NodeId> {
        self.order(&self.x_list)
    }

    /// Member ids in Z order.
    pub fn z_order(&self) -> Vec<NodeId> {
        self.order(&self.z_list)
    }

    fn order(&self, list: &SweepList) -> Vec<NodeId> {
        let keys = AxisKeys {
            nodes: &self.nodes,
            axis: Axis::X,
        };
        list.iter().map(|slot| keys.id(slot)).collect()
    }

    /// Human-readable dump of both axis lists, one line per axis.
    ///
    /// Entities print as `e<n>`, boundaries as `e<n>-` / `e<n>+` (with an `h` before the sign for
    /// hysteresis triggers), each followed by its coordinate. Not a stable format.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        for (name, axis, list) in [("X", Axis::X, &self.x_list), ("Z", Axis::Z, &self.z_list)] {
            let _ = write!(out, "{name}[{}]:", list.len());
            for slot in list.iter() {
                let Some(node) = self.nodes[slot].as_ref() else {
                    continue;
                };
                let v = node.position.on(axis);
                let _ = match &node.kind {
                    NodeKind::Entity(e) => write!(out, " e{}({v})", e.entity.0),
                    NodeKind::Boundary(b) => {
                        let h = match b.tag.role {
                            TriggerRole::Primary => "",
                            TriggerRole::Hysteresis => "h",
                        };
                        let sign = match b.side {
                            Side::Negative => '-',
                            Side::Positive => '+',
                        };
                        write!(out, " e{}{h}{sign}({v})", b.tag.witness.0)
                    }
                };
            }
            out.push('\n');
        }
        out
    }

    /// Full consistency check: list order and links, member count, and boundary placement.
    ///
    /// Panics on the first violation. Intended for tests and debugging.
    pub fn verify(&self) {
        for axis in [Axis::X, Axis::Z] {
            let keys = AxisKeys {
                nodes: &self.nodes,
                axis,
            };
            match axis {
                Axis::X => self.x_list.verify(&keys),
                Axis::Z => self.z_list.verify(&keys),
            }
        }
        assert_eq!(self.x_list.len(), self.count, "X list length drifted from count");
        assert_eq!(self.z_list.len(), self.count, "Z list length drifted from count");
        for slot in self.x_list.iter() {
            assert!(self.z_list.contains(slot), "node {slot} is only in the X list");
            let node = self.nodes[slot]
                .as_ref()
                .expect("sweep list holds a freed node slot");
            assert_eq!(
                node.prev_position, node.position,
                "node {slot} has a pending previous position"
            );
            if let NodeKind::Boundary(b) = &node.kind {
                assert!(
                    self.is_member(b.origin),
                    "boundary {slot} outlived its origin"
                );
                assert_eq!(
                    b.origin_position,
                    self.position(b.origin),
                    "boundary {slot} lags its origin"
                );
                assert_eq!(node.position, b.target(), "boundary {slot} is misplaced");
            }
        }
    }
}
