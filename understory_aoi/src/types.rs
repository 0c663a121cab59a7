// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types shared by the coordinate system, triggers and the space.

/// Identifier for a node in a [`CoordinateSystem`](crate::CoordinateSystem).
///
/// A slot index plus a generation counter. Destroying a node frees its slot; a later node
/// reusing the slot gets a higher generation, so a stale `NodeId` never aliases it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Identifier for an entity in a [`Space`](crate::Space).
///
/// Generational in the same way as [`NodeId`]. The total order is only used to keep interest
/// sets deterministic.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) u32, pub(crate) u32);

impl EntityId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// A point in space. Only `x` and `z` take part in interest management; `y` is carried along.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Position {
    /// Horizontal axis, first sweep axis.
    pub x: f64,
    /// Vertical axis, not swept.
    pub y: f64,
    /// Horizontal axis, second sweep axis.
    pub z: f64,
}

impl Position {
    /// The origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0, 0.0);

    /// Create a position.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Coordinate on a sweep axis.
    pub const fn on(self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Z => self.z,
        }
    }

    pub(crate) const fn splat(v: f64) -> Self {
        Self::new(v, v, v)
    }

    pub(crate) fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

/// One of the two sweep axes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// The X list.
    X,
    /// The Z list.
    Z,
}

bitflags::bitflags! {
    /// Lifecycle flags of a coordinate node.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Never reported to other nodes' pass hooks. Set on boundary nodes.
        const HIDDEN     = 0b0000_0001;
        /// Being unlinked; passes involving the node are ignored.
        const REMOVING   = 0b0000_0010;
        /// Unlinked from both axis lists.
        const REMOVED    = 0b0000_0100;
        /// Boundary in the middle of its install; it never reports "was in range".
        const INSTALLING = 0b0000_1000;
        /// Entity in the middle of a bulk insert.
        const PENDING    = 0b0001_0000;
    }
}

impl NodeFlags {
    /// Flags that keep a node out of other nodes' pass hooks.
    pub const SILENT: Self = Self::HIDDEN.union(Self::REMOVING).union(Self::REMOVED);
}

/// Which side of its origin a boundary node sits on.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// At `origin - radius`.
    Negative,
    /// At `origin + radius`.
    Positive,
}

impl Side {
    /// `-1.0` or `1.0`.
    pub const fn sign(self) -> f64 {
        match self {
            Self::Negative => -1.0,
            Self::Positive => 1.0,
        }
    }
}

/// Placement relative to a reference node for
/// [`CoordinateSystem::insert_with_ref`](crate::CoordinateSystem::insert_with_ref).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Immediately before the reference.
    Before,
    /// Immediately after the reference.
    After,
}

/// What a trigger is used for by its witness.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TriggerRole {
    /// The view range. Enters come only from this trigger.
    Primary,
    /// The view range widened by the hysteresis band. Used only to delay leaves.
    Hysteresis,
}

/// Identifies a range trigger: the witness that owns it and its role.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TriggerTag {
    /// Entity whose witness owns the trigger.
    pub witness: EntityId,
    /// Role of the trigger.
    pub role: TriggerRole,
}

/// A node crossing into or out of a trigger's square.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Crossing {
    /// Trigger whose square was crossed.
    pub tag: TriggerTag,
    /// Node that crossed.
    pub subject: NodeId,
    /// `true` for an enter, `false` for a leave.
    pub entered: bool,
}

/// Closed axis-aligned square test on one axis: `o - r <= v <= o + r`.
pub(crate) fn in_span(v: f64, origin: f64, abs_radius: f64) -> bool {
    v >= origin - abs_radius && v <= origin + abs_radius
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_is_inclusive() {
        assert!(in_span(5.0, 0.0, 5.0), "upper edge is inside");
        assert!(in_span(-5.0, 0.0, 5.0), "lower edge is inside");
        assert!(!in_span(5.000_001, 0.0, 5.0), "just past the edge is outside");
        assert!(!in_span(f64::NEG_INFINITY, 0.0, 5.0), "infinity is outside");
    }

    #[test]
    fn silent_flags() {
        assert!(NodeFlags::SILENT.contains(NodeFlags::HIDDEN));
        assert!(NodeFlags::SILENT.contains(NodeFlags::REMOVED));
        assert!(!NodeFlags::SILENT.contains(NodeFlags::INSTALLING));
    }

    #[test]
    fn tags_order_by_witness_then_role() {
        let a = TriggerTag {
            witness: EntityId::new(0, 1),
            role: TriggerRole::Hysteresis,
        };
        let b = TriggerTag {
            witness: EntityId::new(1, 1),
            role: TriggerRole::Primary,
        };
        assert!(a < b, "witness dominates role");
    }
}
