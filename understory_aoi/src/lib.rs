// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_aoi --heading-base-level=0

//! Understory AOI: sweep-and-prune interest management for large numbers of moving entities.
//!
//! For every entity with a view radius it answers "what do I see" and "who sees me", and
//! reports changes as enter/leave events. Views are axis-aligned squares on the XZ plane;
//! `y` is carried but never tested.
//!
//! - Entities are kept sorted on X and on Z in two [`understory_sweep::SweepList`]s.
//! - A view is a [`RangeTrigger`]: two hidden boundary nodes at `origin - radius` and
//!   `origin + radius`. When a node passes a boundary the trigger checks the square, so the
//!   cost of a move is proportional to the boundaries it actually crosses.
//! - A [`Witness`] owns an entity's triggers and its two interest sets, and can delay leaves
//!   with a hysteresis band.
//! - A [`Space`] ties it together: it owns the [`CoordinateSystem`] and the entities, keeps
//!   the interest relation symmetric, and queues [`AoiEvent`]s.
//!
//! Coordinates are assumed to be finite (no NaNs). Squares are closed: an entity exactly on
//! the edge is inside.
//!
//! ## API overview
//!
//! - [`Space`]: entity table and event queue. Start here.
//! - [`CoordinateSystem`]: node arena and the two sweep lists; usable on its own.
//! - [`RangeTrigger`], [`Witness`]: the building blocks `Space` is made of.
//! - [`EntityId`], [`NodeId`]: generational handles.
//!
//! Key operations:
//! - [`Space::add_entity`] / [`Space::add_zero_radius_entities`] / [`Space::remove_entity`]
//! - [`Space::move_entity`]
//! - [`Space::set_view_radius`] (with an optional hysteresis band)
//! - [`Space::drain_events`] or [`Space::dispatch_events`] to consume [`AoiEvent`]s.
//!
//! ## Example
//!
//! ```rust
//! use understory_aoi::{AoiEvent, Position, Space};
//!
//! let mut space = Space::new();
//! let a = space.add_entity(Position::new(0.0, 0.0, 0.0));
//! let b = space.add_entity(Position::new(20.0, 0.0, 0.0));
//! space.set_view_radius(a, 5.0, 0.0);
//!
//! // b walks into a's view.
//! space.move_entity(b, Position::new(4.0, 0.0, 1.0));
//! let events: Vec<_> = space.drain_events().collect();
//! assert_eq!(events, [AoiEvent::Enter { watcher: a, other: b }]);
//! assert!(space.interest_in(a).unwrap().contains(&b));
//! assert!(space.interested_by(b).unwrap().contains(&a));
//!
//! // And out again.
//! space.move_entity(b, Position::new(4.0, 0.0, 9.0));
//! assert_eq!(space.drain_events().next(), Some(AoiEvent::Leave { watcher: a, other: b }));
//! ```
//!
//! ## Hysteresis
//!
//! With a hysteresis band `h`, entering still needs the `radius` square, but leaving only
//! happens outside the `radius + h` square. This stops entities that hover on the edge of a
//! view from flickering in and out. Bands of [`HYSTERESIS_EPSILON`] or less are ignored.
//!
//! This crate is `no_std` and uses `alloc`. Logging goes through the `log` facade; nothing is
//! logged unless the application installs a logger.

#![no_std]

extern crate alloc;

pub mod node;
pub mod space;
pub mod system;
pub mod trigger;
pub mod types;
pub mod witness;

pub use node::{BoundaryNode, CoordNode, EntityNode, NodeKind};
pub use space::{AoiEvent, AoiListener, Space};
pub use system::CoordinateSystem;
pub use trigger::RangeTrigger;
pub use types::{
    Axis, Crossing, EntityId, NodeFlags, NodeId, Placement, Position, Side, TriggerRole,
    TriggerTag,
};
pub use witness::{HYSTERESIS_EPSILON, Witness};
