// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The space: entities, their witnesses, and the event queue.

use alloc::collections::{BTreeSet, VecDeque};
use alloc::collections::vec_deque::Drain;
use alloc::string::String;
use alloc::vec::Vec;
use kurbo::Rect;

use crate::node::{EntityNode, NodeKind};
use crate::system::CoordinateSystem;
use crate::types::{Crossing, EntityId, NodeId, Position, in_span};
use crate::witness::Witness;

/// A change in what an entity sees.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum AoiEvent {
    /// `other` came into `watcher`'s view.
    Enter {
        /// Entity whose view changed.
        watcher: EntityId,
        /// Entity that came into view.
        other: EntityId,
    },
    /// `other` left `watcher`'s view (or was removed).
    Leave {
        /// Entity whose view changed.
        watcher: EntityId,
        /// Entity that left the view.
        other: EntityId,
    },
}

impl AoiEvent {
    /// Entity whose view changed.
    pub fn watcher(&self) -> EntityId {
        match *self {
            Self::Enter { watcher, .. } | Self::Leave { watcher, .. } => watcher,
        }
    }

    /// Entity that entered or left.
    pub fn other(&self) -> EntityId {
        match *self {
            Self::Enter { other, .. } | Self::Leave { other, .. } => other,
        }
    }
}

/// Receiver for [`Space::dispatch_events`].
///
/// The listener gets the space back, so it may move, add or remove entities while handling an
/// event. Events caused by that are queued behind the ones already pending.
pub trait AoiListener {
    /// Handle one event.
    fn on_event(&mut self, space: &mut Space, event: AoiEvent);
}

impl<F: FnMut(&mut Space, AoiEvent)> AoiListener for F {
    fn on_event(&mut self, space: &mut Space, event: AoiEvent) {
        self(space, event);
    }
}

#[derive(Clone, Debug)]
struct EntitySlot {
    generation: u32,
    node: NodeId,
    witness: Witness,
}

impl Default for Space {
    fn default() -> Self {
        Self::new()
    }
}

/// A set of entities sharing one coordinate system.
///
/// Every mutating call settles all crossings it causes before returning: interest sets are
/// updated on both sides, and the matching [`AoiEvent`]s are queued. Read them with
/// [`Space::drain_events`] or [`Space::dispatch_events`].
///
/// Entity ids that are no longer live are logged and ignored.
#[derive(Clone)]
pub struct Space {
    system: CoordinateSystem,
    entities: Vec<Option<EntitySlot>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
    scratch: Vec<Crossing>,
    events: VecDeque<AoiEvent>,
}

impl core::fmt::Debug for Space {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Space")
            .field("entities", &self.len())
            .field("system", &self.system)
            .field("pending_events", &self.events.len())
            .finish_non_exhaustive()
    }
}

impl Space {
    /// Create an empty space.
    pub fn new() -> Self {
        Self {
            system: CoordinateSystem::new(),
            entities: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            scratch: Vec::new(),
            events: VecDeque::new(),
        }
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.entities.iter().filter(|e| e.is_some()).count()
    }

    /// True if there are no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.iter().all(Option::is_none)
    }

    /// Whether `id` refers to a live entity.
    pub fn contains(&self, id: EntityId) -> bool {
        self.slot(id).is_some()
    }

    /// Live entity ids in slot order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.iter().enumerate().filter_map(|(idx, e)| {
            let e = e.as_ref()?;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "EntityId uses 32-bit indices by design."
            )]
            let idx = idx as u32;
            Some(EntityId::new(idx, e.generation))
        })
    }

    /// Add an entity with no view. Entities already watching its position see it enter.
    pub fn add_entity(&mut self, position: Position) -> EntityId {
        let id = self.spawn(position);
        let node = self.node_of(id);
        self.system.insert(node);
        log::debug!("added {id:?} at {position:?}");
        self.settle();
        id
    }

    /// Add many entities with no view in one pass.
    ///
    /// Equivalent to calling [`Space::add_entity`] for each position, but the sweep lists are
    /// merged once instead of being walked per entity.
    pub fn add_zero_radius_entities(&mut self, positions: &[Position]) -> Vec<EntityId> {
        let ids: Vec<EntityId> = positions.iter().map(|&p| self.spawn(p)).collect();
        let nodes: Vec<NodeId> = ids.iter().map(|&id| self.node_of(id)).collect();
        self.system.insert_zero_radius_entities(&nodes);
        log::debug!("added {} entities in bulk", ids.len());
        self.settle();
        ids
    }

    /// Remove an entity. Everyone who saw it, and everything it saw, gets a leave.
    ///
    /// Removing an entity that is already gone does nothing.
    pub fn remove_entity(&mut self, id: EntityId) {
        let Some(idx) = self.slot_index(id) else {
            log::debug!("remove of stale {id:?}");
            return;
        };
        let (node, (interest_in, interested_by)) = {
            let slot = self.entities[idx].as_mut().expect("live entity slot");
            (slot.node, slot.witness.detach(&mut self.system))
        };
        self.settle();
        for other in interest_in {
            if let Some(o) = self.witness_mut(other) {
                o.del_interested_by(id);
            }
            self.events.push_back(AoiEvent::Leave { watcher: id, other });
        }
        for watcher in interested_by {
            if let Some(w) = self.witness_mut(watcher) {
                w.del_interest_in(id);
            }
            self.events.push_back(AoiEvent::Leave { watcher, other: id });
        }
        self.system.remove(node);
        self.system.destroy_node(node);
        self.entities[idx] = None;
        self.free_list.push(idx);
        log::debug!("removed {id:?}");
    }

    /// Move an entity, along with its view.
    pub fn move_entity(&mut self, id: EntityId, position: Position) {
        let Some(slot) = self.slot(id) else {
            log::warn!("move of stale {id:?}");
            return;
        };
        if !position.is_finite() {
            log::warn!("ignoring non-finite position {position:?} for {id:?}");
            return;
        }
        let node = slot.node;
        self.system.update(node, position);
        self.settle();
    }

    /// Set an entity's view radius and hysteresis band.
    ///
    /// A radius of zero or less removes the view. Anything the entity saw that is now outside
    /// its view (including the band) leaves.
    pub fn set_view_radius(&mut self, id: EntityId, radius: f64, hysteresis: f64) {
        let Some(idx) = self.slot_index(id) else {
            log::warn!("set_view_radius on stale {id:?}");
            return;
        };
        let slot = self.entities[idx].as_mut().expect("live entity slot");
        slot.witness
            .set_view_radius(&mut self.system, radius, hysteresis);
        self.settle();
        self.prune(id);
    }

    /// Reinstall an entity's view at its current radius.
    pub fn install_view_trigger(&mut self, id: EntityId) {
        let Some(idx) = self.slot_index(id) else {
            log::warn!("install_view_trigger on stale {id:?}");
            return;
        };
        let slot = self.entities[idx].as_mut().expect("live entity slot");
        slot.witness.install_view_trigger(&mut self.system);
        self.settle();
    }

    /// Take an entity's view out of the coordinate system. Everything it saw leaves.
    pub fn uninstall_view_trigger(&mut self, id: EntityId) {
        let Some(idx) = self.slot_index(id) else {
            log::warn!("uninstall_view_trigger on stale {id:?}");
            return;
        };
        let slot = self.entities[idx].as_mut().expect("live entity slot");
        slot.witness.uninstall_view_trigger(&mut self.system);
        self.settle();
        self.prune(id);
    }

    /// Entities `id` sees.
    pub fn interest_in(&self, id: EntityId) -> Option<&BTreeSet<EntityId>> {
        self.slot(id).map(|s| s.witness.interest_in())
    }

    /// Entities that see `id`.
    pub fn interested_by(&self, id: EntityId) -> Option<&BTreeSet<EntityId>> {
        self.slot(id).map(|s| s.witness.interested_by())
    }

    /// Current position of `id`.
    pub fn position(&self, id: EntityId) -> Option<Position> {
        self.slot(id).map(|s| self.system.position(s.node))
    }

    /// View radius of `id` (zero when it has no view).
    pub fn view_radius(&self, id: EntityId) -> Option<f64> {
        self.slot(id).map(|s| s.witness.view_radius())
    }

    /// The view square of `id` on the XZ plane, with `z` mapped to the rectangle's `y`.
    pub fn view_rect(&self, id: EntityId) -> Option<Rect> {
        let slot = self.slot(id)?;
        let p = self.system.position(slot.node);
        let r = slot.witness.view_radius();
        Some(Rect::new(p.x - r, p.z - r, p.x + r, p.z + r))
    }

    /// Entities whose XZ position lies in `rect`, edges included.
    ///
    /// A linear scan over all entities, independent of the sweep lists.
    pub fn entities_in_rect(&self, rect: Rect) -> Vec<EntityId> {
        self.entities()
            .filter(|&id| {
                let p = self.system.position(self.node_of(id));
                p.x >= rect.x0 && p.x <= rect.x1 && p.z >= rect.y0 && p.z <= rect.y1
            })
            .collect()
    }

    /// The witness of `id`.
    pub fn witness(&self, id: EntityId) -> Option<&Witness> {
        self.slot(id).map(|s| &s.witness)
    }

    /// The coordinate node of `id`.
    pub fn node(&self, id: EntityId) -> Option<NodeId> {
        self.slot(id).map(|s| s.node)
    }

    /// The underlying coordinate system.
    pub fn coordinate_system(&self) -> &CoordinateSystem {
        &self.system
    }

    /// Human-readable dump of the sweep lists.
    pub fn dump(&self) -> String {
        self.system.dump()
    }

    /// Take all queued events in order.
    pub fn drain_events(&mut self) -> Drain<'_, AoiEvent> {
        self.events.drain(..)
    }

    /// Number of queued events.
    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Hand queued events to `listener` one at a time, until the queue is empty.
    pub fn dispatch_events<L: AoiListener + ?Sized>(&mut self, listener: &mut L) {
        while let Some(event) = self.events.pop_front() {
            listener.on_event(self, event);
        }
    }

    /// Check the coordinate system and the symmetry of every interest pair.
    ///
    /// Panics on the first violation. Intended for tests and debugging.
    pub fn verify(&self) {
        self.system.verify();
        for id in self.entities() {
            let w = &self.slot(id).expect("live entity slot").witness;
            for &other in w.interest_in() {
                let o = self
                    .witness(other)
                    .expect("interest in an entity that is gone");
                assert!(
                    o.interested_by().contains(&id),
                    "{id:?} sees {other:?} but is not recorded as seeing it"
                );
            }
            for &other in w.interested_by() {
                let o = self
                    .witness(other)
                    .expect("interested-by an entity that is gone");
                assert!(
                    o.interest_in().contains(&id),
                    "{other:?} is recorded as seeing {id:?} but does not"
                );
            }
        }
    }

    // --- internals ---

    fn spawn(&mut self, position: Position) -> EntityId {
        debug_assert!(position.is_finite(), "entity positions must be finite");
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            (idx, generation)
        } else {
            self.entities.push(None);
            self.generations.push(1);
            (self.entities.len() - 1, 1)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "EntityId uses 32-bit indices by design."
        )]
        let id = EntityId::new(idx as u32, generation);
        let node = self
            .system
            .create_node(NodeKind::Entity(EntityNode::new(id)), position);
        let mut witness = Witness::new();
        witness.attach(id, node);
        self.entities[idx] = Some(EntitySlot {
            generation,
            node,
            witness,
        });
        id
    }

    fn slot_index(&self, id: EntityId) -> Option<usize> {
        self.slot(id).map(|_| id.idx())
    }

    fn slot(&self, id: EntityId) -> Option<&EntitySlot> {
        self.entities
            .get(id.idx())
            .and_then(|e| e.as_ref())
            .filter(|e| e.generation == id.1)
    }

    fn witness_mut(&mut self, id: EntityId) -> Option<&mut Witness> {
        self.entities
            .get_mut(id.idx())
            .and_then(|e| e.as_mut())
            .filter(|e| e.generation == id.1)
            .map(|e| &mut e.witness)
    }

    fn node_of(&self, id: EntityId) -> NodeId {
        self.slot(id).expect("dangling EntityId").node
    }

    /// Apply every crossing the coordinate system produced since the last call.
    fn settle(&mut self) {
        let mut crossings = core::mem::take(&mut self.scratch);
        crossings.extend(self.system.drain_crossings());
        for crossing in crossings.drain(..) {
            self.apply(crossing);
        }
        self.scratch = crossings;
    }

    fn apply(&mut self, crossing: Crossing) {
        let Some(other) = self.system.get(crossing.subject).and_then(|n| n.entity()) else {
            return;
        };
        let watcher = crossing.tag.witness;
        let role = crossing.tag.role;
        let Some(w) = self.witness_mut(watcher) else {
            return;
        };
        if crossing.entered {
            if !w.accepts_enter(role) || !w.add_interest_in(other) {
                return;
            }
            if let Some(o) = self.witness_mut(other) {
                o.add_interested_by(watcher);
            }
            self.events.push_back(AoiEvent::Enter { watcher, other });
        } else {
            if !w.accepts_leave(role) || !w.del_interest_in(other) {
                return;
            }
            if let Some(o) = self.witness_mut(other) {
                o.del_interested_by(watcher);
            }
            self.events.push_back(AoiEvent::Leave { watcher, other });
        }
    }

    /// Drop whatever `id` sees outside its current leave range.
    fn prune(&mut self, id: EntityId) {
        let Some(slot) = self.slot(id) else {
            return;
        };
        let range = slot.witness.leave_range();
        let center = self.system.position(slot.node);
        let stale: Vec<EntityId> = slot
            .witness
            .interest_in()
            .iter()
            .copied()
            .filter(|&other| match range {
                None => true,
                Some(r) => self.position(other).is_none_or(|p| {
                    !(in_span(p.x, center.x, r) && in_span(p.z, center.z, r))
                }),
            })
            .collect();
        for other in stale {
            if let Some(w) = self.witness_mut(id) {
                w.del_interest_in(other);
            }
            if let Some(o) = self.witness_mut(other) {
                o.del_interested_by(id);
            }
            self.events.push_back(AoiEvent::Leave { watcher: id, other });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn p(x: f64, z: f64) -> Position {
        Position::new(x, 0.0, z)
    }

    fn seen(space: &Space, id: EntityId) -> Vec<EntityId> {
        space.interest_in(id).unwrap().iter().copied().collect()
    }

    fn seen_by(space: &Space, id: EntityId) -> Vec<EntityId> {
        space.interested_by(id).unwrap().iter().copied().collect()
    }

    /// Recompute every interest set by brute force and compare.
    fn check_oracle(space: &Space) {
        space.verify();
        for id in space.entities() {
            let w = space.witness(id).unwrap();
            let expected: BTreeSet<EntityId> = match w.leave_range() {
                Some(_) => {
                    let rect = space.view_rect(id).unwrap();
                    space
                        .entities_in_rect(rect)
                        .into_iter()
                        .filter(|&o| o != id)
                        .collect()
                }
                None => BTreeSet::new(),
            };
            assert_eq!(
                w.interest_in(),
                &expected,
                "interest of {id:?} disagrees with a brute-force scan\n{}",
                space.dump()
            );
        }
    }

    #[test]
    fn lone_watcher() {
        let mut space = Space::new();
        let a = space.add_entity(p(0.0, 0.0));
        space.set_view_radius(a, 5.0, 0.0);
        assert!(seen(&space, a).is_empty());
        assert!(seen_by(&space, a).is_empty());
        assert_eq!(
            space.dump(),
            "X[3]: e0-(-5) e0(0) e0+(5)\nZ[3]: e0-(-5) e0(0) e0+(5)\n"
        );
        assert_eq!(space.drain_events().count(), 0);
    }

    #[test]
    fn two_watchers_see_each_other() {
        let mut space = Space::new();
        let a = space.add_entity(p(0.0, 0.0));
        space.set_view_radius(a, 5.0, 0.0);
        let b = space.add_entity(p(2.0, 2.0));
        space.set_view_radius(b, 5.0, 0.0);
        assert_eq!(seen(&space, a), [b]);
        assert_eq!(seen(&space, b), [a]);
        assert_eq!(seen_by(&space, a), [b]);
        assert_eq!(
            space.dump().lines().next().unwrap(),
            "X[6]: e0-(-5) e1-(-3) e0(0) e1(2) e0+(5) e1+(7)"
        );
        let events: Vec<_> = space.drain_events().collect();
        assert_eq!(
            events,
            [
                AoiEvent::Enter {
                    watcher: a,
                    other: b
                },
                AoiEvent::Enter {
                    watcher: b,
                    other: a
                },
            ]
        );
        check_oracle(&space);
    }

    #[test]
    fn removing_a_watcher_updates_the_rest() {
        let mut space = Space::new();
        let ids: Vec<_> = [(0.0, 0.0), (2.0, 2.0), (5.0, 5.0)]
            .into_iter()
            .map(|(x, z)| {
                let id = space.add_entity(p(x, z));
                space.set_view_radius(id, 5.0, 0.0);
                id
            })
            .collect();
        check_oracle(&space);
        space.drain_events();

        let a = ids[0];
        let a_node = space.node(a).unwrap();
        space.remove_entity(a);
        assert!(!space.contains(a));
        assert!(!space.coordinate_system().is_alive(a_node));
        let sys = space.coordinate_system();
        assert_eq!(sys.len(), 6, "two entities with two boundaries each");
        assert!(!sys.x_order().contains(&a_node));
        assert!(!sys.z_order().contains(&a_node));
        for event in space.drain_events() {
            assert!(matches!(event, AoiEvent::Leave { .. }));
            assert!(event.watcher() == a || event.other() == a);
        }
        check_oracle(&space);

        space.remove_entity(a);
        assert_eq!(space.len(), 2, "second removal is a no-op");
        assert_eq!(space.pending_events(), 0);
    }

    #[test]
    fn wide_view_joins_existing_group() {
        let mut space = Space::new();
        let abc: Vec<_> = [(0.0, 0.0), (2.0, 2.0), (5.0, 5.0)]
            .into_iter()
            .map(|(x, z)| {
                let id = space.add_entity(p(x, z));
                space.set_view_radius(id, 5.0, 0.0);
                id
            })
            .collect();
        let before: Vec<_> = abc.iter().map(|&id| seen(&space, id)).collect();
        let d = space.add_entity(p(30.0, 30.0));
        space.set_view_radius(d, 100.0, 0.0);
        assert_eq!(seen(&space, d), abc);
        let after: Vec<_> = abc.iter().map(|&id| seen(&space, id)).collect();
        assert_eq!(before, after);
        check_oracle(&space);
    }

    #[test]
    fn radius_changes_track_oracle() {
        let mut space = Space::new();
        let a = space.add_entity(p(0.0, 0.0));
        let b = space.add_entity(p(2.0, 2.0));
        let c = space.add_entity(p(5.0, 5.0));
        space.set_view_radius(b, 5.0, 0.0);
        space.set_view_radius(c, 5.0, 0.0);
        for radius in [5.0, 0.0, 200.0, 3.0, 0.0] {
            space.set_view_radius(a, radius, 0.0);
            check_oracle(&space);
        }
    }

    #[test]
    fn zero_radius_entities_see_nothing() {
        let mut space = Space::new();
        let a = space.add_entity(p(0.0, 0.0));
        let b = space.add_entity(p(0.0, 0.0));
        space.move_entity(b, p(1.0, 0.0));
        assert!(seen(&space, a).is_empty());
        assert!(seen(&space, b).is_empty());
        assert_eq!(space.pending_events(), 0);
    }

    #[test]
    fn diagonal_move_fires_once() {
        let mut space = Space::new();
        let a = space.add_entity(p(0.0, 0.0));
        space.set_view_radius(a, 5.0, 0.0);
        let b = space.add_entity(p(-10.0, -10.0));
        space.drain_events();
        // Crosses the negative X and negative Z boundaries in the same move.
        space.move_entity(b, p(-4.0, -4.0));
        let events: Vec<_> = space.drain_events().collect();
        assert_eq!(events, [AoiEvent::Enter { watcher: a, other: b }]);
        // And out through both positive boundaries.
        space.move_entity(b, p(6.0, 6.0));
        let events: Vec<_> = space.drain_events().collect();
        assert_eq!(events, [AoiEvent::Leave { watcher: a, other: b }]);
        check_oracle(&space);
    }

    #[test]
    fn hysteresis_delays_leave_only() {
        let mut space = Space::new();
        let a = space.add_entity(p(0.0, 0.0));
        space.set_view_radius(a, 5.0, 3.0);
        let b = space.add_entity(p(6.0, 0.0));
        assert!(seen(&space, a).is_empty(), "the band alone does not grant interest");

        space.move_entity(b, p(4.0, 0.0));
        assert_eq!(seen(&space, a), [b]);
        space.move_entity(b, p(7.5, 0.0));
        assert_eq!(seen(&space, a), [b], "inside the band interest is kept");
        space.move_entity(b, p(8.5, 0.0));
        assert!(seen(&space, a).is_empty());
        space.move_entity(b, p(7.0, 0.0));
        assert!(seen(&space, a).is_empty());

        // Dropping the band tears down what is only inside it.
        space.move_entity(b, p(3.0, 0.0));
        space.move_entity(b, p(7.0, 0.0));
        assert_eq!(seen(&space, a), [b]);
        space.set_view_radius(a, 5.0, 0.0);
        assert!(seen(&space, a).is_empty());
        assert!(seen_by(&space, b).is_empty());
        check_oracle(&space);
    }

    #[test]
    fn uninstall_tears_down_and_install_restores() {
        let mut space = Space::new();
        let a = space.add_entity(p(0.0, 0.0));
        let b = space.add_entity(p(1.0, 1.0));
        space.set_view_radius(a, 5.0, 0.0);
        assert_eq!(seen(&space, a), [b]);
        space.uninstall_view_trigger(a);
        assert!(seen(&space, a).is_empty());
        assert!(seen_by(&space, b).is_empty());
        space.uninstall_view_trigger(a);
        space.install_view_trigger(a);
        assert_eq!(seen(&space, a), [b]);
        let events: Vec<_> = space.drain_events().collect();
        assert_eq!(
            events,
            [
                AoiEvent::Enter { watcher: a, other: b },
                AoiEvent::Leave { watcher: a, other: b },
                AoiEvent::Enter { watcher: a, other: b },
            ]
        );
    }

    #[test]
    fn bulk_insert_is_order_independent() {
        let positions: Vec<_> = (0..40_i32)
            .map(|i| {
                let f = f64::from(i);
                p((f * 7.3) % 23.0 - 11.0, (f * 3.1) % 19.0 - 9.0)
            })
            .collect();
        let mut results = Vec::new();
        for reversed in [false, true] {
            let mut space = Space::new();
            let w = space.add_entity(p(0.0, 0.0));
            space.set_view_radius(w, 6.0, 1.5);
            let mut input = positions.clone();
            if reversed {
                input.reverse();
            }
            space.add_zero_radius_entities(&input);
            check_oracle_band(&space, w, 6.0);
            let mut seen_positions: Vec<_> = seen(&space, w)
                .into_iter()
                .map(|id| {
                    let q = space.position(id).unwrap();
                    (q.x.to_bits(), q.z.to_bits())
                })
                .collect();
            seen_positions.sort_unstable();
            results.push(seen_positions);
            space.verify();
        }
        assert_eq!(results[0], results[1]);
        assert!(!results[0].is_empty());
    }

    /// Fresh entities only enter through the primary square.
    fn check_oracle_band(space: &Space, w: EntityId, radius: f64) {
        let c = space.position(w).unwrap();
        let rect = Rect::new(c.x - radius, c.z - radius, c.x + radius, c.z + radius);
        let expected: BTreeSet<_> = space
            .entities_in_rect(rect)
            .into_iter()
            .filter(|&o| o != w)
            .collect();
        assert_eq!(space.interest_in(w).unwrap(), &expected);
    }

    #[test]
    fn bulk_insert_matches_single_inserts() {
        let positions = [p(1.0, 1.0), p(-5.0, 5.0), p(5.5, 0.0), p(0.0, 0.0)];
        let mut one = Space::new();
        let mut many = Space::new();
        for space in [&mut one, &mut many] {
            let w = space.add_entity(p(0.0, 0.0));
            space.set_view_radius(w, 5.0, 0.0);
        }
        for &q in &positions {
            one.add_entity(q);
        }
        many.add_zero_radius_entities(&positions);
        let w = EntityId::new(0, 1);
        assert_eq!(one.interest_in(w), many.interest_in(w));
        assert_eq!(many.interest_in(w).unwrap().len(), 3);
        check_oracle(&many);
    }

    #[test]
    fn stale_ids_are_ignored() {
        let mut space = Space::new();
        let a = space.add_entity(p(0.0, 0.0));
        space.remove_entity(a);
        let b = space.add_entity(p(0.0, 0.0));
        assert_ne!(a, b, "slot reuse bumps the generation");
        space.move_entity(a, p(3.0, 3.0));
        space.set_view_radius(a, 5.0, 0.0);
        space.install_view_trigger(a);
        space.uninstall_view_trigger(a);
        assert_eq!(space.position(b), Some(p(0.0, 0.0)));
        assert_eq!(space.view_radius(b), Some(0.0));
        assert_eq!(space.position(a), None);
        assert_eq!(space.len(), 1);
    }

    #[test]
    fn listener_may_reenter() {
        let mut space = Space::new();
        let a = space.add_entity(p(0.0, 0.0));
        space.set_view_radius(a, 5.0, 0.0);
        let b = space.add_entity(p(1.0, 1.0));
        let c = space.add_entity(p(2.0, 2.0));
        let mut log = Vec::new();
        // Whoever `a` sees first gets removed; the removal's leave is dispatched too.
        let mut listener = |space: &mut Space, event: AoiEvent| {
            log.push(event);
            if let AoiEvent::Enter { other, .. } = event
                && other == b
            {
                space.remove_entity(b);
            }
        };
        space.dispatch_events(&mut listener);
        assert_eq!(
            log,
            vec![
                AoiEvent::Enter { watcher: a, other: b },
                AoiEvent::Enter { watcher: a, other: c },
                AoiEvent::Leave { watcher: a, other: b },
            ]
        );
        assert_eq!(space.pending_events(), 0);
        assert_eq!(seen(&space, a), [c]);
        check_oracle(&space);
    }

    #[test]
    fn view_rect_is_the_xz_square() {
        let mut space = Space::new();
        let a = space.add_entity(Position::new(1.0, 9.0, -2.0));
        space.set_view_radius(a, 3.0, 0.0);
        assert_eq!(space.view_rect(a), Some(Rect::new(-2.0, -5.0, 4.0, 1.0)));
        let edge = space.add_entity(p(4.0, 1.0));
        assert_eq!(space.entities_in_rect(space.view_rect(a).unwrap()), [a, edge]);
        assert_eq!(seen(&space, a), [edge], "edges are inside");
    }

    fn snap(v: f64) -> f64 {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "test coordinates stay well inside i32."
        )]
        let i = v as i32;
        f64::from(i)
    }

    #[test]
    fn random_moves_match_oracle() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        let mut space = Space::new();
        let mut ids = Vec::new();
        for _ in 0..120 {
            let q = p(rng.gen_range(-100.0..100.0), rng.gen_range(-100.0..100.0));
            let id = space.add_entity(q);
            if rng.gen_bool(0.5) {
                space.set_view_radius(id, rng.gen_range(1.0..30.0), 0.0);
            }
            ids.push(id);
        }
        check_oracle(&space);

        for step in 0..400 {
            let id = ids[rng.gen_range(0..ids.len())];
            match rng.gen_range(0..10) {
                0 => {
                    space.set_view_radius(id, rng.gen_range(0.0..40.0), 0.0);
                }
                1 if step % 4 == 0 => {
                    space.remove_entity(id);
                    let q = p(rng.gen_range(-100.0..100.0), rng.gen_range(-100.0..100.0));
                    let fresh = space.add_entity(q);
                    space.set_view_radius(fresh, rng.gen_range(1.0..30.0), 0.0);
                    let at = ids.iter().position(|&x| x == id).unwrap();
                    ids[at] = fresh;
                }
                _ => {
                    let old = space.position(id).unwrap();
                    let q = p(
                        old.x + rng.gen_range(-15.0..15.0),
                        old.z + rng.gen_range(-15.0..15.0),
                    );
                    // Snap some moves onto integer coordinates to exercise exact edges.
                    let q = if rng.gen_bool(0.2) {
                        p(snap(q.x), snap(q.z))
                    } else {
                        q
                    };
                    space.move_entity(id, q);
                }
            }
            if step % 20 == 0 {
                check_oracle(&space);
            }
        }
        check_oracle(&space);
    }

    #[test]
    fn single_move_never_double_fires() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut space = Space::new();
        let ids: Vec<_> = (0..60)
            .map(|_| {
                let id = space.add_entity(p(rng.gen_range(-40.0..40.0), rng.gen_range(-40.0..40.0)));
                space.set_view_radius(id, rng.gen_range(2.0..15.0), 0.0);
                id
            })
            .collect();
        space.drain_events();
        for _ in 0..300 {
            let id = ids[rng.gen_range(0..ids.len())];
            let q = p(rng.gen_range(-40.0..40.0), rng.gen_range(-40.0..40.0));
            space.move_entity(id, q);
            let mut pairs = BTreeSet::new();
            for event in space.drain_events() {
                assert!(
                    pairs.insert((event.watcher(), event.other())),
                    "pair reported twice in one move: {event:?}"
                );
            }
        }
        check_oracle(&space);
    }
}
