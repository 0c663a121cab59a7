// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-entity view state: view triggers and the two interest sets.

use alloc::collections::BTreeSet;

use crate::system::CoordinateSystem;
use crate::trigger::RangeTrigger;
use crate::types::{EntityId, NodeId, TriggerRole, TriggerTag};

/// Hysteresis widths at or below this are treated as no hysteresis.
pub const HYSTERESIS_EPSILON: f64 = 0.01;

/// The view of one entity.
///
/// A witness owns the entity's view trigger and, when a hysteresis band is configured, a
/// second wider trigger that only decides when things leave. It also holds the two halves of
/// the interest relation:
///
/// - `interest_in`: entities this one sees.
/// - `interested_by`: entities that see this one.
///
/// The sets are only changed through enter/leave handling, which keeps them symmetric across
/// every pair of witnesses in a [`Space`](crate::Space).
#[derive(Clone, Debug, Default)]
pub struct Witness {
    entity: Option<EntityId>,
    node: Option<NodeId>,
    radius: f64,
    hysteresis: f64,
    primary: Option<RangeTrigger>,
    hysteresis_trigger: Option<RangeTrigger>,
    interest_in: BTreeSet<EntityId>,
    interested_by: BTreeSet<EntityId>,
}

impl Witness {
    /// An unattached witness.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind to an entity and its coordinate node. The view radius starts at zero.
    pub fn attach(&mut self, entity: EntityId, node: NodeId) {
        if self.entity.is_some() {
            log::warn!("witness for {:?} re-attached to {entity:?}", self.entity);
        }
        self.entity = Some(entity);
        self.node = Some(node);
        self.radius = 0.0;
        self.hysteresis = 0.0;
    }

    /// Tear down triggers and reset for reuse.
    ///
    /// Returns the former `(interest_in, interested_by)` sets; the caller owes a leave to
    /// every pair in them.
    pub fn detach(
        &mut self,
        sys: &mut CoordinateSystem,
    ) -> (BTreeSet<EntityId>, BTreeSet<EntityId>) {
        for mut trigger in [self.primary.take(), self.hysteresis_trigger.take()]
            .into_iter()
            .flatten()
        {
            trigger.destroy(sys);
        }
        let sets = (
            core::mem::take(&mut self.interest_in),
            core::mem::take(&mut self.interested_by),
        );
        *self = Self::default();
        sets
    }

    /// Whether the witness is bound to an entity.
    pub fn is_attached(&self) -> bool {
        self.entity.is_some()
    }

    /// The bound entity.
    pub fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    /// The bound entity's coordinate node.
    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    /// Half-width of the view square. Zero means no view.
    pub fn view_radius(&self) -> f64 {
        self.radius
    }

    /// Width of the hysteresis band.
    pub fn hysteresis(&self) -> f64 {
        self.hysteresis
    }

    /// Whether the view trigger is installed.
    pub fn is_installed(&self) -> bool {
        self.primary.as_ref().is_some_and(RangeTrigger::is_installed)
    }

    /// Whether a hysteresis trigger is installed.
    pub fn has_hysteresis_trigger(&self) -> bool {
        self.hysteresis_trigger
            .as_ref()
            .is_some_and(RangeTrigger::is_installed)
    }

    /// The view trigger, if built.
    pub fn view_trigger(&self) -> Option<&RangeTrigger> {
        self.primary.as_ref()
    }

    /// The hysteresis trigger, if built.
    pub fn hysteresis_view_trigger(&self) -> Option<&RangeTrigger> {
        self.hysteresis_trigger.as_ref()
    }

    /// Half-width of the square outside which seen entities must be dropped, or `None` when
    /// nothing may be seen.
    pub fn leave_range(&self) -> Option<f64> {
        if !self.is_installed() {
            return None;
        }
        if self.has_hysteresis_trigger() {
            Some(self.radius + self.hysteresis)
        } else {
            Some(self.radius)
        }
    }

    /// Change the view.
    ///
    /// A radius of zero or less uninstalls the triggers (keeping them for reuse). Otherwise
    /// the view trigger is built or moved to `radius`, and a hysteresis trigger at
    /// `radius + hysteresis` is kept only while `hysteresis` exceeds [`HYSTERESIS_EPSILON`].
    pub fn set_view_radius(&mut self, sys: &mut CoordinateSystem, radius: f64, hysteresis: f64) {
        let (Some(entity), Some(node)) = (self.entity, self.node) else {
            log::warn!("set_view_radius on a witness with no entity");
            return;
        };
        if !radius.is_finite() || !hysteresis.is_finite() {
            log::warn!("ignoring non-finite view radius {radius} / {hysteresis} for {entity:?}");
            return;
        }
        self.hysteresis = hysteresis.max(0.0);
        if radius <= 0.0 {
            self.radius = 0.0;
            self.uninstall_view_trigger(sys);
            return;
        }
        self.radius = radius;

        match &mut self.primary {
            Some(trigger) => trigger.update(sys, radius),
            None => {
                let mut trigger = RangeTrigger::new(tag(entity, TriggerRole::Primary), node, radius);
                trigger.install(sys);
                self.primary = Some(trigger);
            }
        }

        if self.hysteresis > HYSTERESIS_EPSILON {
            let wide = radius + self.hysteresis;
            match &mut self.hysteresis_trigger {
                Some(trigger) => trigger.update(sys, wide),
                None => {
                    let mut trigger =
                        RangeTrigger::new(tag(entity, TriggerRole::Hysteresis), node, wide);
                    trigger.install(sys);
                    self.hysteresis_trigger = Some(trigger);
                }
            }
        } else if let Some(mut trigger) = self.hysteresis_trigger.take() {
            trigger.destroy(sys);
        }
    }

    /// Install the triggers for the current radius.
    pub fn install_view_trigger(&mut self, sys: &mut CoordinateSystem) {
        if !self.is_attached() {
            log::warn!("install_view_trigger on a witness with no entity");
            return;
        }
        if self.radius <= 0.0 {
            return;
        }
        let (radius, hysteresis) = (self.radius, self.hysteresis);
        self.set_view_radius(sys, radius, hysteresis);
    }

    /// Uninstall both triggers. Redundant calls do nothing.
    pub fn uninstall_view_trigger(&mut self, sys: &mut CoordinateSystem) {
        for trigger in [&mut self.primary, &mut self.hysteresis_trigger]
            .into_iter()
            .flatten()
        {
            trigger.uninstall(sys);
        }
    }

    /// Whether an enter from the trigger with `role` counts.
    pub fn accepts_enter(&self, role: TriggerRole) -> bool {
        role == TriggerRole::Primary
    }

    /// Whether a leave from the trigger with `role` counts.
    pub fn accepts_leave(&self, role: TriggerRole) -> bool {
        match role {
            TriggerRole::Primary => !self.has_hysteresis_trigger(),
            TriggerRole::Hysteresis => true,
        }
    }

    /// Record that this entity sees `other`. Returns `false` if it already did.
    pub fn add_interest_in(&mut self, other: EntityId) -> bool {
        self.interest_in.insert(other)
    }

    /// Record that `other` sees this entity. Returns `false` if it already did.
    pub fn add_interested_by(&mut self, other: EntityId) -> bool {
        self.interested_by.insert(other)
    }

    /// Forget that this entity sees `other`. Returns `false` if it did not.
    pub fn del_interest_in(&mut self, other: EntityId) -> bool {
        self.interest_in.remove(&other)
    }

    /// Forget that `other` sees this entity. Returns `false` if it did not.
    pub fn del_interested_by(&mut self, other: EntityId) -> bool {
        self.interested_by.remove(&other)
    }

    /// Entities this one sees.
    pub fn interest_in(&self) -> &BTreeSet<EntityId> {
        &self.interest_in
    }

    /// Entities that see this one.
    pub fn interested_by(&self) -> &BTreeSet<EntityId> {
        &self.interested_by
    }
}

fn tag(witness: EntityId, role: TriggerRole) -> TriggerTag {
    TriggerTag { witness, role }
}
