// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The [`SweepList`] and the [`SweepOrder`] callback trait.

use alloc::vec::Vec;
use core::fmt::Debug;

/// Direction of travel of the slot being re-sorted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Towards the head (decreasing keys).
    Backward,
    /// Towards the tail (increasing keys).
    Forward,
}

/// Ordering and pass notifications supplied by the owner of the keys.
pub trait SweepOrder {
    /// Return `true` if slot `a` must be placed strictly before slot `b`.
    ///
    /// Slots for which neither `precedes(a, b)` nor `precedes(b, a)` holds are treated as
    /// equal and are never reordered relative to each other.
    fn precedes(&self, a: usize, b: usize) -> bool;

    /// Called once for every slot `passed` that `mover` overtakes during [`SweepList::resort`].
    fn pass(&mut self, _mover: usize, _passed: usize, _direction: Direction) {}
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
struct Link {
    prev: Option<usize>,
    next: Option<usize>,
}

/// A sorted, doubly linked list of slot indices.
///
/// Slots are small integers chosen by the caller (typically arena indices). A slot is either a
/// member of the list or not; membership is tracked per slot so that the list can be shared
/// with an arena that recycles indices.
///
/// All structural invariant violations (re-sorting or removing a non-member, inserting a slot
/// twice, a broken head or tail after a mutation) panic. They indicate a programming error in
/// the caller and continuing would corrupt the order for every other slot.
#[derive(Clone, Default)]
pub struct SweepList {
    links: Vec<Option<Link>>,
    head: Option<usize>,
    tail: Option<usize>,
    len: usize,
}

impl Debug for SweepList {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SweepList")
            .field("len", &self.len)
            .field("head", &self.head)
            .field("tail", &self.tail)
            .finish_non_exhaustive()
    }
}

impl SweepList {
    /// Create an empty list.
    pub fn new() -> Self {
        Self {
            links: Vec::new(),
            head: None,
            tail: None,
            len: 0,
        }
    }

    /// Number of member slots.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True if the list has no members.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// First slot in order.
    pub fn head(&self) -> Option<usize> {
        self.head
    }

    /// Last slot in order.
    pub fn tail(&self) -> Option<usize> {
        self.tail
    }

    /// Whether `slot` is currently a member.
    pub fn contains(&self, slot: usize) -> bool {
        matches!(self.links.get(slot), Some(Some(_)))
    }

    /// Slot following `slot`, if any. Returns `None` for non-members.
    pub fn next(&self, slot: usize) -> Option<usize> {
        self.link(slot).and_then(|l| l.next)
    }

    /// Slot preceding `slot`, if any. Returns `None` for non-members.
    pub fn prev(&self, slot: usize) -> Option<usize> {
        self.link(slot).and_then(|l| l.prev)
    }

    /// Iterate member slots from head to tail.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    /// Remove every member.
    pub fn clear(&mut self) {
        self.links.clear();
        self.head = None;
        self.tail = None;
        self.len = 0;
    }

    /// Insert `slot` by scanning from the head.
    ///
    /// The slot is placed before the first member that does not precede it. No pass
    /// notifications are fired.
    pub fn insert<O: SweepOrder + ?Sized>(&mut self, slot: usize, ord: &O) {
        match self.head {
            Some(head) => self.insert_from(slot, head, ord),
            None => self.push_front(slot),
        }
    }

    /// Insert `slot` by scanning from the member `hint`.
    ///
    /// Intended for bulk loads: when a batch is inserted in sorted order and each insertion
    /// uses the previously inserted slot as the hint, the whole batch costs one walk over the
    /// list. The hint only has to be approximately right; the scan backs off towards the head
    /// if needed. No pass notifications are fired.
    pub fn insert_from<O: SweepOrder + ?Sized>(&mut self, slot: usize, hint: usize, ord: &O) {
        assert!(
            self.contains(hint),
            "insert hint {hint} is not a member of the sweep list"
        );
        let mut cursor = Some(hint);
        // Back off while the slot before the cursor must come after `slot`.
        while let Some(c) = cursor {
            match self.prev(c) {
                Some(p) if ord.precedes(slot, p) => cursor = Some(p),
                _ => break,
            }
        }
        while let Some(c) = cursor {
            if ord.precedes(c, slot) {
                cursor = self.next(c);
            } else {
                break;
            }
        }
        match cursor {
            Some(at) => self.insert_before(slot, at),
            None => self.push_back(slot),
        }
    }

    /// Insert `slot` at the head without scanning.
    pub fn push_front(&mut self, slot: usize) {
        self.claim(slot);
        let old_head = self.head;
        self.set_link(
            slot,
            Link {
                prev: None,
                next: old_head,
            },
        );
        match old_head {
            Some(h) => self.link_mut(h).prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
        self.len += 1;
    }

    /// Insert `slot` at the tail without scanning.
    pub fn push_back(&mut self, slot: usize) {
        self.claim(slot);
        let old_tail = self.tail;
        self.set_link(
            slot,
            Link {
                prev: old_tail,
                next: None,
            },
        );
        match old_tail {
            Some(t) => self.link_mut(t).next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
        self.len += 1;
    }

    /// Insert `slot` immediately before the member `reference`, without scanning.
    ///
    /// The caller is responsible for order; follow up with [`SweepList::resort`] when the
    /// reference is only approximately right.
    pub fn insert_before(&mut self, slot: usize, reference: usize) {
        let prev = self
            .link(reference)
            .expect("insert reference is not a member of the sweep list")
            .prev;
        self.claim(slot);
        self.set_link(
            slot,
            Link {
                prev,
                next: Some(reference),
            },
        );
        self.link_mut(reference).prev = Some(slot);
        match prev {
            Some(p) => self.link_mut(p).next = Some(slot),
            None => self.head = Some(slot),
        }
        self.len += 1;
    }

    /// Insert `slot` immediately after the member `reference`, without scanning.
    pub fn insert_after(&mut self, slot: usize, reference: usize) {
        let next = self
            .link(reference)
            .expect("insert reference is not a member of the sweep list")
            .next;
        self.claim(slot);
        self.set_link(
            slot,
            Link {
                prev: Some(reference),
                next,
            },
        );
        self.link_mut(reference).next = Some(slot);
        match next {
            Some(n) => self.link_mut(n).prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.len += 1;
    }

    /// Unlink `slot`. Panics if it is not a member.
    pub fn remove(&mut self, slot: usize) {
        let link = self
            .links
            .get_mut(slot)
            .and_then(Option::take)
            .expect("remove of a slot that is not in the sweep list");
        self.detach(link);
        self.len -= 1;
        self.check_ends();
    }

    /// Move `slot` to its sorted position after its key changed.
    ///
    /// Walks towards the head first, then towards the tail, only as far as needed. Calls
    /// [`SweepOrder::pass`] for every overtaken slot, in the order they are overtaken, and
    /// splices the slot into place. Returns the number of slots overtaken.
    ///
    /// Members with a key equal to the slot's key are not overtaken.
    pub fn resort<O: SweepOrder + ?Sized>(&mut self, slot: usize, ord: &mut O) -> usize {
        assert!(
            self.contains(slot),
            "resort of slot {slot} which is not in the sweep list"
        );
        let mut passes = 0;

        let mut before = self.prev(slot);
        while let Some(p) = before {
            if !ord.precedes(slot, p) {
                break;
            }
            ord.pass(slot, p, Direction::Backward);
            passes += 1;
            before = self.prev(p);
        }
        if passes > 0 {
            // `before` is the new predecessor (or None for the head).
            let link = self.links[slot].take().expect("resorted slot vanished");
            self.detach(link);
            match before {
                Some(p) => self.relink_after(slot, p),
                None => self.relink_front(slot),
            }
        } else {
            let mut after = self.next(slot);
            while let Some(n) = after {
                if !ord.precedes(n, slot) {
                    break;
                }
                ord.pass(slot, n, Direction::Forward);
                passes += 1;
                after = self.next(n);
            }
            if passes > 0 {
                let link = self.links[slot].take().expect("resorted slot vanished");
                self.detach(link);
                match after {
                    Some(n) => self.relink_before(slot, n),
                    None => self.relink_back(slot),
                }
            }
        }

        self.check_placement(slot, ord);
        passes
    }

    /// Walk the whole list and check link symmetry, head/tail, length and order.
    ///
    /// Panics with a description of the first violation found.
    pub fn verify<O: SweepOrder + ?Sized>(&self, ord: &O) {
        let mut count = 0;
        let mut prev: Option<usize> = None;
        let mut cursor = self.head;
        while let Some(slot) = cursor {
            let link = self
                .link(slot)
                .expect("sweep list walk reached a non-member slot");
            assert_eq!(link.prev, prev, "broken back link at slot {slot}");
            if let Some(p) = prev {
                assert!(
                    !ord.precedes(slot, p),
                    "sweep list out of order: slot {slot} must precede slot {p}"
                );
            }
            count += 1;
            assert!(count <= self.len, "sweep list contains a cycle");
            prev = Some(slot);
            cursor = link.next;
        }
        assert_eq!(prev, self.tail, "sweep list tail does not match the last slot");
        assert_eq!(count, self.len, "sweep list length does not match its links");
    }

    fn link(&self, slot: usize) -> Option<&Link> {
        self.links.get(slot).and_then(Option::as_ref)
    }

    fn link_mut(&mut self, slot: usize) -> &mut Link {
        self.links
            .get_mut(slot)
            .and_then(Option::as_mut)
            .expect("dangling sweep list link")
    }

    fn set_link(&mut self, slot: usize, link: Link) {
        self.links[slot] = Some(link);
    }

    fn claim(&mut self, slot: usize) {
        if self.links.len() <= slot {
            self.links.resize_with(slot + 1, || None);
        }
        assert!(
            self.links[slot].is_none(),
            "slot {slot} is already in the sweep list"
        );
    }

    // Unlink a slot whose own link has already been taken out.
    fn detach(&mut self, link: Link) {
        match link.prev {
            Some(p) => self.link_mut(p).next = link.next,
            None => self.head = link.next,
        }
        match link.next {
            Some(n) => self.link_mut(n).prev = link.prev,
            None => self.tail = link.prev,
        }
    }

    fn relink_after(&mut self, slot: usize, p: usize) {
        let next = self.link_mut(p).next;
        self.set_link(
            slot,
            Link {
                prev: Some(p),
                next,
            },
        );
        self.link_mut(p).next = Some(slot);
        match next {
            Some(n) => self.link_mut(n).prev = Some(slot),
            None => self.tail = Some(slot),
        }
    }

    fn relink_before(&mut self, slot: usize, n: usize) {
        let prev = self.link_mut(n).prev;
        self.set_link(
            slot,
            Link {
                prev,
                next: Some(n),
            },
        );
        self.link_mut(n).prev = Some(slot);
        match prev {
            Some(p) => self.link_mut(p).next = Some(slot),
            None => self.head = Some(slot),
        }
    }

    fn relink_front(&mut self, slot: usize) {
        let head = self.head;
        self.set_link(
            slot,
            Link {
                prev: None,
                next: head,
            },
        );
        match head {
            Some(h) => self.link_mut(h).prev = Some(slot),
            None => self.tail = Some(slot),
        }
        self.head = Some(slot);
    }

    fn relink_back(&mut self, slot: usize) {
        let tail = self.tail;
        self.set_link(
            slot,
            Link {
                prev: tail,
                next: None,
            },
        );
        match tail {
            Some(t) => self.link_mut(t).next = Some(slot),
            None => self.head = Some(slot),
        }
        self.tail = Some(slot);
    }

    fn check_ends(&self) {
        if self.len == 0 {
            assert!(
                self.head.is_none() && self.tail.is_none(),
                "empty sweep list still has a head or tail"
            );
            return;
        }
        let head = self.head.expect("non-empty sweep list lost its head");
        let tail = self.tail.expect("non-empty sweep list lost its tail");
        assert!(self.prev(head).is_none(), "sweep list head has a predecessor");
        assert!(self.next(tail).is_none(), "sweep list tail has a successor");
    }

    fn check_placement<O: SweepOrder + ?Sized>(&self, slot: usize, ord: &O) {
        if let Some(p) = self.prev(slot) {
            assert!(
                !ord.precedes(slot, p),
                "slot {slot} left behind its predecessor {p} after resort"
            );
        }
        if let Some(n) = self.next(slot) {
            assert!(
                !ord.precedes(n, slot),
                "slot {slot} left ahead of its successor {n} after resort"
            );
        }
        self.check_ends();
    }
}

/// Iterator over member slots from head to tail.
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    list: &'a SweepList,
    cursor: Option<usize>,
}

impl Iterator for Iter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let slot = self.cursor?;
        self.cursor = self.list.next(slot);
        Some(slot)
    }
}
