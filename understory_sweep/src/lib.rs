// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_sweep --heading-base-level=0

//! Understory Sweep: a sorted sweep list for sort-and-prune style spatial structures.
//!
//! A [`SweepList`] keeps a set of slots in order along one axis as a doubly linked list.
//! It does not own keys: callers store keys wherever they like (usually an arena) and
//! describe the order through the [`SweepOrder`] trait.
//!
//! - Insert by scanning from the head or from a caller-known hint (bulk loads of sorted batches).
//! - Insert next to a known slot without scanning.
//! - Re-sort a single slot after its key changed. The walk is local: its cost is proportional
//!   to the number of slots overtaken, and [`SweepOrder::pass`] is called once per overtaken slot.
//! - Unlink in O(1).
//!
//! The pass notifications are what make the list useful for interest management: a moving
//! entity only learns about the boundaries it actually crossed.
//!
//! # Example
//!
//! ```rust
//! use understory_sweep::{Direction, SweepList, SweepOrder};
//!
//! struct Keys {
//!     keys: Vec<i32>,
//!     passed: Vec<(usize, Direction)>,
//! }
//!
//! impl SweepOrder for Keys {
//!     fn precedes(&self, a: usize, b: usize) -> bool {
//!         self.keys[a] < self.keys[b]
//!     }
//!
//!     fn pass(&mut self, _mover: usize, passed: usize, direction: Direction) {
//!         self.passed.push((passed, direction));
//!     }
//! }
//!
//! let mut keys = Keys { keys: vec![10, 20, 30], passed: Vec::new() };
//! let mut list = SweepList::new();
//! for slot in 0..3 {
//!     list.insert(slot, &keys);
//! }
//!
//! // Slot 0 jumps past slot 1 but not past slot 2.
//! keys.keys[0] = 25;
//! assert_eq!(list.resort(0, &mut keys), 1);
//! assert_eq!(keys.passed, vec![(1, Direction::Forward)]);
//! assert_eq!(list.iter().collect::<Vec<_>>(), vec![1, 0, 2]);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod list;

pub use list::{Direction, Iter, SweepList, SweepOrder};
