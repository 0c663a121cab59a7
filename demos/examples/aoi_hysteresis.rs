// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! AOI hysteresis.
//!
//! An entity pacing along the edge of a view flickers in and out without a band, and stays
//! put with one. A listener counts the events and re-enters the space to move a follower.
//!
//! Run:
//! - `cargo run -p understory_demos --example aoi_hysteresis`

use understory_aoi::{AoiEvent, EntityId, Position, Space};

fn pace(hysteresis: f64) -> usize {
    let mut space = Space::new();
    let watcher = space.add_entity(Position::new(0.0, 0.0, 0.0));
    let pacer = space.add_entity(Position::new(9.0, 0.0, 0.0));
    let follower = space.add_entity(Position::new(50.0, 0.0, 50.0));
    space.set_view_radius(watcher, 10.0, hysteresis);

    let mut count = 0;
    let mut listener = |space: &mut Space, event: AoiEvent| {
        count += 1;
        // Whenever the watcher sees someone new, the follower teleports next to it.
        if let AoiEvent::Enter { watcher: w, other } = event
            && w == watcher
            && other != follower
        {
            let p = space.position(other).unwrap();
            space.move_entity(follower, Position::new(p.x, p.y, p.z + 30.0));
        }
    };
    for i in 0..20 {
        let x = if i % 2 == 0 { 9.5 } else { 10.5 };
        space.move_entity(pacer, Position::new(x, 0.0, 0.0));
        space.dispatch_events(&mut listener);
    }
    report(&space, watcher, hysteresis);
    count
}

fn report(space: &Space, watcher: EntityId, hysteresis: f64) {
    let seen: Vec<_> = space.interest_in(watcher).unwrap().iter().collect();
    println!("band {hysteresis}: watcher ends up seeing {seen:?}");
}

fn main() {
    let flicker = pace(0.0);
    let steady = pace(2.0);
    println!("events without band: {flicker}, with band: {steady}");
    assert!(steady < flicker, "the band should suppress edge flicker");
}
