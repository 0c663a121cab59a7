// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! AOI basics.
//!
//! Give two entities a view, walk a third one past them, and print what each sees.
//!
//! Run:
//! - `cargo run -p understory_demos --example aoi_basics`

use kurbo::Rect;
use understory_aoi::{AoiEvent, Position, Space};

fn main() {
    let mut space = Space::new();
    let guard = space.add_entity(Position::new(0.0, 0.0, 0.0));
    let tower = space.add_entity(Position::new(12.0, 30.0, 0.0));
    space.set_view_radius(guard, 10.0, 0.0);
    space.set_view_radius(tower, 25.0, 0.0);

    // The guard stands inside the tower's square; the tower is too far for the guard.
    print_events(&mut space);
    println!("{}", space.dump());

    // Walk a runner along the X axis.
    let runner = space.add_entity(Position::new(-40.0, 0.0, 3.0));
    for step in 0..10_i32 {
        let x = -40.0 + f64::from(step) * 10.0;
        space.move_entity(runner, Position::new(x, 0.0, 3.0));
        print_events(&mut space);
    }

    // Everything the guard sees lies inside its view rectangle.
    let rect = space.view_rect(guard).unwrap();
    println!("guard view {rect:?}");
    for id in space.interest_in(guard).unwrap() {
        println!("  guard sees {id:?} at {:?}", space.position(*id).unwrap());
    }

    // Ad hoc region queries take a kurbo rectangle on the XZ plane.
    let near_origin = space.entities_in_rect(Rect::new(-15.0, -15.0, 15.0, 15.0));
    println!("entities near the origin: {near_origin:?}");

    space.remove_entity(tower);
    print_events(&mut space);
    assert!(space.interested_by(guard).unwrap().is_empty());
}

fn print_events(space: &mut Space) {
    for event in space.drain_events() {
        match event {
            AoiEvent::Enter { watcher, other } => println!("{watcher:?} now sees {other:?}"),
            AoiEvent::Leave { watcher, other } => println!("{watcher:?} lost sight of {other:?}"),
        }
    }
}
