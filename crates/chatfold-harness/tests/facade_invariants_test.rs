//! Property-based tests for the facade state machine.
//!
//! Tests verify that the standard invariants hold under arbitrary
//! interleavings of live events, backfill pages, selections and ticks.

use std::time::Duration;

use chatfold_app::{ChatConfig, ChatFacade, FacadeEvent, JoinedRoom};
use chatfold_core::{Event, RoomId};
use chatfold_harness::{InvariantRegistry, SystemSnapshot};
use proptest::prelude::*;

const ROOMS: [&str; 3] = ["!a", "!b", "!c"];
const SENDERS: [&str; 3] = ["@me:x", "@bob:x", "@carol:x"];
const KEYS: [&str; 2] = ["👍", "❤"];

/// Event payload; targets index earlier ids and may dangle.
#[derive(Debug, Clone)]
enum Shape {
    Message,
    Edit(usize),
    Reply(usize),
    Reaction(usize, usize),
    Redaction(usize),
}

#[derive(Debug, Clone)]
enum Op {
    Live { room: usize, sender: usize, shape: Shape },
    Page { room: usize, sender: usize, shapes: Vec<Shape> },
    Select(Option<usize>),
    Tick(u64),
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    prop_oneof![
        4 => Just(Shape::Message),
        1 => (0usize..30).prop_map(Shape::Edit),
        1 => (0usize..30).prop_map(Shape::Reply),
        2 => (0usize..30, 0..KEYS.len()).prop_map(|(t, k)| Shape::Reaction(t, k)),
        1 => (0usize..30).prop_map(Shape::Redaction),
    ]
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0..ROOMS.len(), 0..SENDERS.len(), shape_strategy())
            .prop_map(|(room, sender, shape)| Op::Live { room, sender, shape }),
        1 => (0..ROOMS.len(), 0..SENDERS.len(), prop::collection::vec(shape_strategy(), 0..5))
            .prop_map(|(room, sender, shapes)| Op::Page { room, sender, shapes }),
        2 => proptest::option::of(0..ROOMS.len()).prop_map(Op::Select),
        1 => (0u64..20).prop_map(Op::Tick),
    ]
}

fn build(room: &str, sender: &str, n: usize, shape: &Shape) -> Event {
    let id = format!("$e{n}");
    let target = |t: &usize| format!("$e{t}");
    let ts = n as u64;
    match shape {
        Shape::Message => Event::message(id, room, sender, ts, format!("m{n}")),
        Shape::Edit(t) => Event::edit(id, room, sender, ts, target(t), format!("e{n}")),
        Shape::Reply(t) => Event::reply(id, room, sender, ts, target(t), format!("r{n}")),
        Shape::Reaction(t, k) => Event::reaction(id, room, sender, ts, target(t), KEYS[*k]),
        Shape::Redaction(t) => Event::redaction(id, room, sender, ts, target(t)),
    }
}

fn new_facade() -> ChatFacade<Duration> {
    let config = ChatConfig { auto_select_first: false, ..ChatConfig::for_user(SENDERS[0]) };
    let mut facade = ChatFacade::new(config, Duration::ZERO);
    let rooms = ROOMS.iter().map(|id| JoinedRoom::new(*id, id.trim_start_matches('!'))).collect();
    facade.handle(FacadeEvent::RoomsListed { rooms });
    facade
}

proptest! {
    /// Facade invariants hold after every step.
    #[test]
    fn prop_facade_invariants_hold(ops in prop::collection::vec(op_strategy(), 0..80)) {
        let mut facade = new_facade();
        let invariants = InvariantRegistry::standard();
        let mut next_id = 0usize;

        for op in &ops {
            match op {
                Op::Live { room, sender, shape } => {
                    let event = build(ROOMS[*room], SENDERS[*sender], next_id, shape);
                    next_id += 1;
                    let room_id = RoomId::new(ROOMS[*room]);
                    facade.handle(FacadeEvent::LiveEvent { room_id, event });
                },
                Op::Page { room, sender, shapes } => {
                    let events = shapes
                        .iter()
                        .map(|shape| {
                            next_id += 1;
                            build(ROOMS[*room], SENDERS[*sender], next_id - 1, shape)
                        })
                        .collect();
                    let room_id = RoomId::new(ROOMS[*room]);
                    facade.handle(FacadeEvent::BackfillCompleted { room_id, events });
                },
                Op::Select(room) => {
                    facade.select_room(room.map(|i| RoomId::new(ROOMS[i]))).unwrap();
                },
                Op::Tick(secs) => {
                    facade.handle(FacadeEvent::Tick { now: Duration::from_secs(*secs) });
                },
            }

            let snapshot = SystemSnapshot::from_facade(&facade);
            prop_assert!(
                invariants.check_all(&snapshot).is_ok(),
                "Invariant violated after {:?}: {:?}", op, invariants.check_all(&snapshot)
            );
        }
    }

    /// Redelivering every event already seen changes nothing.
    #[test]
    fn prop_redelivery_is_idempotent(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let mut facade = new_facade();
        let mut delivered = Vec::new();

        for (n, op) in ops.iter().enumerate() {
            if let Op::Live { room, sender, shape } = op {
                let event = build(ROOMS[*room], SENDERS[*sender], n, shape);
                delivered.push((RoomId::new(ROOMS[*room]), event.clone()));
                let room_id = RoomId::new(ROOMS[*room]);
                facade.handle(FacadeEvent::LiveEvent { room_id, event });
            }
        }
        let before = SystemSnapshot::from_facade(&facade);

        for (room_id, event) in delivered {
            let actions = facade.handle(FacadeEvent::LiveEvent { room_id, event });
            prop_assert!(actions.is_empty());
        }
        prop_assert_eq!(SystemSnapshot::from_facade(&facade), before);
    }
}
