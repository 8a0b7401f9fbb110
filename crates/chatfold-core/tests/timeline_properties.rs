//! Property-based tests for the event store and relation resolution.
//!
//! Timelines are generated as sequences of messages, edits, replies,
//! reactions and redactions whose targets point anywhere in the timeline
//! (including ids that are never loaded). The properties check that the
//! derived state depends only on the set of events held, never on the
//! channel or order of delivery.

use std::collections::HashSet;

use chatfold_core::{
    EffectiveContent, Event, EventId, EventStore, Relation, Room, RoomId, UserId, resolver,
};
use proptest::prelude::*;

const ROOM: &str = "!prop:example.org";
const SENDERS: [&str; 3] = ["@alice:x", "@bob:x", "@carol:x"];
const KEYS: [&str; 2] = ["👍", "🎉"];

#[derive(Debug, Clone)]
enum Shape {
    Message,
    Edit(usize),
    Reply(usize),
    Reaction(usize, usize),
    Redaction(usize),
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    // Targets may exceed the timeline length so that some relations dangle.
    prop_oneof![
        4 => Just(Shape::Message),
        2 => (0usize..40).prop_map(Shape::Edit),
        2 => (0usize..40).prop_map(Shape::Reply),
        3 => (0usize..40, 0usize..KEYS.len()).prop_map(|(t, k)| Shape::Reaction(t, k)),
        1 => (0usize..40).prop_map(Shape::Redaction),
    ]
}

fn id(i: usize) -> String {
    format!("$e{i}")
}

fn timeline_strategy() -> impl Strategy<Value = Vec<Event>> {
    prop::collection::vec((shape_strategy(), 0usize..SENDERS.len()), 0..30).prop_map(|shapes| {
        shapes
            .into_iter()
            .enumerate()
            .map(|(i, (shape, sender))| {
                let ts = i as u64 * 10;
                let (me, sender) = (id(i), SENDERS[sender]);
                match shape {
                    Shape::Message => Event::message(me, ROOM, sender, ts, format!("m{i}")),
                    Shape::Edit(t) => Event::edit(me, ROOM, sender, ts, id(t), format!("e{i}")),
                    Shape::Reply(t) => Event::reply(me, ROOM, sender, ts, id(t), format!("r{i}")),
                    Shape::Reaction(t, k) => Event::reaction(me, ROOM, sender, ts, id(t), KEYS[k]),
                    Shape::Redaction(t) => Event::redaction(me, ROOM, sender, ts, id(t)),
                }
            })
            .collect()
    })
}

fn ids(store: &EventStore) -> Vec<EventId> {
    store.iter().map(|e| e.id.clone()).collect()
}

proptest! {
    #[test]
    fn prop_append_is_idempotent(timeline in timeline_strategy()) {
        let mut room = Room::new(RoomId::new(ROOM), "prop", Vec::<UserId>::new());
        room.append(timeline.clone());
        let first = room.resolution().clone();
        let len = room.store().len();

        prop_assert_eq!(room.append(timeline.clone()), 0);
        prop_assert_eq!(room.backfill(timeline), 0);
        prop_assert_eq!(room.store().len(), len);
        prop_assert_eq!(room.resolution(), &first);
    }

    #[test]
    fn prop_split_delivery_matches_single_append(
        timeline in timeline_strategy(),
        split in 0usize..30,
    ) {
        let split = split.min(timeline.len());

        let mut whole = EventStore::new();
        whole.append(timeline.clone());

        let mut split_store = EventStore::new();
        split_store.append(timeline[split..].to_vec());
        split_store.backfill(timeline[..split].to_vec());

        prop_assert_eq!(ids(&split_store), ids(&whole));
        prop_assert_eq!(resolver::resolve(&split_store), resolver::resolve(&whole));
        for (a, b) in whole.iter().zip(split_store.iter()) {
            prop_assert_eq!(a.redacted, b.redacted, "redaction state differs for {}", a.id);
        }
        prop_assert_eq!(split_store.pending_redactions(), whole.pending_redactions());
    }

    #[test]
    fn prop_last_edit_wins(timeline in timeline_strategy()) {
        let resolution = resolver::resolve(&timeline);

        for event in &timeline {
            let Some(Relation::Replace { target, .. }) = &event.relation else { continue };
            let last = timeline
                .iter()
                .filter_map(|e| match &e.relation {
                    Some(Relation::Replace { target: t, new_content: Some(content) })
                        if t == target =>
                    {
                        Some(content)
                    },
                    _ => None,
                })
                .last();
            prop_assert_eq!(resolution.edit(target), last);
        }
    }

    #[test]
    fn prop_reaction_senders_are_unique(timeline in timeline_strategy()) {
        let resolution = resolver::resolve(&timeline);

        for tally in resolution.all_reactions().values() {
            for senders in tally.values() {
                let distinct: HashSet<&UserId> = senders.iter().collect();
                prop_assert_eq!(distinct.len(), senders.len());
                prop_assert!(!senders.is_empty());
            }
        }
    }

    #[test]
    fn prop_replies_only_to_loaded_targets(timeline in timeline_strategy()) {
        let resolution = resolver::resolve(&timeline);
        let loaded: HashSet<&EventId> = timeline.iter().map(|e| &e.id).collect();

        for target in resolution.replies().values() {
            prop_assert!(loaded.contains(target));
        }
    }

    #[test]
    fn prop_canonical_excludes_relations_and_redacted_reads_deleted(
        timeline in timeline_strategy(),
    ) {
        let mut store = EventStore::new();
        store.append(timeline);
        let resolution = resolver::resolve(&store);

        for id in resolution.canonical() {
            let event = store.get(id);
            prop_assert!(event.is_some());
            let Some(event) = event else { continue };

            prop_assert!(!event.is_edit());
            prop_assert!(
                !matches!(event.relation, Some(Relation::Annotation { .. })),
                "annotation {} listed as canonical", id
            );
            if event.redacted {
                prop_assert_eq!(resolution.effective_content(event), EffectiveContent::Deleted);
            }
        }
    }
}
