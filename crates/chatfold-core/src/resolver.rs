//! Relation resolution over a room timeline.
//!
//! [`resolve`] is a pure function of the timeline it is given: it indexes the
//! loaded events, folds edit, reaction and reply relations into lookup maps,
//! and selects the canonical (renderable) message sequence. Callers re-run it
//! on every timeline mutation, so a relation whose target is loaded later by
//! backfill takes effect on the next resolve without any patching.
//!
//! # Precedence rules
//!
//! - The temporally last edit of an event in timeline order wins.
//! - Redaction dominates edits: a redacted event always reads as deleted.
//! - A sender counts at most once per `(target, key)` reaction pair.
//! - A reply whose target is not loaded produces no reply entry.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::event::{Content, Event, EventId, EventKind, MessageContent, Relation, UserId};

/// Text shown in place of withdrawn content.
pub const DELETED_PLACEHOLDER: &str = "Message deleted";

/// Reaction glyph to distinct senders, in first-seen key order.
pub type ReactionTally = IndexMap<String, Vec<UserId>>;

/// Derived indices for one timeline.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resolution {
    canonical: Vec<EventId>,
    edits: HashMap<EventId, MessageContent>,
    replies: HashMap<EventId, EventId>,
    reactions: HashMap<EventId, ReactionTally>,
    latest_canonical_ts: Option<u64>,
}

/// What a canonical event should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectiveContent<'a> {
    /// The event's own content.
    Original(&'a Content),
    /// Content superseded by the last edit.
    Edited(&'a MessageContent),
    /// The event was redacted.
    Deleted,
}

impl EffectiveContent<'_> {
    /// True if an edit replaced the original content.
    pub fn is_edited(&self) -> bool {
        matches!(self, Self::Edited(_))
    }

    /// True if the content was withdrawn.
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }
}

/// Resolve a timeline into derived indices.
///
/// Events without an id are skipped with a diagnostic. Events of unknown type
/// are indexed (they can be reply targets) but never canonical.
pub fn resolve<'a, I>(timeline: I) -> Resolution
where
    I: IntoIterator<Item = &'a Event>,
    I::IntoIter: Clone,
{
    let timeline = timeline.into_iter();

    let mut loaded: HashSet<&EventId> = HashSet::new();
    for event in timeline.clone() {
        if event.id.is_empty() {
            tracing::warn!(
                room_id = %event.room_id,
                sender = %event.sender,
                kind = event.kind.as_type(),
                "skipping malformed event without id"
            );
            continue;
        }
        if let EventKind::Unknown(event_type) = &event.kind {
            tracing::debug!(event_id = %event.id, event_type = %event_type, "unknown event type");
        }
        loaded.insert(&event.id);
    }

    let mut resolution = Resolution::default();
    for event in timeline {
        if event.id.is_empty() {
            continue;
        }

        match (&event.kind, &event.relation) {
            (EventKind::Message, Some(Relation::Replace { target, new_content })) => {
                if let Some(new_content) = new_content {
                    resolution.edits.insert(target.clone(), new_content.clone());
                }
            },
            (EventKind::Message, Some(Relation::ReplyTo { target })) => {
                if loaded.contains(target) {
                    resolution.replies.insert(event.id.clone(), target.clone());
                }
            },
            (EventKind::Reaction, Some(Relation::Annotation { target, key })) => {
                let senders = resolution
                    .reactions
                    .entry(target.clone())
                    .or_default()
                    .entry(key.clone())
                    .or_default();
                if !senders.contains(&event.sender) {
                    senders.push(event.sender.clone());
                }
            },
            _ => {},
        }

        if event.is_canonical() {
            resolution.canonical.push(event.id.clone());
            resolution.latest_canonical_ts = Some(event.timestamp_ms);
        }
    }

    tracing::trace!(
        canonical = resolution.canonical.len(),
        edits = resolution.edits.len(),
        replies = resolution.replies.len(),
        reacted = resolution.reactions.len(),
        "resolved timeline"
    );
    resolution
}

impl Resolution {
    /// Canonical message ids in timeline order.
    pub fn canonical(&self) -> &[EventId] {
        &self.canonical
    }

    /// Timestamp of the last canonical message. `None` if there are none.
    pub fn latest_canonical_ts(&self) -> Option<u64> {
        self.latest_canonical_ts
    }

    /// Replacement content for `id`, if it was edited.
    pub fn edit(&self, id: &EventId) -> Option<&MessageContent> {
        self.edits.get(id)
    }

    /// Every recorded edit, keyed by target.
    pub fn edits(&self) -> &HashMap<EventId, MessageContent> {
        &self.edits
    }

    /// Loaded event that `id` replies to.
    pub fn reply_target(&self, id: &EventId) -> Option<&EventId> {
        self.replies.get(id)
    }

    /// Every resolved reply, keyed by the replying event.
    pub fn replies(&self) -> &HashMap<EventId, EventId> {
        &self.replies
    }

    /// Reactions on `id`.
    pub fn reactions(&self, id: &EventId) -> Option<&ReactionTally> {
        self.reactions.get(id)
    }

    /// Every reaction tally, keyed by target.
    pub fn all_reactions(&self) -> &HashMap<EventId, ReactionTally> {
        &self.reactions
    }

    /// Effective content of a canonical event.
    ///
    /// Redaction is checked first, so an edited-then-redacted event reads as
    /// deleted. Edits only apply to message events.
    pub fn effective_content<'a>(&'a self, event: &'a Event) -> EffectiveContent<'a> {
        if event.redacted {
            return EffectiveContent::Deleted;
        }
        if event.kind == EventKind::Message
            && let Some(edit) = self.edits.get(&event.id)
        {
            return EffectiveContent::Edited(edit);
        }
        EffectiveContent::Original(&event.content)
    }
}
