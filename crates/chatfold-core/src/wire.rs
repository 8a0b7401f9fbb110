//! Decoding of upstream JSON events.
//!
//! The transport hands over events in the homeserver's client-server JSON
//! shape. This module maps that shape onto [`Event`], collapsing the two
//! reply formats into [`Relation::ReplyTo`] and turning
//! `unsigned.redacted_because` into the redaction flag.
//!
//! Missing required fields are reported as [`ChatError::MalformedEvent`]
//! rather than guessed; callers skip such events with a diagnostic.

use serde::Deserialize;
use serde_json::Value;

use crate::{
    error::ChatError,
    event::{
        Content, Event, EventId, EventKind, Membership, MessageContent, MsgType, Relation, RoomId,
        UserId,
    },
};

#[derive(Debug, Deserialize)]
struct RawEvent {
    event_id: Option<String>,
    sender: Option<String>,
    origin_server_ts: Option<u64>,
    #[serde(rename = "type")]
    event_type: Option<String>,
    #[serde(default)]
    content: RawContent,
    state_key: Option<String>,
    #[serde(default)]
    unsigned: RawUnsigned,
    redacts: Option<String>,
    room_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawContent {
    msgtype: Option<String>,
    body: Option<String>,
    membership: Option<String>,
    displayname: Option<String>,
    redacts: Option<String>,
    #[serde(rename = "m.relates_to")]
    relates_to: Option<RawRelatesTo>,
    #[serde(rename = "m.new_content")]
    new_content: Option<RawMessage>,
}

#[derive(Debug, Deserialize)]
struct RawMessage {
    msgtype: Option<String>,
    body: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRelatesTo {
    rel_type: Option<String>,
    event_id: Option<String>,
    key: Option<String>,
    #[serde(rename = "m.in_reply_to")]
    in_reply_to: Option<RawInReplyTo>,
}

#[derive(Debug, Deserialize)]
struct RawInReplyTo {
    event_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawUnsigned {
    redacted_because: Option<Value>,
}

/// Decode one event delivered for `room_id`.
///
/// A `room_id` field inside the JSON, if any, is ignored in favour of the
/// room the transport delivered the event for.
pub fn decode_event(value: Value, room_id: &RoomId) -> Result<Event, ChatError> {
    let raw: RawEvent = serde_json::from_value(value)?;
    build(raw, room_id.clone())
}

/// Decode one event that names its own room in a `room_id` field.
pub fn decode_room_event(value: Value) -> Result<Event, ChatError> {
    let mut raw: RawEvent = serde_json::from_value(value)?;
    let Some(room_id) = raw.room_id.take().filter(|r| !r.is_empty()) else {
        return Err(ChatError::malformed(raw.event_id.map(EventId::new), "missing room_id"));
    };
    build(raw, RoomId::new(room_id))
}

/// Decode one event from a JSON string.
pub fn decode_str(json: &str, room_id: &RoomId) -> Result<Event, ChatError> {
    decode_event(serde_json::from_str(json)?, room_id)
}

fn build(raw: RawEvent, room_id: RoomId) -> Result<Event, ChatError> {
    let id = match raw.event_id {
        Some(id) if !id.is_empty() => EventId::new(id),
        _ => return Err(ChatError::malformed(None, "missing event_id")),
    };
    let malformed = |reason: &str| ChatError::malformed(Some(id.clone()), reason);

    let sender =
        raw.sender.filter(|s| !s.is_empty()).ok_or_else(|| malformed("missing sender"))?;
    let timestamp_ms = raw.origin_server_ts.ok_or_else(|| malformed("missing origin_server_ts"))?;
    let event_type = raw.event_type.ok_or_else(|| malformed("missing type"))?;
    let kind = EventKind::from_type(&event_type);
    let redacted = raw.unsigned.redacted_because.is_some();

    let relation =
        raw.content.relates_to.as_ref().and_then(|rel| relation(rel, &raw.content));

    let content = if redacted {
        Content::Empty
    } else {
        match &kind {
            EventKind::Message => {
                let body = raw.content.body.ok_or_else(|| malformed("message without body"))?;
                let msgtype = msgtype(raw.content.msgtype.as_deref());
                Content::Message(MessageContent { msgtype, body })
            },
            EventKind::Sticker => Content::Sticker { body: raw.content.body.unwrap_or_default() },
            EventKind::Membership => {
                let user_id = raw
                    .state_key
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| malformed("membership without state_key"))?;
                let membership = raw
                    .content
                    .membership
                    .as_deref()
                    .and_then(Membership::from_str_opt)
                    .ok_or_else(|| malformed("unrecognized membership"))?;
                Content::Membership {
                    user_id: UserId::new(user_id),
                    membership,
                    display_name: raw.content.displayname,
                }
            },
            EventKind::Redaction => {
                let redacts = raw
                    .redacts
                    .or(raw.content.redacts)
                    .filter(|r| !r.is_empty())
                    .ok_or_else(|| malformed("redaction without target"))?;
                Content::Redaction { redacts: EventId::new(redacts) }
            },
            EventKind::Reaction | EventKind::Unknown(_) => Content::Empty,
        }
    };

    Ok(Event {
        id,
        room_id,
        sender: UserId::new(sender),
        timestamp_ms,
        kind,
        content,
        relation,
        redacted,
    })
}

fn relation(rel: &RawRelatesTo, content: &RawContent) -> Option<Relation> {
    let target = rel.event_id.as_deref().filter(|t| !t.is_empty()).map(EventId::from);

    match (rel.rel_type.as_deref(), target) {
        (Some("m.replace"), Some(target)) => {
            let new_content = content.new_content.as_ref().map(|new| MessageContent {
                msgtype: msgtype(new.msgtype.as_deref()),
                body: new.body.clone().unwrap_or_default(),
            });
            if new_content.is_none() {
                tracing::debug!(%target, "edit without m.new_content");
            }
            return Some(Relation::Replace { target, new_content });
        },
        // Still an edit event; it just replaces nothing.
        (Some("m.replace"), None) => {
            tracing::debug!("edit without target event_id");
            return Some(Relation::Replace { target: EventId::from(""), new_content: None });
        },
        (Some("m.annotation"), Some(target)) => {
            let key = rel.key.clone()?;
            return Some(Relation::Annotation { target, key });
        },
        _ => {},
    }

    if let Some(target) = rel
        .in_reply_to
        .as_ref()
        .and_then(|r| r.event_id.as_deref())
        .filter(|t| !t.is_empty())
    {
        return Some(Relation::ReplyTo { target: EventId::from(target) });
    }

    match (rel.rel_type.as_deref(), rel.event_id.as_deref()) {
        (Some("m.reference"), Some(target)) if !target.is_empty() => {
            Some(Relation::ReplyTo { target: EventId::from(target) })
        },
        _ => None,
    }
}

fn msgtype(msgtype: Option<&str>) -> MsgType {
    msgtype.map_or(MsgType::Text, MsgType::from_msgtype)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn room() -> RoomId {
        RoomId::new("!room:example.org")
    }

    fn base(event_type: &str, content: Value) -> Value {
        json!({
            "event_id": "$e1",
            "sender": "@alice:example.org",
            "origin_server_ts": 1_700_000_000_000_u64,
            "type": event_type,
            "content": content,
        })
    }

    #[test]
    fn decodes_text_message() {
        let value = base("m.room.message", json!({"msgtype": "m.text", "body": "hi"}));
        let event = decode_event(value, &room()).unwrap();

        assert_eq!(event.id, EventId::new("$e1"));
        assert_eq!(event.room_id, room());
        assert_eq!(event.timestamp_ms, 1_700_000_000_000);
        assert_eq!(event.content, Content::Message(MessageContent::text("hi")));
        assert!(event.relation.is_none());
        assert!(!event.redacted);
    }

    #[test]
    fn decodes_edit() {
        let event = decode_event(
            base(
                "m.room.message",
                json!({
                    "msgtype": "m.text",
                    "body": "* hello",
                    "m.new_content": {"msgtype": "m.text", "body": "hello"},
                    "m.relates_to": {"rel_type": "m.replace", "event_id": "$orig"},
                }),
            ),
            &room(),
        )
        .unwrap();

        assert!(event.is_edit());
        assert_eq!(
            event.relation,
            Some(Relation::Replace {
                target: EventId::new("$orig"),
                new_content: Some(MessageContent::text("hello")),
            })
        );
    }

    #[test]
    fn incomplete_edits_stay_out_of_canonical() {
        let original = base("m.room.message", json!({"msgtype": "m.text", "body": "hi"}));
        let mut no_content = base(
            "m.room.message",
            json!({"body": "* hey", "m.relates_to": {"rel_type": "m.replace", "event_id": "$e1"}}),
        );
        no_content["event_id"] = json!("$e2");
        let mut no_target = base(
            "m.room.message",
            json!({
                "body": "* hey",
                "m.new_content": {"body": "hey"},
                "m.relates_to": {"rel_type": "m.replace"},
            }),
        );
        no_target["event_id"] = json!("$e3");

        let events: Vec<Event> = [original, no_content, no_target]
            .into_iter()
            .map(|value| decode_event(value, &room()).unwrap())
            .collect();
        assert!(events[1].is_edit());
        assert!(events[2].is_edit());

        let resolution = crate::resolver::resolve(&events);
        assert_eq!(resolution.canonical(), [EventId::new("$e1")]);
        assert!(resolution.edits().is_empty());
    }

    #[test]
    fn both_reply_formats_collapse() {
        let in_reply_to = base(
            "m.room.message",
            json!({"body": "yes", "m.relates_to": {"m.in_reply_to": {"event_id": "$q"}}}),
        );
        let reference = base(
            "m.room.message",
            json!({"body": "yes", "m.relates_to": {"rel_type": "m.reference", "event_id": "$q"}}),
        );

        for value in [in_reply_to, reference] {
            let event = decode_event(value, &room()).unwrap();
            assert_eq!(event.relation, Some(Relation::ReplyTo { target: EventId::new("$q") }));
        }
    }

    #[test]
    fn decodes_reaction() {
        let content =
            json!({"m.relates_to": {"rel_type": "m.annotation", "event_id": "$t", "key": "👍"}});
        let event = decode_event(base("m.reaction", content), &room()).unwrap();

        assert_eq!(event.kind, EventKind::Reaction);
        assert_eq!(
            event.relation,
            Some(Relation::Annotation { target: EventId::new("$t"), key: "👍".to_owned() })
        );
    }

    #[test]
    fn membership_user_comes_from_state_key() {
        let mut value = base("m.room.member", json!({"membership": "join", "displayname": "Bob"}));
        value["state_key"] = json!("@bob:example.org");
        let event = decode_event(value, &room()).unwrap();

        assert_eq!(
            event.content,
            Content::Membership {
                user_id: UserId::new("@bob:example.org"),
                membership: Membership::Join,
                display_name: Some("Bob".to_owned()),
            }
        );
    }

    #[test]
    fn redaction_target_from_top_level_or_content() {
        let mut top = base("m.room.redaction", json!({}));
        top["redacts"] = json!("$gone");
        let in_content = base("m.room.redaction", json!({"redacts": "$gone"}));

        for value in [top, in_content] {
            let event = decode_event(value, &room()).unwrap();
            assert_eq!(event.redacts(), Some(&EventId::new("$gone")));
        }
    }

    #[test]
    fn redacted_because_marks_event_redacted() {
        let mut value = base("m.room.message", json!({}));
        value["unsigned"] = json!({"redacted_because": {"type": "m.room.redaction"}});
        let event = decode_event(value, &room()).unwrap();

        assert!(event.redacted);
        assert_eq!(event.content, Content::Empty);
    }

    #[test]
    fn unknown_types_decode_with_empty_content() {
        let event = decode_event(base("m.room.topic", json!({"topic": "plans"})), &room()).unwrap();
        assert_eq!(event.kind, EventKind::Unknown("m.room.topic".to_owned()));
        assert_eq!(event.content, Content::Empty);
    }

    #[test]
    fn missing_fields_are_malformed() {
        let mut no_id = base("m.room.message", json!({"body": "x"}));
        no_id.as_object_mut().unwrap().remove("event_id");
        assert_eq!(
            decode_event(no_id, &room()),
            Err(ChatError::malformed(None, "missing event_id"))
        );

        let mut no_sender = base("m.room.message", json!({"body": "x"}));
        no_sender.as_object_mut().unwrap().remove("sender");
        assert_eq!(
            decode_event(no_sender, &room()),
            Err(ChatError::malformed(Some(EventId::new("$e1")), "missing sender"))
        );

        let no_body = base("m.room.message", json!({"msgtype": "m.text"}));
        assert!(matches!(decode_event(no_body, &room()), Err(ChatError::MalformedEvent { .. })));
    }

    #[test]
    fn room_event_requires_room_id() {
        let mut value = base("m.room.message", json!({"body": "x"}));
        assert!(decode_room_event(value.clone()).is_err());

        value["room_id"] = json!("!other:example.org");
        let event = decode_room_event(value).unwrap();
        assert_eq!(event.room_id, RoomId::new("!other:example.org"));
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(matches!(decode_str("{not json", &room()), Err(ChatError::MalformedEvent { .. })));
    }
}
