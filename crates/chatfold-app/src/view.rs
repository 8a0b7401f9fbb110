//! Presentation views.
//!
//! Plain data snapshots handed to presentation code. They are rebuilt from
//! the current [`Room`] on every read and hold no references into facade
//! state.

use chatfold_core::{
    Content, DELETED_PLACEHOLDER, EffectiveContent, Event, EventId, EventKind, Membership,
    MessageContent, MsgType, Resolution, Room, RoomId, UserId,
};

/// Reply previews are cut to this many characters.
pub const PREVIEW_MAX_CHARS: usize = 100;

/// Counts above this show as `"99+"`.
pub const BADGE_CAP: u32 = 99;

/// One reaction glyph on a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionView {
    /// Reaction glyph.
    pub key: String,
    /// Number of distinct senders.
    pub count: usize,
    /// Distinct senders in first-seen order.
    pub senders: Vec<UserId>,
}

/// Quoted summary of the event a message replies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyPreview {
    /// Event replied to.
    pub target: EventId,
    /// Author of the target.
    pub sender: UserId,
    /// Preview text of the target.
    pub text: String,
}

/// One canonical message ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    /// Event id.
    pub id: EventId,
    /// Author.
    pub sender: UserId,
    /// Origin timestamp in milliseconds.
    pub timestamp_ms: u64,
    /// Event kind.
    pub kind: EventKind,
    /// Message sub-type of the effective content, for messages.
    pub msgtype: Option<MsgType>,
    /// Effective body text.
    pub body: String,
    /// Content was replaced by an edit.
    pub edited: bool,
    /// Content was withdrawn.
    pub deleted: bool,
    /// Resolved reply target, if loaded.
    pub reply: Option<ReplyPreview>,
    /// Reactions in first-seen key order.
    pub reactions: Vec<ReactionView>,
}

/// One room list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSummary {
    /// Room id.
    pub room_id: RoomId,
    /// Display name.
    pub display_name: String,
    /// Preview of the latest canonical message.
    pub preview: Option<String>,
    /// Timestamp of the latest canonical message.
    pub latest_timestamp: Option<u64>,
    /// Unread count.
    pub unread: u32,
    /// Rendered unread badge. `None` when nothing is unread.
    pub badge: Option<String>,
    /// Room contains a priority member.
    pub priority: bool,
}

/// Render an unread count as a badge.
pub fn unread_badge(count: u32) -> Option<String> {
    match count {
        0 => None,
        n if n > BADGE_CAP => Some(format!("{BADGE_CAP}+")),
        n => Some(n.to_string()),
    }
}

/// Cut `text` to [`PREVIEW_MAX_CHARS`] characters, marking the cut.
pub fn truncate_preview(text: &str) -> String {
    match text.char_indices().nth(PREVIEW_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_owned(),
    }
}

/// Human-readable line for a membership change.
pub fn membership_text(
    user_id: &UserId,
    membership: Membership,
    display_name: Option<&str>,
) -> String {
    let who = display_name.filter(|name| !name.trim().is_empty()).unwrap_or(user_id.as_str());
    match membership {
        Membership::Join => format!("{who} joined"),
        Membership::Leave => format!("{who} left"),
        Membership::Invite => format!("{who} was invited"),
        Membership::Ban => format!("{who} was banned"),
        Membership::Knock => format!("{who} asked to join"),
    }
}

/// Short one-line label for an event, used by reply quotes and room list
/// previews.
///
/// Media messages are labelled by type rather than by body. Text is
/// truncated.
pub fn preview_text(resolution: &Resolution, event: &Event) -> String {
    match resolution.effective_content(event) {
        EffectiveContent::Deleted => DELETED_PLACEHOLDER.to_owned(),
        EffectiveContent::Edited(content) => message_label(content),
        EffectiveContent::Original(content) => match content {
            Content::Message(content) => message_label(content),
            Content::Sticker { .. } => "Sticker".to_owned(),
            Content::Membership { user_id, membership, display_name } => {
                membership_text(user_id, *membership, display_name.as_deref())
            },
            Content::Redaction { .. } | Content::Empty => String::new(),
        },
    }
}

fn message_label(content: &MessageContent) -> String {
    match &content.msgtype {
        MsgType::Image => "Image".to_owned(),
        MsgType::Audio => "Audio".to_owned(),
        MsgType::Video => "Video".to_owned(),
        MsgType::File => format!("File: {}", content.body),
        MsgType::Text | MsgType::Notice | MsgType::Emote | MsgType::Other(_) => {
            truncate_preview(&content.body)
        },
    }
}

/// Reply quote for `target`, if it is loaded.
pub fn reply_preview(room: &Room, target: &EventId) -> Option<ReplyPreview> {
    let event = room.event(target)?;
    Some(ReplyPreview {
        target: target.clone(),
        sender: event.sender.clone(),
        text: preview_text(room.resolution(), event),
    })
}

/// Build the display view of one canonical event.
pub fn message_view(room: &Room, event: &Event) -> MessageView {
    let resolution = room.resolution();
    let effective = resolution.effective_content(event);

    let (msgtype, body) = match effective {
        EffectiveContent::Deleted => (None, DELETED_PLACEHOLDER.to_owned()),
        EffectiveContent::Edited(content) => (Some(content.msgtype.clone()), content.body.clone()),
        EffectiveContent::Original(Content::Message(content)) => {
            (Some(content.msgtype.clone()), content.body.clone())
        },
        EffectiveContent::Original(Content::Sticker { body }) => (None, body.clone()),
        EffectiveContent::Original(Content::Membership { user_id, membership, display_name }) => {
            (None, membership_text(user_id, *membership, display_name.as_deref()))
        },
        EffectiveContent::Original(Content::Redaction { .. } | Content::Empty) => {
            (None, String::new())
        },
    };

    let reply = resolution.reply_target(&event.id).and_then(|target| reply_preview(room, target));

    let reactions = resolution
        .reactions(&event.id)
        .map(|tally| {
            tally
                .iter()
                .map(|(key, senders)| ReactionView {
                    key: key.clone(),
                    count: senders.len(),
                    senders: senders.clone(),
                })
                .collect()
        })
        .unwrap_or_default();

    MessageView {
        id: event.id.clone(),
        sender: event.sender.clone(),
        timestamp_ms: event.timestamp_ms,
        kind: event.kind.clone(),
        msgtype,
        body,
        edited: effective.is_edited(),
        deleted: effective.is_deleted(),
        reply,
        reactions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM: &str = "!room:x";

    fn room(events: Vec<Event>) -> Room {
        let mut room = Room::new(RoomId::new(ROOM), "Room", Vec::<UserId>::new());
        room.append(events);
        room
    }

    fn media(id: &str, msgtype: MsgType, body: &str) -> Event {
        let mut event = Event::message(id, ROOM, "@bob:x", 1, body);
        event.content = Content::Message(MessageContent { msgtype, body: body.to_owned() });
        event
    }

    #[test]
    fn badge_caps_at_ninety_nine() {
        assert_eq!(unread_badge(0), None);
        assert_eq!(unread_badge(7).as_deref(), Some("7"));
        assert_eq!(unread_badge(99).as_deref(), Some("99"));
        assert_eq!(unread_badge(100).as_deref(), Some("99+"));
    }

    #[test]
    fn long_previews_are_truncated_on_char_boundary() {
        let text = "é".repeat(150);
        let preview = truncate_preview(&text);
        assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS + 3);
        assert!(preview.ends_with("..."));

        assert_eq!(truncate_preview("short"), "short");
        assert_eq!(truncate_preview(&"a".repeat(100)), "a".repeat(100));
    }

    #[test]
    fn media_messages_preview_by_type() {
        let room = room(vec![
            media("$i", MsgType::Image, "cat.png"),
            media("$a", MsgType::Audio, "voice.ogg"),
            media("$v", MsgType::Video, "clip.mp4"),
            media("$f", MsgType::File, "report.pdf"),
            Event::sticker("$s", ROOM, "@bob:x", 2, "waving cat"),
        ]);
        let labels: Vec<String> = room
            .canonical_messages()
            .map(|event| preview_text(room.resolution(), event))
            .collect();

        assert_eq!(labels, ["Image", "Audio", "Video", "File: report.pdf", "Sticker"]);
    }

    #[test]
    fn reply_to_deleted_message_quotes_placeholder() {
        let room = room(vec![
            Event::message("$a", ROOM, "@alice:x", 1, "secret"),
            Event::reply("$b", ROOM, "@bob:x", 2, "$a", "what?"),
            Event::redaction("$x", ROOM, "@alice:x", 3, "$a"),
        ]);
        let reply = room.event(&EventId::new("$b")).map(|event| message_view(&room, event));

        let preview = reply.and_then(|view| view.reply);
        assert_eq!(
            preview,
            Some(ReplyPreview {
                target: EventId::new("$a"),
                sender: UserId::new("@alice:x"),
                text: DELETED_PLACEHOLDER.to_owned(),
            })
        );
    }

    #[test]
    fn message_view_reports_edit_and_reactions() {
        let room = room(vec![
            Event::message("$a", ROOM, "@alice:x", 1, "helo"),
            Event::edit("$b", ROOM, "@alice:x", 2, "$a", "hello"),
            Event::reaction("$r1", ROOM, "@bob:x", 3, "$a", "👍"),
            Event::reaction("$r2", ROOM, "@carol:x", 4, "$a", "👍"),
        ]);
        let views: Vec<MessageView> =
            room.canonical_messages().map(|event| message_view(&room, event)).collect();

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].body, "hello");
        assert!(views[0].edited);
        assert!(!views[0].deleted);
        assert_eq!(views[0].reactions.len(), 1);
        assert_eq!(views[0].reactions[0].count, 2);
    }

    #[test]
    fn membership_uses_display_name_when_present() {
        let user = UserId::new("@bob:x");
        assert_eq!(membership_text(&user, Membership::Join, Some("Bob")), "Bob joined");
        assert_eq!(membership_text(&user, Membership::Leave, None), "@bob:x left");
    }
}
