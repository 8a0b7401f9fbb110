//! Plain-text rendering of facade views.
//!
//! Times are shown in the timezone of the `now` (or `tz`) the caller passes;
//! the binary uses [`chrono::Local`].

use std::fmt::{self, Write};

use chatfold_app::{MessageView, RoomSummary};
use chatfold_core::RoomId;
use chrono::{DateTime, TimeZone};

/// Room list, one line per room.
///
/// The selected room is marked `>`, others `-`. Priority rooms carry `!`,
/// unread rooms their badge, and rooms with messages a time label relative
/// to `now` (see [`time_label`]).
pub fn room_list<W, Tz>(
    out: &mut W,
    rooms: &[RoomSummary],
    selected: Option<&RoomId>,
    now: &DateTime<Tz>,
) -> fmt::Result
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    for room in rooms {
        let marker = if selected == Some(&room.room_id) { '>' } else { '-' };
        write!(out, "{marker} {}", room.display_name)?;
        if room.priority {
            out.write_str(" !")?;
        }
        if let Some(badge) = &room.badge {
            write!(out, " ({badge})")?;
        }
        if let Some(label) = room.latest_timestamp.and_then(|ts| time_label(ts, now)) {
            write!(out, " [{label}]")?;
        }
        if let Some(preview) = &room.preview {
            write!(out, ": {preview}")?;
        }
        out.write_char('\n')?;
    }
    Ok(())
}

/// Message list, one line per canonical message.
pub fn messages<W, Tz>(out: &mut W, views: &[MessageView], tz: &Tz) -> fmt::Result
where
    W: Write,
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    for view in views {
        write!(out, "[{}] {}: {}", clock(view.timestamp_ms, tz), view.sender, view.body)?;
        if view.edited {
            out.write_str(" (edited)")?;
        }
        if let Some(reply) = &view.reply {
            write!(out, " [re {}: {}]", reply.sender, reply.text)?;
        }
        let mut reactions = view.reactions.iter();
        if let Some(first) = reactions.next() {
            write!(out, " [{} {}", first.key, first.count)?;
            for reaction in reactions {
                write!(out, ", {} {}", reaction.key, reaction.count)?;
            }
            out.write_char(']')?;
        }
        out.write_char('\n')?;
    }
    Ok(())
}

/// Sidebar time label: `HH:MM` today, `Yesterday`, otherwise `dd/mm`.
///
/// Days are calendar days in `now`'s timezone. `None` for timestamps
/// outside chrono's range.
pub fn time_label<Tz>(timestamp_ms: u64, now: &DateTime<Tz>) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    let at = local(timestamp_ms, &now.timezone())?;
    let today = now.date_naive();
    let day = at.date_naive();

    let label = if day == today {
        at.format("%H:%M").to_string()
    } else if today.pred_opt() == Some(day) {
        "Yesterday".to_owned()
    } else {
        at.format("%d/%m").to_string()
    };
    Some(label)
}

/// `HH:MM` of a millisecond timestamp in `tz`.
fn clock<Tz>(timestamp_ms: u64, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: fmt::Display,
{
    local(timestamp_ms, tz).map_or_else(|| "--:--".to_owned(), |at| at.format("%H:%M").to_string())
}

fn local<Tz: TimeZone>(timestamp_ms: u64, tz: &Tz) -> Option<DateTime<Tz>> {
    let millis = i64::try_from(timestamp_ms).ok()?;
    DateTime::from_timestamp_millis(millis).map(|utc| utc.with_timezone(tz))
}
