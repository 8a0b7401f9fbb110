//! Chat facade state machine.
//!
//! This module defines the [`ChatFacade`], the single integration point
//! between presentation code and the derived-state engine. It is a pure
//! state machine: it consumes [`FacadeEvent`] inputs and user operations and
//! produces [`FacadeAction`] instructions for the runtime to execute.
//!
//! # Responsibilities
//!
//! - Owns one [`Room`] (timeline plus resolution) per joined room.
//! - Keeps the room list order current as recency changes.
//! - Feeds newly appended events to the unread tracker.
//! - Tracks the selected room, the draft, and a transient status line.

use std::{collections::HashMap, ops::Sub, time::Duration};

use chatfold_core::{ChatError, Event, Room, RoomId, RoomOrderer, RoomRecency, UnreadTracker};

use crate::{
    ChatConfig, FacadeAction, FacadeEvent, JoinedRoom,
    view::{self, MessageView, RoomSummary},
};

/// Which room the user is looking at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    /// No room is open.
    NoRoomSelected,
    /// `0` is open.
    RoomSelected(RoomId),
}

/// Chat facade state machine.
///
/// `I` is the environment's instant type. No I/O dependencies; the
/// [`crate::Runtime`] executes the actions it returns.
#[derive(Debug, Clone)]
pub struct ChatFacade<I> {
    config: ChatConfig,
    /// Per-room state.
    rooms: HashMap<RoomId, Room>,
    /// Rooms in the order the transport reported them.
    join_order: Vec<RoomId>,
    orderer: RoomOrderer,
    /// Current room list order, recomputed on recency changes.
    order: Vec<RoomId>,
    unread: UnreadTracker<I>,
    selection: Selection,
    draft: String,
    /// Transient status line. `None` if nothing to report.
    status: Option<String>,
    /// Latest time seen through ticks.
    now: I,
}

impl<I> ChatFacade<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a facade for a session that started at `started_at`.
    pub fn new(config: ChatConfig, started_at: I) -> Self {
        let unread = UnreadTracker::new(
            config.local_user.clone(),
            config.linked_identities.iter().cloned(),
            config.settle_delay(),
            started_at,
        );
        let orderer = RoomOrderer::new(config.priority_identities.iter().cloned());
        tracing::info!(
            local_user = %config.local_user,
            settle = ?config.settle_delay(),
            "chat session started"
        );

        Self {
            config,
            rooms: HashMap::new(),
            join_order: Vec::new(),
            orderer,
            order: Vec::new(),
            unread,
            selection: Selection::NoRoomSelected,
            draft: String::new(),
            status: None,
            now: started_at,
        }
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: FacadeEvent<I>) -> Vec<FacadeAction> {
        match event {
            FacadeEvent::RoomsListed { rooms } => {
                tracing::info!(count = rooms.len(), "room list received");
                for room in rooms {
                    self.add_room(room);
                }
                self.recompute_order();

                let mut actions = Vec::new();
                if self.config.auto_select_first
                    && self.selection == Selection::NoRoomSelected
                    && let Some(first) = self.first_visible_room()
                {
                    actions.extend(self.open_room(first));
                }
                actions.push(FacadeAction::Render);
                actions
            },
            FacadeEvent::RoomJoined { room } => {
                tracing::info!(room_id = %room.room_id, "room joined");
                self.add_room(room);
                self.recompute_order();
                vec![FacadeAction::Render]
            },
            FacadeEvent::LiveEvent { room_id, event } => self.handle_live(room_id, event),
            FacadeEvent::BackfillCompleted { room_id, events } => {
                let Some(room) = self.rooms.get_mut(&room_id) else {
                    tracing::warn!(%room_id, "backfill for unknown room dropped");
                    return vec![];
                };
                let fetched = events.len();
                let inserted = room.backfill(events);
                tracing::debug!(%room_id, fetched, inserted, "backfill applied");

                self.status = None;
                self.recompute_order();
                vec![FacadeAction::Render]
            },
            FacadeEvent::BackfillFailed { room_id, error } => {
                if let Some(room) = self.rooms.get_mut(&room_id) {
                    room.mark_backfill_failed();
                }
                tracing::warn!(%room_id, %error, "backfill failed");
                self.status = Some(format!("Could not load history: {error}"));
                vec![FacadeAction::Render]
            },
            FacadeEvent::SendCompleted { room_id, event_id } => {
                tracing::info!(%room_id, %event_id, "message sent");
                self.draft.clear();
                self.status = None;
                vec![FacadeAction::Render]
            },
            FacadeEvent::SendFailed { room_id, error } => {
                tracing::warn!(%room_id, %error, "send failed, draft kept");
                self.status = Some(format!("Message not sent: {error}"));
                vec![FacadeAction::Render]
            },
            FacadeEvent::Tick { now } => {
                self.now = self.now.max(now);
                if self.unread.tick(self.now) { vec![FacadeAction::Render] } else { vec![] }
            },
            FacadeEvent::TransportError { error } => {
                tracing::warn!(%error, "transport error");
                self.status = Some(format!("Connection problem: {error}"));
                vec![FacadeAction::Render]
            },
        }
    }

    fn handle_live(&mut self, room_id: RoomId, event: Event) -> Vec<FacadeAction> {
        let Some(room) = self.rooms.get_mut(&room_id) else {
            tracing::warn!(%room_id, event_id = %event.id, "live event for unknown room dropped");
            return vec![];
        };
        if event.room_id != room_id {
            tracing::debug!(
                %room_id,
                event_room = %event.room_id,
                "event room differs from delivery room"
            );
        }

        let sender = event.sender.clone();
        if room.append([event]) == 0 {
            tracing::trace!(%room_id, "duplicate live event ignored");
            return vec![];
        }
        self.status = None;

        if self.unread.record(self.now, &room_id, &sender) {
            tracing::debug!(%room_id, unread = self.unread.count(&room_id), "unread incremented");
        }
        // Membership changes can move a room across the priority partition
        // without touching its recency.
        self.recompute_order();
        vec![FacadeAction::Render]
    }

    /// Select a room, or clear the selection with `None`.
    ///
    /// Resets the room's unread count. Requests older history when the
    /// loaded window is smaller than the configured minimum.
    pub fn select_room(&mut self, room_id: Option<RoomId>) -> Result<Vec<FacadeAction>, ChatError> {
        let Some(room_id) = room_id else {
            tracing::info!("selection cleared");
            self.selection = Selection::NoRoomSelected;
            self.unread.set_active_room(None);
            return Ok(vec![FacadeAction::Render]);
        };
        if !self.rooms.contains_key(&room_id) {
            return Err(ChatError::UnknownRoom(room_id));
        }

        let mut actions = self.open_room(room_id);
        actions.push(FacadeAction::Render);
        Ok(actions)
    }

    fn open_room(&mut self, room_id: RoomId) -> Vec<FacadeAction> {
        tracing::info!(%room_id, "room selected");
        self.unread.set_active_room(Some(&room_id));

        let mut actions = Vec::new();
        if let Some(room) = self.rooms.get_mut(&room_id)
            && room.store().len() < self.config.min_window
        {
            actions.extend(Self::start_backfill(room, self.config.backfill_limit));
        }
        self.selection = Selection::RoomSelected(room_id);
        actions
    }

    /// Explicitly request older history for a room ("load older").
    ///
    /// Returns no action if a request is already outstanding or history is
    /// exhausted.
    pub fn request_backfill(&mut self, room_id: &RoomId) -> Result<Vec<FacadeAction>, ChatError> {
        let limit = self.config.backfill_limit;
        let room =
            self.rooms.get_mut(room_id).ok_or_else(|| ChatError::UnknownRoom(room_id.clone()))?;
        Ok(Self::start_backfill(room, limit).into_iter().collect())
    }

    fn start_backfill(room: &mut Room, limit: usize) -> Option<FacadeAction> {
        if !room.can_backfill() {
            tracing::debug!(
                room_id = %room.id(),
                in_flight = room.backfill_in_flight(),
                exhausted = room.history_exhausted(),
                "backfill not requested"
            );
            return None;
        }
        room.mark_backfill_started();
        let before = room.store().earliest_id().cloned();
        tracing::debug!(room_id = %room.id(), ?before, limit, "requesting backfill");
        Some(FacadeAction::Backfill { room_id: room.id().clone(), before, limit })
    }

    /// Send a message to the selected room.
    ///
    /// The text becomes the draft until the transport acknowledges the send.
    /// The local timeline is not touched; the message appears when it comes
    /// back through the subscription.
    pub fn send_message(&mut self, text: &str) -> Result<Vec<FacadeAction>, ChatError> {
        let Selection::RoomSelected(room_id) = &self.selection else {
            return Err(ChatError::NoRoomSelected);
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyMessage);
        }

        let action =
            FacadeAction::SendMessage { room_id: room_id.clone(), text: trimmed.to_owned() };
        text.clone_into(&mut self.draft);
        Ok(vec![action, FacadeAction::Render])
    }

    /// Replace the draft text.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Send the current draft.
    pub fn send_draft(&mut self) -> Result<Vec<FacadeAction>, ChatError> {
        let draft = self.draft.clone();
        self.send_message(&draft)
    }

    fn add_room(&mut self, joined: JoinedRoom) {
        let JoinedRoom { room_id, display_name, members, backlog } = joined;
        if let Some(room) = self.rooms.get_mut(&room_id) {
            tracing::debug!(%room_id, "room already known, merging backlog");
            room.seed(backlog);
            return;
        }

        let mut room = Room::new(room_id.clone(), display_name, members);
        let seeded = room.seed(backlog);
        tracing::debug!(%room_id, seeded, "room added");

        self.unread.track_room(&room_id);
        self.rooms.insert(room_id.clone(), room);
        self.join_order.push(room_id);
    }

    fn recompute_order(&mut self) {
        let rooms = self.join_order.iter().filter_map(|id| self.rooms.get(id)).map(|room| {
            RoomRecency {
                room_id: room.id(),
                latest: room.latest_timestamp(),
                members: room.members(),
            }
        });
        self.order = self.orderer.order(rooms);
    }

    fn first_visible_room(&self) -> Option<RoomId> {
        self.order
            .iter()
            .filter_map(|id| self.rooms.get(id))
            .find(|room| !self.config.is_hidden(room.display_name()))
            .map(|room| room.id().clone())
    }

    /// Current selection.
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Selected room id. `None` if no room is selected.
    pub fn selected_room(&self) -> Option<&RoomId> {
        match &self.selection {
            Selection::RoomSelected(room_id) => Some(room_id),
            Selection::NoRoomSelected => None,
        }
    }

    /// Canonical messages of the selected room. Empty if none is selected.
    pub fn current_messages(&self) -> Vec<MessageView> {
        let Some(room) = self.selected_room().and_then(|id| self.rooms.get(id)) else {
            return Vec::new();
        };
        room.canonical_messages().map(|event| view::message_view(room, event)).collect()
    }

    /// Room list order, including hidden rooms.
    pub fn room_order(&self) -> &[RoomId] {
        &self.order
    }

    /// Room list entries in display order.
    ///
    /// Hidden rooms are excluded. A non-blank `search` keeps only rooms whose
    /// display name or latest message preview contains it, ignoring case.
    pub fn room_summaries(&self, search: &str) -> Vec<RoomSummary> {
        let needle = search.trim().to_lowercase();
        self.order
            .iter()
            .filter_map(|id| self.rooms.get(id))
            .filter(|room| !self.config.is_hidden(room.display_name()))
            .map(|room| self.summary(room))
            .filter(|summary| {
                needle.is_empty()
                    || summary.display_name.to_lowercase().contains(&needle)
                    || summary.preview.as_ref().is_some_and(|p| p.to_lowercase().contains(&needle))
            })
            .collect()
    }

    fn summary(&self, room: &Room) -> RoomSummary {
        let unread = self.unread.count(room.id());
        RoomSummary {
            room_id: room.id().clone(),
            display_name: room.display_name().to_owned(),
            preview: room
                .last_canonical()
                .map(|event| view::preview_text(room.resolution(), event)),
            latest_timestamp: room.latest_timestamp(),
            unread,
            badge: view::unread_badge(unread),
            priority: self.orderer.is_priority(room.members()),
        }
    }

    /// Unread count for a room. Zero for unknown rooms.
    pub fn unread_count(&self, room_id: &RoomId) -> u32 {
        self.unread.count(room_id)
    }

    /// True once the initial sync has settled and unread counting is active.
    pub fn is_settled(&self) -> bool {
        self.unread.is_active()
    }

    /// Room state. `None` for unknown rooms.
    pub fn room(&self, room_id: &RoomId) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// All rooms, in join order.
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.join_order.iter().filter_map(|id| self.rooms.get(id))
    }

    /// Current draft text.
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Transient status line. `None` if nothing to report.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Active configuration.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }
}
