//! Generic runtime for facade orchestration.
//!
//! The Runtime drives the session loop, coordinating between:
//! - [`ChatFacade`]: derived-state machine
//! - [`Transport`]: protocol client I/O
//! - [`Environment`]: clock for ticks and retry pauses

use std::{collections::VecDeque, time::Duration};

use chatfold_core::{ChatError, RoomId, env::Environment};

use crate::{ChatConfig, ChatFacade, FacadeAction, FacadeEvent, Transport};

/// Pause after a subscription error before polling again.
pub const SUBSCRIPTION_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Generic runtime that executes facade actions against a transport.
///
/// # Type Parameters
///
/// - `T`: Protocol client
/// - `E`: Environment providing time
pub struct Runtime<T, E>
where
    T: Transport,
    E: Environment,
{
    transport: T,
    env: E,
    facade: ChatFacade<E::Instant>,
    renders: u64,
}

impl<T, E> Runtime<T, E>
where
    T: Transport,
    E: Environment,
{
    /// Create a runtime. The session clock starts now.
    pub fn new(transport: T, env: E, config: ChatConfig) -> Self {
        let facade = ChatFacade::new(config, env.now());
        Self { transport, env, facade, renders: 0 }
    }

    /// Load the joined rooms into the facade.
    ///
    /// # Errors
    ///
    /// Returns [`ChatError::TransportUnavailable`] if the room list cannot be
    /// fetched. The error is also shown as the facade status.
    pub async fn start(&mut self) -> Result<(), ChatError> {
        let rooms = match self.transport.joined_rooms().await {
            Ok(rooms) => rooms,
            Err(err) => {
                let error = transport_error(&err);
                let actions =
                    self.facade.handle(FacadeEvent::TransportError { error: error.clone() });
                self.execute(actions).await;
                return Err(error);
            },
        };

        let actions = self.facade.handle(FacadeEvent::RoomsListed { rooms });
        self.execute(actions).await;
        Ok(())
    }

    /// Run the session until the subscription closes.
    ///
    /// # Errors
    ///
    /// Returns an error if [`Runtime::start`] fails.
    pub async fn run(&mut self) -> Result<(), ChatError> {
        self.start().await?;
        while self.process_cycle().await {}
        tracing::info!(renders = self.renders, "subscription closed, session finished");
        Ok(())
    }

    /// Process one live event.
    ///
    /// Returns `false` once the subscription is closed.
    pub async fn process_cycle(&mut self) -> bool {
        self.tick().await;

        match self.transport.next_event().await {
            Ok(Some((room_id, event))) => {
                self.tick().await;
                let actions = self.facade.handle(FacadeEvent::LiveEvent { room_id, event });
                self.execute(actions).await;
                true
            },
            Ok(None) => false,
            Err(err) => {
                let error = transport_error(&err);
                let actions = self.facade.handle(FacadeEvent::TransportError { error });
                self.execute(actions).await;
                self.env.sleep(SUBSCRIPTION_RETRY_DELAY).await;
                true
            },
        }
    }

    /// Select a room and execute the resulting actions.
    pub async fn select_room(&mut self, room_id: Option<RoomId>) -> Result<(), ChatError> {
        let actions = self.facade.select_room(room_id)?;
        self.execute(actions).await;
        Ok(())
    }

    /// Send a message to the selected room.
    ///
    /// Transport failures do not surface here; they leave the draft in place
    /// and set the facade status.
    pub async fn send_message(&mut self, text: &str) -> Result<(), ChatError> {
        let actions = self.facade.send_message(text)?;
        self.execute(actions).await;
        Ok(())
    }

    /// Request older history for a room.
    pub async fn request_backfill(&mut self, room_id: &RoomId) -> Result<(), ChatError> {
        let actions = self.facade.request_backfill(room_id)?;
        self.execute(actions).await;
        Ok(())
    }

    async fn tick(&mut self) {
        let now = self.env.now();
        let actions = self.facade.handle(FacadeEvent::Tick { now });
        self.execute(actions).await;
    }

    /// Execute actions, feeding each result back into the facade until no
    /// actions remain.
    async fn execute(&mut self, actions: Vec<FacadeAction>) {
        let mut pending: VecDeque<FacadeAction> = actions.into();

        while let Some(action) = pending.pop_front() {
            match action {
                FacadeAction::Backfill { room_id, before, limit } => {
                    let result = self.transport.paginate(&room_id, before.as_ref(), limit).await;
                    let event = match result {
                        Ok(events) => FacadeEvent::BackfillCompleted { room_id, events },
                        Err(err) => {
                            FacadeEvent::BackfillFailed { room_id, error: transport_error(&err) }
                        },
                    };
                    pending.extend(self.facade.handle(event));
                },
                FacadeAction::SendMessage { room_id, text } => {
                    let event = match self.transport.send(&room_id, &text).await {
                        Ok(event_id) => FacadeEvent::SendCompleted { room_id, event_id },
                        Err(err) => {
                            FacadeEvent::SendFailed { room_id, error: transport_error(&err) }
                        },
                    };
                    pending.extend(self.facade.handle(event));
                },
                FacadeAction::Render => {
                    self.renders += 1;
                },
            }
        }
    }

    /// Get a reference to the facade.
    pub fn facade(&self) -> &ChatFacade<E::Instant> {
        &self.facade
    }

    /// Get a mutable reference to the facade.
    pub fn facade_mut(&mut self) -> &mut ChatFacade<E::Instant> {
        &mut self.facade
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Number of render requests executed so far.
    pub fn render_count(&self) -> u64 {
        self.renders
    }
}

fn transport_error(err: &impl std::error::Error) -> ChatError {
    ChatError::TransportUnavailable(err.to_string())
}
