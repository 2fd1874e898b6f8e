//! Match Session Management
//!
//! A [`MatchSession`] owns one [`MatchEngine`] and serializes every input
//! through a single command loop: client messages, timer expiries and
//! connection changes. Timer commands produced by the engine become tokio
//! sleep tasks that report back through the same channel, so a stale expiry
//! is just another command the engine ignores.

use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::game::engine::{ActionResult, MatchEngine, TableConfig};
use crate::game::events::GameEvent;
use crate::game::intent::PlayerIntent;
use crate::game::state::PlayerId;
use crate::game::tile::{Seat, SEAT_COUNT};
use crate::game::timer::{TimerCommand, TimerId};
use crate::network::protocol::{ClientMessage, ServerErrorCode, ServerMessage, TableSummary};

/// Unique session identifier.
pub type SessionId = [u8; 16];

/// Configuration for a match session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capacity of the inbound command channel.
    pub command_capacity: usize,
    /// Capacity of each client's outbound channel.
    pub outbound_capacity: usize,
    /// Deal the first hand as soon as the session runs.
    pub auto_start: bool,
    /// Rules engine configuration.
    pub table: TableConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            command_capacity: 64,
            outbound_capacity: 1024,
            auto_start: true,
            table: TableConfig::default(),
        }
    }
}

impl SessionConfig {
    /// One outbound channel per seat, sized by `outbound_capacity`.
    pub fn outbound_channels(
        &self,
    ) -> ([mpsc::Sender<ServerMessage>; SEAT_COUNT], Vec<mpsc::Receiver<ServerMessage>>) {
        let mut receivers = Vec::with_capacity(SEAT_COUNT);
        let senders = std::array::from_fn(|_| {
            let (tx, rx) = mpsc::channel(self.outbound_capacity);
            receivers.push(rx);
            tx
        });
        (senders, receivers)
    }
}

/// Inputs to the session loop.
#[derive(Debug)]
pub enum SessionCommand {
    /// Message from a seated client.
    Client {
        /// Sender's seat.
        seat: Seat,
        /// Decoded message.
        message: ClientMessage,
    },
    /// Undecoded JSON text from a seated client.
    Raw {
        /// Sender's seat.
        seat: Seat,
        /// Message text.
        text: String,
    },
        /// A timer task finished sleeping.
    TimerFired(TimerId),
    /// Transport noticed a connect or disconnect.
    Connection {
        /// Seat.
        seat: Seat,
        /// New state.
        connected: bool,
    },
    /// Deal the first hand.
    Start,
    /// Stop the session.
    Shutdown {
        /// Sent to every client.
        reason: String,
    },
}

/// Session errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The session loop has stopped.
    #[error("Session is closed")]
    SessionClosed,

    /// Seat index out of range.
    #[error("Invalid seat {0}")]
    InvalidSeat(Seat),

    /// Player already seated at a table.
    #[error("Already in session")]
    AlreadyInSession,

    /// Player not seated anywhere.
    #[error("Player not found")]
    PlayerNotFound,
}

// =============================================================================
// HANDLE
// =============================================================================

/// Cloneable sender side of a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Queue a raw command.
    pub async fn send(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands.send(command).await.map_err(|_| SessionError::SessionClosed)
    }

    /// Forward a client message from `seat`.
    pub async fn client(&self, seat: Seat, message: ClientMessage) -> Result<(), SessionError> {
        if seat >= SEAT_COUNT {
            return Err(SessionError::InvalidSeat(seat));
        }
        self.send(SessionCommand::Client { seat, message }).await
    }

    /// Forward raw JSON from `seat`; the session decodes it and answers
    /// `InvalidMessage` if it does not parse.
    pub async fn client_json(&self, seat: Seat, text: impl Into<String>) -> Result<(), SessionError> {
        if seat >= SEAT_COUNT {
            return Err(SessionError::InvalidSeat(seat));
        }
        self.send(SessionCommand::Raw { seat, text: text.into() }).await
    }

    /// Forward a game action from `seat`.
    pub async fn intent(&self, seat: Seat, intent: PlayerIntent) -> Result<(), SessionError> {
        self.client(seat, ClientMessage::Intent(intent)).await
    }

    /// Report a connection change.
    pub async fn set_connected(&self, seat: Seat, connected: bool) -> Result<(), SessionError> {
        if seat >= SEAT_COUNT {
            return Err(SessionError::InvalidSeat(seat));
        }
        self.send(SessionCommand::Connection { seat, connected }).await
    }

    /// Deal the first hand (no-op once started).
    pub async fn start(&self) -> Result<(), SessionError> {
        self.send(SessionCommand::Start).await
    }

    /// Stop the session loop.
    pub async fn shutdown(&self, reason: &str) -> Result<(), SessionError> {
        self.send(SessionCommand::Shutdown { reason: reason.to_string() }).await
    }

    /// Check whether the session loop has stopped.
    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

// =============================================================================
// SESSION
// =============================================================================

/// One table: engine, client channels and live timer tasks.
pub struct MatchSession {
    /// Unique session identifier.
    pub id: SessionId,
    config: SessionConfig,
    engine: MatchEngine,
    /// Message channel to each seat.
    outbound: Vec<mpsc::Sender<ServerMessage>>,
    commands: mpsc::Receiver<SessionCommand>,
    /// Timer tasks report through this without keeping the loop alive.
    timer_tx: mpsc::WeakSender<SessionCommand>,
    timers: BTreeMap<TimerId, JoinHandle<()>>,
    started: bool,
}

impl MatchSession {
    /// Create a session for four seated players. Nothing runs until
    /// [`MatchSession::run`] is awaited or [`MatchSession::spawn`]ed.
    pub fn new(
        id: SessionId,
        players: [PlayerId; SEAT_COUNT],
        outbound: [mpsc::Sender<ServerMessage>; SEAT_COUNT],
        config: SessionConfig,
    ) -> (Self, SessionHandle) {
        let (tx, rx) = mpsc::channel(config.command_capacity);
        let engine = MatchEngine::new(id, players, config.table.clone());

        let session = Self {
            id,
            engine,
            outbound: outbound.into_iter().collect(),
            commands: rx,
            timer_tx: tx.downgrade(),
            timers: BTreeMap::new(),
            started: false,
            config,
        };
        (session, SessionHandle { id, commands: tx })
    }

    /// Run the loop on the tokio runtime.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    /// Process commands until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        info!(session = %hex::encode(self.id), "session started");
        if self.config.auto_start {
            self.start();
        }

        while let Some(command) = self.commands.recv().await {
            if !self.handle(command) {
                break;
            }
        }

        for (_, task) in std::mem::take(&mut self.timers) {
            task.abort();
        }
        info!(
            session = %hex::encode(self.id),
            hands = self.engine.state().hand_number + 1,
            "session closed"
        );
    }

    /// Handle one command. Returns `false` to stop the loop.
    fn handle(&mut self, command: SessionCommand) -> bool {
        match command {
            SessionCommand::Client { seat, message } => self.on_client(seat, message),
            SessionCommand::Raw { seat, text } => match ClientMessage::from_json(&text) {
                Ok(message) => self.on_client(seat, message),
                Err(err) => {
                    warn!(seat, error = %err, "undecodable client message");
                    self.send(seat, ServerMessage::error(ServerErrorCode::InvalidMessage, err.to_string()));
                }
            },
            SessionCommand::TimerFired(id) => {
                self.timers.remove(&id);
                let result = self.engine.on_timer(id);
                self.dispatch(result);
            }
            SessionCommand::Connection { seat, connected } => {
                let result = self.engine.set_connected(seat, connected);
                self.dispatch(result);
            }
            SessionCommand::Start => self.start(),
            SessionCommand::Shutdown { reason } => {
                info!(session = %hex::encode(self.id), %reason, "session shutting down");
                for seat in 0..SEAT_COUNT {
                    self.send(seat, ServerMessage::Shutdown { reason: reason.clone() });
                }
                return false;
            }
        }
        true
    }

    fn start(&mut self) {
        if self.started {
            return;
        }
        self.started = true;
        let result = self.engine.start();
        self.dispatch(result);
    }

    fn on_client(&mut self, seat: Seat, message: ClientMessage) {
        if seat >= SEAT_COUNT {
            warn!(seat, "message from unknown seat dropped");
            return;
        }

        match message {
            ClientMessage::Intent(intent) if !self.engine.state().player(seat).connected => {
                debug!(seat, intent = intent.name(), "intent from a seat that left");
                self.send(seat, ServerMessage::error(ServerErrorCode::NotSeated, "seat has left the table"));
            }
            ClientMessage::Intent(intent) => {
                debug!(seat, intent = intent.name(), "intent received");
                let result = self.engine.apply(seat, &intent);
                self.dispatch(result);
            }
            ClientMessage::SyncRequest => {
                let summary = TableSummary::for_seat(self.engine.state(), seat);
                self.send(seat, ServerMessage::Sync(summary));
            }
            ClientMessage::Ping { timestamp } => {
                let server_time = SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .map(|d| d.as_millis() as u64)
                    .unwrap_or(0);
                self.send(seat, ServerMessage::Pong { timestamp, server_time });
            }
            ClientMessage::Leave => {
                let result = self.engine.set_connected(seat, false);
                self.dispatch(result);
            }
        }
    }

    /// Apply timer commands, then deliver events.
    fn dispatch(&mut self, result: ActionResult) {
        for command in result.timers {
            match command {
                TimerCommand::Schedule(handle) => {
                    let tx = self.timer_tx.clone();
                    let task = tokio::spawn(async move {
                        tokio::time::sleep(handle.duration).await;
                        if let Some(tx) = tx.upgrade() {
                            let _ = tx.send(SessionCommand::TimerFired(handle.id)).await;
                        }
                    });
                    self.timers.insert(handle.id, task);
                }
                TimerCommand::Cancel(id) => {
                    if let Some(task) = self.timers.remove(&id) {
                        task.abort();
                    }
                }
            }
        }

        for event in result.events {
            self.route(event);
        }
    }

    /// Deliver an event to every connected seat in its audience.
    fn route(&self, event: GameEvent) {
        for seat in 0..SEAT_COUNT {
            if event.audience.includes(seat) && self.engine.state().player(seat).connected {
                self.send(seat, ServerMessage::Event(event.clone()));
            }
        }
    }

    /// Non-blocking send; a slow client loses messages rather than stalling
    /// the table.
    fn send(&self, seat: Seat, message: ServerMessage) {
        let Some(sender) = self.outbound.get(seat) else {
            return;
        };
        match sender.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => warn!(seat, "outbound channel full, message dropped"),
            Err(mpsc::error::TrySendError::Closed(_)) => debug!(seat, "outbound channel closed"),
        }
    }

    /// Read-only engine access.
    pub fn engine(&self) -> &MatchEngine {
        &self.engine
    }
}

// =============================================================================
// SESSION MANAGER
// =============================================================================

/// Manages all active sessions.
pub struct SessionManager {
    /// Active sessions.
    sessions: RwLock<BTreeMap<SessionId, SessionHandle>>,
    /// Player to (session, seat) mapping.
    player_sessions: RwLock<BTreeMap<PlayerId, (SessionId, Seat)>>,
}

impl SessionManager {
    /// Create new session manager.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(BTreeMap::new()),
            player_sessions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Seat four players at a new table and start its loop.
    pub async fn create_session(
        &self,
        players: [PlayerId; SEAT_COUNT],
        outbound: [mpsc::Sender<ServerMessage>; SEAT_COUNT],
        config: SessionConfig,
    ) -> Result<SessionId, SessionError> {
        let mut player_sessions = self.player_sessions.write().await;
        if players.iter().any(|p| player_sessions.contains_key(p)) {
            return Err(SessionError::AlreadyInSession);
        }

        let id = uuid::Uuid::new_v4().into_bytes();
        let (session, handle) = MatchSession::new(id, players, outbound, config);
        session.spawn();

        for (seat, player) in players.iter().enumerate() {
            player_sessions.insert(*player, (id, seat));
        }
        self.sessions.write().await.insert(id, handle);

        info!(
            session = %hex::encode(id),
            players = ?players.iter().map(PlayerId::to_uuid_string).collect::<Vec<_>>(),
            "session created"
        );
        Ok(id)
    }

    /// Get a session by ID.
    pub async fn get_session(&self, id: &SessionId) -> Option<SessionHandle> {
        let sessions = self.sessions.read().await;
        sessions.get(id).cloned()
    }

    /// Session and seat of a player.
    pub async fn seat_of(&self, player_id: &PlayerId) -> Option<(SessionId, Seat)> {
        let player_sessions = self.player_sessions.read().await;
        player_sessions.get(player_id).copied()
    }

    /// Forward a client message to the player's table.
    pub async fn route(&self, player_id: &PlayerId, message: ClientMessage) -> Result<(), SessionError> {
        let (session_id, seat) = self.seat_of(player_id).await.ok_or(SessionError::PlayerNotFound)?;
        let handle = self.get_session(&session_id).await.ok_or(SessionError::SessionClosed)?;
        handle.client(seat, message).await
    }

    /// Stop and forget a session.
    pub async fn remove_session(&self, id: &SessionId, reason: &str) {
        let removed = self.sessions.write().await.remove(id);
        self.player_sessions.write().await.retain(|_, (session, _)| session != id);
        if let Some(handle) = removed {
            let _ = handle.shutdown(reason).await;
        }
    }

    /// Get active session count.
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    /// Forget sessions whose loop has stopped.
    pub async fn cleanup(&self) {
        let mut sessions = self.sessions.write().await;
        let closed: Vec<SessionId> = sessions
            .iter()
            .filter(|(_, handle)| handle.is_closed())
            .map(|(id, _)| *id)
            .collect();

        for id in &closed {
            sessions.remove(id);
        }
        drop(sessions);

        if !closed.is_empty() {
            self.player_sessions
                .write()
                .await
                .retain(|_, (session, _)| !closed.contains(session));
        }
    }
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::events::GameEventData;
    use crate::game::handlers::ErrorCode;
    use crate::game::tile::TileId;
    use std::time::Duration;

    struct Table {
        handle: SessionHandle,
        task: JoinHandle<()>,
        inboxes: Vec<mpsc::Receiver<ServerMessage>>,
    }

    fn players() -> [PlayerId; SEAT_COUNT] {
        [1u8, 2, 3, 4].map(|i| PlayerId::new([i; 16]))
    }

    fn channels(
        capacity: usize,
    ) -> ([mpsc::Sender<ServerMessage>; SEAT_COUNT], Vec<mpsc::Receiver<ServerMessage>>) {
        SessionConfig { outbound_capacity: capacity, ..SessionConfig::default() }.outbound_channels()
    }

    fn open_table(config: SessionConfig) -> Table {
        let (senders, inboxes) = config.outbound_channels();
        let (session, handle) = MatchSession::new([7; 16], players(), senders, config);
        Table { handle, task: session.spawn(), inboxes }
    }

    async fn wait_for<F>(inbox: &mut mpsc::Receiver<ServerMessage>, mut matches: F) -> ServerMessage
    where
        F: FnMut(&ServerMessage) -> bool,
    {
        loop {
            let message = inbox.recv().await.expect("session closed");
            if matches(&message) {
                return message;
            }
        }
    }

    fn is_event(message: &ServerMessage, check: impl Fn(&GameEventData) -> bool) -> bool {
        matches!(message, ServerMessage::Event(event) if check(&event.data))
    }

    #[tokio::test]
    async fn test_session_deals_on_start() {
        let mut table = open_table(SessionConfig::default());

        for inbox in table.inboxes.iter_mut() {
            wait_for(inbox, |m| is_event(m, |d| matches!(d, GameEventData::HandStarted { .. }))).await;
        }
        let hand = wait_for(&mut table.inboxes[0], |m| {
            is_event(m, |d| matches!(d, GameEventData::HandUpdated { .. }))
        })
        .await;
        match hand {
            ServerMessage::Event(event) => assert_eq!(event.audience, crate::game::events::Audience::Seat(0)),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_manual_start() {
        let config = SessionConfig { auto_start: false, ..SessionConfig::default() };
        let mut table = open_table(config);

        table.handle.client(1, ClientMessage::SyncRequest).await.unwrap();
        let sync = wait_for(&mut table.inboxes[1], |m| matches!(m, ServerMessage::Sync(_))).await;
        assert!(matches!(sync, ServerMessage::Sync(ref s) if s.hand.is_empty()));

        table.handle.start().await.unwrap();
        table.handle.start().await.unwrap();
        table.handle.client(1, ClientMessage::SyncRequest).await.unwrap();
        let sync = wait_for(&mut table.inboxes[1], |m| matches!(m, ServerMessage::Sync(_))).await;
        match sync {
            ServerMessage::Sync(summary) => {
                assert_eq!(summary.viewer, 1);
                assert_eq!(summary.hand.len(), 16);
                assert_eq!(summary.hand_number, 0);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_turn_timer_auto_discards() {
        tokio::time::pause();
        let mut table = open_table(SessionConfig::default());

        let message = wait_for(&mut table.inboxes[2], |m| {
            is_event(m, |d| matches!(d, GameEventData::TileDiscarded { seat: 0, .. }))
        })
        .await;
        match message {
            ServerMessage::Event(event) => {
                assert!(matches!(event.data, GameEventData::TileDiscarded { automatic: true, .. }));
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rejection_goes_to_actor_only() {
        let mut table = open_table(SessionConfig::default());

        table.handle.intent(1, PlayerIntent::Discard { tile: TileId(0) }).await.unwrap();
        let rejected = wait_for(&mut table.inboxes[1], |m| {
            is_event(m, |d| matches!(d, GameEventData::ActionRejected { .. }))
        })
        .await;
        assert!(is_event(&rejected, |d| matches!(
            d,
            GameEventData::ActionRejected { code: ErrorCode::WrongTurn, .. }
        )));

        table.handle.client(3, ClientMessage::SyncRequest).await.unwrap();
        let inbox = &mut table.inboxes[3];
        loop {
            let message = inbox.recv().await.unwrap();
            assert!(!is_event(&message, |d| matches!(d, GameEventData::ActionRejected { .. })));
            if matches!(message, ServerMessage::Sync(_)) {
                break;
            }
        }
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let mut table = open_table(SessionConfig::default());
        table.handle.client(2, ClientMessage::Ping { timestamp: 42 }).await.unwrap();
        let pong = wait_for(&mut table.inboxes[2], |m| matches!(m, ServerMessage::Pong { .. })).await;
        assert!(matches!(pong, ServerMessage::Pong { timestamp: 42, .. }));
    }

    #[tokio::test]
    async fn test_invalid_seat_rejected_by_handle() {
        let table = open_table(SessionConfig::default());
        assert_eq!(
            table.handle.client(4, ClientMessage::SyncRequest).await,
            Err(SessionError::InvalidSeat(4))
        );
    }

    #[tokio::test]
    async fn test_leave_stops_delivery() {
        let mut table = open_table(SessionConfig::default());
        table.handle.client(3, ClientMessage::Leave).await.unwrap();

        let notice = wait_for(&mut table.inboxes[0], |m| {
            is_event(m, |d| matches!(d, GameEventData::ConnectionChanged { .. }))
        })
        .await;
        assert!(is_event(&notice, |d| matches!(
            d,
            GameEventData::ConnectionChanged { seat: 3, connected: false }
        )));
    }

    #[tokio::test]
    async fn test_raw_json_is_decoded_or_refused() {
        let mut table = open_table(SessionConfig::default());

        table.handle.client_json(2, r#"{"type":"ping","timestamp":7}"#).await.unwrap();
        let pong = wait_for(&mut table.inboxes[2], |m| matches!(m, ServerMessage::Pong { .. })).await;
        assert!(matches!(pong, ServerMessage::Pong { timestamp: 7, .. }));

        table.handle.client_json(2, "{not json").await.unwrap();
        let error = wait_for(&mut table.inboxes[2], |m| matches!(m, ServerMessage::Error(_))).await;
        assert!(matches!(error, ServerMessage::Error(ref e) if e.code == ServerErrorCode::InvalidMessage));
    }

    #[tokio::test]
    async fn test_intent_after_leave_is_refused() {
        let mut table = open_table(SessionConfig::default());
        table.handle.client(0, ClientMessage::Leave).await.unwrap();
        table.handle.intent(0, PlayerIntent::Pass).await.unwrap();

        let error = wait_for(&mut table.inboxes[0], |m| matches!(m, ServerMessage::Error(_))).await;
        assert!(matches!(error, ServerMessage::Error(ref e) if e.code == ServerErrorCode::NotSeated));
    }

    #[tokio::test]
    async fn test_shutdown_notifies_and_stops() {
        let mut table = open_table(SessionConfig::default());
        table.handle.shutdown("maintenance").await.unwrap();

        let message = wait_for(&mut table.inboxes[0], |m| matches!(m, ServerMessage::Shutdown { .. })).await;
        assert!(matches!(message, ServerMessage::Shutdown { ref reason } if reason == "maintenance"));

        tokio::time::timeout(Duration::from_secs(1), table.task).await.unwrap().unwrap();
        assert!(table.handle.is_closed());
        assert_eq!(table.handle.start().await, Err(SessionError::SessionClosed));
    }

    #[tokio::test]
    async fn test_session_manager() {
        let manager = SessionManager::new();
        let (senders, mut inboxes) = channels(1024);
        let id = manager.create_session(players(), senders, SessionConfig::default()).await.unwrap();
        assert_eq!(manager.session_count().await, 1);
        assert_eq!(manager.seat_of(&players()[2]).await, Some((id, 2)));

        let (again, _) = channels(8);
        assert_eq!(
            manager.create_session(players(), again, SessionConfig::default()).await,
            Err(SessionError::AlreadyInSession)
        );

        manager.route(&players()[2], ClientMessage::SyncRequest).await.unwrap();
        let sync = wait_for(&mut inboxes[2], |m| matches!(m, ServerMessage::Sync(_))).await;
        assert!(matches!(sync, ServerMessage::Sync(ref s) if s.viewer == 2));

        let stranger = PlayerId::new([9; 16]);
        assert_eq!(
            manager.route(&stranger, ClientMessage::SyncRequest).await,
            Err(SessionError::PlayerNotFound)
        );

        manager.remove_session(&id, "done").await;
        assert_eq!(manager.session_count().await, 0);
        assert_eq!(manager.seat_of(&players()[0]).await, None);
    }

    #[tokio::test]
    async fn test_cleanup_forgets_stopped_sessions() {
        let manager = SessionManager::new();
        let (senders, mut inboxes) = channels(1024);
        let id = manager.create_session(players(), senders, SessionConfig::default()).await.unwrap();

        let handle = manager.get_session(&id).await.unwrap();
        handle.shutdown("test").await.unwrap();
        wait_for(&mut inboxes[0], |m| matches!(m, ServerMessage::Shutdown { .. })).await;
        while !handle.is_closed() {
            tokio::task::yield_now().await;
        }

        manager.cleanup().await;
        assert_eq!(manager.session_count().await, 0);
        assert_eq!(manager.seat_of(&players()[1]).await, None);
    }
}
