//! Match Engine
//!
//! Drives one match through its hands: deal, bonus replacement, the
//! draw/discard loop with claim windows, hand end and rotation.
//!
//! Everything here is a free function over `&mut MatchState`; callers
//! must validate intents first (see `handlers`). [`MatchEngine`] bundles
//! the state with its configuration and drains events and timer commands
//! after every input.
//!
//! ## Turn flow
//!
//! ```text
//! deal ─► bonus replacement ─► dealer opens (17 tiles, no draw)
//!                                   │
//!        ┌──────────────────────────┘
//!        ▼
//!   offer self options ─► turn timer ─► discard ─► claim window?
//!        ▲                                            │ no claim
//!        └──────────── next seat draws ◄──────────────┘
//! ```

use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::core::rng::{derive_match_seed, DeterministicRng};
use crate::game::claim::{
    claim_options, is_valid_claim, win_options, ClaimContext, ClaimOption, ClaimResolution, ClaimWindow,
    PendingRobKong,
};
use crate::game::events::{GameEvent, GameEventData, HandResult, RevealedHand, SeatResult};
use crate::game::handlers::handle_intent;
use crate::game::intent::PlayerIntent;
use crate::game::kong::{self_kong_options, KongOption};
use crate::game::meld::{Meld, MeldKind};
use crate::game::state::{HandOutcome, MatchPhase, MatchState, PlayerId, WinnerEntry};
use crate::game::tile::{next_seat, seats_after, sort_tiles, Seat, Tile, TileId, TileKind, SEAT_COUNT};
use crate::game::timer::{TimerCommand, TimerId, TimerPurpose};
use crate::game::wall::{TileWall, WallError};
use crate::game::win::{find_winning_combinations, WinningCombination};

/// Tiles dealt to each non-dealer seat.
pub const HAND_SIZE: usize = 16;

/// Allowed turn timeout, in seconds.
pub const TURN_TIMEOUT_SECS: RangeInclusive<u64> = 5..=30;

/// Allowed claim window, in seconds.
pub const CLAIM_TIMEOUT_SECS: RangeInclusive<u64> = 3..=8;

/// Tiles dealt to `seat` when `dealer` deals.
#[inline]
pub fn deal_size(seat: Seat, dealer: Seat) -> usize {
    if seat == dealer { HAND_SIZE + 1 } else { HAND_SIZE }
}

// =============================================================================
// CONFIGURATION
// =============================================================================

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Turn timeout outside 5..=30 s.
    #[error("turn timeout {0:?} outside 5..=30s")]
    TurnTimeout(Duration),
    /// Claim window outside 3..=8 s.
    #[error("claim timeout {0:?} outside 3..=8s")]
    ClaimTimeout(Duration),
    /// Environment variable is not a whole number of seconds.
    #[error("{var}={value:?} is not a number of seconds")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
    },
    /// Debug deal names a seat that does not exist.
    #[error("debug deal names seat {0}")]
    DebugSeat(Seat),
    /// Debug deal gives a seat more tiles than a hand holds.
    #[error("debug deal gives seat {seat} {len} tiles")]
    DebugHandSize {
        /// Seat.
        seat: Seat,
        /// Tiles listed.
        len: usize,
    },
}

/// Fixed dealing for tests: named seats receive the listed kinds and the
/// first draws come off the wall in `draws` order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DebugDeal {
    /// Kinds per seat; the rest of the hand is filled from the shuffled wall.
    pub hands: BTreeMap<Seat, Vec<TileKind>>,
    /// Kinds moved to the front of the wall after dealing.
    pub draws: Vec<TileKind>,
}

/// Table configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableConfig {
    /// Time the current player has to act.
    pub turn_timeout: Duration,
    /// Time opponents have to claim a discard.
    pub claim_timeout: Duration,
    /// Fixed dealing, bypassing the shuffle for named seats.
    pub debug_deal: Option<DebugDeal>,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            turn_timeout: Duration::from_secs(15),
            claim_timeout: Duration::from_secs(5),
            debug_deal: None,
        }
    }
}

impl TableConfig {
    /// Environment variable overriding the turn timeout.
    pub const TURN_TIMEOUT_ENV: &'static str = "TABLE_TURN_TIMEOUT_SECS";
    /// Environment variable overriding the claim window.
    pub const CLAIM_TIMEOUT_ENV: &'static str = "TABLE_CLAIM_TIMEOUT_SECS";

    /// Defaults overridden by environment variables, validated.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(secs) = env_secs(Self::TURN_TIMEOUT_ENV)? {
            config.turn_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_secs(Self::CLAIM_TIMEOUT_ENV)? {
            config.claim_timeout = Duration::from_secs(secs);
        }
        config.validate()?;
        Ok(config)
    }

    /// Check ranges and debug dealing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !in_range(self.turn_timeout, &TURN_TIMEOUT_SECS) {
            return Err(ConfigError::TurnTimeout(self.turn_timeout));
        }
        if !in_range(self.claim_timeout, &CLAIM_TIMEOUT_SECS) {
            return Err(ConfigError::ClaimTimeout(self.claim_timeout));
        }
        if let Some(debug) = &self.debug_deal {
            for (seat, kinds) in &debug.hands {
                if *seat >= SEAT_COUNT {
                    return Err(ConfigError::DebugSeat(*seat));
                }
                if kinds.len() > HAND_SIZE + 1 {
                    return Err(ConfigError::DebugHandSize { seat: *seat, len: kinds.len() });
                }
            }
        }
        Ok(())
    }

    /// Pull both timeouts into their allowed ranges.
    pub fn clamped(mut self) -> Self {
        self.turn_timeout = clamp_secs(self.turn_timeout, &TURN_TIMEOUT_SECS);
        self.claim_timeout = clamp_secs(self.claim_timeout, &CLAIM_TIMEOUT_SECS);
        self
    }

    /// Builder: fixed dealing.
    pub fn with_debug_deal(mut self, debug_deal: DebugDeal) -> Self {
        self.debug_deal = Some(debug_deal);
        self
    }
}

fn env_secs(var: &'static str) -> Result<Option<u64>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value }),
        Err(_) => Ok(None),
    }
}

fn in_range(duration: Duration, secs: &RangeInclusive<u64>) -> bool {
    duration >= Duration::from_secs(*secs.start()) && duration <= Duration::from_secs(*secs.end())
}

fn clamp_secs(duration: Duration, secs: &RangeInclusive<u64>) -> Duration {
    duration.clamp(Duration::from_secs(*secs.start()), Duration::from_secs(*secs.end()))
}

// =============================================================================
// ENGINE
// =============================================================================

/// Output of one engine input.
#[derive(Debug, Default)]
pub struct ActionResult {
    /// Events generated, in order.
    pub events: Vec<GameEvent>,
    /// Timers to start or abort.
    pub timers: Vec<TimerCommand>,
    /// A hand ended during this input.
    pub hand_ended: bool,
}

/// One match: state plus configuration.
#[derive(Debug, Clone)]
pub struct MatchEngine {
    state: MatchState,
    config: TableConfig,
}

impl MatchEngine {
    /// Seat four players; nothing is dealt until [`MatchEngine::start`].
    pub fn new(match_id: [u8; 16], players: [PlayerId; SEAT_COUNT], config: TableConfig) -> Self {
        let ids: Vec<[u8; 16]> = players.iter().map(|p| p.0).collect();
        let seed = derive_match_seed(&match_id, &ids, 0);
        Self {
            state: MatchState::new(match_id, players, seed),
            config,
        }
    }

    /// Read-only view of the state.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Configuration in use.
    pub fn config(&self) -> &TableConfig {
        &self.config
    }

    /// Deal the first hand.
    pub fn start(&mut self) -> ActionResult {
        start_hand(&mut self.state, &self.config);
        self.drain()
    }

    /// Apply a decoded intent from `seat`.
    ///
    /// A rejected intent leaves the state untouched and produces a single
    /// private `ActionRejected` event.
    pub fn apply(&mut self, seat: Seat, intent: &PlayerIntent) -> ActionResult {
        if let Err(err) = handle_intent(&mut self.state, &self.config, seat, intent) {
            warn!(seat, intent = intent.name(), error = %err, "intent rejected");
            self.state.send_to(
                seat,
                GameEventData::ActionRejected {
                    code: err.code(),
                    message: err.to_string(),
                },
            );
        }
        self.drain()
    }

    /// Handle a timer expiry reported by the session.
    pub fn on_timer(&mut self, id: TimerId) -> ActionResult {
        on_timer(&mut self.state, &self.config, id);
        self.drain()
    }

    /// Record a connection change reported by the transport.
    pub fn set_connected(&mut self, seat: Seat, connected: bool) -> ActionResult {
        set_connected(&mut self.state, &self.config, seat, connected);
        self.drain()
    }

    fn drain(&mut self) -> ActionResult {
        let events = self.state.take_events();
        let hand_ended = events.iter().any(|e| matches!(e.data, GameEventData::HandEnded(_)));
        ActionResult {
            events,
            timers: self.state.timers.take_commands(),
            hand_ended,
        }
    }
}

// =============================================================================
// HAND SETUP
// =============================================================================

/// How a turn begins.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TurnStart {
    /// Dealer's first turn: already holding the extra tile.
    Opening,
    /// Draw from the wall (normal turn or kong replacement).
    Draw,
    /// Pong or chow just claimed: discard without drawing.
    AfterClaim,
}

/// Reset per-hand state, shuffle, deal and play up to the dealer's opening.
pub fn start_hand(state: &mut MatchState, config: &TableConfig) {
    state.timers.cancel_all();
    state.claim_window = None;
    state.rob_kong = None;
    state.outcome = None;
    for player in &mut state.players {
        player.reset_for_hand();
    }

    state.rng_seed = derive_match_seed(&state.match_id, &state.player_id_bytes(), state.hand_number);
    state.rng = DeterministicRng::new(state.rng_seed);
    state.wall = TileWall::new();
    state.wall.shuffle(&mut state.rng);
    state.current = state.dealer;
    state.phase = MatchPhase::BonusReplacement;

    deal(state, config);

    info!(
        hand = state.hand_number,
        dealer = state.dealer,
        round = state.round,
        wind = ?state.wind,
        "hand started"
    );
    state.broadcast(GameEventData::HandStarted {
        dealer: state.dealer,
        round: state.round,
        wind: state.wind,
        wall_remaining: state.wall.remaining(),
    });
    for seat in 0..SEAT_COUNT {
        send_hand(state, seat);
    }
    state.broadcast(GameEventData::PhaseChanged { phase: MatchPhase::BonusReplacement });

    if replace_bonus_tiles(state).is_err() {
        end_hand(state, HandOutcome::Exhausted);
        return;
    }
    stack_debug_draws(state, config);

    let dealer = state.dealer;
    let opening_tile = state.player(dealer).hand.last().map(|t| t.id);
    state.player_mut(dealer).last_drawn = opening_tile;

    state.phase = MatchPhase::DrawDiscard;
    state.broadcast(GameEventData::PhaseChanged { phase: MatchPhase::DrawDiscard });
    begin_turn(state, config, dealer, TurnStart::Opening);
}

fn deal(state: &mut MatchState, config: &TableConfig) {
    let dealer = state.dealer;
    let mut fixed: BTreeMap<Seat, Vec<Tile>> = BTreeMap::new();

    if let Some(debug) = &config.debug_deal {
        for (seat, kinds) in &debug.hands {
            let hand = fixed.entry(*seat).or_default();
            for kind in kinds.iter().take(deal_size(*seat, dealer)) {
                match state.wall.take_kind(*kind) {
                    Some(tile) => hand.push(tile),
                    None => warn!(seat, %kind, "debug deal: no copy left in wall"),
                }
            }
        }
    }

    for seat in (0..SEAT_COUNT).map(|offset| (dealer + offset) % SEAT_COUNT) {
        let mut hand = fixed.remove(&seat).unwrap_or_default();
        while hand.len() < deal_size(seat, dealer) {
            match state.wall.draw() {
                Ok(tile) => hand.push(tile),
                Err(_) => break,
            }
        }
        sort_tiles(&mut hand);
        state.player_mut(seat).hand = hand;
    }
}

/// Put debug draws on top of the wall once bonus replacement is done.
fn stack_debug_draws(state: &mut MatchState, config: &TableConfig) {
    if let Some(debug) = &config.debug_deal {
        let stacked = state.wall.stack_front(&debug.draws);
        debug!(stacked, "debug deal: draws stacked");
    }
}

/// Strip bonus tiles from every hand, starting at the dealer, until a
/// full pass finds none.
fn replace_bonus_tiles(state: &mut MatchState) -> Result<(), WallError> {
    let dealer = state.dealer;
    loop {
        let mut replaced = 0;
        for seat in (0..SEAT_COUNT).map(|offset| (dealer + offset) % SEAT_COUNT) {
            replaced += absorb_bonus(state, seat)?;
        }
        if replaced == 0 {
            return Ok(());
        }
        debug!(replaced, "bonus replacement pass");
    }
}

/// Reveal a seat's bonus tiles and draw replacements until none remain.
fn absorb_bonus(state: &mut MatchState, seat: Seat) -> Result<usize, WallError> {
    let mut total = 0;
    loop {
        let player = state.player_mut(seat);
        let (bonus, rest): (Vec<Tile>, Vec<Tile>) = player.hand.drain(..).partition(Tile::is_bonus);
        player.hand = rest;
        if bonus.is_empty() {
            return Ok(total);
        }

        total += bonus.len();
        player.bonus.extend(bonus.iter().copied());
        state.broadcast(GameEventData::BonusRevealed { seat, tiles: bonus.clone() });

        for _ in 0..bonus.len() {
            let tile = state.wall.draw()?;
            state.player_mut(seat).hand.push(tile);
        }
        sort_tiles(&mut state.player_mut(seat).hand);
        send_hand(state, seat);
    }
}

// =============================================================================
// TURNS
// =============================================================================

fn send_hand(state: &mut MatchState, seat: Seat) {
    let hand = state.player(seat).hand.clone();
    state.send_to(seat, GameEventData::HandUpdated { hand });
}

/// Draw for the turn owner, laying bonus tiles aside as they come.
fn draw_for_turn(state: &mut MatchState, seat: Seat) -> Result<Tile, WallError> {
    loop {
        let tile = state.wall.draw()?;
        if tile.is_bonus() {
            state.player_mut(seat).bonus.push(tile);
            state.broadcast(GameEventData::BonusRevealed { seat, tiles: vec![tile] });
            continue;
        }

        let player = state.player_mut(seat);
        player.hand.push(tile);
        player.last_drawn = Some(tile.id);
        let hand_size = player.hand.len();
        debug!(seat, kind = %tile.kind, remaining = state.wall.remaining(), "draw");

        state.send_to(seat, GameEventData::TileDrawn { tile });
        state.broadcast(GameEventData::DrawNotice {
            seat,
            hand_size,
            wall_remaining: state.wall.remaining(),
        });
        return Ok(tile);
    }
}

/// Hand the turn to `seat`, drawing if needed, then offer options and
/// start the turn timer.
pub fn begin_turn(state: &mut MatchState, config: &TableConfig, seat: Seat, start: TurnStart) {
    state.current = seat;
    state.broadcast(GameEventData::TurnChanged { seat });

    if start == TurnStart::Draw {
        if let Err(WallError::Exhausted) = draw_for_turn(state, seat) {
            info!(hand = state.hand_number, "wall exhausted");
            end_hand(state, HandOutcome::Exhausted);
            return;
        }
    }

    let wins = self_win_options(state, seat);
    let kongs = self_kong_offers(state, seat);
    if !wins.is_empty() || !kongs.is_empty() {
        state.send_to(seat, GameEventData::SelfOptions { wins, kongs });
    }

    state.timers.schedule(TimerPurpose::Turn, config.turn_timeout);
}

/// Wins available to the turn owner with the tile just drawn.
///
/// Empty after a pong or chow claim: only a drawn (or dealt opening)
/// tile completes a self-drawn win.
pub fn self_win_options(state: &MatchState, seat: Seat) -> Vec<WinningCombination> {
    let player = state.player(seat);
    let Some(last) = player.last_drawn.and_then(|id| player.find_tile(id)) else {
        return Vec::new();
    };
    find_winning_combinations(&player.counts_without(last.id), last.kind, player.meld_count())
}

/// Kongs the turn owner may declare. Waiting players get none.
pub fn self_kong_offers(state: &MatchState, seat: Seat) -> Vec<KongOption> {
    let player = state.player(seat);
    if player.waiting || !player.must_discard() {
        return Vec::new();
    }
    self_kong_options(&player.hand, &player.melds)
}

/// Move a validated tile from hand to the discard pile and open claims.
pub fn discard_tile(state: &mut MatchState, config: &TableConfig, seat: Seat, id: TileId, automatic: bool) {
    state.timers.cancel(TimerPurpose::Turn);

    let player = state.player_mut(seat);
    let Some(tile) = player.remove_tile(id) else {
        warn!(seat, ?id, "discard of a tile not in hand");
        return;
    };
    player.last_drawn = None;
    player.discards.push(tile);

    debug!(seat, kind = %tile.kind, automatic, "discard");
    state.broadcast(GameEventData::TileDiscarded { seat, tile, automatic });
    send_hand(state, seat);

    open_claim_window(state, config, seat, tile);
}

/// Commit `seat` to waiting, then discard.
pub fn declare_waiting(state: &mut MatchState, config: &TableConfig, seat: Seat, id: TileId) {
    let Some(tile) = state.player(seat).find_tile(id) else {
        return;
    };
    state.player_mut(seat).waiting = true;
    info!(seat, "waiting declared");
    state.broadcast(GameEventData::WaitingDeclared { seat, tile });
    discard_tile(state, config, seat, id, false);
}

/// Auto-discard for a stalled turn owner: the drawn tile if still held,
/// otherwise the last tile in hand.
fn on_turn_timeout(state: &mut MatchState, config: &TableConfig) {
    if state.phase != MatchPhase::DrawDiscard || state.window_open() {
        debug!("turn timer fired outside a turn");
        return;
    }

    let seat = state.current;
    let player = state.player(seat);
    let tile = player
        .last_drawn
        .and_then(|id| player.find_tile(id))
        .or_else(|| player.hand.last().copied());

    match tile {
        Some(tile) => {
            info!(seat, kind = %tile.kind, "turn timer expired, auto-discarding");
            discard_tile(state, config, seat, tile.id, true);
        }
        None => warn!(seat, "turn timer expired with an empty hand"),
    }
}

// =============================================================================
// CLAIM WINDOWS
// =============================================================================

fn open_claim_window(state: &mut MatchState, config: &TableConfig, discarder: Seat, tile: Tile) {
    let chow_seat = next_seat(discarder);
    let candidates: BTreeMap<Seat, Vec<ClaimOption>> = seats_after(discarder)
        .map(|seat| {
            let player = state.player(seat);
            let ctx = ClaimContext {
                hand: &player.hand,
                meld_count: player.meld_count(),
                waiting: player.waiting,
                is_next_seat: seat == chow_seat,
            };
            (seat, claim_options(ctx, tile))
        })
        .collect();

    match ClaimWindow::open(discarder, tile, candidates) {
        None => {
            debug!(discarder, "no claims possible");
            begin_turn(state, config, chow_seat, TurnStart::Draw);
        }
        Some(mut window) => {
            window.timer = Some(state.timers.schedule(TimerPurpose::ClaimWindow, config.claim_timeout));
            state.broadcast(GameEventData::ClaimWindowOpened {
                discarder,
                tile,
                timeout_ms: config.claim_timeout.as_millis() as u64,
            });
            send_window_options(state, &window);
            state.claim_window = Some(window);
        }
    }
}

fn send_window_options(state: &mut MatchState, window: &ClaimWindow) {
    for (seat, options) in &window.candidates {
        state.send_to(*seat, GameEventData::ClaimOptions { options: options.clone() });
    }
}

fn active_window(state: &MatchState) -> Option<&ClaimWindow> {
    state
        .claim_window
        .as_ref()
        .or_else(|| state.rob_kong.as_ref().map(|p| &p.window))
}

fn active_window_mut(state: &mut MatchState) -> Option<&mut ClaimWindow> {
    match (&mut state.claim_window, &mut state.rob_kong) {
        (Some(window), _) => Some(window),
        (None, Some(pending)) => Some(&mut pending.window),
        (None, None) => None,
    }
}

/// Options offered to `seat` in whichever window is open.
pub fn window_options(state: &MatchState, seat: Seat) -> Option<&[ClaimOption]> {
    active_window(state)?.options_for(seat)
}

/// Seat has a registered claim in the open window.
pub fn has_registered_claim(state: &MatchState, seat: Seat) -> bool {
    active_window(state).is_some_and(|w| w.registered.contains_key(&seat))
}

/// Register a claim from an eligible seat. A malformed claim counts as a pass.
pub fn register_claim(state: &mut MatchState, config: &TableConfig, seat: Seat, option: ClaimOption) {
    let Some(window) = active_window(state) else {
        return;
    };
    let offered = window.options_for(seat).unwrap_or(&[]);
    let valid = is_valid_claim(&option, offered, &state.player(seat).hand, window.tile);

    if let Some(window) = active_window_mut(state) {
        let recorded = if valid {
            debug!(seat, kind = ?option.kind(), "claim registered");
            window.register(seat, option)
        } else {
            warn!(seat, kind = ?option.kind(), "malformed claim treated as pass");
            window.pass(seat)
        };
        if recorded.is_err() {
            return;
        }
    }
    close_if_all_responded(state, config);
}

/// Record a pass from an eligible seat.
pub fn pass_claim(state: &mut MatchState, config: &TableConfig, seat: Seat) {
    if let Some(window) = active_window_mut(state) {
        if window.pass(seat).is_err() {
            return;
        }
        debug!(seat, "pass");
    }
    close_if_all_responded(state, config);
}

/// Withdraw a registered claim.
pub fn cancel_claim(state: &mut MatchState, seat: Seat) {
    if let Some(window) = active_window_mut(state) {
        if window.cancel(seat).is_ok() {
            debug!(seat, "claim cancelled");
        }
    }
}

fn close_if_all_responded(state: &mut MatchState, config: &TableConfig) {
    if state.claim_window.as_ref().is_some_and(ClaimWindow::all_responded) {
        close_claim_window(state, config);
    } else if state.rob_kong.as_ref().is_some_and(|p| p.window.all_responded()) {
        close_rob_kong(state, config);
    }
}

/// Close the discard window and carry out its resolution.
pub fn close_claim_window(state: &mut MatchState, config: &TableConfig) {
    state.timers.cancel(TimerPurpose::ClaimWindow);
    let Some(window) = state.claim_window.take() else {
        return;
    };

    let resolution = window.resolve();
    state.broadcast(GameEventData::ClaimWindowClosed {
        claimed: resolution != ClaimResolution::NoClaim,
    });

    match resolution {
        ClaimResolution::NoClaim => {
            begin_turn(state, config, window.chow_seat(), TurnStart::Draw);
        }
        ClaimResolution::Wins(wins) => {
            let mut winners = winner_entries(wins, window.tile);
            let outcome = if winners.len() == 1 {
                HandOutcome::Discard { winner: winners.remove(0), discarder: window.discarder }
            } else {
                HandOutcome::MultiWinner { winners, discarder: window.discarder }
            };
            end_hand(state, outcome);
        }
        ClaimResolution::Meld { seat, option } => {
            execute_meld_claim(state, config, &window, seat, option);
        }
    }
}

fn winner_entries(wins: Vec<(Seat, WinningCombination)>, tile: Tile) -> Vec<WinnerEntry> {
    wins.into_iter()
        .map(|(seat, combination)| WinnerEntry { seat, combination, winning_tile: tile })
        .collect()
}

fn execute_meld_claim(
    state: &mut MatchState,
    config: &TableConfig,
    window: &ClaimWindow,
    seat: Seat,
    option: ClaimOption,
) {
    let kind = match option {
        ClaimOption::Pong { .. } => MeldKind::Pong,
        ClaimOption::Kong { .. } => MeldKind::Kong,
        ClaimOption::Chow { .. } => MeldKind::Chow,
        ClaimOption::Win { .. } => {
            begin_turn(state, config, window.chow_seat(), TurnStart::Draw);
            return;
        }
    };

    let Some(mut tiles) = state.player_mut(seat).take_tiles(option.hand_tiles()) else {
        warn!(seat, "claimed tiles no longer in hand");
        begin_turn(state, config, window.chow_seat(), TurnStart::Draw);
        return;
    };

    let discards = &mut state.player_mut(window.discarder).discards;
    if discards.last().map(|t| t.id) != Some(window.tile.id) {
        error!(seat, discarder = window.discarder, "claimed tile is not the latest discard");
        state.player_mut(seat).hand.extend(tiles);
        begin_turn(state, config, window.chow_seat(), TurnStart::Draw);
        return;
    }
    discards.pop();

    tiles.push(window.tile);
    let meld = Meld::new(kind, tiles, Some(window.discarder));
    let view = meld.public_view();
    state.player_mut(seat).melds.push(meld);

    info!(seat, from = window.discarder, ?kind, "claim executed");
    state.broadcast(GameEventData::ClaimExecuted { seat, from: window.discarder, kind, meld: view });
    send_hand(state, seat);

    let start = if kind == MeldKind::Kong { TurnStart::Draw } else { TurnStart::AfterClaim };
    begin_turn(state, config, seat, start);
}

// =============================================================================
// SELF DECLARATIONS
// =============================================================================

/// Lay down a validated self kong.
///
/// Concealed kongs draw a replacement straight away. Extended kongs first
/// give opponents a chance to rob the added tile.
pub fn declare_self_kong(state: &mut MatchState, config: &TableConfig, seat: Seat, option: KongOption) {
    state.timers.cancel(TimerPurpose::Turn);
    let kind = option.kind();
    debug!(seat, %kind, robbable = option.is_robbable(), "self kong");

    match option {
        KongOption::Concealed { .. } => {
            let ids: Vec<TileId> = state
                .player(seat)
                .hand
                .iter()
                .filter(|t| t.kind == kind)
                .map(|t| t.id)
                .collect();
            let Some(tiles) = state.player_mut(seat).take_tiles(&ids) else {
                return;
            };
            let meld = Meld::new(MeldKind::ConcealedKong, tiles, None);
            let view = meld.public_view();
            state.player_mut(seat).melds.push(meld);

            info!(seat, "concealed kong declared");
            state.broadcast(GameEventData::KongDeclared { seat, meld: view });
            send_hand(state, seat);
            begin_turn(state, config, seat, TurnStart::Draw);
        }
        KongOption::Extended { meld_index, .. } => {
            let player = state.player_mut(seat);
            let Some(tile) = player.hand.iter().find(|t| t.kind == kind).copied() else {
                return;
            };
            let Some(meld) = player.melds.get_mut(meld_index) else {
                return;
            };
            player.hand.retain(|t| t.id != tile.id);
            if player.last_drawn == Some(tile.id) {
                player.last_drawn = None;
            }
            meld.extend(tile);
            let view = meld.public_view();

            info!(seat, "kong extended");
            state.broadcast(GameEventData::KongDeclared { seat, meld: view });
            send_hand(state, seat);
            open_rob_kong(state, config, seat, meld_index, tile);
        }
    }
}

fn open_rob_kong(state: &mut MatchState, config: &TableConfig, declarer: Seat, meld_index: usize, tile: Tile) {
    let candidates: BTreeMap<Seat, Vec<ClaimOption>> = seats_after(declarer)
        .map(|seat| {
            let player = state.player(seat);
            (seat, win_options(&player.hand, player.meld_count(), tile))
        })
        .collect();

    match ClaimWindow::open(declarer, tile, candidates) {
        None => begin_turn(state, config, declarer, TurnStart::Draw),
        Some(mut window) => {
            window.timer = Some(state.timers.schedule(TimerPurpose::RobKong, config.claim_timeout));
            info!(declarer, "rob-the-kong window opened");
            state.broadcast(GameEventData::RobKongWindowOpened {
                declarer,
                tile,
                timeout_ms: config.claim_timeout.as_millis() as u64,
            });
            send_window_options(state, &window);
            state.rob_kong = Some(PendingRobKong { declarer, meld_index, window });
        }
    }
}

/// Close the rob-the-kong window: any win ends the hand, otherwise the
/// declarer draws the replacement.
pub fn close_rob_kong(state: &mut MatchState, config: &TableConfig) {
    state.timers.cancel(TimerPurpose::RobKong);
    let Some(pending) = state.rob_kong.take() else {
        return;
    };

    let resolution = pending.window.resolve();
    let claimed = matches!(resolution, ClaimResolution::Wins(_));
    state.broadcast(GameEventData::ClaimWindowClosed { claimed });

    match resolution {
        ClaimResolution::Wins(wins) => {
            let winners = winner_entries(wins, pending.window.tile);
            end_hand(state, HandOutcome::RobbedKong { winners, declarer: pending.declarer });
        }
        ClaimResolution::NoClaim | ClaimResolution::Meld { .. } => {
            begin_turn(state, config, pending.declarer, TurnStart::Draw);
        }
    }
}

/// End the hand on a validated self-drawn win.
pub fn claim_self_win(state: &mut MatchState, seat: Seat, combination: WinningCombination) {
    let player = state.player(seat);
    let Some(winning_tile) = player.last_drawn.and_then(|id| player.find_tile(id)) else {
        return;
    };
    end_hand(
        state,
        HandOutcome::SelfDrawn {
            winner: WinnerEntry { seat, combination, winning_tile },
        },
    );
}

// =============================================================================
// HAND END AND ROTATION
// =============================================================================

/// Finish the hand: stop timers, rotate dealer/round/wind and broadcast
/// the revealed result.
pub fn end_hand(state: &mut MatchState, outcome: HandOutcome) {
    state.timers.cancel_all();
    state.claim_window = None;
    state.rob_kong = None;
    state.phase = MatchPhase::Ended;

    let dealer_retained = outcome.retains_dealer(state.dealer);
    if !dealer_retained {
        state.dealer = next_seat(state.dealer);
        if state.dealer == 0 {
            match state.wind.next() {
                Some(wind) => {
                    state.wind = wind;
                    state.round += 1;
                }
                None => state.match_over = true,
            }
        }
    }

    let result = assemble_result(state, &outcome, dealer_retained);
    info!(
        hand = state.hand_number,
        winners = ?outcome.winners(),
        next_dealer = state.dealer,
        match_over = state.match_over,
        "hand ended"
    );

    state.outcome = Some(outcome);
    for player in &mut state.players {
        player.ready = false;
        player.last_drawn = None;
    }

    state.broadcast(GameEventData::PhaseChanged { phase: MatchPhase::Ended });
    state.broadcast(GameEventData::HandEnded(Box::new(result)));
    if state.match_over {
        info!(hands = state.hand_number + 1, "match over");
        state.broadcast(GameEventData::MatchOver { hands_played: state.hand_number + 1 });
    }
}

fn assemble_result(state: &MatchState, outcome: &HandOutcome, dealer_retained: bool) -> HandResult {
    if let Err(err) = state.check_conservation() {
        error!(hand = state.hand_number, error = %err, "tile conservation violated");
    }

    let winners = outcome.winners();
    let loser = outcome.loser();

    HandResult {
        hand_number: state.hand_number,
        outcome: outcome.clone(),
        revealed: state
            .players
            .iter()
            .map(|p| RevealedHand {
                seat: p.seat,
                hand: p.hand.clone(),
                melds: p.melds.clone(),
                bonus: p.bonus.clone(),
                waiting: p.waiting,
            })
            .collect(),
        seats: (0..SEAT_COUNT)
            .map(|seat| SeatResult {
                seat,
                won: winners.contains(&seat),
                dealt_in: loser == Some(seat),
                score: 0,
            })
            .collect(),
        dealer_retained,
        next_dealer: state.dealer,
        next_round: state.round,
        next_wind: state.wind,
        match_over: state.match_over,
        state_hash: hex::encode(state.compute_hash()),
    }
}

/// Mark a seat ready; deal the next hand once every connected seat is.
pub fn mark_ready(state: &mut MatchState, config: &TableConfig, seat: Seat) {
    state.player_mut(seat).ready = true;
    state.broadcast(GameEventData::PlayerReady { seat });
    maybe_start_next_hand(state, config);
}

/// Record a connection change.
pub fn set_connected(state: &mut MatchState, config: &TableConfig, seat: Seat, connected: bool) {
    if seat >= SEAT_COUNT || state.player(seat).connected == connected {
        return;
    }
    state.player_mut(seat).connected = connected;
    info!(seat, connected, "connection changed");
    state.broadcast(GameEventData::ConnectionChanged { seat, connected });
    maybe_start_next_hand(state, config);
}

fn maybe_start_next_hand(state: &mut MatchState, config: &TableConfig) {
    if !state.is_ended() || state.match_over {
        return;
    }
    let mut connected = state.players.iter().filter(|p| p.connected).peekable();
    if connected.peek().is_none() || !connected.all(|p| p.ready) {
        return;
    }

    state.hand_number += 1;
    state.broadcast(GameEventData::NextHandStarting { hand_number: state.hand_number });
    start_hand(state, config);
}

/// Dispatch a timer expiry; stale ids are ignored.
pub fn on_timer(state: &mut MatchState, config: &TableConfig, id: TimerId) {
    match state.timers.fire(id) {
        None => debug!(?id, "stale timer ignored"),
        Some(TimerPurpose::Turn) => on_turn_timeout(state, config),
        Some(TimerPurpose::ClaimWindow) => {
            debug!("claim window timed out");
            close_claim_window(state, config);
        }
        Some(TimerPurpose::RobKong) => {
            debug!("rob-the-kong window timed out");
            close_rob_kong(state, config);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
