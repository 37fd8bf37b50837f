//! Session actor implementation with async message handling.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::oneshot;
use tokio::time::{Instant, interval};
use uuid::Uuid;

use super::messages::{GameClosed, SessionMessage, SessionSnapshot};
use crate::game::{AccusationKind, Code, Die, GameData, GameError, GameProgression, GameRules, dice};
use crate::net::messages::{ClientEvent, PlayerDiceCount, PlayerHand, PlayerPublic, ServerEvent};

const INBOX_CAPACITY: usize = 64;
const REAP_CHECK_PERIOD: Duration = Duration::from_secs(30);

/// A session with no connections and no traffic for this long is
/// reaped, covering abandoned lobbies and finished games alike.
const IDLE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// A game cannot start with fewer ready players than this.
pub const MIN_PLAYERS: usize = 2;

/// Where the state machine is between lobby and game over. The
/// wire-visible [`GameProgression`] is the coarse projection of this.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    Lobby,
    /// A round is live and the current accuser may act.
    AwaitingAccusation,
    Finished { winner: Uuid },
}

/// Session actor handle for sending messages.
#[derive(Clone, Debug)]
pub struct GameHandle {
    sender: mpsc::Sender<SessionMessage>,
    code: Code,
}

impl GameHandle {
    pub fn code(&self) -> &str {
        &self.code
    }

    /// True once the actor's run loop has exited.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    pub async fn send(&self, message: SessionMessage) -> Result<(), GameClosed> {
        self.sender.send(message).await.map_err(|_| GameClosed)
    }

    /// Registers a connection and seats the player.
    pub async fn connect(
        &self,
        user_id: Uuid,
        name: String,
        sender: mpsc::Sender<ServerEvent>,
    ) -> Result<Result<(), GameError>, GameClosed> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionMessage::Connect {
            user_id,
            name,
            sender,
            response: tx,
        })
        .await?;
        rx.await.map_err(|_| GameClosed)
    }

    pub async fn disconnect(&self, user_id: Uuid) -> Result<(), GameClosed> {
        self.send(SessionMessage::Disconnect { user_id }).await
    }

    /// Forwards a decoded client event into the session's inbox.
    pub async fn event(&self, user_id: Uuid, event: ClientEvent) -> Result<(), GameClosed> {
        self.send(SessionMessage::Event { user_id, event }).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, GameClosed> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionMessage::Snapshot { response: tx }).await?;
        rx.await.map_err(|_| GameClosed)
    }

    pub async fn is_seated(&self, user_id: Uuid) -> Result<bool, GameClosed> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionMessage::IsSeated {
            user_id,
            response: tx,
        })
        .await?;
        rx.await.map_err(|_| GameClosed)
    }
}

/// Session actor managing a single game. All mutation goes through
/// the inbox, one message at a time.
pub struct GameActor {
    data: GameData,

    phase: Phase,

    /// Current accuser while a round is live.
    turn: Option<Uuid>,

    /// Player id to live outbound channel. Entries are added on
    /// connect and removed on disconnect; leaving the game is a
    /// separate protocol event and keeps the connection.
    connections: HashMap<Uuid, mpsc::Sender<ServerEvent>>,

    /// Message inbox.
    inbox: mpsc::Receiver<SessionMessage>,

    last_activity: Instant,
}

impl GameActor {
    pub fn new(code: Code, rules: GameRules) -> (Self, GameHandle) {
        let (sender, inbox) = mpsc::channel(INBOX_CAPACITY);
        let handle = GameHandle {
            sender,
            code: code.clone(),
        };
        let actor = Self {
            data: GameData::new(code, rules),
            phase: Phase::Lobby,
            turn: None,
            connections: HashMap::new(),
            inbox,
            last_activity: Instant::now(),
        };
        (actor, handle)
    }

    /// Runs the session event loop until the game is over and everyone
    /// has disconnected, or the session sits idle past [`IDLE_TIMEOUT`].
    pub async fn run(mut self) {
        log::info!("game {} open", self.data.code);

        let mut reap_check = interval(REAP_CHECK_PERIOD);

        loop {
            tokio::select! {
                message = self.inbox.recv() => {
                    let Some(message) = message else { break };
                    self.last_activity = Instant::now();
                    self.handle_message(message);

                    if self.is_done() {
                        break;
                    }
                }

                _ = reap_check.tick() => {
                    if self.is_abandoned() {
                        log::info!("game {} idle, reaping", self.data.code);
                        break;
                    }
                }
            }
        }

        log::info!("game {} closed", self.data.code);
    }

    fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Finished { .. }) && self.connections.is_empty()
    }

    fn is_abandoned(&self) -> bool {
        self.connections.is_empty() && self.last_activity.elapsed() >= IDLE_TIMEOUT
    }

    fn handle_message(&mut self, message: SessionMessage) {
        match message {
            SessionMessage::Connect {
                user_id,
                name,
                sender,
                response,
            } => {
                let result = self.handle_connect(user_id, name, sender);
                let _ = response.send(result);
            }

            SessionMessage::Disconnect { user_id } => {
                self.handle_disconnect(user_id);
            }

            SessionMessage::Event { user_id, event } => {
                self.handle_event(user_id, event);
            }

            SessionMessage::Snapshot { response } => {
                let _ = response.send(self.snapshot());
            }

            SessionMessage::IsSeated { user_id, response } => {
                let _ = response.send(self.data.contains_player(user_id));
            }
        }
    }

    fn handle_connect(
        &mut self,
        user_id: Uuid,
        name: String,
        sender: mpsc::Sender<ServerEvent>,
    ) -> Result<(), GameError> {
        if !self.data.contains_player(user_id) {
            match self.phase {
                Phase::Lobby => {}
                Phase::AwaitingAccusation => return Err(GameError::GameInProgress),
                Phase::Finished { .. } => return Err(GameError::GameFinished),
            }
            self.data.add_player(user_id, &name);
            log::info!("game {}: {name} ({user_id}) joined", self.data.code);
        }
        self.connections.insert(user_id, sender);
        self.broadcast_roster();

        // A reconnecting player mid-round gets its hand dealt again.
        if self.phase == Phase::AwaitingAccusation
            && let Some(player) = self.data.player(user_id)
            && player.is_active()
        {
            let dice = player.dice.clone();
            let players = self
                .data
                .active_players()
                .map(|p| PlayerDiceCount {
                    id: p.id,
                    name: p.name.clone(),
                    current_dice_count: p.current_dice_count,
                })
                .collect();
            self.send_to(user_id, ServerEvent::RoundStart { dice, players });
        }
        Ok(())
    }

    /// Disconnect policy: in the lobby the seat is simply vacated; mid
    /// game a vanished player would stall the turn loop, so the drop
    /// counts as forfeiture, same as an explicit leave.
    fn handle_disconnect(&mut self, user_id: Uuid) {
        let had_connection = self.connections.remove(&user_id).is_some();
        if !had_connection && !self.data.contains_player(user_id) {
            return;
        }
        log::info!("game {}: {user_id} disconnected", self.data.code);

        match self.phase {
            Phase::Lobby => {
                if self.data.remove_player(user_id).is_some() {
                    self.broadcast_roster();
                    self.maybe_start();
                }
            }
            Phase::AwaitingAccusation => {
                if self.data.contains_player(user_id) {
                    self.forfeit(user_id);
                }
            }
            Phase::Finished { .. } => {}
        }
    }

    fn handle_event(&mut self, user_id: Uuid, event: ClientEvent) {
        if !self.data.contains_player(user_id) {
            self.send_to(user_id, ServerEvent::rejected(GameError::UnknownPlayer));
            return;
        }
        log::debug!("game {}: {user_id} {event}", self.data.code);

        let result = match event {
            ClientEvent::PlayerReady => self.handle_ready(user_id),
            ClientEvent::PlayerLeave => self.handle_leave(user_id),
            ClientEvent::Accusation {
                kind,
                accused_player,
                dice_value,
                dice_count,
            } => self.handle_accusation(user_id, kind, accused_player, dice_value, dice_count),
        };

        let ack = match &result {
            Ok(()) => ServerEvent::accepted(),
            Err(error) => ServerEvent::rejected(error),
        };
        self.send_to(user_id, ack);
    }

    fn handle_ready(&mut self, user_id: Uuid) -> Result<(), GameError> {
        match self.phase {
            Phase::Lobby => {}
            Phase::AwaitingAccusation => return Err(GameError::GameInProgress),
            Phase::Finished { .. } => return Err(GameError::GameFinished),
        }
        if let Some(player) = self.data.player_mut(user_id) {
            player.ready = true;
        }
        self.broadcast_roster();
        self.maybe_start();
        Ok(())
    }

    fn handle_leave(&mut self, user_id: Uuid) -> Result<(), GameError> {
        match self.phase {
            Phase::Lobby | Phase::Finished { .. } => {
                if self.data.remove_player(user_id).is_some() {
                    log::info!("game {}: {user_id} left", self.data.code);
                    self.broadcast_roster();
                    self.maybe_start();
                }
            }
            Phase::AwaitingAccusation => {
                self.forfeit(user_id);
            }
        }
        Ok(())
    }

    fn handle_accusation(
        &mut self,
        user_id: Uuid,
        kind: AccusationKind,
        accused: Uuid,
        dice_value: Option<Die>,
        dice_count: Option<usize>,
    ) -> Result<(), GameError> {
        match self.phase {
            Phase::Lobby => return Err(GameError::NotInGame),
            Phase::Finished { .. } => return Err(GameError::GameFinished),
            Phase::AwaitingAccusation => {}
        }
        if self.turn != Some(user_id) {
            return Err(GameError::OutOfTurnAccusation);
        }

        let accused_player = self.data.player(accused).ok_or(GameError::UnknownPlayer)?;
        if !accused_player.is_active() {
            return Err(GameError::PlayerNotActive);
        }
        let accused_hand = accused_player.dice.clone();

        let (value, claimed) = match kind {
            AccusationKind::Paso => {
                if !self.data.rules.paso_allowed {
                    return Err(GameError::PasoDisabled);
                }
                (0, 0)
            }
            AccusationKind::Standard | AccusationKind::Exact => {
                if kind == AccusationKind::Exact && !self.data.rules.exact_allowed {
                    return Err(GameError::ExactDisabled);
                }
                let value = dice_value.ok_or(GameError::MissingClaim)?;
                let claimed = dice_count.ok_or(GameError::MissingClaim)?;
                if !(1..=6).contains(&value) {
                    return Err(GameError::InvalidDiceValue);
                }
                (value, claimed)
            }
        };

        let hands = self.data.active_players().map(|p| p.dice.as_slice());
        let resolution = dice::resolve_accusation(kind, value, claimed, hands, &accused_hand);

        // The party proven wrong loses a die.
        let (winner, loser) = if resolution.correct {
            (user_id, accused)
        } else {
            (accused, user_id)
        };
        log::info!(
            "game {}: {kind} accusation by {user_id} against {accused}, correct: {}",
            self.data.code,
            resolution.correct,
        );

        // Reveal this round's hands as rolled, before elimination.
        let reveal: Vec<PlayerHand> = self
            .data
            .players
            .iter()
            .filter(|p| !p.dice.is_empty())
            .map(|p| PlayerHand {
                id: p.id,
                name: p.name.clone(),
                dice: p.dice.clone(),
            })
            .collect();

        if let Some(player) = self.data.player_mut(loser) {
            player.current_dice_count -= 1;
        }

        self.broadcast(ServerEvent::RoundEnd {
            winner,
            loser,
            correct_accusation: resolution.correct,
            accusation_type: kind,
            dice_value,
            dice_count,
            actual_count: resolution.actual_count,
            joker_count: resolution.joker_count,
            players: reveal,
        });

        // Captured before any relink so an eliminated loser still
        // hands the turn to its old ring successor.
        let successor = self.data.player(loser).and_then(|p| p.right_id);
        let loser_active = self.data.player(loser).is_some_and(|p| p.is_active());
        if !loser_active {
            if let Some(player) = self.data.player_mut(loser) {
                player.dice.clear();
            }
            self.data.unlink_player(loser);
            log::info!("game {}: {loser} eliminated", self.data.code);
        }

        if self.try_finish() {
            return Ok(());
        }

        self.turn = if loser_active { Some(loser) } else { successor };
        self.start_round();
        Ok(())
    }

    /// Starts the game once the lobby condition holds. Called after
    /// every event that could complete it, including departures that
    /// leave only ready players behind.
    fn maybe_start(&mut self) {
        if self.phase == Phase::Lobby
            && self.data.players.len() >= MIN_PLAYERS
            && self.data.all_ready()
        {
            self.start_game();
        }
    }

    fn start_game(&mut self) {
        self.data.progression = GameProgression::InGame;
        let initial = self.data.rules.initial_dice_count;
        for player in &mut self.data.players {
            player.current_dice_count = initial;
        }
        self.data.link_ring();
        self.turn = self.data.players.first().map(|p| p.id);
        self.phase = Phase::AwaitingAccusation;
        log::info!(
            "game {}: started with {} players",
            self.data.code,
            self.data.players.len(),
        );

        self.broadcast(ServerEvent::GameStart {
            rules: self.data.rules.clone(),
        });

        // Each player learns its own ring neighbors.
        let links: Vec<(Uuid, Option<Uuid>, Option<Uuid>)> = self
            .data
            .players
            .iter()
            .map(|p| (p.id, p.left_id, p.right_id))
            .collect();
        for (id, left_player_id, right_player_id) in links {
            self.send_to(
                id,
                ServerEvent::PlayerReady {
                    ready: true,
                    left_player_id,
                    right_player_id,
                },
            );
        }

        self.start_round();
    }

    /// Rerolls every active hand and deals each player its own dice
    /// along with everyone's die counts.
    fn start_round(&mut self) {
        self.data.roll_all();

        let counts: Vec<PlayerDiceCount> = self
            .data
            .active_players()
            .map(|p| PlayerDiceCount {
                id: p.id,
                name: p.name.clone(),
                current_dice_count: p.current_dice_count,
            })
            .collect();
        let hands: Vec<(Uuid, Vec<Die>)> = self
            .data
            .active_players()
            .map(|p| (p.id, p.dice.clone()))
            .collect();

        for (id, dice) in hands {
            self.send_to(
                id,
                ServerEvent::RoundStart {
                    dice,
                    players: counts.clone(),
                },
            );
        }
    }

    /// Strips a player of all remaining dice mid-game: removal, ring
    /// relink, and either game end or a turn handoff.
    fn forfeit(&mut self, user_id: Uuid) {
        let successor = self.data.player(user_id).and_then(|p| p.right_id);
        self.data.unlink_player(user_id);
        self.data.remove_player(user_id);
        log::info!("game {}: {user_id} forfeited", self.data.code);

        if self.try_finish() {
            return;
        }
        if self.turn == Some(user_id) {
            self.turn = successor;
        }
    }

    /// Ends the game once a single active player remains.
    fn try_finish(&mut self) -> bool {
        if self.data.active_count() != 1 {
            return false;
        }
        let Some(winner) = self.data.active_players().next().map(|p| p.id) else {
            return false;
        };
        self.phase = Phase::Finished { winner };
        self.turn = None;
        log::info!("game {}: {winner} wins", self.data.code);
        self.broadcast(ServerEvent::GameEnd { winner });
        true
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            code: self.data.code.clone(),
            progression: self.data.progression,
            rules: self.data.rules.clone(),
            players: self.roster(),
        }
    }

    fn roster(&self) -> Vec<PlayerPublic> {
        self.data
            .players
            .iter()
            .map(|p| PlayerPublic {
                id: p.id,
                name: p.name.clone(),
                ready: p.ready,
            })
            .collect()
    }

    fn broadcast_roster(&mut self) {
        let players = self.roster();
        self.broadcast(ServerEvent::PlayerUpdate { players });
    }

    /// Fire-and-forget fan-out. A slow client loses frames rather than
    /// blocking the session; a closed channel loses its mapping and
    /// the reader side will follow up with a disconnect.
    fn broadcast(&mut self, event: ServerEvent) {
        let code = &self.data.code;
        self.connections
            .retain(|player_id, sender| match sender.try_send(event.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    log::warn!("game {code}: {player_id} outbound queue full, dropping frame");
                    true
                }
                Err(TrySendError::Closed(_)) => {
                    log::debug!("game {code}: {player_id} outbound channel closed");
                    false
                }
            });
    }

    fn send_to(&mut self, player_id: Uuid, event: ServerEvent) {
        let closed = match self.connections.get(&player_id) {
            None => return,
            Some(sender) => match sender.try_send(event) {
                Ok(()) => false,
                Err(TrySendError::Full(_)) => {
                    log::warn!(
                        "game {}: {player_id} outbound queue full, dropping frame",
                        self.data.code,
                    );
                    false
                }
                Err(TrySendError::Closed(_)) => true,
            },
        };
        if closed {
            self.connections.remove(&player_id);
        }
    }
}
