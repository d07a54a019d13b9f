// =============================================================================
// Interaction controller
//
// Owns one game session: the rules position, the move list, highlight state,
// orientation and the outstanding service request. Hosts (the browser
// binding, the terminal front-end, tests) translate their native events into
// `Command`s, dispatch them, perform the returned `Effect`s and re-render from
// `view()`. Nothing here touches the network or the DOM.
//
// Turn flow: an accepted human drop that leaves the service on move emits one
// `RequestMove`. Until its reply is dispatched, drags are denied, drops snap
// back and undo is ignored. Replies carry the request id; a reply for any id
// other than the outstanding one is dropped without touching the game.
// =============================================================================

use log::{debug, info, warn};
use serde::Serialize;
use shakmaty::Square;

use crate::config::{Config, Difficulty, Side};
use crate::error::PlayError;
use crate::highlight::{HighlightView, Highlights};
use crate::history::{HistoryRow, MoveHistory};
use crate::moves::{AppliedMove, CoordMove};
use crate::rules::Game;
use crate::service::{Evaluation, EvaluationRequest, MoveRequest};
use crate::status::status_text;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Sound {
    Move,
    Capture,
}

/// Everything a host can tell the controller.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    DragStart { square: Square, side: Side },
    Drop { from: Square, to: Square },
    HoverEnter(Square),
    HoverLeave(Square),
    ServiceReply {
        id: u64,
        result: Result<String, PlayError>,
    },
    EvaluationReply {
        id: u64,
        result: Result<Evaluation, PlayError>,
    },
    Reset,
    Undo,
    ToggleColor,
    SetDifficulty(i64),
    LoadFen(String),
    Retry,
}

/// Work the host must carry out after a dispatch, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Refuse the drag that was just attempted.
    DenyDrag,
    /// Return the dropped piece to its source square.
    Snapback,
    /// Redraw the board from this FEN.
    SetPosition(String),
    SetOrientation(Side),
    PlaySound(Sound),
    RequestMove(MoveRequest),
    RequestEvaluation(EvaluationRequest),
    /// Blocking message for the player.
    Alert(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragGate {
    Allow,
    Deny,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DropOutcome {
    Accepted(AppliedMove),
    Rejected,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyOutcome {
    Applied(AppliedMove),
    Failed(PlayError),
    /// The reply did not belong to the outstanding request.
    Stale,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    HumanToMove,
    AwaitingService,
    /// The service is on move but no request is outstanding, e.g. after a
    /// failed request. `Retry` or `Undo`/`Reset` leave this state.
    ServiceToMove,
    Checkmate { winner: Side },
    Draw,
}

/// Snapshot of everything the host renders.
#[derive(Clone, Debug, Serialize)]
pub struct BoardView {
    pub fen: String,
    pub turn: Side,
    pub human: Side,
    pub orientation: Side,
    pub status: String,
    pub phase: Phase,
    pub history: Vec<HistoryRow>,
    pub highlights: HighlightView,
    pub difficulty: u8,
    pub evaluation: Option<String>,
}

pub struct Controller {
    config: Config,
    game: Game,
    history: MoveHistory,
    highlights: Highlights,
    orientation: Side,
    pending_move: Option<u64>,
    pending_evaluation: Option<u64>,
    evaluation: Option<Evaluation>,
    next_id: u64,
    effects: Vec<Effect>,
}

impl Controller {
    /// Start a session from the standard position. The opening effects
    /// (position, orientation and, when the human plays Black, the service's
    /// first move request) are queued for [`Controller::take_effects`].
    pub fn new(config: Config) -> Self {
        let orientation = config.human;
        let mut controller = Controller {
            config,
            game: Game::new(),
            history: MoveHistory::default(),
            highlights: Highlights::default(),
            orientation,
            pending_move: None,
            pending_evaluation: None,
            evaluation: None,
            next_id: 0,
            effects: Vec::new(),
        };
        controller.reset();
        controller
    }

    pub fn dispatch(&mut self, command: Command) -> Vec<Effect> {
        match command {
            Command::DragStart { square, side } => {
                if self.drag_start(square, side) == DragGate::Deny {
                    self.effects.push(Effect::DenyDrag);
                }
            }
            Command::Drop { from, to } => {
                if self.drop_piece(from, to) == DropOutcome::Rejected {
                    self.effects.push(Effect::Snapback);
                }
            }
            Command::HoverEnter(square) => self.hover_enter(square),
            Command::HoverLeave(square) => self.hover_leave(square),
            Command::ServiceReply { id, result } => {
                self.receive_move(id, result);
            }
            Command::EvaluationReply { id, result } => self.receive_evaluation(id, result),
            Command::Reset => self.reset(),
            Command::Undo => {
                self.undo();
            }
            Command::ToggleColor => self.toggle_color(),
            Command::SetDifficulty(level) => self.set_difficulty(level),
            Command::LoadFen(fen) => {
                if let Err(e) = self.load_fen(&fen) {
                    self.effects.push(Effect::Alert(e.to_string()));
                }
            }
            Command::Retry => {
                self.retry();
            }
        }
        self.take_effects()
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// Whether a drag of a `side` piece from `square` may begin.
    pub fn drag_start(&self, square: Square, side: Side) -> DragGate {
        let allowed = self.pending_move.is_none()
            && !self.game.is_game_over()
            && side == self.game.turn()
            && side == self.config.human
            && self.game.piece_side(square) == Some(side);
        if allowed {
            DragGate::Allow
        } else {
            DragGate::Deny
        }
    }

    /// Try the human move `from`-`to`, promoting to a queen when a pawn
    /// reaches the last rank.
    pub fn drop_piece(&mut self, from: Square, to: Square) -> DropOutcome {
        if self.pending_move.is_some()
            || self.game.is_game_over()
            || self.game.turn() != self.config.human
        {
            return DropOutcome::Rejected;
        }
        let Some(applied) = self.game.apply(CoordMove::new(from, to)) else {
            debug!("illegal drop {from}{to}");
            return DropOutcome::Rejected;
        };
        debug!("human played {}", applied.san);
        self.highlights.clear_candidates();
        self.record(&applied);
        self.request_service_move();
        DropOutcome::Accepted(applied)
    }

    /// Mark the legal destinations of the piece on `square`. Only the
    /// human's pieces are marked, and only while no request is outstanding.
    pub fn hover_enter(&mut self, square: Square) {
        if self.pending_move.is_some() || self.game.turn() != self.config.human {
            return;
        }
        let destinations = self.game.legal_destinations(square);
        if destinations.is_empty() {
            return;
        }
        self.highlights.show_candidates(square, &destinations);
    }

    pub fn hover_leave(&mut self, _square: Square) {
        self.highlights.clear_candidates();
    }

    /// Apply the service's answer to request `id`.
    pub fn receive_move(&mut self, id: u64, result: Result<String, PlayError>) -> ReplyOutcome {
        if self.pending_move != Some(id) {
            warn!("discarding reply to request {id}, outstanding: {:?}", self.pending_move);
            return ReplyOutcome::Stale;
        }
        self.pending_move = None;
        match self.apply_service_move(result) {
            Ok(applied) => ReplyOutcome::Applied(applied),
            Err(e) => {
                warn!("service move failed: {e}");
                self.effects.push(Effect::Alert(e.to_string()));
                ReplyOutcome::Failed(e)
            }
        }
    }

    fn apply_service_move(&mut self, result: Result<String, PlayError>) -> Result<AppliedMove, PlayError> {
        let uci = result?;
        let mv = CoordMove::from_uci(&uci).ok_or_else(|| PlayError::InvalidAiMove(uci.clone()))?;
        let applied = self
            .game
            .apply(mv)
            .ok_or_else(|| PlayError::InvalidAiMove(uci.clone()))?;
        debug!("service played {} ({uci})", applied.san);
        self.record(&applied);
        Ok(applied)
    }

    fn receive_evaluation(&mut self, id: u64, result: Result<Evaluation, PlayError>) {
        if self.pending_evaluation != Some(id) {
            debug!("discarding evaluation {id}");
            return;
        }
        self.pending_evaluation = None;
        match result {
            Ok(evaluation) => self.evaluation = Some(evaluation),
            Err(e) => warn!("evaluation failed: {e}"),
        }
    }

    /// Back to the standard position with the board turned to the human's
    /// colour. The service opens when the human plays Black.
    pub fn reset(&mut self) {
        info!("new game, human plays {}", self.config.human.name());
        self.restart(Game::new());
        self.orientation = self.config.human;
        self.effects.push(Effect::SetOrientation(self.orientation));
        self.request_service_move();
    }

    /// Replace the game with the position in `fen`.
    pub fn load_fen(&mut self, fen: &str) -> Result<(), PlayError> {
        let game = Game::from_fen(fen)?;
        info!("loaded position {fen}");
        self.restart(game);
        self.request_service_move();
        Ok(())
    }

    fn restart(&mut self, game: Game) {
        self.game = game;
        self.history = MoveHistory::new(self.game.start_fullmove(), self.game.start_turn());
        self.highlights.clear();
        self.pending_move = None;
        self.pending_evaluation = None;
        self.evaluation = None;
        self.effects.push(Effect::SetPosition(self.game.fen()));
        self.request_evaluation();
    }

    /// Take back the last full turn. Ignored with fewer than two plies or
    /// while the service is thinking. When the service is left on move (after
    /// a failed request) its move is requested again.
    pub fn undo(&mut self) -> bool {
        if self.pending_move.is_some() || self.game.plies() < 2 {
            return false;
        }
        for _ in 0..2 {
            self.game.undo();
            self.history.pop();
        }
        self.highlights.clear_candidates();
        self.highlights
            .set_last_move(self.game.last_move().map(|m| (m.from, m.to)));
        self.effects.push(Effect::SetPosition(self.game.fen()));
        self.request_evaluation();
        self.request_service_move();
        true
    }

    pub fn toggle_color(&mut self) {
        self.config.human = self.config.human.opposite();
        self.reset();
    }

    pub fn set_difficulty(&mut self, level: i64) {
        self.config.difficulty = Difficulty::new(level);
        info!("difficulty set to {}", self.config.difficulty.level());
    }

    /// Re-issue the service request for a turn whose request failed.
    pub fn retry(&mut self) -> bool {
        self.request_service_move()
    }

    fn record(&mut self, applied: &AppliedMove) {
        self.highlights.set_last_move(Some((applied.from, applied.to)));
        self.history.push(applied.san.clone());
        self.effects.push(Effect::SetPosition(self.game.fen()));
        let sound = if applied.captured {
            Sound::Capture
        } else {
            Sound::Move
        };
        self.effects.push(Effect::PlaySound(sound));
        self.request_evaluation();
    }

    fn next_request_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn request_service_move(&mut self) -> bool {
        if self.pending_move.is_some()
            || self.game.is_game_over()
            || self.game.turn() == self.config.human
        {
            return false;
        }
        let id = self.next_request_id();
        let request = MoveRequest {
            id,
            fen: self.game.fen(),
            difficulty: self.config.difficulty.level(),
        };
        debug!("requesting service move {id} for {}", request.fen);
        self.pending_move = Some(id);
        self.effects.push(Effect::RequestMove(request));
        true
    }

    fn request_evaluation(&mut self) {
        if !self.config.show_evaluation {
            return;
        }
        let id = self.next_request_id();
        self.pending_evaluation = Some(id);
        self.evaluation = None;
        self.effects.push(Effect::RequestEvaluation(EvaluationRequest {
            id,
            fen: self.game.fen(),
        }));
    }

    pub fn phase(&self) -> Phase {
        if self.game.is_checkmate() {
            Phase::Checkmate {
                winner: self.game.turn().opposite(),
            }
        } else if self.game.is_draw() {
            Phase::Draw
        } else if self.pending_move.is_some() {
            Phase::AwaitingService
        } else if self.game.turn() == self.config.human {
            Phase::HumanToMove
        } else {
            Phase::ServiceToMove
        }
    }

    pub fn status(&self) -> String {
        status_text(&self.game)
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn history(&self) -> &MoveHistory {
        &self.history
    }

    pub fn highlights(&self) -> &Highlights {
        &self.highlights
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn orientation(&self) -> Side {
        self.orientation
    }

    pub fn pending_move(&self) -> Option<u64> {
        self.pending_move
    }

    pub fn evaluation(&self) -> Option<Evaluation> {
        self.evaluation
    }

    pub fn view(&self) -> BoardView {
        BoardView {
            fen: self.game.fen(),
            turn: self.game.turn(),
            human: self.config.human,
            orientation: self.orientation,
            status: self.status(),
            phase: self.phase(),
            history: self.history.rows(),
            highlights: self.highlights.to_view(),
            difficulty: self.config.difficulty.level(),
            evaluation: self.evaluation.map(|e| e.label()),
        }
    }
}
