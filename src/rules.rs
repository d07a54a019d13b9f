// =============================================================================
// Rules adapter
//
// Wraps a shakmaty position with the handful of queries and mutations the
// controller needs: apply a dragged or service move, export/import FEN,
// status flags, per-square destinations, ply history and undo. Move legality
// and notation are shakmaty's; this module only adds bookkeeping (the ply
// stack used for undo and threefold repetition) and the UI conventions:
// standard king-two-squares castling coordinates and auto-queen promotion.
// =============================================================================

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position, Rank, Role, Square};

use crate::config::Side;
use crate::error::PlayError;
use crate::moves::{AppliedMove, CoordMove};

/// Promotion piece used when a pawn reaches the last rank without an
/// explicit choice.
pub const DEFAULT_PROMOTION: Role = Role::Queen;

#[derive(Clone, Debug)]
struct Ply {
    before: Chess,
    applied: AppliedMove,
}

#[derive(Clone, Debug)]
pub struct Game {
    start: Chess,
    position: Chess,
    plies: Vec<Ply>,
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

impl Game {
    /// Standard starting position.
    pub fn new() -> Self {
        Self::from_position(Chess::default())
    }

    fn from_position(position: Chess) -> Self {
        Game {
            start: position.clone(),
            position,
            plies: Vec::new(),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, PlayError> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| PlayError::InvalidFen(format!("{e}")))?;
        let position: Chess = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| PlayError::InvalidFen(format!("{e}")))?;
        Ok(Self::from_position(position))
    }

    pub fn reset(&mut self) {
        *self = Game::new();
    }

    pub fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    pub fn turn(&self) -> Side {
        self.position.turn().into()
    }

    pub fn piece_side(&self, square: Square) -> Option<Side> {
        self.position
            .board()
            .piece_at(square)
            .map(|piece| piece.color.into())
    }

    /// Fullmove number of the position the history starts from.
    pub fn start_fullmove(&self) -> u32 {
        self.start.fullmoves().get()
    }

    pub fn start_turn(&self) -> Side {
        self.start.turn().into()
    }

    /// Apply a move given by its squares. Returns `None` when the rules
    /// reject it; the position is then untouched.
    ///
    /// A pawn reaching the last rank promotes to `mv.promotion`, or to
    /// [`DEFAULT_PROMOTION`] when none is given. A promotion piece on any
    /// other move is ignored.
    pub fn apply(&mut self, mv: CoordMove) -> Option<AppliedMove> {
        let role = self.position.board().piece_at(mv.from)?.role;
        let promotion = if role == Role::Pawn && matches!(mv.to.rank(), Rank::First | Rank::Eighth)
        {
            Some(mv.promotion.unwrap_or(DEFAULT_PROMOTION))
        } else {
            None
        };

        let uci = UciMove::Normal {
            from: mv.from,
            to: mv.to,
            promotion,
        };
        let m = uci.to_move(&self.position).ok()?;

        let san = San::from_move(&self.position, &m);
        let side = self.turn();
        let captured = m.is_capture();
        let (from, to) = match UciMove::from_move(&m, CastlingMode::Standard) {
            UciMove::Normal { from, to, .. } => (from, to),
            _ => (mv.from, mv.to),
        };

        let before = self.position.clone();
        let after = before.clone().play(&m).ok()?;
        let suffix = if after.is_checkmate() {
            "#"
        } else if after.is_check() {
            "+"
        } else {
            ""
        };

        let applied = AppliedMove {
            side,
            from,
            to,
            promotion,
            captured,
            san: format!("{san}{suffix}"),
        };
        self.position = after;
        self.plies.push(Ply {
            before,
            applied: applied.clone(),
        });
        Some(applied)
    }

    /// Squares the piece on `square` may move to, in generation order and
    /// without duplicates. Empty for an empty square or a piece of the side
    /// not on move.
    pub fn legal_destinations(&self, square: Square) -> Vec<Square> {
        let mut out = Vec::new();
        for m in self.position.legal_moves().iter() {
            if m.from() != Some(square) {
                continue;
            }
            if let UciMove::Normal { to, .. } = UciMove::from_move(m, CastlingMode::Standard) {
                if !out.contains(&to) {
                    out.push(to);
                }
            }
        }
        out
    }

    pub fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    pub fn is_check(&self) -> bool {
        self.position.is_check()
    }

    pub fn is_stalemate(&self) -> bool {
        self.position.is_stalemate()
    }

    /// Stalemate, insufficient material, the fifty-move rule or threefold
    /// repetition.
    pub fn is_draw(&self) -> bool {
        self.position.is_stalemate()
            || self.position.is_insufficient_material()
            || self.position.halfmoves() >= 100
            || self.is_threefold_repetition()
    }

    pub fn is_game_over(&self) -> bool {
        self.is_checkmate() || self.is_draw()
    }

    pub fn is_threefold_repetition(&self) -> bool {
        if self.plies.len() < 8 {
            return false;
        }
        let current = repetition_key(&self.position);
        let earlier = self
            .plies
            .iter()
            .filter(|ply| repetition_key(&ply.before) == current)
            .count();
        earlier + 1 >= 3
    }

    pub fn plies(&self) -> usize {
        self.plies.len()
    }

    pub fn history(&self) -> impl Iterator<Item = &AppliedMove> {
        self.plies.iter().map(|ply| &ply.applied)
    }

    pub fn last_move(&self) -> Option<&AppliedMove> {
        self.plies.last().map(|ply| &ply.applied)
    }

    /// Take back the most recent ply.
    pub fn undo(&mut self) -> Option<AppliedMove> {
        let ply = self.plies.pop()?;
        self.position = ply.before;
        Some(ply.applied)
    }
}

/// Board, side to move, castling rights and en passant square: the FEN
/// without its clocks.
fn repetition_key(position: &Chess) -> String {
    let fen = Fen::from_position(position.clone(), EnPassantMode::Legal).to_string();
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn play(game: &mut Game, uci: &str) -> AppliedMove {
        game.apply(CoordMove::from_uci(uci).unwrap())
            .unwrap_or_else(|| panic!("{uci} rejected"))
    }

    #[test]
    fn starts_from_standard_position() {
        let game = Game::new();
        assert_eq!(game.fen(), START_FEN);
        assert_eq!(game.turn(), Side::White);
        assert_eq!(game.plies(), 0);
        assert!(!game.is_game_over());
    }

    #[test]
    fn accepted_pawn_push_records_san_and_flips_turn() {
        let mut game = Game::new();
        let mv = play(&mut game, "e2e4");
        assert_eq!(mv.san, "e4");
        assert_eq!(mv.side, Side::White);
        assert!(!mv.captured);
        assert_eq!(game.turn(), Side::Black);
        assert_eq!(
            game.fen(),
            "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
        );
    }

    #[test]
    fn illegal_move_leaves_position_untouched() {
        let mut game = Game::new();
        let before = game.fen();
        assert!(game.apply(CoordMove::from_uci("e2e5").unwrap()).is_none());
        assert!(game.apply(CoordMove::from_uci("e7e5").unwrap()).is_none());
        assert!(game.apply(CoordMove::from_uci("e3e4").unwrap()).is_none());
        assert_eq!(game.fen(), before);
        assert_eq!(game.plies(), 0);
    }

    #[test]
    fn captures_are_flagged() {
        let mut game = Game::new();
        play(&mut game, "e2e4");
        play(&mut game, "d7d5");
        let mv = play(&mut game, "e4d5");
        assert!(mv.captured);
        assert_eq!(mv.san, "exd5");
    }

    #[test]
    fn promotion_defaults_to_queen() {
        let mut game = Game::from_fen("8/6P1/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        let mv = play(&mut game, "g7g8");
        assert_eq!(mv.promotion, Some(Role::Queen));
        assert!(mv.san.starts_with("g8=Q"), "{}", mv.san);
    }

    #[test]
    fn explicit_underpromotion_is_honoured() {
        let mut game = Game::from_fen("8/6P1/8/8/8/8/k7/4K3 w - - 0 1").unwrap();
        let mv = play(&mut game, "g7g8n");
        assert_eq!(mv.promotion, Some(Role::Knight));
        assert_eq!(mv.san, "g8=N");
    }

    #[test]
    fn promotion_letter_on_ordinary_move_is_ignored() {
        let mut game = Game::new();
        let mv = play(&mut game, "e2e4q");
        assert_eq!(mv.promotion, None);
        assert_eq!(mv.san, "e4");
    }

    #[test]
    fn destinations_for_pieces_of_side_to_move() {
        let game = Game::new();
        assert_eq!(game.legal_destinations(Square::E2), vec![Square::E3, Square::E4]);
        let mut knight = game.legal_destinations(Square::G1);
        knight.sort();
        assert_eq!(knight, vec![Square::F3, Square::H3]);
        assert!(game.legal_destinations(Square::E7).is_empty());
        assert!(game.legal_destinations(Square::E4).is_empty());
    }

    #[test]
    fn castling_uses_king_destination_squares() {
        let mut game = Game::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let dests = game.legal_destinations(Square::E1);
        assert!(dests.contains(&Square::G1));
        assert!(dests.contains(&Square::C1));

        let mv = play(&mut game, "e1g1");
        assert_eq!(mv.san, "O-O");
        assert_eq!((mv.from, mv.to), (Square::E1, Square::G1));
        assert!(game.fen().starts_with("r3k2r/8/8/8/8/8/8/R4RK1 b kq"));
    }

    #[test]
    fn fools_mate_is_checkmate_with_suffix() {
        let mut game = Game::new();
        for uci in ["f2f3", "e7e5", "g2g4"] {
            play(&mut game, uci);
        }
        let mate = play(&mut game, "d8h4");
        assert_eq!(mate.san, "Qh4#");
        assert!(game.is_checkmate());
        assert!(game.is_check());
        assert!(game.is_game_over());
        assert!(!game.is_draw());
        assert_eq!(game.turn(), Side::White);
    }

    #[test]
    fn check_and_mate_suffixes() {
        let mut game = Game::new();
        for uci in ["e2e4", "f7f6", "d2d4", "g7g5"] {
            play(&mut game, uci);
        }
        let mv = play(&mut game, "d1h5");
        assert_eq!(mv.san, "Qh5#");

        let mut game = Game::new();
        for uci in ["e2e4", "f7f5", "d1h5"] {
            play(&mut game, uci);
        }
        assert_eq!(game.last_move().unwrap().san, "Qh5+");
        assert!(game.is_check());
        assert!(!game.is_checkmate());
    }

    #[test]
    fn draw_conditions() {
        let stalemate = Game::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(stalemate.is_stalemate());
        assert!(stalemate.is_draw());
        assert!(!stalemate.is_checkmate());

        let bare_kings = Game::from_fen("8/8/8/4k3/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(bare_kings.is_draw());

        let fifty = Game::from_fen("8/8/8/4k3/8/8/3R4/4K3 w - - 100 80").unwrap();
        assert!(fifty.is_draw());
        assert!(fifty.is_game_over());
    }

    #[test]
    fn threefold_repetition_needs_third_occurrence() {
        let mut game = Game::new();
        for uci in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            play(&mut game, uci);
        }
        assert!(!game.is_draw(), "second occurrence is not a draw");
        for uci in ["g1f3", "g8f6", "f3g1", "f6g8"] {
            play(&mut game, uci);
        }
        assert!(game.is_threefold_repetition());
        assert!(game.is_draw());
    }

    #[test]
    fn undo_restores_previous_position() {
        let mut game = Game::new();
        play(&mut game, "e2e4");
        let after_e4 = game.fen();
        play(&mut game, "e7e5");
        let undone = game.undo().unwrap();
        assert_eq!(undone.san, "e5");
        assert_eq!(game.fen(), after_e4);
        assert_eq!(game.plies(), 1);
        game.undo();
        assert_eq!(game.fen(), START_FEN);
        assert!(game.undo().is_none());
    }

    #[test]
    fn invalid_fen_is_an_error() {
        assert!(matches!(
            Game::from_fen("not a fen"),
            Err(PlayError::InvalidFen(_))
        ));
        assert!(matches!(
            Game::from_fen("8/8/8/8/8/8/8/8 w - - 0 1"),
            Err(PlayError::InvalidFen(_))
        ));
    }

    #[test]
    fn fen_import_round_trips() {
        let fen = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
        let game = Game::from_fen(fen).unwrap();
        assert_eq!(game.fen(), fen);
        assert_eq!(game.start_fullmove(), 2);
        assert_eq!(game.start_turn(), Side::White);
    }
}
