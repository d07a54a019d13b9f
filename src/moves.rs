use shakmaty::{Role, Square};

use crate::config::Side;

/// A move as the board widget and the move service speak it: two squares
/// and an optional promotion piece.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CoordMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl CoordMove {
    pub fn new(from: Square, to: Square) -> Self {
        CoordMove {
            from,
            to,
            promotion: None,
        }
    }

    /// Convert to UCI notation, e.g. "e2e4", "a7a8q"
    pub fn to_uci(&self) -> String {
        match self.promotion {
            Some(role) => format!("{}{}{}", self.from, self.to, role.char()),
            None => format!("{}{}", self.from, self.to),
        }
    }

    /// Parse from UCI notation. Accepts exactly four or five characters;
    /// a fifth character must name a piece a pawn can promote to.
    pub fn from_uci(s: &str) -> Option<CoordMove> {
        let s = s.trim();
        if !s.is_ascii() || !(4..=5).contains(&s.len()) {
            return None;
        }
        let from: Square = s[0..2].parse().ok()?;
        let to: Square = s[2..4].parse().ok()?;
        let promotion = match s.as_bytes().get(4) {
            Some(&b) => Some(promotion_role(b as char)?),
            None => None,
        };
        Some(CoordMove {
            from,
            to,
            promotion,
        })
    }
}

fn promotion_role(c: char) -> Option<Role> {
    match c.to_ascii_lowercase() {
        'q' => Some(Role::Queen),
        'r' => Some(Role::Rook),
        'b' => Some(Role::Bishop),
        'n' => Some(Role::Knight),
        _ => None,
    }
}

/// A ply the rules accepted, with what the UI needs to present it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppliedMove {
    pub side: Side,
    /// Squares the piece visibly travelled between (king squares for castling).
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
    pub captured: bool,
    /// Standard algebraic notation including a `+` or `#` suffix.
    pub san: String,
}
