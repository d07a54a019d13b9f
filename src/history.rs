use serde::Serialize;

use crate::config::Side;

/// One numbered line of the move list: White's ply and Black's reply.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HistoryRow {
    pub number: u32,
    pub white: Option<String>,
    pub black: Option<String>,
}

impl HistoryRow {
    /// Rendered as `1. e4 e5`, `1. e4`, or `1... e5` for a row opened by Black.
    pub fn text(&self) -> String {
        match (&self.white, &self.black) {
            (Some(w), Some(b)) => format!("{}. {w} {b}", self.number),
            (Some(w), None) => format!("{}. {w}", self.number),
            (None, Some(b)) => format!("{}... {b}", self.number),
            (None, None) => format!("{}.", self.number),
        }
    }
}

/// Notated plies in the order they were played.
#[derive(Clone, Debug)]
pub struct MoveHistory {
    first_number: u32,
    first_side: Side,
    plies: Vec<String>,
}

impl Default for MoveHistory {
    fn default() -> Self {
        Self::new(1, Side::White)
    }
}

impl MoveHistory {
    /// History for a game whose first ply will be `first_side`'s, at fullmove
    /// `first_number`.
    pub fn new(first_number: u32, first_side: Side) -> Self {
        MoveHistory {
            first_number: first_number.max(1),
            first_side,
            plies: Vec::new(),
        }
    }

    pub fn push(&mut self, san: impl Into<String>) {
        self.plies.push(san.into());
    }

    /// Remove the last ply, returning its notation.
    pub fn pop(&mut self) -> Option<String> {
        self.plies.pop()
    }

    pub fn clear(&mut self) {
        self.plies.clear();
    }

    pub fn len(&self) -> usize {
        self.plies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plies.is_empty()
    }

    pub fn plies(&self) -> &[String] {
        &self.plies
    }

    /// Group plies into numbered rows. When Black moved first, the first
    /// row has no White entry.
    pub fn rows(&self) -> Vec<HistoryRow> {
        let mut rows: Vec<HistoryRow> = Vec::new();
        let mut number = self.first_number;
        let mut side = self.first_side;
        for san in &self.plies {
            match side {
                Side::White => rows.push(HistoryRow {
                    number,
                    white: Some(san.clone()),
                    black: None,
                }),
                Side::Black => {
                    match rows.last_mut() {
                        Some(row) if row.black.is_none() && row.number == number => {
                            row.black = Some(san.clone());
                        }
                        _ => rows.push(HistoryRow {
                            number,
                            white: None,
                            black: Some(san.clone()),
                        }),
                    }
                    number += 1;
                }
            }
            side = side.opposite();
        }
        rows
    }
}
