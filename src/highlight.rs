use serde::Serialize;
use shakmaty::Square;

/// Class toggled on hover candidates.
pub const HOVER_CLASS: &str = "highlight-hover";
/// Class toggled on the two squares of the last completed ply.
pub const LAST_MOVE_CLASS: &str = "highlight-last";

/// Squares currently marked on the board. `hover` is transient and
/// recomputed on every hover event; `last_move` survives hover changes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Highlights {
    hover: Vec<Square>,
    last_move: Option<(Square, Square)>,
}

impl Highlights {
    /// Mark `origin` and its destinations. Nothing is marked when there
    /// are no destinations.
    pub fn show_candidates(&mut self, origin: Square, destinations: &[Square]) {
        self.hover.clear();
        if destinations.is_empty() {
            return;
        }
        self.hover.push(origin);
        self.hover.extend_from_slice(destinations);
    }

    pub fn clear_candidates(&mut self) {
        self.hover.clear();
    }

    pub fn set_last_move(&mut self, last: Option<(Square, Square)>) {
        self.last_move = last;
    }

    pub fn clear(&mut self) {
        self.hover.clear();
        self.last_move = None;
    }

    pub fn candidates(&self) -> &[Square] {
        &self.hover
    }

    pub fn last_move(&self) -> Option<(Square, Square)> {
        self.last_move
    }

    pub fn to_view(&self) -> HighlightView {
        HighlightView {
            hover: self.hover.iter().map(|sq| sq.to_string()).collect(),
            last_move: self
                .last_move
                .map(|(from, to)| vec![from.to_string(), to.to_string()])
                .unwrap_or_default(),
        }
    }
}

/// Square names per highlight class, as the DOM layer consumes them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HighlightView {
    pub hover: Vec<String>,
    pub last_move: Vec<String>,
}
