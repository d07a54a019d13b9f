use serde::{Deserialize, Serialize};
use shakmaty::Color;

/// Lowest and highest skill level the move service accepts.
pub const MIN_DIFFICULTY: u8 = 1;
pub const MAX_DIFFICULTY: u8 = 20;
pub const DEFAULT_DIFFICULTY: u8 = 5;

/// One of the two players, as seen by the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }

    /// Lowercase name, as the board widget expects for orientation.
    pub fn name(self) -> &'static str {
        match self {
            Side::White => "white",
            Side::Black => "black",
        }
    }

    /// Capitalised name used in status lines.
    pub fn title(self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }

    pub fn parse(s: &str) -> Option<Side> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" | "w" => Some(Side::White),
            "black" | "b" => Some(Side::Black),
            _ => None,
        }
    }

    /// Side owning a widget piece code such as `wP` or `bK`.
    pub fn of_piece_code(code: &str) -> Option<Side> {
        match code.as_bytes().first() {
            Some(b'w') => Some(Side::White),
            Some(b'b') => Some(Side::Black),
            _ => None,
        }
    }
}

impl From<Color> for Side {
    fn from(c: Color) -> Side {
        match c {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

impl From<Side> for Color {
    fn from(s: Side) -> Color {
        match s {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

/// Skill level sent with every move request. Always within
/// `MIN_DIFFICULTY..=MAX_DIFFICULTY`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "u8")]
pub struct Difficulty(u8);

impl Difficulty {
    pub fn new(level: i64) -> Difficulty {
        Difficulty(level.clamp(MIN_DIFFICULTY as i64, MAX_DIFFICULTY as i64) as u8)
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty(DEFAULT_DIFFICULTY)
    }
}

impl From<i64> for Difficulty {
    fn from(level: i64) -> Self {
        Difficulty::new(level)
    }
}

impl From<Difficulty> for u8 {
    fn from(d: Difficulty) -> u8 {
        d.0
    }
}

/// Session configuration. Only `human` and `difficulty` change at runtime,
/// through the colour toggle and the difficulty control.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Colour the human plays; the move service plays the other one.
    pub human: Side,
    pub difficulty: Difficulty,
    /// Base URL prepended to the endpoint paths. Empty means same origin.
    pub service_url: String,
    pub move_path: String,
    pub evaluate_path: String,
    /// Ask the service for an evaluation after every ply.
    pub show_evaluation: bool,
    pub move_sound: String,
    pub capture_sound: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Config {
            human: Side::White,
            difficulty: Difficulty::default(),
            service_url: String::new(),
            move_path: "/move".to_string(),
            evaluate_path: "/evaluate".to_string(),
            show_evaluation: false,
            move_sound: "/static/sounds/move.mp3".to_string(),
            capture_sound: "/static/sounds/capture.mp3".to_string(),
        }
    }

    pub fn move_url(&self) -> String {
        join_url(&self.service_url, &self.move_path)
    }

    pub fn evaluate_url(&self) -> String {
        join_url(&self.service_url, &self.evaluate_path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    if base.is_empty() {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_is_clamped_to_service_range() {
        assert_eq!(Difficulty::new(0).level(), 1);
        assert_eq!(Difficulty::new(-4).level(), 1);
        assert_eq!(Difficulty::new(12).level(), 12);
        assert_eq!(Difficulty::new(99).level(), 20);
        assert_eq!(Difficulty::default().level(), 5);
    }

    #[test]
    fn config_deserializes_with_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"human": "black", "difficulty": 40}"#).unwrap();
        assert_eq!(config.human, Side::Black);
        assert_eq!(config.difficulty.level(), 20);
        assert_eq!(config.move_url(), "/move");
        assert!(!config.show_evaluation);
    }

    #[test]
    fn urls_join_base_and_path() {
        let mut config = Config::new();
        config.service_url = "http://localhost:5000/".to_string();
        assert_eq!(config.move_url(), "http://localhost:5000/move");
        assert_eq!(config.evaluate_url(), "http://localhost:5000/evaluate");
    }

    #[test]
    fn piece_codes_map_to_sides() {
        assert_eq!(Side::of_piece_code("wQ"), Some(Side::White));
        assert_eq!(Side::of_piece_code("bP"), Some(Side::Black));
        assert_eq!(Side::of_piece_code(""), None);
        assert_eq!(Side::parse(" Black "), Some(Side::Black));
    }
}
