use crate::rules::Game;

/// Status line for the current position.
pub fn status_text(game: &Game) -> String {
    let turn = game.turn();
    if game.is_checkmate() {
        return format!(
            "Game over - {} wins by checkmate.",
            turn.opposite().title()
        );
    }
    if game.is_draw() {
        return "Game over - Draw".to_string();
    }
    let mut status = format!("{} to move", turn.title());
    if game.is_check() {
        status.push_str(" - Check!");
    }
    status
}
