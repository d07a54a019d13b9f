use std::cell::RefCell;
use std::collections::VecDeque;

use fenboard::controller::Sound;
use fenboard::driver;
use fenboard::service::{Evaluation, EvaluationRequest, MoveRequest, MoveService};
use fenboard::{Command, Config, Controller, Effect, Phase, PlayError, Side};
use shakmaty::Square;

const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Replays canned replies in order and remembers what it was asked.
#[derive(Default)]
struct Scripted {
    replies: RefCell<VecDeque<Result<String, PlayError>>>,
    requests: RefCell<Vec<MoveRequest>>,
}

impl Scripted {
    fn new(replies: &[&str]) -> Self {
        let scripted = Scripted::default();
        for reply in replies {
            scripted.push(Ok(reply.to_string()));
        }
        scripted
    }

    fn push(&self, reply: Result<String, PlayError>) {
        self.replies.borrow_mut().push_back(reply);
    }
}

impl MoveService for Scripted {
    fn best_move(&self, request: &MoveRequest) -> Result<String, PlayError> {
        self.requests.borrow_mut().push(request.clone());
        self.replies
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(PlayError::Transport("script exhausted".to_string())))
    }

    fn evaluate(&self, _request: &EvaluationRequest) -> Result<Evaluation, PlayError> {
        Ok(Evaluation::Mate(2))
    }
}

fn sq(name: &str) -> Square {
    name.parse().unwrap()
}

fn play(controller: &mut Controller, service: &Scripted, from: &str, to: &str) -> Vec<Effect> {
    let mut seen = Vec::new();
    driver::dispatch(
        controller,
        service,
        Command::Drop {
            from: sq(from),
            to: sq(to),
        },
        |e| seen.push(e.clone()),
    );
    seen
}

fn start(config: Config, service: &Scripted) -> Controller {
    let mut controller = Controller::new(config);
    let opening = controller.take_effects();
    driver::run(&mut controller, service, opening, |_| {});
    controller
}

#[test]
fn human_move_then_service_reply() {
    let service = Scripted::new(&["e7e5"]);
    let mut controller = start(Config::new(), &service);

    let effects = play(&mut controller, &service, "e2", "e4");

    let requests = service.requests.borrow();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].fen,
        "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1"
    );
    assert_eq!(requests[0].difficulty, 5);
    assert_eq!(
        controller.game().fen(),
        "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2"
    );
    assert_eq!(controller.history().rows()[0].text(), "1. e4 e5");
    assert_eq!(controller.status(), "White to move");
    let sounds = effects
        .iter()
        .filter(|e| matches!(e, Effect::PlaySound(Sound::Move)))
        .count();
    assert_eq!(sounds, 2);
}

#[test]
fn service_promotion_is_applied() {
    let service = Scripted::new(&["g2g1n"]);
    let mut controller = start(Config::new(), &service);
    controller.load_fen("7k/8/8/8/8/8/6p1/K7 w - - 0 1").unwrap();
    controller.take_effects();

    play(&mut controller, &service, "a1", "b1");

    assert_eq!(controller.game().fen(), "7k/8/8/8/8/8/8/1K4n1 w - - 0 2");
    assert_eq!(controller.history().plies().last().unwrap(), "g1=N");
}

#[test]
fn human_pawn_promotes_to_queen() {
    let service = Scripted::new(&["h8h7"]);
    let mut controller = start(Config::new(), &service);
    controller.load_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
    controller.take_effects();

    play(&mut controller, &service, "a7", "a8");

    assert_eq!(controller.history().plies()[0], "a8=Q+");
    let board_fen = controller.game().fen();
    assert!(board_fen.starts_with("Q7/7k/"), "{board_fen}");
}

#[test]
fn history_tracks_every_ply_and_undo_rewinds_two() {
    let service = Scripted::new(&["e7e5", "b8c6", "f8c5"]);
    let mut controller = start(Config::new(), &service);
    play(&mut controller, &service, "e2", "e4");
    play(&mut controller, &service, "g1", "f3");
    let after_two_turns = controller.game().fen();
    play(&mut controller, &service, "f1", "c4");

    assert_eq!(controller.history().len(), controller.game().plies());
    assert_eq!(controller.history().len(), 6);

    controller.dispatch(Command::Undo);
    assert_eq!(controller.game().fen(), after_two_turns);
    assert_eq!(controller.history().len(), 4);
    assert_eq!(controller.game().plies(), 4);
}

#[test]
fn reset_as_black_lets_the_service_open() {
    let service = Scripted::new(&["d2d4"]);
    let mut config = Config::new();
    config.human = Side::Black;
    let controller = start(config, &service);

    assert_eq!(service.requests.borrow()[0].fen, START_FEN);
    assert_eq!(controller.orientation(), Side::Black);
    assert_eq!(controller.history().rows()[0].text(), "1. d4");
    assert_eq!(controller.phase(), Phase::HumanToMove);
}

#[test]
fn failed_request_leaves_the_game_alone_until_retry() {
    let service = Scripted::default();
    service.push(Err(PlayError::Transport("connection refused".to_string())));
    service.push(Ok("c7c5".to_string()));
    let mut controller = start(Config::new(), &service);

    let effects = play(&mut controller, &service, "e2", "e4");
    let fen = controller.game().fen();
    assert!(effects.contains(&Effect::Alert("Server error: connection refused".to_string())));
    assert_eq!(controller.phase(), Phase::ServiceToMove);
    assert_eq!(controller.history().len(), 1);

    driver::dispatch(&mut controller, &service, Command::Retry, |_| {});
    assert_ne!(controller.game().fen(), fen);
    assert_eq!(controller.history().rows()[0].text(), "1. e4 c5");
}

#[test]
fn evaluation_is_shown_when_enabled() {
    let service = Scripted::new(&["e7e5"]);
    let mut config = Config::new();
    config.show_evaluation = true;
    let mut controller = start(config, &service);
    play(&mut controller, &service, "e2", "e4");

    assert_eq!(controller.view().evaluation.as_deref(), Some("#2"));
}
