//! Terminal front-end: type coordinate moves against the move service.
//!
//! Commands: `e2e4` (or `e7e8q`), `hover <square>`, `undo`, `reset`, `flip`,
//! `retry`, `level <n>`, `fen <FEN>`, `quit`.

use std::io::{self, BufRead, Write};

use clap::Parser;
use log::info;

use fenboard::controller::Sound;
use fenboard::driver;
use fenboard::moves::CoordMove;
use fenboard::service::HttpMoveService;
use fenboard::{Command, Config, Controller, Difficulty, Effect, Side};

#[derive(Parser, Debug)]
#[command(version, about = "Play against the move service from a terminal")]
struct Args {
    /// Base URL of the move service.
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    url: String,

    /// Service skill level, 1 to 20.
    #[arg(long, default_value_t = 5)]
    difficulty: i64,

    /// Side the human plays: white or black.
    #[arg(long, default_value = "white")]
    color: String,

    /// Ask the service for an evaluation after every move.
    #[arg(long)]
    evaluate: bool,
}

fn show(effect: &Effect) {
    match effect {
        Effect::SetPosition(fen) => println!("  {fen}"),
        Effect::SetOrientation(side) => println!("  board faces {}", side.name()),
        Effect::PlaySound(Sound::Capture) => println!("  (capture)"),
        Effect::RequestMove(request) => {
            println!("  service thinking at level {}...", request.difficulty)
        }
        Effect::Alert(message) => eprintln!("! {message}"),
        Effect::Snapback => println!("  illegal move"),
        Effect::DenyDrag => println!("  not your piece"),
        Effect::PlaySound(Sound::Move) | Effect::RequestEvaluation(_) => {}
    }
}

fn print_view(controller: &Controller) {
    let view = controller.view();
    if let Some(row) = view.history.last() {
        println!("  {}", row.text());
    }
    match view.evaluation {
        Some(evaluation) => println!("  {} [{evaluation}]", view.status),
        None => println!("  {}", view.status),
    }
}

/// Turn a typed line into a command. Moves go through the drag gate first,
/// the same as a mouse drag would.
fn parse_line(controller: &Controller, line: &str) -> Result<Vec<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(word) = words.next() else {
        return Ok(Vec::new());
    };
    let rest: Vec<&str> = words.collect();
    let command = match word {
        "undo" => Command::Undo,
        "reset" => Command::Reset,
        "flip" => Command::ToggleColor,
        "retry" => Command::Retry,
        "level" => {
            let level = rest
                .first()
                .and_then(|s| s.parse().ok())
                .ok_or("usage: level <n>")?;
            Command::SetDifficulty(level)
        }
        "fen" => Command::LoadFen(rest.join(" ")),
        "hover" => {
            let square = rest
                .first()
                .and_then(|s| s.parse().ok())
                .ok_or("usage: hover <square>")?;
            Command::HoverEnter(square)
        }
        _ => {
            let mv = CoordMove::from_uci(word).ok_or_else(|| format!("unknown command {word:?}"))?;
            let side = controller
                .game()
                .piece_side(mv.from)
                .ok_or_else(|| format!("no piece on {}", mv.from))?;
            return Ok(vec![
                Command::DragStart {
                    square: mv.from,
                    side,
                },
                Command::Drop {
                    from: mv.from,
                    to: mv.to,
                },
            ]);
        }
    };
    Ok(vec![command])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let human = Side::parse(&args.color).ok_or_else(|| format!("bad color {:?}", args.color))?;
    let config = Config {
        human,
        difficulty: Difficulty::new(args.difficulty),
        service_url: args.url,
        show_evaluation: args.evaluate,
        ..Config::new()
    };
    info!("using move service at {}", config.move_url());
    let service = HttpMoveService::new(&config)?;
    let mut controller = Controller::new(config);

    let opening = controller.take_effects();
    driver::run(&mut controller, &service, opening, show);
    print_view(&controller);

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let line = line.trim();
        if line == "quit" {
            break;
        }
        let commands = match parse_line(&controller, line) {
            Ok(commands) => commands,
            Err(e) => {
                eprintln!("! {e}");
                continue;
            }
        };
        let hovered = commands
            .iter()
            .find(|c| matches!(c, Command::HoverEnter(_)))
            .cloned();
        for command in commands {
            let drag = matches!(command, Command::DragStart { .. });
            let effects = controller.dispatch(command);
            let denied = drag && effects.contains(&Effect::DenyDrag);
            driver::run(&mut controller, &service, effects, show);
            if denied {
                break;
            }
        }
        if let Some(Command::HoverEnter(square)) = hovered {
            let mut squares: Vec<String> = controller
                .highlights()
                .candidates()
                .iter()
                .map(|s| s.to_string())
                .collect();
            squares.sort();
            println!("  {}", squares.join(" "));
            controller.dispatch(Command::HoverLeave(square));
        }
        print_view(&controller);
    }
    Ok(())
}
