use clap::Parser;
use log::{info, warn};
use rand::seq::SliceRandom;
use shakmaty::Square;

use fenboard::driver;
use fenboard::service::HttpMoveService;
use fenboard::{Command, Config, Controller, Difficulty, Effect, Phase, Side};

/// Drive the human side with random legal drops against the move service.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    #[arg(long, default_value = "http://127.0.0.1:5000")]
    url: String,

    #[arg(long, default_value_t = 1)]
    difficulty: i64,

    /// Let the service play White.
    #[arg(long)]
    black: bool,

    #[arg(long, default_value_t = 200)]
    max_plies: usize,
}

fn random_drop(controller: &Controller) -> Option<(Square, Square)> {
    let game = controller.game();
    let turn = game.turn();
    let drops: Vec<(Square, Square)> = Square::ALL
        .into_iter()
        .filter(|&from| game.piece_side(from) == Some(turn))
        .flat_map(|from| {
            game.legal_destinations(from)
                .into_iter()
                .map(move |to| (from, to))
        })
        .collect();
    drops.choose(&mut rand::thread_rng()).copied()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let config = Config {
        human: if args.black { Side::Black } else { Side::White },
        difficulty: Difficulty::new(args.difficulty),
        service_url: args.url,
        ..Config::new()
    };
    let service = HttpMoveService::new(&config)?;
    let mut controller = Controller::new(config);
    let mut failed = false;
    let mut alert = |effect: &Effect| {
        if let Effect::Alert(message) = effect {
            warn!("{message}");
            failed = true;
        }
    };

    let opening = controller.take_effects();
    driver::run(&mut controller, &service, opening, &mut alert);

    while controller.game().plies() < args.max_plies {
        if controller.phase() != Phase::HumanToMove {
            break;
        }
        let Some((from, to)) = random_drop(&controller) else {
            break;
        };
        driver::dispatch(&mut controller, &service, Command::Drop { from, to }, &mut alert);
    }

    let plies = controller.game().plies();
    match controller.phase() {
        Phase::Checkmate { winner } => info!("{} wins", winner.title()),
        Phase::Draw => info!("draw"),
        _ => info!("stopped"),
    }
    eprintln!("Game over after {plies} plies: {}", controller.status());
    for row in controller.history().rows() {
        println!("{}", row.text());
    }
    if failed {
        return Err("the move service reported an error".into());
    }
    Ok(())
}
