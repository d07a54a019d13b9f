pub mod config;
pub mod controller;
pub mod error;
pub mod highlight;
pub mod history;
pub mod moves;
pub mod rules;
pub mod service;
pub mod status;

#[cfg(not(target_arch = "wasm32"))]
pub mod driver;

#[cfg(target_arch = "wasm32")]
mod wasm_api;

pub use config::{Config, Difficulty, Side};
pub use controller::{Command, Controller, DragGate, DropOutcome, Effect, Phase, ReplyOutcome};
pub use error::PlayError;
