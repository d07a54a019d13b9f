//! Synchronous effect pump for hosts without an event loop (the terminal
//! front-ends and tests). The browser binding does the same work with
//! `fetch` promises instead.

use std::collections::VecDeque;

use crate::controller::{Command, Controller, Effect};
use crate::service::MoveService;

/// Dispatch `command` and run everything it sets off.
pub fn dispatch<S: MoveService + ?Sized>(
    controller: &mut Controller,
    service: &S,
    command: Command,
    sink: impl FnMut(&Effect),
) {
    let effects = controller.dispatch(command);
    run(controller, service, effects, sink);
}

/// Hand each effect to `sink` in order. Move and evaluation requests are
/// also answered through `service` and the replies dispatched back, so the
/// effects those replies produce follow in the same stream.
pub fn run<S: MoveService + ?Sized>(
    controller: &mut Controller,
    service: &S,
    effects: Vec<Effect>,
    mut sink: impl FnMut(&Effect),
) {
    let mut queue: VecDeque<Effect> = effects.into();
    while let Some(effect) = queue.pop_front() {
        sink(&effect);
        let follow_up = match &effect {
            Effect::RequestMove(request) => {
                let result = service.best_move(request);
                controller.dispatch(Command::ServiceReply {
                    id: request.id,
                    result,
                })
            }
            Effect::RequestEvaluation(request) => {
                let result = service.evaluate(request);
                controller.dispatch(Command::EvaluationReply {
                    id: request.id,
                    result,
                })
            }
            _ => continue,
        };
        queue.extend(follow_up);
    }
}
