use std::cell::RefCell;
use std::rc::Rc;

use log::warn;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{Document, Element, HtmlAudioElement, Request, RequestInit, Response};

use crate::config::{Config, Side};
use crate::controller::{Command, Controller, Effect, Sound};
use crate::error::PlayError;
use crate::highlight::{HighlightView, HOVER_CLASS, LAST_MOVE_CLASS};
use crate::service::{decode_evaluation_reply, decode_move_reply, EvaluationRequest, MoveRequest};

#[wasm_bindgen]
extern "C" {
    /// A chessboard.js board handle.
    pub type Chessboard;

    #[wasm_bindgen(method)]
    fn position(this: &Chessboard, fen: &str);

    #[wasm_bindgen(method)]
    fn orientation(this: &Chessboard, side: &str);
}

struct Inner {
    controller: RefCell<Controller>,
    board: Chessboard,
    config: Config,
}

#[wasm_bindgen]
pub struct ChessApp {
    inner: Rc<Inner>,
}

#[wasm_bindgen]
impl ChessApp {
    /// Bind a controller to `board`. `config` is an optional object with
    /// any of the `Config` fields.
    #[wasm_bindgen(constructor)]
    pub fn new(board: Chessboard, config: JsValue) -> Result<ChessApp, JsValue> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);

        let config: Config = if config.is_undefined() || config.is_null() {
            Config::new()
        } else {
            serde_wasm_bindgen::from_value(config)?
        };
        let inner = Rc::new(Inner {
            controller: RefCell::new(Controller::new(config.clone())),
            board,
            config,
        });
        let effects = inner.controller.borrow_mut().take_effects();
        perform(&inner, effects);
        Ok(ChessApp { inner })
    }

    pub fn on_drag_start(&self, source: &str, piece: &str) -> bool {
        let (Ok(square), Some(side)) = (source.parse(), Side::of_piece_code(piece)) else {
            return false;
        };
        let effects = self.dispatch(Command::DragStart { square, side });
        !effects.contains(&Effect::DenyDrag)
    }

    /// Returns `"snapback"` when the drop was refused.
    pub fn on_drop(&self, source: &str, target: &str) -> JsValue {
        let (Ok(from), Ok(to)) = (source.parse(), target.parse()) else {
            return JsValue::from_str("snapback");
        };
        let effects = self.dispatch(Command::Drop { from, to });
        if effects.contains(&Effect::Snapback) {
            return JsValue::from_str("snapback");
        }
        // The widget is still animating the drop; on_snap_end redraws.
        let effects = effects
            .into_iter()
            .filter(|e| !matches!(e, Effect::SetPosition(_)))
            .collect();
        perform(&self.inner, effects);
        JsValue::UNDEFINED
    }

    pub fn on_snap_end(&self) {
        let fen = self.inner.controller.borrow().game().fen();
        self.inner.board.position(&fen);
    }

    pub fn on_mouseover_square(&self, square: &str) {
        if let Ok(square) = square.parse() {
            self.run(Command::HoverEnter(square));
        }
    }

    pub fn on_mouseout_square(&self, square: &str) {
        if let Ok(square) = square.parse() {
            self.run(Command::HoverLeave(square));
        }
    }

    pub fn reset(&self) {
        self.run(Command::Reset);
    }

    pub fn undo(&self) {
        self.run(Command::Undo);
    }

    pub fn toggle_color(&self) {
        self.run(Command::ToggleColor);
    }

    pub fn retry(&self) {
        self.run(Command::Retry);
    }

    pub fn set_difficulty(&self, level: i32) {
        self.run(Command::SetDifficulty(i64::from(level)));
    }

    pub fn load_fen(&self, fen: &str) {
        self.run(Command::LoadFen(fen.to_string()));
    }

    pub fn view(&self) -> JsValue {
        let view = self.inner.controller.borrow().view();
        serde_wasm_bindgen::to_value(&view).unwrap_or(JsValue::NULL)
    }

    pub fn fen(&self) -> String {
        self.inner.controller.borrow().game().fen()
    }

    pub fn build_stamp() -> String {
        format!(
            "{} ({})",
            env!("CARGO_PKG_VERSION"),
            env!("BUILD_TIMESTAMP")
        )
    }
}

impl ChessApp {
    fn dispatch(&self, command: Command) -> Vec<Effect> {
        self.inner.controller.borrow_mut().dispatch(command)
    }

    fn run(&self, command: Command) {
        let effects = self.dispatch(command);
        perform(&self.inner, effects);
    }
}

/// Carry out effects, then repaint the DOM from the controller's view.
/// No controller borrow is held while effects run.
fn perform(inner: &Rc<Inner>, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::DenyDrag | Effect::Snapback => {}
            Effect::SetPosition(fen) => inner.board.position(&fen),
            Effect::SetOrientation(side) => inner.board.orientation(side.name()),
            Effect::PlaySound(sound) => play_sound(&inner.config, sound),
            Effect::RequestMove(request) => request_move(Rc::clone(inner), request),
            Effect::RequestEvaluation(request) => request_evaluation(Rc::clone(inner), request),
            Effect::Alert(message) => {
                if let Some(window) = web_sys::window() {
                    let _ = window.alert_with_message(&message);
                }
            }
        }
    }
    render(inner);
}

fn request_move(inner: Rc<Inner>, request: MoveRequest) {
    let url = inner.config.move_url();
    spawn_local(async move {
        let result = match post_json(&url, &request).await {
            Ok((status, status_text, body)) => decode_move_reply(status, &status_text, &body),
            Err(e) => Err(e),
        };
        let effects = inner
            .controller
            .borrow_mut()
            .dispatch(Command::ServiceReply {
                id: request.id,
                result,
            });
        perform(&inner, effects);
    });
}

fn request_evaluation(inner: Rc<Inner>, request: EvaluationRequest) {
    let url = inner.config.evaluate_url();
    spawn_local(async move {
        let result = match post_json(&url, &request).await {
            Ok((status, status_text, body)) => decode_evaluation_reply(status, &status_text, &body),
            Err(e) => Err(e),
        };
        let effects = inner
            .controller
            .borrow_mut()
            .dispatch(Command::EvaluationReply {
                id: request.id,
                result,
            });
        perform(&inner, effects);
    });
}

fn js_error(value: JsValue) -> PlayError {
    PlayError::Transport(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

/// POST `body` as JSON; yields status code, status text and response text.
async fn post_json<T: Serialize>(url: &str, body: &T) -> Result<(u16, String, String), PlayError> {
    let window = web_sys::window().ok_or_else(|| PlayError::Transport("no window".to_string()))?;
    let json = serde_json::to_string(body).map_err(|e| PlayError::Transport(e.to_string()))?;

    let init = RequestInit::new();
    init.set_method("POST");
    init.set_body(&JsValue::from_str(&json));
    let request = Request::new_with_str_and_init(url, &init).map_err(js_error)?;
    request
        .headers()
        .set("Content-Type", "application/json")
        .map_err(js_error)?;

    let response: Response = JsFuture::from(window.fetch_with_request(&request))
        .await
        .map_err(js_error)?
        .dyn_into()
        .map_err(js_error)?;
    let text = JsFuture::from(response.text().map_err(js_error)?)
        .await
        .map_err(js_error)?
        .as_string()
        .unwrap_or_default();
    Ok((response.status(), response.status_text(), text))
}

fn play_sound(config: &Config, sound: Sound) {
    let src = match sound {
        Sound::Move => &config.move_sound,
        Sound::Capture => &config.capture_sound,
    };
    match HtmlAudioElement::new_with_src(src) {
        Ok(audio) => {
            let _ = audio.play();
        }
        Err(e) => warn!("cannot play {src}: {e:?}"),
    }
}

fn render(inner: &Inner) {
    let view = inner.controller.borrow().view();
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    paint_highlights(&document, &view.highlights);
    if let Some(list) = document.get_element_by_id("move-history") {
        let rows: String = view
            .history
            .iter()
            .map(|row| format!("<li>{}</li>", row.text()))
            .collect();
        list.set_inner_html(&rows);
    }
    if let Some(status) = document.get_element_by_id("game-status") {
        status.set_text_content(Some(&view.status));
    }
    if let Some(evaluation) = document.get_element_by_id("evaluation") {
        evaluation.set_text_content(view.evaluation.as_deref());
    }
}

fn paint_highlights(document: &Document, highlights: &HighlightView) {
    for class in [HOVER_CLASS, LAST_MOVE_CLASS] {
        let Ok(marked) = document.query_selector_all(&format!(".{class}")) else {
            continue;
        };
        for i in 0..marked.length() {
            if let Some(element) = marked.item(i).and_then(|n| n.dyn_into::<Element>().ok()) {
                let _ = element.class_list().remove_1(class);
            }
        }
    }
    mark_squares(document, &highlights.last_move, LAST_MOVE_CLASS);
    mark_squares(document, &highlights.hover, HOVER_CLASS);
}

fn mark_squares(document: &Document, squares: &[String], class: &str) {
    for square in squares {
        if let Ok(Some(element)) = document.query_selector(&format!(".square-{square}")) {
            let _ = element.class_list().add_1(class);
        }
    }
}
