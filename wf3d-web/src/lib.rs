/// WF3D Web - wireframe viewer drawing into an HTML canvas
///
/// The page owns the animation loop and keyboard listener and forwards
/// them to [`WebViewer::tick`] and [`WebViewer::key_down`].
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};
use wf3d_core::{LineDrawer, NavCommand, RenderContext, Scene, ViewerConfig, Viewport};

/// Side of the square drawn at each segment endpoint, in pixels
const ENDPOINT_SIZE: f64 = 4.0;

/// Map a DOM `keyCode`: A/D strafe, W/S dolly, left/right arrows yaw
pub fn command_for_key_code(code: u32) -> Option<NavCommand> {
    match code {
        65 => Some(NavCommand::StrafeLeft),
        68 => Some(NavCommand::StrafeRight),
        87 => Some(NavCommand::Forward),
        83 => Some(NavCommand::Backward),
        37 => Some(NavCommand::YawLeft),
        39 => Some(NavCommand::YawRight),
        _ => None,
    }
}

fn js_error(err: wf3d_core::Error) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Line sink over a 2D canvas context; flips y so the origin is bottom-left
struct CanvasDrawer<'a> {
    ctx: &'a CanvasRenderingContext2d,
    height: f64,
}

impl LineDrawer for CanvasDrawer<'_> {
    fn draw_line(&mut self, x1: f64, y1: f64, x2: f64, y2: f64) {
        let (y1, y2) = (self.height - y1, self.height - y2);
        self.ctx.begin_path();
        self.ctx.move_to(x1, y1);
        self.ctx.line_to(x2, y2);
        self.ctx.stroke();

        let half = ENDPOINT_SIZE / 2.0;
        self.ctx.fill_rect(x1 - half, y1 - half, ENDPOINT_SIZE, ENDPOINT_SIZE);
        self.ctx.fill_rect(x2 - half, y2 - half, ENDPOINT_SIZE, ENDPOINT_SIZE);
    }
}

#[wasm_bindgen]
pub struct WebViewer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    context: RenderContext,
}

#[wasm_bindgen]
impl WebViewer {
    /// Attach to the canvas with the given element id and show the house scene
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<WebViewer, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document available"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("no element with id '{}'", canvas_id)))?
            .dyn_into::<HtmlCanvasElement>()?;
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        let config = ViewerConfig {
            width: canvas.width(),
            height: canvas.height(),
            ..ViewerConfig::default()
        };
        let context = RenderContext::with_config(Scene::house(), &config);
        Ok(WebViewer {
            canvas,
            ctx,
            context,
        })
    }

    /// Replace the scene; the current one stays if the document is invalid
    pub fn load_scene(&mut self, json: &str) -> Result<(), JsValue> {
        self.context.load_scene_json(json).map_err(js_error)?;
        self.redraw()
    }

    /// Advance animations by `dt_ms` milliseconds and redraw
    pub fn tick(&mut self, dt_ms: f64) -> Result<(), JsValue> {
        self.clear();
        let mut drawer = CanvasDrawer {
            ctx: &self.ctx,
            height: self.canvas.height() as f64,
        };
        self.context
            .tick(dt_ms / 1000.0, &mut drawer)
            .map(|_| ())
            .map_err(js_error)
    }

    /// Returns true when the key moved the camera
    pub fn key_down(&mut self, code: u32) -> Result<bool, JsValue> {
        let Some(command) = command_for_key_code(code) else {
            return Ok(false);
        };
        self.clear();
        let mut drawer = CanvasDrawer {
            ctx: &self.ctx,
            height: self.canvas.height() as f64,
        };
        self.context
            .navigate(command, &mut drawer)
            .map_err(js_error)?;
        Ok(true)
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), JsValue> {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
        self.context
            .set_viewport(Viewport::new(width as f64, height as f64));
        self.redraw()
    }

    fn redraw(&mut self) -> Result<(), JsValue> {
        self.clear();
        let mut drawer = CanvasDrawer {
            ctx: &self.ctx,
            height: self.canvas.height() as f64,
        };
        self.context.render(&mut drawer).map(|_| ()).map_err(js_error)
    }

    fn clear(&self) {
        let (w, h) = (self.canvas.width() as f64, self.canvas.height() as f64);
        self.ctx.clear_rect(0.0, 0.0, w, h);
        self.ctx.set_stroke_style(&JsValue::from_str("black"));
        self.ctx.set_fill_style(&JsValue::from_str("red"));
    }
}

#[wasm_bindgen(start)]
pub fn main() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    Ok(())
}
