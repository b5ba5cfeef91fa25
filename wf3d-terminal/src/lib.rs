/// Terminal-based ASCII wireframe viewer
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wf3d_core::{FrameStats, NavCommand, RenderContext, Scene, ViewerConfig, Viewport};

pub mod renderer;

pub use renderer::AsciiCanvas;

/// Rows kept free for the status line
const STATUS_ROWS: u16 = 1;

/// Map a key to a camera command: A/D strafe, W/S dolly, arrows yaw
pub fn command_for_key(code: KeyCode) -> Option<NavCommand> {
    match code {
        KeyCode::Char('a') | KeyCode::Char('A') => Some(NavCommand::StrafeLeft),
        KeyCode::Char('d') | KeyCode::Char('D') => Some(NavCommand::StrafeRight),
        KeyCode::Char('w') | KeyCode::Char('W') => Some(NavCommand::Forward),
        KeyCode::Char('s') | KeyCode::Char('S') => Some(NavCommand::Backward),
        KeyCode::Left => Some(NavCommand::YawLeft),
        KeyCode::Right => Some(NavCommand::YawRight),
        _ => None,
    }
}

/// Main application struct for terminal wireframe rendering
pub struct TerminalApp {
    context: RenderContext,
    canvas: AsciiCanvas,
    target_fps: u32,
    running: bool,
    last_frame: Instant,
    last_tick: Instant,
    frame_count: u32,
    fps: f32,
    stats: FrameStats,
    status: Option<String>,
}

impl TerminalApp {
    /// The surface follows the terminal size; the config supplies the rest
    pub fn new(scene: Scene, config: &ViewerConfig) -> io::Result<Self> {
        let (width, height) = terminal::size()?;
        let height = height.saturating_sub(STATUS_ROWS);
        let mut context = RenderContext::with_config(scene, config);
        context.set_viewport(Viewport::new(width as f64, height as f64));

        Ok(Self {
            context,
            canvas: AsciiCanvas::new(width as usize, height as usize),
            target_fps: config.target_fps.max(1),
            running: true,
            last_frame: Instant::now(),
            last_tick: Instant::now(),
            frame_count: 0,
            fps: 0.0,
            stats: FrameStats::default(),
            status: None,
        })
    }

    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    pub fn run(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> io::Result<()> {
        let target_frame_time = Duration::from_millis(1000 / self.target_fps as u64);

        while self.running {
            let frame_start = Instant::now();

            while event::poll(Duration::from_millis(0))? {
                self.handle_event(event::read()?);
            }

            let dt = self.last_tick.elapsed().as_secs_f64();
            self.last_tick = Instant::now();
            self.update(dt);
            self.render()?;

            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(KeyEvent { code, kind, .. }) if kind != KeyEventKind::Release => {
                self.handle_key(code)
            }
            Event::Resize(width, height) => self.resize(width, height),
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        if matches!(code, KeyCode::Char('q') | KeyCode::Esc) {
            self.running = false;
            return;
        }
        let Some(command) = command_for_key(code) else {
            return;
        };
        let camera = *self.context.camera();
        match camera.apply(&mut self.context.scene_mut().view, command) {
            Ok(()) => debug!(?command, "camera moved"),
            Err(err) => {
                warn!(?command, "{err}");
                self.status = Some(err.to_string());
            }
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        let height = height.saturating_sub(STATUS_ROWS);
        self.canvas.resize(width as usize, height as usize);
        self.context
            .set_viewport(Viewport::new(width as f64, height as f64));
    }

    /// Advance animations and rasterize the frame into the canvas
    fn update(&mut self, dt: f64) {
        self.canvas.clear();
        match self.context.tick(dt, &mut self.canvas) {
            Ok(stats) => {
                self.stats = stats;
                self.status = None;
            }
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    fn render(&mut self) -> io::Result<()> {
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.canvas.draw(&mut stdout)?;

        let line = match &self.status {
            Some(err) => format!("WF3D | error: {}", err),
            None => format!(
                "WF3D | FPS: {:.1} | drawn {} clipped {} | A/D=Strafe W/S=Move Arrows=Yaw Q=Quit",
                self.fps, self.stats.drawn, self.stats.clipped
            ),
        };
        let color = if self.status.is_some() {
            Color::Red
        } else {
            Color::Yellow
        };
        queue!(
            stdout,
            cursor::MoveTo(0, self.canvas.height() as u16),
            terminal::Clear(ClearType::CurrentLine),
            SetForegroundColor(color),
            Print(line),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(command_for_key(KeyCode::Char('a')), Some(NavCommand::StrafeLeft));
        assert_eq!(command_for_key(KeyCode::Char('D')), Some(NavCommand::StrafeRight));
        assert_eq!(command_for_key(KeyCode::Char('w')), Some(NavCommand::Forward));
        assert_eq!(command_for_key(KeyCode::Char('s')), Some(NavCommand::Backward));
        assert_eq!(command_for_key(KeyCode::Left), Some(NavCommand::YawLeft));
        assert_eq!(command_for_key(KeyCode::Right), Some(NavCommand::YawRight));
        assert_eq!(command_for_key(KeyCode::Up), None);
        assert_eq!(command_for_key(KeyCode::Char('q')), None);
    }

    #[test]
    fn test_canvas_as_line_drawer() {
        let mut context = RenderContext::new(Scene::house(), Viewport::new(80.0, 24.0));
        let mut canvas = AsciiCanvas::new(80, 24);
        let stats = context.tick(0.0, &mut canvas).unwrap();
        assert!(stats.drawn > 0);
        let marked = (0..24)
            .flat_map(|y| (0..80).map(move |x| (x, y)))
            .filter(|&(x, y)| canvas.cell(x, y) == Some('o'))
            .count();
        assert!(marked > 0);
    }
}
