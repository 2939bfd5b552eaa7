use crate::config::Settings;
use crate::hover::HoverFeedback;
use crate::input::{collect_events_nonblocking, translate, Command, HostEvent, ModifierTracker};
use crate::interaction::{Effect, InputEvent, InteractionMachine, InteractionState};
use crate::motion::MotionSimulator;
use crate::noise_field::NoiseField;
use crate::render::{
    background_color, canvas_to_braille, canvas_to_halfblocks, draw_scene, draw_text, RenderMode,
    Terminal,
};
use crate::scene::{Scene, Stage, Viewport};
use crate::shader::{Lighting, SurfaceShader};
use crossterm::style::Color;
use log::{debug, info};
use std::time::{Duration, Instant};

const HUD_FG: Color = Color::Rgb {
    r: 235,
    g: 228,
    b: 228,
};
const HUD_BG: Color = Color::Rgb {
    r: 48,
    g: 44,
    b: 44,
};

pub(crate) struct App {
    settings: Settings,
    stage: Stage,
    machine: InteractionMachine,
    motion: MotionSimulator,
    hover: HoverFeedback,
    shader: SurfaceShader,
    term: Terminal,
    tracker: ModifierTracker,
    should_quit: bool,
    fps: f32,
}

impl App {
    fn init(settings: Settings) -> anyhow::Result<Self> {
        let scene = Scene::spheres();
        let motion = MotionSimulator::new(settings.motion_tuning(), scene.len());
        let hover = HoverFeedback::new(settings.hover_tuning(), scene.len());
        let shader = SurfaceShader::new(
            NoiseField::new(settings.noise_seed),
            Lighting::default(),
            settings.grain,
        );

        let term = Terminal::begin(settings.render_mode, hud_rows(settings.show_hud))?;
        let viewport = viewport_for(&term);
        info!(
            "terminal {}x{}, canvas {}x{} ({:?})",
            term.cols, term.rows, term.canvas.w, term.canvas.h, term.mode
        );

        Ok(Self {
            stage: Stage::new(scene, viewport),
            machine: InteractionMachine::new(),
            motion,
            hover,
            shader,
            term,
            tracker: ModifierTracker::new(),
            should_quit: false,
            fps: settings.fps_cap as f32,
            settings,
        })
    }

    fn run(&mut self) -> anyhow::Result<()> {
        let frame_dt = Duration::from_secs_f32(1.0 / self.settings.fps_cap as f32);
        let mut last_frame = Instant::now();

        while !self.should_quit {
            let frame_start = Instant::now();
            let mut resized = self.term.resize_if_needed()?;
            if resized {
                self.sync_viewport();
            }

            // input
            for ev in collect_events_nonblocking(frame_dt)? {
                for hev in translate(&ev, &mut self.tracker, &self.stage.viewport) {
                    resized |= self.handle(hev)?;
                }
                if self.should_quit {
                    break;
                }
            }

            // one simulation step per frame
            self.stage.camera.update();
            self.motion.tick(&mut self.stage.scene);
            self.hover.tick(
                self.machine.hovered(),
                self.machine.is_dragging(),
                &mut self.stage.scene,
            );

            self.render_frame(!resized)?;

            let now = Instant::now();
            let dt = now.saturating_duration_since(last_frame).as_secs_f32();
            last_frame = now;
            if dt > 0.0 {
                self.fps += (1.0 / dt - self.fps) * 0.1;
            }

            // frame cap
            spin_sleep(frame_dt, frame_start);
        }
        Ok(())
    }

    /// Returns true when the canvas was reallocated.
    fn handle(&mut self, ev: HostEvent) -> anyhow::Result<bool> {
        match ev {
            HostEvent::Input(input) => {
                let remeasure =
                    dispatch_input(input, &mut self.machine, &mut self.stage, &mut self.motion);
                if remeasure && self.term.resize_if_needed()? {
                    self.sync_viewport();
                    return Ok(true);
                }
                Ok(false)
            }
            HostEvent::Zoom(notches) => {
                if self.stage.orbit_enabled {
                    self.stage.camera.zoom(notches);
                }
                Ok(false)
            }
            HostEvent::Command(cmd) => Ok(self.command(cmd)),
        }
    }

    fn command(&mut self, cmd: Command) -> bool {
        debug!("command {cmd:?}");
        match cmd {
            Command::Quit => self.should_quit = true,
            Command::ToggleInertia => {
                self.settings.inertia = !self.settings.inertia;
                self.motion.set_inertia(self.settings.inertia);
            }
            Command::ToggleGrain => {
                self.settings.grain = !self.settings.grain;
                self.shader.set_grain(self.settings.grain);
            }
            Command::ToggleRenderMode => {
                self.settings.render_mode = self.term.mode.toggled();
                self.term.set_mode(self.settings.render_mode);
                self.sync_viewport();
                return true;
            }
            Command::ToggleHud => {
                self.settings.show_hud = !self.settings.show_hud;
                self.term.set_hud_rows(hud_rows(self.settings.show_hud));
                self.sync_viewport();
                return true;
            }
        }
        false
    }

    fn sync_viewport(&mut self) {
        self.stage.viewport = viewport_for(&self.term);
        debug!(
            "viewport {}x{} px",
            self.stage.viewport.width, self.stage.viewport.height
        );
    }

    fn render_frame(&mut self, diff_only: bool) -> anyhow::Result<()> {
        let bg = background_color(self.stage.scene.background);
        self.term.cur.clear(bg);

        draw_scene(&mut self.term.canvas, &self.stage, &self.shader);
        let rows = self.term.scene_rows();
        match self.term.mode {
            RenderMode::HalfBlock => canvas_to_halfblocks(&self.term.canvas, &mut self.term.cur, rows),
            RenderMode::Braille => canvas_to_braille(&self.term.canvas, &mut self.term.cur, rows, bg),
        }

        if self.settings.show_hud {
            self.draw_hud(rows);
        }

        self.term.present(diff_only)
    }

    fn draw_hud(&mut self, row: u16) {
        let cursor = self.stage.cursor;
        let mode = self
            .machine
            .session()
            .map(|s| format!("{:?}", s.mode).to_lowercase())
            .unwrap_or_else(|| "-".to_string());
        let on_off = |b: bool| if b { "on" } else { "off" };

        let target = match self.machine.state() {
            InteractionState::Dragging(s) => Some(s.object),
            InteractionState::Hovering(h) => Some(h),
            InteractionState::Idle => None,
        };
        let target = target
            .and_then(|h| {
                let obj = self.stage.scene.get(h)?;
                let v = self.motion.velocity(h)?;
                let speed = if v.is_at_rest() {
                    "rest".to_string()
                } else {
                    format!("v{:.3}", v.magnitude())
                };
                Some(format!(
                    "{} {} glow{:>3.0}%",
                    obj.name,
                    speed,
                    self.hover.intensity(h) * 100.0
                ))
            })
            .unwrap_or_default();

        let line = format!(
            " {} {:<8} {:<22} mode {:<6} inertia {:<3} grain {:<3} {:<9} {:>3.0} fps  drag spin  shift move  alt depth  wheel zoom  [i]nertia [g]rain [b]raille [h]ud [q]uit",
            cursor.glyph(),
            cursor.label(),
            target,
            mode,
            on_off(self.motion.tuning().inertia),
            on_off(self.shader.grain_enabled()),
            self.term.mode.label(),
            self.fps,
        );
        for x in 0..self.term.cols {
            draw_text(&mut self.term.cur, x, row, " ", HUD_FG, HUD_BG);
        }
        draw_text(&mut self.term.cur, 0, row, &line, HUD_FG, HUD_BG);
    }
}

/// Runs one pointer or modifier event through the interaction machine and
/// applies the effects it asks for. Returns true when the terminal should
/// be measured again.
pub(crate) fn dispatch_input(
    input: InputEvent,
    machine: &mut InteractionMachine,
    stage: &mut Stage,
    motion: &mut MotionSimulator,
) -> bool {
    let mut remeasure = false;
    for fx in machine.handle_event(input, &*stage) {
        match fx {
            Effect::Cursor(c) => stage.cursor = c,
            Effect::OrbitEnabled(on) => {
                stage.orbit_enabled = on;
                if !on {
                    stage.camera.end_drag();
                }
            }
            Effect::Impulse {
                object,
                mode,
                delta,
            } => motion.apply_impulse(object, mode, delta),
            Effect::Resize { .. } => remeasure = true,
        }
    }
    forward_to_orbit(input, stage);
    remeasure
}

/// Pointer input drives the orbit camera only while no object drag owns it.
fn forward_to_orbit(input: InputEvent, stage: &mut Stage) {
    let cam = &mut stage.camera;
    match input {
        InputEvent::PointerUp { .. } => cam.end_drag(),
        _ if !stage.orbit_enabled => {}
        InputEvent::PointerDown { pos, .. } => cam.begin_drag(pos),
        InputEvent::PointerMove { pos, .. } => cam.drag_to(pos, stage.viewport.height),
        _ => {}
    }
}

fn hud_rows(show: bool) -> u16 {
    u16::from(show)
}

fn viewport_for(term: &Terminal) -> Viewport {
    let (cw, ch) = term.mode.cell_pixels();
    Viewport::new(term.cols, term.scene_rows(), cw, ch)
}

pub(crate) fn run(settings: Settings) -> anyhow::Result<()> {
    info!("starting with {settings:?}");
    let mut app = App::init(settings)?;
    let result = app.run();
    // restore the terminal before surfacing any loop error
    let restored = app.term.end();
    info!("shutdown");
    result?;
    restored
}

/* -----------------------------
   Frame pacing helper
------------------------------ */

fn spin_sleep(target: Duration, start: Instant) {
    let end = start + target;
    loop {
        let t = Instant::now();
        if t >= end {
            break;
        }
        let left = end - t;
        if left > Duration::from_millis(2) {
            std::thread::sleep(Duration::from_millis(1));
        } else {
            std::hint::spin_loop();
        }
    }
}
