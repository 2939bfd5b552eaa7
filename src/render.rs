use crate::scene::{ObjectHandle, Stage};
use crate::shader::{sphere_uv, SurfacePoint, SurfaceShader};
use crate::pick::intersect_sphere;
use crossterm::{
    cursor,
    event::{
        DisableMouseCapture, EnableMouseCapture, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen,
    },
};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum RenderMode {
    /// Upper-half block, two pixels per cell.
    #[default]
    HalfBlock,
    /// 2×4 dots per cell.
    Braille,
}

impl RenderMode {
    /// Canvas pixels per terminal cell, (w, h).
    pub(crate) fn cell_pixels(self) -> (u32, u32) {
        match self {
            Self::HalfBlock => (1, 2),
            Self::Braille => (2, 4),
        }
    }

    pub(crate) fn toggled(self) -> Self {
        match self {
            Self::HalfBlock => Self::Braille,
            Self::Braille => Self::HalfBlock,
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            Self::HalfBlock => "halfblock",
            Self::Braille => "braille",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Cell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

pub(crate) struct CellBuffer {
    pub(crate) w: u16,
    pub(crate) h: u16,
    pub(crate) cells: Vec<Cell>,
}

impl CellBuffer {
    pub(crate) fn new(w: u16, h: u16) -> Self {
        Self {
            w,
            h,
            cells: vec![Cell::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
    pub(crate) fn set(&mut self, x: u16, y: u16, c: Cell) {
        if x < self.w && y < self.h {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }
    pub(crate) fn clear(&mut self, bg: Color) {
        for c in &mut self.cells {
            c.ch = ' ';
            c.fg = Color::White;
            c.bg = bg;
        }
    }
}

/// Alpha is coverage: 255 where a sphere was drawn, 0 for bare background.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Pixel {
    pub(crate) r: u8,
    pub(crate) g: u8,
    pub(crate) b: u8,
    pub(crate) a: u8,
}

impl Pixel {
    pub(crate) fn from_rgb(c: Vec3, covered: bool) -> Self {
        let to8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0 + 0.5) as u8;
        Self {
            r: to8(c.x),
            g: to8(c.y),
            b: to8(c.z),
            a: if covered { 255 } else { 0 },
        }
    }

    fn color(self) -> Color {
        Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

/// Terminal colour of the scene background, rounded the same way as
/// rendered pixels.
pub(crate) fn background_color(bg: Vec3) -> Color {
    Pixel::from_rgb(bg, false).color()
}

pub(crate) struct PixelCanvas {
    pub(crate) w: u32,
    pub(crate) h: u32,
    pub(crate) px: Vec<Pixel>,
}

impl PixelCanvas {
    pub(crate) fn new(w: u32, h: u32) -> Self {
        Self {
            w,
            h,
            px: vec![Pixel::default(); (w as usize) * (h as usize)],
        }
    }
    pub(crate) fn idx(&self, x: u32, y: u32) -> usize {
        (y as usize) * (self.w as usize) + (x as usize)
    }
}

pub(crate) struct Terminal {
    pub(crate) out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) hud_rows: u16,
    pub(crate) mode: RenderMode,
    pub(crate) prev: CellBuffer,
    pub(crate) cur: CellBuffer,
    pub(crate) canvas: PixelCanvas,
    enhanced_keys: bool,
}

impl Terminal {
    pub(crate) fn begin(mode: RenderMode, hud_rows: u16) -> anyhow::Result<Self> {
        let mut out = io::stdout();
        execute!(
            out,
            EnterAlternateScreen,
            cursor::Hide,
            DisableLineWrap,
            EnableMouseCapture,
            terminal::Clear(ClearType::All)
        )?;
        terminal::enable_raw_mode()?;

        // Bare Shift/Alt presses are only reported with the enhanced protocol.
        let enhanced_keys = terminal::supports_keyboard_enhancement().unwrap_or(false);
        if enhanced_keys {
            queue!(
                out,
                PushKeyboardEnhancementFlags(
                    KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                        | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
                        | KeyboardEnhancementFlags::REPORT_ALL_KEYS_AS_ESCAPE_CODES
                )
            )?;
            out.flush()?;
        }
        log::info!("keyboard enhancement: {enhanced_keys}");

        let (cols, rows) = terminal::size()?;
        let mut term = Self {
            out,
            cols,
            rows,
            hud_rows,
            mode,
            prev: CellBuffer::new(cols, rows),
            cur: CellBuffer::new(cols, rows),
            canvas: PixelCanvas::new(0, 0),
            enhanced_keys,
        };
        term.alloc_canvas();
        Ok(term)
    }

    pub(crate) fn end(&mut self) -> anyhow::Result<()> {
        if self.enhanced_keys {
            queue!(self.out, PopKeyboardEnhancementFlags)?;
        }
        queue!(
            self.out,
            BeginSynchronizedUpdate,
            ResetColor,
            Clear(ClearType::All),
            cursor::Show,
            EnableLineWrap,
            DisableMouseCapture,
            EndSynchronizedUpdate,
            LeaveAlternateScreen
        )?;
        self.out.flush()?;
        terminal::disable_raw_mode()?;
        Ok(())
    }

    /// Rows left for the scene once the HUD is placed.
    pub(crate) fn scene_rows(&self) -> u16 {
        self.rows.saturating_sub(self.hud_rows)
    }

    fn alloc_canvas(&mut self) {
        let (sw, sh) = self.mode.cell_pixels();
        self.canvas = PixelCanvas::new(self.cols as u32 * sw, self.scene_rows() as u32 * sh);
    }

    pub(crate) fn set_mode(&mut self, mode: RenderMode) {
        self.mode = mode;
        self.alloc_canvas();
    }

    pub(crate) fn set_hud_rows(&mut self, hud_rows: u16) {
        self.hud_rows = hud_rows;
        self.alloc_canvas();
    }

    pub(crate) fn resize_if_needed(&mut self) -> anyhow::Result<bool> {
        let (c, r) = terminal::size()?;
        if c == self.cols && r == self.rows {
            return Ok(false);
        }
        self.cols = c;
        self.rows = r;
        self.prev = CellBuffer::new(c, r);
        self.cur = CellBuffer::new(c, r);
        self.alloc_canvas();
        Ok(true)
    }

    pub(crate) fn present(&mut self, diff_only: bool) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if diff_only && c == self.prev.cells[i] {
                    continue;
                }

                queue!(self.out, cursor::MoveTo(x, y))?;

                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }

                queue!(self.out, Print(c.ch))?;
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        Ok(())
    }
}

/* -----------------------------
   Canvas -> cells
------------------------------ */

fn braille_bit(dx: u32, dy: u32) -> u8 {
    // Dot mapping:
    // (0,0)=1 (0,1)=2 (0,2)=4 (0,3)=64
    // (1,0)=8 (1,1)=16 (1,2)=32 (1,3)=128
    match (dx, dy) {
        (0, 0) => 0x01,
        (0, 1) => 0x02,
        (0, 2) => 0x04,
        (0, 3) => 0x40,
        (1, 0) => 0x08,
        (1, 1) => 0x10,
        (1, 2) => 0x20,
        (1, 3) => 0x80,
        _ => 0x00,
    }
}

/// 2×4 pixels per cell; covered pixels become dots in their average colour.
pub(crate) fn canvas_to_braille(canvas: &PixelCanvas, out: &mut CellBuffer, rows: u16, bg: Color) {
    let cols = out.w as u32;

    for cy in 0..rows as u32 {
        for cx in 0..cols {
            let px0 = cx * 2;
            let py0 = cy * 4;

            let mut mask: u8 = 0;
            let mut sum_r: u32 = 0;
            let mut sum_g: u32 = 0;
            let mut sum_b: u32 = 0;
            let mut ink_count: u32 = 0;

            for dy in 0..4 {
                for dx in 0..2 {
                    let x = px0 + dx;
                    let y = py0 + dy;
                    if x >= canvas.w || y >= canvas.h {
                        continue;
                    }
                    let p = canvas.px[canvas.idx(x, y)];
                    if p.a >= 32 {
                        mask |= braille_bit(dx, dy);
                        sum_r += p.r as u32;
                        sum_g += p.g as u32;
                        sum_b += p.b as u32;
                        ink_count += 1;
                    }
                }
            }

            let ch = char::from_u32(0x2800 + (mask as u32)).unwrap_or(' ');

            let fg = if ink_count > 0 {
                Color::Rgb {
                    r: (sum_r / ink_count) as u8,
                    g: (sum_g / ink_count) as u8,
                    b: (sum_b / ink_count) as u8,
                }
            } else {
                bg
            };

            out.set(cx as u16, cy as u16, Cell { ch, fg, bg });
        }
    }
}

/// 1×2 pixels per cell: foreground is the top pixel, background the bottom.
pub(crate) fn canvas_to_halfblocks(canvas: &PixelCanvas, out: &mut CellBuffer, rows: u16) {
    for cy in 0..rows as u32 {
        for cx in 0..out.w as u32 {
            let (top, bottom) = (cy * 2, cy * 2 + 1);
            if cx >= canvas.w || bottom >= canvas.h {
                continue;
            }
            let fg = canvas.px[canvas.idx(cx, top)].color();
            let bg = canvas.px[canvas.idx(cx, bottom)].color();
            out.set(cx as u16, cy as u16, Cell { ch: '▀', fg, bg });
        }
    }
}

/* -----------------------------
   Scene ray casting
------------------------------ */

/// Casts one ray per canvas pixel and composites the transparent spheres
/// back to front over the background.
pub(crate) fn draw_scene(canvas: &mut PixelCanvas, stage: &Stage, shader: &SurfaceShader) {
    if canvas.w == 0 || canvas.h == 0 {
        return;
    }
    let scene = &stage.scene;
    let aspect = canvas.w as f32 / canvas.h as f32;
    let rays = stage.camera.ray_caster(aspect);
    let view_rot = stage.camera.view_rotation();
    let mut hits: Vec<(f32, ObjectHandle)> = Vec::with_capacity(scene.len());

    for y in 0..canvas.h {
        for x in 0..canvas.w {
            let ndc = Vec2::new(
                (x as f32 + 0.5) / canvas.w as f32 * 2.0 - 1.0,
                1.0 - (y as f32 + 0.5) / canvas.h as f32 * 2.0,
            );
            let ray = rays.ray(ndc);

            hits.clear();
            for (h, o) in scene.iter() {
                if let Some(t) = intersect_sphere(&ray, o.transform.position, o.world_radius()) {
                    hits.push((t, h));
                }
            }
            hits.sort_by(|a, b| b.0.total_cmp(&a.0));

            let mut color = scene.background;
            for &(t, h) in &hits {
                let Some(o) = scene.get(h) else {
                    continue;
                };
                let world = ray.at(t);
                let local = o.transform.to_local(world);
                let point = SurfacePoint {
                    position: local,
                    normal: (view_rot * (world - o.transform.position)).normalize(),
                    uv: sphere_uv(local.normalize()),
                };
                let frag = shader.shade(&o.material, &point);
                color = color.lerp(frag.color.clamp(Vec3::ZERO, Vec3::ONE), frag.alpha);
            }

            let i = canvas.idx(x, y);
            canvas.px[i] = Pixel::from_rgb(color, !hits.is_empty());
        }
    }
}

/* -----------------------------
   Text
------------------------------ */

pub(crate) fn draw_text(buf: &mut CellBuffer, x: u16, y: u16, s: &str, fg: Color, bg: Color) {
    for (i, ch) in s.chars().enumerate() {
        let xx = x.saturating_add(i as u16);
        if xx >= buf.w || y >= buf.h {
            break;
        }
        buf.set(xx, y, Cell { ch, fg, bg });
    }
}
