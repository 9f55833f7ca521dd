use anyhow::{Context, Result, bail};
use finchgate_core::{Colour, CueColours};
use finchgate_timing::{SystemTimer, Timer};
use std::time::Duration;
use tiny_skia::{Color, Paint, Pixmap, Rect, Transform};
use tracing::debug;

/// Drawn for colour names the renderer cannot resolve.
const FALLBACK_RGB: [u8; 3] = [0x80, 0x80, 0x80];

/// What the screen should show.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CueScene {
    /// Left/right half colours; black until the first cue is published.
    pub cue: Option<CueColours>,
    /// Obstacle preview band, drawn across the middle third of each half.
    pub preview: Option<CueColours>,
}

pub struct FrameStats {
    pub draw: Duration,
    pub copy: Duration,
    pub total: Duration,
    /// `false` when the scene was unchanged and the frame left as is.
    pub redrawn: bool,
}

/// Paints the two-colour cue into an offscreen pixmap and copies it into the
/// window's RGBA frame buffer.
pub struct CueRenderer {
    width: u32,
    height: u32,
    canvas: Pixmap,
    last: Option<CueScene>,
    timer: SystemTimer,
}

impl CueRenderer {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Ok(Self {
            width,
            height,
            canvas: blank_canvas(width, height)?,
            last: None,
            timer: SystemTimer::new(),
        })
    }

    pub fn resize(&mut self, new_width: u32, new_height: u32) -> Result<()> {
        self.width = new_width;
        self.height = new_height;
        self.canvas = blank_canvas(new_width, new_height)?;
        self.last = None;
        Ok(())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn canvas(&self) -> &Pixmap {
        &self.canvas
    }

    pub fn render_frame(&mut self, scene: &CueScene, frame_buffer: &mut [u8]) -> Result<FrameStats> {
        let t_total = self.timer.now();
        if frame_buffer.len() != self.canvas.data().len() {
            bail!(
                "frame buffer holds {} bytes, canvas is {}x{}",
                frame_buffer.len(),
                self.width,
                self.height
            );
        }
        if self.last.as_ref() == Some(scene) {
            return Ok(FrameStats {
                draw: Duration::ZERO,
                copy: Duration::ZERO,
                total: self.timer.elapsed(t_total),
                redrawn: false,
            });
        }

        let t = self.timer.now();
        self.draw(scene);
        let draw = self.timer.elapsed(t);

        let t = self.timer.now();
        frame_buffer.copy_from_slice(self.canvas.data());
        let copy = self.timer.elapsed(t);

        self.last = Some(scene.clone());
        Ok(FrameStats {
            draw,
            copy,
            total: self.timer.elapsed(t_total),
            redrawn: true,
        })
    }

    fn draw(&mut self, scene: &CueScene) {
        let Some(cue) = &scene.cue else {
            self.canvas.fill(Color::BLACK);
            return;
        };
        let (w, h) = (self.width as f32, self.height as f32);
        let half = (self.width / 2) as f32;

        self.fill_rect(0.0, 0.0, half, h, &cue.left);
        self.fill_rect(half, 0.0, w - half, h, &cue.right);

        if let Some(preview) = &scene.preview {
            let top = (self.height / 3) as f32;
            let bottom = (2 * self.height / 3) as f32;
            self.fill_rect(0.0, top, half, bottom - top, &preview.left);
            self.fill_rect(half, top, w - half, bottom - top, &preview.right);
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, colour: &Colour) {
        // zero-sized on degenerate windows
        let Some(rect) = Rect::from_xywh(x, y, w, h) else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(resolve(colour));
        paint.anti_alias = false;
        self.canvas
            .fill_rect(rect, &paint, Transform::identity(), None);
    }
}

fn resolve(colour: &Colour) -> Color {
    let [r, g, b] = colour.rgb().unwrap_or_else(|| {
        debug!("Unknown colour {colour:?}, drawing grey");
        FALLBACK_RGB
    });
    Color::from_rgba8(r, g, b, 255)
}

fn blank_canvas(width: u32, height: u32) -> Result<Pixmap> {
    let mut canvas = Pixmap::new(width, height)
        .with_context(|| format!("cannot allocate a {width}x{height} canvas"))?;
    canvas.fill(Color::BLACK);
    Ok(canvas)
}
