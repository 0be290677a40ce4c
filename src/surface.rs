//! Drawing surface - pixel canvas and terminal attachment.
//!
//! The [`Canvas`] is a flat grid of RGBA pixels sized to the host viewport
//! (one terminal column per pixel horizontally, two pixels per row
//! vertically for half-block rendering). The [`SurfaceManager`] owns the
//! canvas together with the overlay lifecycle: attach on demand, keep the
//! pixel dimensions equal to the viewport while attached, detach on
//! teardown. Both attach and detach are idempotent.

use std::io;

use tracing::debug;

use crate::renderer::OverlayRenderer;
use crate::types::Rgba;

/// Viewport dimensions when the terminal cannot be queried (not a tty).
const FALLBACK_COLS: u16 = 80;
const FALLBACK_ROWS: u16 = 24;

// =============================================================================
// Canvas
// =============================================================================

/// A 2D buffer of RGBA pixels.
///
/// Uses flat storage with row-major indexing: `index = y * width + x`.
/// Transparent pixels are empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: u16,
    height: u16,
    pixels: Vec<Rgba>,
}

impl Canvas {
    /// Create a new canvas with every pixel empty.
    pub fn new(width: u16, height: u16) -> Self {
        let size = width as usize * height as usize;
        Self {
            width,
            height,
            pixels: vec![Rgba::TRANSPARENT; size],
        }
    }

    #[inline]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u16 {
        self.height
    }

    #[inline]
    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    #[inline]
    pub fn in_bounds(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height
    }

    /// Get a pixel (None if out of bounds).
    #[inline]
    pub fn get(&self, x: u16, y: u16) -> Option<Rgba> {
        if self.in_bounds(x, y) {
            Some(self.pixels[self.index(x, y)])
        } else {
            None
        }
    }

    /// Set a pixel. Out-of-bounds writes are dropped.
    #[inline]
    pub fn set(&mut self, x: u16, y: u16, color: Rgba) {
        if self.in_bounds(x, y) {
            let idx = self.index(x, y);
            self.pixels[idx] = color;
        }
    }

    /// Clear every pixel.
    pub fn clear(&mut self) {
        self.pixels.fill(Rgba::TRANSPARENT);
    }

    /// Resize the canvas (clears content).
    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        let size = width as usize * height as usize;
        self.pixels.clear();
        self.pixels.resize(size, Rgba::TRANSPARENT);
    }

    /// Fill a rotated rectangle centered at `(cx, cy)`.
    ///
    /// `degrees` may be any angle, wrapped or not. Each pixel whose center
    /// falls inside the rotated rectangle is painted; writes outside the
    /// canvas are clipped.
    pub fn fill_rect_rotated(&mut self, cx: f32, cy: f32, w: f32, h: f32, degrees: f32, color: Rgba) {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let half_w = w * 0.5;
        let half_h = h * 0.5;

        // Axis-aligned bounding box of the rotated rectangle, clipped.
        let ext_x = half_w * cos.abs() + half_h * sin.abs();
        let ext_y = half_w * sin.abs() + half_h * cos.abs();
        let x0 = ((cx - ext_x).floor() as i32).max(0);
        let y0 = ((cy - ext_y).floor() as i32).max(0);
        let x1 = ((cx + ext_x).ceil() as i32).min(self.width as i32 - 1);
        let y1 = ((cy + ext_y).ceil() as i32).min(self.height as i32 - 1);

        for py in y0..=y1 {
            for px in x0..=x1 {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                // Rotate the pixel center back into rectangle space.
                let u = dx * cos + dy * sin;
                let v = -dx * sin + dy * cos;
                if u.abs() <= half_w && v.abs() <= half_h {
                    self.set(px as u16, py as u16, color);
                }
            }
        }
    }
}

// =============================================================================
// SurfaceManager
// =============================================================================

/// Owns the drawing surface and its attachment to the terminal.
///
/// At most one manager is live per engine run, and the render task holds it
/// exclusively, so exactly one overlay exists system-wide at any time.
pub struct SurfaceManager {
    canvas: Canvas,
    renderer: OverlayRenderer,
    attached: bool,
}

impl SurfaceManager {
    pub fn new() -> Self {
        Self {
            canvas: Canvas::new(0, 0),
            renderer: OverlayRenderer::new(),
            attached: false,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Attach the overlay, sizing the canvas to the viewport.
    ///
    /// Reuses the existing surface when already attached.
    pub fn acquire(&mut self) -> io::Result<()> {
        if self.attached {
            return Ok(());
        }
        let (width, height) = viewport_pixels();
        self.canvas.resize(width, height);
        self.renderer.enter_overlay()?;
        self.attached = true;
        debug!(width, height, "surface attached");
        Ok(())
    }

    /// Detach the overlay. No-op when not attached; safe to call twice.
    pub fn release(&mut self) {
        if !self.attached {
            return;
        }
        if let Err(err) = self.renderer.exit_overlay() {
            debug!(?err, "overlay exit failed");
        }
        self.attached = false;
        debug!("surface detached");
    }

    /// Keep the canvas dimensions equal to the viewport.
    ///
    /// Called once per frame while attached; returns the current pixel
    /// dimensions. Content is not repositioned on resize - off-surface
    /// particles are culled against the new bounds on the same tick.
    pub fn sync_size(&mut self) -> (u16, u16) {
        let (width, height) = viewport_pixels();
        if self.attached && (width != self.canvas.width() || height != self.canvas.height()) {
            debug!(width, height, "viewport resized");
            self.canvas.resize(width, height);
            if let Err(err) = self.renderer.clear_screen() {
                debug!(?err, "post-resize clear failed");
            }
        }
        (width, height)
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    /// Present the canvas to the terminal. No-op when detached.
    pub fn present(&mut self) -> io::Result<()> {
        if !self.attached {
            return Ok(());
        }
        self.renderer.render(&self.canvas)
    }
}

impl Default for SurfaceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SurfaceManager {
    fn drop(&mut self) {
        self.release();
    }
}

/// Current viewport in pixels: columns × (rows * 2) half-block pixels.
fn viewport_pixels() -> (u16, u16) {
    let (cols, rows) = crossterm::terminal::size().unwrap_or((FALLBACK_COLS, FALLBACK_ROWS));
    (cols, rows.saturating_mul(2))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Rgba = Rgba::rgb(255, 0, 0);

    #[test]
    fn test_canvas_get_set() {
        let mut canvas = Canvas::new(10, 10);
        assert_eq!(canvas.get(3, 4), Some(Rgba::TRANSPARENT));
        canvas.set(3, 4, RED);
        assert_eq!(canvas.get(3, 4), Some(RED));
        assert_eq!(canvas.get(10, 4), None);
        // Out-of-bounds write is dropped, not panicking.
        canvas.set(10, 10, RED);
    }

    #[test]
    fn test_canvas_clear() {
        let mut canvas = Canvas::new(4, 4);
        canvas.set(1, 1, RED);
        canvas.clear();
        assert_eq!(canvas.get(1, 1), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_canvas_resize_clears() {
        let mut canvas = Canvas::new(4, 4);
        canvas.set(1, 1, RED);
        canvas.resize(8, 6);
        assert_eq!(canvas.width(), 8);
        assert_eq!(canvas.height(), 6);
        assert_eq!(canvas.get(1, 1), Some(Rgba::TRANSPARENT));
    }

    fn painted(canvas: &Canvas) -> usize {
        let mut n = 0;
        for y in 0..canvas.height() {
            for x in 0..canvas.width() {
                if canvas.get(x, y) != Some(Rgba::TRANSPARENT) {
                    n += 1;
                }
            }
        }
        n
    }

    #[test]
    fn test_fill_rect_axis_aligned() {
        let mut canvas = Canvas::new(10, 10);
        // 4x2 rect centered at (5, 5): pixel centers with |dx| <= 2, |dy| <= 1.
        canvas.fill_rect_rotated(5.0, 5.0, 4.0, 2.0, 0.0, RED);
        assert_eq!(painted(&canvas), 8);
        assert_eq!(canvas.get(4, 4), Some(RED));
        assert_eq!(canvas.get(6, 5), Some(RED));
        assert_eq!(canvas.get(2, 5), Some(Rgba::TRANSPARENT));
        assert_eq!(canvas.get(5, 3), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_fill_rect_quarter_turn_swaps_axes() {
        let mut canvas = Canvas::new(10, 10);
        canvas.fill_rect_rotated(5.0, 5.0, 4.0, 2.0, 90.0, RED);
        // Same footprint as the 2x4 axis-aligned rect.
        assert_eq!(painted(&canvas), 8);
        assert_eq!(canvas.get(4, 3), Some(RED));
        assert_eq!(canvas.get(5, 6), Some(RED));
        assert_eq!(canvas.get(3, 5), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_fill_rect_full_turn_matches_zero() {
        let mut a = Canvas::new(12, 12);
        let mut b = Canvas::new(12, 12);
        // Center off the pixel grid so no pixel sits exactly on the edge.
        a.fill_rect_rotated(6.3, 6.3, 5.0, 3.0, 0.0, RED);
        b.fill_rect_rotated(6.3, 6.3, 5.0, 3.0, 720.0, RED);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fill_rect_clips_to_bounds() {
        let mut canvas = Canvas::new(6, 6);
        // Mostly above the top edge.
        canvas.fill_rect_rotated(3.0, -1.0, 4.0, 4.0, 30.0, RED);
        // Nothing panicked and only in-bounds pixels were touched.
        assert!(painted(&canvas) > 0);
        // Entirely outside.
        let mut empty = Canvas::new(6, 6);
        empty.fill_rect_rotated(30.0, 30.0, 4.0, 4.0, 0.0, RED);
        assert_eq!(painted(&empty), 0);
    }

    #[test]
    fn test_manager_release_without_acquire() {
        let mut surface = SurfaceManager::new();
        assert!(!surface.is_attached());
        surface.release();
        surface.release();
        assert!(!surface.is_attached());
    }

    #[test]
    fn test_manager_present_detached_is_noop() {
        let mut surface = SurfaceManager::new();
        assert!(surface.present().is_ok());
    }
}
