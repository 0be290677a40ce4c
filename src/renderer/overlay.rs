//! Half-block overlay presenter.
//!
//! Presents the pixel canvas on the terminal, two vertically stacked pixels
//! per cell: `▀` with foreground = top pixel and background = bottom pixel
//! (`▄` when only the bottom pixel is set, so empty halves keep the
//! terminal's default background).
//!
//! # Algorithm
//!
//! 1. Wrap the frame in synchronized output (begin_sync/end_sync)
//! 2. For each cell, compare its pixel pair to the previously presented
//!    frame and skip unchanged cells
//! 3. Emit cursor moves and SGR colors only when they differ from the
//!    last emitted state
//! 4. Flush the accumulated bytes in one syscall and keep the frame for
//!    the next comparison

use std::io;

use super::ansi;
use super::output::OutputBuffer;
use crate::surface::Canvas;
use crate::types::Rgba;

// =============================================================================
// OverlayRenderer
// =============================================================================

/// Renders a canvas to the terminal overlay with frame-to-frame diffing.
pub struct OverlayRenderer {
    output: OutputBuffer,
    previous: Option<Canvas>,
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self {
            output: OutputBuffer::new(),
            previous: None,
        }
    }

    /// Enter the overlay: alternate screen, hidden cursor, cleared screen.
    pub fn enter_overlay(&mut self) -> io::Result<()> {
        ansi::enter_alt_screen(&mut self.output)?;
        ansi::cursor_hide(&mut self.output)?;
        ansi::clear_screen(&mut self.output)?;
        self.output.flush_stdout()?;
        self.invalidate();
        Ok(())
    }

    /// Leave the overlay, restoring colors and cursor.
    pub fn exit_overlay(&mut self) -> io::Result<()> {
        ansi::reset(&mut self.output)?;
        ansi::cursor_show(&mut self.output)?;
        ansi::exit_alt_screen(&mut self.output)?;
        self.output.flush_stdout()
    }

    /// Clear the terminal and forget the previous frame.
    ///
    /// Used after a viewport resize, where stale cells may linger outside
    /// the diffed region.
    pub fn clear_screen(&mut self) -> io::Result<()> {
        ansi::clear_screen(&mut self.output)?;
        self.output.flush_stdout()?;
        self.invalidate();
        Ok(())
    }

    /// Drop the previous frame; the next render is a full redraw.
    pub fn invalidate(&mut self) {
        self.previous = None;
    }

    /// Check if there is a previous frame to diff against.
    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Present a frame, outputting only changed cells.
    pub fn render(&mut self, canvas: &Canvas) -> io::Result<()> {
        ansi::begin_sync(&mut self.output)?;
        emit_frame(&mut self.output, canvas, self.previous.as_ref());
        ansi::end_sync(&mut self.output)?;
        self.output.flush_stdout()?;
        self.previous = Some(canvas.clone());
        Ok(())
    }
}

impl Default for OverlayRenderer {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Cell emission
// =============================================================================

/// Emit the changed cells of `canvas` into `out`.
///
/// Tracks last cursor position and last emitted colors so sequential cells
/// and color runs cost no extra escapes. When `previous` is absent the
/// screen is assumed freshly cleared, so blank cells are skipped too.
fn emit_frame(out: &mut OutputBuffer, canvas: &Canvas, previous: Option<&Canvas>) {
    let cols = canvas.width();
    let rows = canvas.height().div_ceil(2);
    let diff = previous.filter(|p| p.width() == canvas.width() && p.height() == canvas.height());

    let mut last_x: i32 = -2;
    let mut last_y: i32 = -1;
    let mut last_fg: Option<Rgba> = None;
    let mut last_bg: Option<Rgba> = None;

    for row in 0..rows {
        for col in 0..cols {
            let top = canvas.get(col, row * 2).unwrap_or(Rgba::TRANSPARENT);
            let bottom = canvas.get(col, row * 2 + 1).unwrap_or(Rgba::TRANSPARENT);

            match diff {
                Some(prev) => {
                    let prev_top = prev.get(col, row * 2).unwrap_or(Rgba::TRANSPARENT);
                    let prev_bottom = prev.get(col, row * 2 + 1).unwrap_or(Rgba::TRANSPARENT);
                    if prev_top == top && prev_bottom == bottom {
                        continue;
                    }
                }
                None => {
                    if top.is_transparent() && bottom.is_transparent() {
                        continue;
                    }
                }
            }

            let (glyph, cell_fg, cell_bg) = match (top.is_transparent(), bottom.is_transparent()) {
                (true, true) => (" ", Rgba::TRANSPARENT, Rgba::TRANSPARENT),
                (false, true) => ("▀", top, Rgba::TRANSPARENT),
                (true, false) => ("▄", bottom, Rgba::TRANSPARENT),
                (false, false) => ("▀", top, bottom),
            };

            // Cursor movement (only if not sequential)
            if row as i32 != last_y || col as i32 != last_x + 1 {
                ansi::cursor_to(out, col, row).ok();
            }
            if last_fg != Some(cell_fg) {
                ansi::fg(out, cell_fg).ok();
                last_fg = Some(cell_fg);
            }
            if last_bg != Some(cell_bg) {
                ansi::bg(out, cell_bg).ok();
                last_bg = Some(cell_bg);
            }
            out.write_str(glyph);

            last_x = col as i32;
            last_y = row as i32;
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
