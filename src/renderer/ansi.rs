//! ANSI escape sequences for terminal control.
//!
//! Only the sequences the confetti overlay emits:
//! - Cursor movement and visibility
//! - Screen clearing
//! - Alternate screen buffer (the overlay surface)
//! - TrueColor foreground/background
//! - Synchronized output for flicker-free frames

use crate::types::Rgba;
use std::io::Write;

// =============================================================================
// Cursor
// =============================================================================

/// Move cursor to absolute position (0-indexed input, 1-indexed sequence).
#[inline]
pub fn cursor_to<W: Write>(w: &mut W, x: u16, y: u16) -> std::io::Result<()> {
    write!(w, "\x1b[{};{}H", y + 1, x + 1)
}

/// Hide cursor.
#[inline]
pub fn cursor_hide<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?25l")
}

/// Show cursor.
#[inline]
pub fn cursor_show<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?25h")
}

// =============================================================================
// Screen Control
// =============================================================================

/// Clear the screen and home the cursor.
#[inline]
pub fn clear_screen<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[2J\x1b[H")
}

/// Enter alternate screen buffer (the overlay).
#[inline]
pub fn enter_alt_screen<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?1049h")
}

/// Exit alternate screen buffer.
#[inline]
pub fn exit_alt_screen<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?1049l")
}

// =============================================================================
// Synchronized Output (Flicker Prevention)
// =============================================================================

/// Begin synchronized output (terminal buffers until end_sync).
#[inline]
pub fn begin_sync<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?2026h")
}

/// End synchronized output (terminal flushes buffer).
#[inline]
pub fn end_sync<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[?2026l")
}

// =============================================================================
// Colors
// =============================================================================

/// Reset all attributes and colors.
#[inline]
pub fn reset<W: Write>(w: &mut W) -> std::io::Result<()> {
    write!(w, "\x1b[0m")
}

/// Set foreground color. Transparent means "terminal default".
#[inline]
pub fn fg<W: Write>(w: &mut W, color: Rgba) -> std::io::Result<()> {
    if color.is_transparent() {
        write!(w, "\x1b[39m")
    } else {
        write!(w, "\x1b[38;2;{};{};{}m", color.r, color.g, color.b)
    }
}

/// Set background color. Transparent means "terminal default".
#[inline]
pub fn bg<W: Write>(w: &mut W, color: Rgba) -> std::io::Result<()> {
    if color.is_transparent() {
        write!(w, "\x1b[49m")
    } else {
        write!(w, "\x1b[48;2;{};{};{}m", color.r, color.g, color.b)
    }
}

// =============================================================================
// Tests
// =============================================================================
