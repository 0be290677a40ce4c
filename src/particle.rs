//! Particle model - a single confetti piece.
//!
//! A particle is a value: it has no identity beyond its presence in the
//! live-set. Size, color, velocity, rotation speed and oscillation speed are
//! fixed at creation; position, rotation and oscillation phase advance once
//! per tick.

use rand::Rng;

use crate::types::Rgba;

// =============================================================================
// Constants
// =============================================================================

/// The fixed confetti palette.
pub const PALETTE: [Rgba; 10] = [
    Rgba::rgb(0xff, 0x6b, 0x6b),
    Rgba::rgb(0xfe, 0xca, 0x57),
    Rgba::rgb(0x48, 0xdb, 0xfb),
    Rgba::rgb(0xff, 0x9f, 0xf3),
    Rgba::rgb(0x54, 0xa0, 0xff),
    Rgba::rgb(0x5f, 0x27, 0xcd),
    Rgba::rgb(0x00, 0xd2, 0xd3),
    Rgba::rgb(0xff, 0x9f, 0x43),
    Rgba::rgb(0x10, 0xac, 0x84),
    Rgba::rgb(0xee, 0x5a, 0x24),
];

/// Spawn height: just above the visible top edge.
pub const SPAWN_Y: f32 = -20.0;

/// How far below the bottom edge a particle may fall before it is culled.
pub const CULL_MARGIN: f32 = 50.0;

/// Horizontal sway amplitude applied on top of the base velocity.
const SWAY_AMPLITUDE: f32 = 0.5;

// =============================================================================
// Particle
// =============================================================================

/// One confetti piece in surface coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub color: Rgba,
    /// Rotation in degrees. Grows without wrapping; the rasterizer handles
    /// arbitrary angles.
    pub rotation: f32,
    /// Degrees per tick, signed.
    pub rotation_speed: f32,
    pub velocity_x: f32,
    /// Biased positive: confetti falls.
    pub velocity_y: f32,
    /// Sway phase in radians.
    pub oscillation: f32,
    pub oscillation_speed: f32,
}

impl Particle {
    /// Create a randomized particle just above the top edge of a surface
    /// `surface_width` units wide.
    pub fn spawn<R: Rng>(surface_width: f32, rng: &mut R) -> Self {
        let x = if surface_width > 0.0 {
            rng.gen_range(0.0..surface_width)
        } else {
            0.0
        };
        Self {
            x,
            y: SPAWN_Y,
            width: rng.gen_range(5.0..15.0),
            height: rng.gen_range(4.0..10.0),
            color: PALETTE[rng.gen_range(0..PALETTE.len())],
            rotation: rng.gen_range(0.0..360.0),
            rotation_speed: rng.gen_range(-5.0..5.0),
            velocity_x: rng.gen_range(-2.0..2.0),
            velocity_y: rng.gen_range(2.0..5.0),
            oscillation: rng.gen_range(0.0..std::f32::consts::TAU),
            oscillation_speed: rng.gen_range(0.01..0.03),
        }
    }

    /// Advance the particle by one tick.
    ///
    /// Deterministic given the current state. No clamping: position and
    /// rotation may grow unbounded.
    pub fn advance(&mut self) {
        self.oscillation += self.oscillation_speed;
        self.x += self.velocity_x + self.oscillation.sin() * SWAY_AMPLITUDE;
        self.y += self.velocity_y;
        self.rotation += self.rotation_speed;
    }

    /// True once the particle has fallen past the cull line for a surface
    /// `surface_height` units tall.
    #[inline]
    pub fn is_below(&self, surface_height: f32) -> bool {
        self.y > surface_height + CULL_MARGIN
    }
}

// =============================================================================
// Tests
// =============================================================================
