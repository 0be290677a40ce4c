//! # confetti-tui
//!
//! Transient confetti burst overlay for terminal applications.
//!
//! Fire [`ConfettiEngine::start`] from a host event (a winner announced, a
//! job finished) and the engine takes the alternate screen, rains confetti
//! for the requested window, then removes every trace of itself: the
//! overlay, its timers, and its particles. Nothing leaks across runs.
//!
//! ## Architecture
//!
//! ```text
//! ConfettiEngine ── spawn timer ──▶ live-set (Mutex<Vec<Particle>>)
//!        │                              ▲
//!        └─── frame task ── advance/draw/cull ──▶ Canvas ──▶ OverlayRenderer
//! ```
//!
//! Two cancellable tasks share the live-set: a 50ms spawn timer appends
//! five-particle batches for the duration of the burst, and a ~60fps frame
//! task updates, draws and culls. When the spawn window has closed and the
//! last particle has fallen past the bottom edge, the frame task tears the
//! overlay down by itself.
//!
//! The observable `active` flag is a [spark-signals](https://crates.io/crates/spark-signals)
//! signal, so host UIs can gate re-triggering reactively.
//!
//! ## Modules
//!
//! - [`types`] - `Rgba` color
//! - [`particle`] - confetti piece model and physics
//! - [`surface`] - pixel canvas and terminal overlay lifecycle
//! - [`renderer`] - ANSI output layer (half-block cells, frame diffing)
//! - [`spawner`] - cancellable spawn timer
//! - [`engine`] - render loop and the public controller
//! - [`settings`] - host configuration (enable flag)

pub mod engine;
pub mod particle;
pub mod renderer;
pub mod settings;
pub mod spawner;
pub mod surface;
pub mod types;

// Re-export commonly used items
pub use engine::{ConfettiEngine, DEFAULT_DURATION, FRAME_INTERVAL};
pub use particle::{CULL_MARGIN, PALETTE, Particle, SPAWN_Y};
pub use renderer::{OutputBuffer, OverlayRenderer};
pub use settings::EffectSettings;
pub use spawner::{BATCH_SIZE, SPAWN_INTERVAL, Spawner};
pub use surface::{Canvas, SurfaceManager};
pub use types::Rgba;
