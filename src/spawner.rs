//! Spawn timer - emits particle batches at a fixed cadence.
//!
//! A background timer thread appends a batch of particles to the shared
//! live-set every 50ms until the requested duration has elapsed, then flips
//! the engine's active flag off: "no more new particles", not "animation
//! finished" - in-flight particles keep animating until they fall off the
//! surface.
//!
//! # Pattern
//!
//! - One timer thread per run, parameterized by a fresh running flag
//! - Cancellation sets the flag and joins, so a superseded run can never
//!   append after its replacement started
//! - Only natural expiry flips the active flag; a cancelled run leaves it
//!   to whoever cancelled it

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::particle::Particle;

// =============================================================================
// Constants
// =============================================================================

/// Cadence of batch emission.
pub const SPAWN_INTERVAL: Duration = Duration::from_millis(50);

/// Particles per batch.
pub const BATCH_SIZE: usize = 5;

// =============================================================================
// Spawner
// =============================================================================

/// Cancellable periodic particle emitter.
pub struct Spawner {
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl Spawner {
    pub fn new() -> Self {
        Self {
            handle: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Check if the current timer is still emitting.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start emitting batches into `live_set` for `duration`.
    ///
    /// Any previous timer is cancelled (and joined) first - restart
    /// semantics. `surface_width` feeds the horizontal spawn range and is
    /// kept current by the render task; `active` is flipped off when the
    /// duration elapses naturally.
    pub fn start(
        &mut self,
        duration: Duration,
        live_set: Arc<Mutex<Vec<Particle>>>,
        surface_width: Arc<AtomicU32>,
        active: Arc<AtomicBool>,
    ) {
        self.cancel();

        let running = Arc::new(AtomicBool::new(true));
        self.running = running.clone();
        debug!(?duration, "spawn timer started");

        self.handle = Some(thread::spawn(move || {
            let started = Instant::now();
            while running.load(Ordering::SeqCst) && started.elapsed() < duration {
                thread::sleep(SPAWN_INTERVAL);
                if !running.load(Ordering::SeqCst) {
                    // Cancelled mid-sleep: the canceller owns the flags now.
                    return;
                }
                let width = surface_width.load(Ordering::SeqCst) as f32;
                let mut rng = rand::thread_rng();
                let mut set = live_set.lock().unwrap();
                for _ in 0..BATCH_SIZE {
                    set.push(Particle::spawn(width, &mut rng));
                }
            }
            // Natural expiry: close the spawn window. A run cancelled
            // between the checks loses the swap and must not touch it.
            if running.swap(false, Ordering::SeqCst) {
                active.store(false, Ordering::SeqCst);
                debug!("spawn window closed");
            }
        }));
    }

    /// Stop emitting. Synchronous: no batch is appended after this returns.
    pub fn cancel(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Default for Spawner {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Spawner {
    fn drop(&mut self) {
        self.cancel();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn shared() -> (Arc<Mutex<Vec<Particle>>>, Arc<AtomicU32>, Arc<AtomicBool>) {
        (
            Arc::new(Mutex::new(Vec::new())),
            Arc::new(AtomicU32::new(100)),
            Arc::new(AtomicBool::new(true)),
        )
    }

    #[test]
    fn test_emits_whole_batches_then_deactivates() {
        let (live_set, width, active) = shared();
        let mut spawner = Spawner::new();
        spawner.start(
            Duration::from_millis(200),
            live_set.clone(),
            width,
            active.clone(),
        );

        thread::sleep(Duration::from_millis(400));
        assert!(!spawner.is_running());
        assert!(!active.load(Ordering::SeqCst), "expiry closes the window");

        let count = live_set.lock().unwrap().len();
        assert!(count >= BATCH_SIZE, "at least one batch in 200ms");
        assert!(count <= 5 * BATCH_SIZE, "no more than ~4 batches in 200ms");
        assert_eq!(count % BATCH_SIZE, 0, "batches are appended atomically");
    }

    #[test]
    fn test_cancel_stops_emission_and_keeps_active() {
        let (live_set, width, active) = shared();
        let mut spawner = Spawner::new();
        spawner.start(
            Duration::from_secs(10),
            live_set.clone(),
            width,
            active.clone(),
        );

        thread::sleep(Duration::from_millis(120));
        spawner.cancel();
        assert!(!spawner.is_running());

        let frozen = live_set.lock().unwrap().len();
        thread::sleep(Duration::from_millis(120));
        assert_eq!(live_set.lock().unwrap().len(), frozen);
        // Cancellation is the caller's teardown; the flag stays theirs.
        assert!(active.load(Ordering::SeqCst));
    }

    #[test]
    fn test_restart_supersedes_previous_timer() {
        let (live_set, width, active) = shared();
        let mut spawner = Spawner::new();
        spawner.start(
            Duration::from_secs(10),
            live_set.clone(),
            width.clone(),
            active.clone(),
        );
        thread::sleep(Duration::from_millis(80));

        // Restart with a short window; the first timer must be gone.
        spawner.start(
            Duration::from_millis(100),
            live_set.clone(),
            width,
            active.clone(),
        );
        thread::sleep(Duration::from_millis(300));

        assert!(!spawner.is_running());
        assert!(
            !active.load(Ordering::SeqCst),
            "only the second timer's expiry flips the flag"
        );
    }

    #[test]
    fn test_cancel_without_start() {
        let mut spawner = Spawner::new();
        spawner.cancel();
        assert!(!spawner.is_running());
    }
}
