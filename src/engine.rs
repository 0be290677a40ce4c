//! Engine controller and render loop.
//!
//! [`ConfettiEngine`] is the public entry point. `start()` attaches the
//! overlay surface, starts the spawn timer and the frame task; the frame
//! task advances, draws and culls particles each tick and tears everything
//! down once the spawn window has closed and the last particle has fallen
//! off the surface. `stop()` is an immediate hard stop over the same
//! teardown path.
//!
//! # Concurrency
//!
//! Two cancellable tasks share the live-set behind a mutex: the spawn timer
//! appends batches, the frame task updates and culls. The frame task makes
//! its shutdown decision *while holding the live-set lock*, and a restart
//! flips the active flag under that same lock, so a restart can never be
//! swallowed by a concurrently completing loop.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use spark_signals::{signal, Signal};
use tracing::{debug, warn};

use crate::particle::Particle;
use crate::settings::EffectSettings;
use crate::spawner::Spawner;
use crate::surface::SurfaceManager;

// =============================================================================
// Constants
// =============================================================================

/// Spawn window length when none is given.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);

/// Frame cadence (~60fps).
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

// =============================================================================
// Render loop task
// =============================================================================

/// The frame task: owns the surface for its lifetime, cancellable by flag.
struct RenderLoop {
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl RenderLoop {
    fn new() -> Self {
        Self {
            handle: None,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Spawn the frame task. Caller must ensure no task is currently running.
    fn start(
        &mut self,
        surface: SurfaceManager,
        live_set: Arc<Mutex<Vec<Particle>>>,
        surface_width: Arc<AtomicU32>,
        active: Arc<AtomicBool>,
    ) {
        // Reap a previously finished task.
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }

        let running = Arc::new(AtomicBool::new(true));
        self.running = running.clone();
        self.handle = Some(thread::spawn(move || {
            run_frames(surface, live_set, surface_width, active, running);
        }));
    }

    /// Stop the frame task and wait for its teardown to finish.
    fn cancel(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Frame task body: update, draw, cull, present, decide, sleep.
fn run_frames(
    mut surface: SurfaceManager,
    live_set: Arc<Mutex<Vec<Particle>>>,
    surface_width: Arc<AtomicU32>,
    active: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
) {
    while running.load(Ordering::SeqCst) {
        let (width, height) = surface.sync_size();
        surface_width.store(width as u32, Ordering::SeqCst);
        surface.canvas_mut().clear();

        {
            let mut set = live_set.lock().unwrap();
            for p in set.iter_mut() {
                p.advance();
                surface
                    .canvas_mut()
                    .fill_rect_rotated(p.x, p.y, p.width, p.height, p.rotation, p.color);
            }
            // Cull after the draw pass: a particle's final frame is still
            // rendered, and retain() is immune to index shifting.
            let surface_height = height as f32;
            set.retain(|p| !p.is_below(surface_height));

            // Natural completion is decided under the live-set lock; a
            // restart also activates under this lock, so neither can miss
            // the other.
            if set.is_empty() && !active.load(Ordering::SeqCst) {
                running.store(false, Ordering::SeqCst);
            }
        }

        if !running.load(Ordering::SeqCst) {
            break;
        }
        if let Err(err) = surface.present() {
            debug!(?err, "frame present failed");
        }
        thread::sleep(FRAME_INTERVAL);
    }

    // Shared teardown for both explicit stop and natural completion.
    live_set.lock().unwrap().clear();
    active.store(false, Ordering::SeqCst);
    surface.release();
    debug!("render loop finished");
}

// =============================================================================
// ConfettiEngine
// =============================================================================

/// On-demand confetti burst over the terminal.
///
/// ```ignore
/// let mut engine = ConfettiEngine::new(EffectSettings::default());
/// engine.start();
/// while engine.is_active() {
///     std::thread::sleep(std::time::Duration::from_millis(50));
/// }
/// ```
pub struct ConfettiEngine {
    settings: EffectSettings,
    /// Reactive mirror of `active_flag`, synced on read.
    active: Signal<bool>,
    active_flag: Arc<AtomicBool>,
    live_set: Arc<Mutex<Vec<Particle>>>,
    surface_width: Arc<AtomicU32>,
    spawner: Spawner,
    frames: RenderLoop,
}

impl ConfettiEngine {
    pub fn new(settings: EffectSettings) -> Self {
        Self {
            settings,
            active: signal(false),
            active_flag: Arc::new(AtomicBool::new(false)),
            live_set: Arc::new(Mutex::new(Vec::new())),
            surface_width: Arc::new(AtomicU32::new(0)),
            spawner: Spawner::new(),
            frames: RenderLoop::new(),
        }
    }

    /// Start a burst with the default 3-second spawn window.
    pub fn start(&mut self) {
        self.start_for(DEFAULT_DURATION);
    }

    /// Start a burst, spawning particles for `duration`.
    ///
    /// No-op when the effect is disabled in settings or the terminal
    /// overlay cannot be attached. Starting while a burst is running
    /// restarts the spawn window: the previous timer is cancelled before
    /// the new one exists, and the live-set is reset.
    pub fn start_for(&mut self, duration: Duration) {
        if !self.settings.enabled() {
            debug!("confetti disabled, ignoring start");
            return;
        }

        // Cancel any previous spawn window up front: a superseded timer
        // expiring mid-restart must not close the new window's flag.
        self.spawner.cancel();

        // Restart path: the frame task is alive, so the surface stays up
        // and only the timer and live-set reset. Activation happens under
        // the live-set lock (see module docs).
        let restarted = {
            let mut set = self.live_set.lock().unwrap();
            if self.frames.is_running() {
                set.clear();
                self.active_flag.store(true, Ordering::SeqCst);
                true
            } else {
                false
            }
        };

        if !restarted {
            // Fresh run: make sure a completed frame task is fully torn
            // down before attaching a new surface.
            self.frames.cancel();

            let mut surface = SurfaceManager::new();
            if let Err(err) = surface.acquire() {
                warn!(?err, "confetti surface unavailable, skipping effect");
                return;
            }
            self.surface_width
                .store(surface.canvas().width() as u32, Ordering::SeqCst);

            {
                let mut set = self.live_set.lock().unwrap();
                set.clear();
                self.active_flag.store(true, Ordering::SeqCst);
            }
            self.frames.start(
                surface,
                self.live_set.clone(),
                self.surface_width.clone(),
                self.active_flag.clone(),
            );
        }

        self.active.set(true);
        self.spawner.start(
            duration,
            self.live_set.clone(),
            self.surface_width.clone(),
            self.active_flag.clone(),
        );
        debug!(?duration, restarted, "confetti started");
    }

    /// Hard stop: cancel the spawn timer and the frame task, release the
    /// surface, clear the live-set. Synchronous - nothing mutates after
    /// this returns. Idempotent, no-op when nothing is running.
    pub fn stop(&mut self) {
        self.active_flag.store(false, Ordering::SeqCst);
        self.active.set(false);
        self.spawner.cancel();
        self.frames.cancel();
        debug!("confetti stopped");
    }

    /// Whether a burst's spawn window is currently open.
    ///
    /// Also syncs the observable signal from the cross-task flag.
    pub fn is_active(&self) -> bool {
        let value = self.active_flag.load(Ordering::SeqCst);
        if self.active.get() != value {
            self.active.set(value);
        }
        value
    }

    /// The observable active flag.
    ///
    /// Synced from the engine's cross-task state whenever `is_active()` is
    /// called; poll that accessor for reactive tracking.
    pub fn active_signal(&self) -> Signal<bool> {
        self.active.clone()
    }
}

impl Drop for ConfettiEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn wait_until(timeout: Duration, mut pred: impl FnMut() -> bool) -> bool {
        let started = Instant::now();
        while started.elapsed() < timeout {
            if pred() {
                return true;
            }
            thread::sleep(Duration::from_millis(10));
        }
        pred()
    }

    #[test]
    fn test_disabled_start_is_noop() {
        let mut engine = ConfettiEngine::new(EffectSettings::new(false));
        engine.start();

        assert!(!engine.is_active());
        assert!(!engine.frames.is_running());
        assert!(!engine.spawner.is_running());

        thread::sleep(Duration::from_millis(150));
        assert!(engine.live_set.lock().unwrap().is_empty());
    }

    #[test]
    fn test_stop_idempotent() {
        let mut engine = ConfettiEngine::new(EffectSettings::default());
        // Stop before any start must not panic.
        engine.stop();

        engine.start_for(Duration::from_millis(500));
        assert!(engine.is_active());
        engine.stop();
        engine.stop();

        assert!(!engine.is_active());
        assert!(!engine.frames.is_running());
        assert!(!engine.spawner.is_running());
        assert!(engine.live_set.lock().unwrap().is_empty());
    }

    #[test]
    fn test_spawn_window_fills_live_set_in_batches() {
        let mut engine = ConfettiEngine::new(EffectSettings::default());
        engine.start_for(Duration::from_millis(400));

        assert!(wait_until(Duration::from_secs(2), || {
            !engine.live_set.lock().unwrap().is_empty()
        }));
        let count = engine.live_set.lock().unwrap().len();
        assert!(count > 0);
        engine.stop();
    }

    #[test]
    fn test_natural_completion() {
        let mut engine = ConfettiEngine::new(EffectSettings::default());
        engine.start_for(Duration::from_millis(150));
        assert!(engine.is_active());

        // The spawn window closes no later than the duration (plus slack).
        assert!(wait_until(Duration::from_secs(2), || !engine.is_active()));

        // The remaining particles drain and the loop tears itself down.
        assert!(wait_until(Duration::from_secs(8), || {
            !engine.frames.is_running()
        }));
        assert!(engine.live_set.lock().unwrap().is_empty());
    }

    #[test]
    fn test_restart_supersedes_previous_run() {
        let mut engine = ConfettiEngine::new(EffectSettings::default());
        engine.start_for(Duration::from_secs(10));
        assert!(engine.is_active());
        thread::sleep(Duration::from_millis(100));

        // Restart with a short window; the long timer must be gone.
        engine.start_for(Duration::from_millis(150));
        assert!(engine.is_active());
        assert!(wait_until(Duration::from_secs(2), || !engine.is_active()));
        engine.stop();
    }

    #[test]
    fn test_active_signal_tracks_state() {
        let mut engine = ConfettiEngine::new(EffectSettings::default());
        let active = engine.active_signal();
        assert!(!active.get());

        engine.start_for(Duration::from_millis(300));
        assert!(active.get());
        engine.stop();
        assert!(!active.get());
    }

    #[test]
    fn test_drop_tears_down_promptly() {
        let mut engine = ConfettiEngine::new(EffectSettings::default());
        engine.start_for(Duration::from_secs(10));
        let started = Instant::now();
        drop(engine);
        assert!(started.elapsed() < Duration::from_secs(2));
    }
}
