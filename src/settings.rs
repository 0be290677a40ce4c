//! Effect configuration - the external settings collaborator.
//!
//! The engine only reads one knob: whether the party effect is enabled.
//! The flag is a signal so a host UI can bind to it reactively; the engine
//! itself reads it once per `start()` and ignores mid-run changes.

use spark_signals::{signal, Signal};

/// Host-owned configuration for the confetti effect.
#[derive(Clone)]
pub struct EffectSettings {
    party_enabled: Signal<bool>,
}

impl EffectSettings {
    pub fn new(enabled: bool) -> Self {
        Self {
            party_enabled: signal(enabled),
        }
    }

    /// Current value of the enable flag.
    pub fn enabled(&self) -> bool {
        self.party_enabled.get()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.party_enabled.set(enabled);
    }

    /// The enable flag signal, for reactive tracking.
    pub fn enabled_signal(&self) -> Signal<bool> {
        self.party_enabled.clone()
    }
}

impl Default for EffectSettings {
    fn default() -> Self {
        Self::new(true)
    }
}

// =============================================================================
// Tests
// =============================================================================
