//! Burst demo - one full confetti run on the real terminal.
//!
//! Run with: cargo run --example burst

use std::thread;
use std::time::Duration;

use confetti_tui::{ConfettiEngine, EffectSettings};

fn main() {
    let mut engine = ConfettiEngine::new(EffectSettings::default());

    engine.start();
    while engine.is_active() {
        thread::sleep(Duration::from_millis(50));
    }

    // The spawn window is closed; give the last pieces time to fall.
    thread::sleep(Duration::from_secs(3));
    engine.stop();

    println!("party over 🎉");
}
