use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Status of an external accessibility aid (a sign-language interpreter
/// widget, for instance). Polled, never cached.
pub trait AccessibilitySignal {
    fn is_active(&self) -> bool;
}

/// A flag the presentation layer can flip from anywhere.
#[derive(Clone, Debug, Default)]
pub struct SharedSignal(Arc<AtomicBool>);

impl SharedSignal {
    pub fn new(active: bool) -> Self {
        Self(Arc::new(AtomicBool::new(active)))
    }

    pub fn set(&self, active: bool) {
        self.0.store(active, Ordering::Relaxed);
    }

    pub fn toggle(&self) -> bool {
        !self.0.fetch_xor(true, Ordering::Relaxed)
    }
}

impl AccessibilitySignal for SharedSignal {
    fn is_active(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Accessibility is active when the external aid is on or voice readout is
/// enabled. The controller only ever sees the OR of the two.
pub struct Accessibility {
    external: Box<dyn AccessibilitySignal>,
    voice_readout: bool,
}

impl Accessibility {
    pub fn new(external: Box<dyn AccessibilitySignal>, voice_readout: bool) -> Self {
        Self {
            external,
            voice_readout,
        }
    }

    pub fn is_active(&self) -> bool {
        self.voice_readout || self.external.is_active()
    }

    pub fn voice_readout(&self) -> bool {
        self.voice_readout
    }

    pub fn set_voice_readout(&mut self, on: bool) {
        self.voice_readout = on;
    }
}
