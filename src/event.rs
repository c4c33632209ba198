use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

pub enum AppEvent {
    Key(KeyEvent),
    /// No input within one poll interval. The main loop uses it to let the
    /// game clock catch up.
    Tick,
    Resize(u16, u16),
}

/// Reads the terminal on a background thread and forwards events over a
/// channel. Nothing game-related happens on that thread.
pub struct EventHandler {
    rx: Receiver<AppEvent>,
}

impl EventHandler {
    pub fn new(poll_interval: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || forward_input(&tx, poll_interval));
        Self { rx }
    }

    pub fn next(&self) -> anyhow::Result<AppEvent> {
        Ok(self.rx.recv()?)
    }
}

fn forward_input(tx: &Sender<AppEvent>, poll_interval: Duration) {
    loop {
        let event = if event::poll(poll_interval).unwrap_or(false) {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                Ok(Event::Resize(w, h)) => AppEvent::Resize(w, h),
                Ok(_) => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "terminal read failed");
                    continue;
                }
            }
        } else {
            AppEvent::Tick
        };
        if tx.send(event).is_err() {
            tracing::debug!("event receiver dropped, input thread exiting");
            return;
        }
    }
}
