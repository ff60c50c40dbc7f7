// render.rs - Frame sinks: terminal text and a watch channel for viewers

use std::io::Write;
use std::time::Duration;

use tokio::sync::watch;

use crate::driver::{Frame, TickObserver};
use crate::error::RenderError;
use crate::grid::{Grid, Markers};

const CLEAR_SCREEN: &str = "\x1b[H\x1b[2J";

/// Writes each frame as text: one line per row, then an optional duration line.
pub struct TerminalRenderer<W: Write> {
    out: W,
    markers: Markers,
    clear_screen: bool,
    show_duration: bool,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W, markers: Markers) -> Self {
        Self {
            out,
            markers,
            clear_screen: true,
            show_duration: true,
        }
    }

    pub fn clear_screen(mut self, clear: bool) -> Self {
        self.clear_screen = clear;
        self
    }

    pub fn show_duration(mut self, show: bool) -> Self {
        self.show_duration = show;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TickObserver for TerminalRenderer<W> {
    fn tick_completed(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        let mut text = String::new();
        if self.clear_screen {
            text.push_str(CLEAR_SCREEN);
        }
        text.push_str(&frame.grid.render(self.markers));
        if self.show_duration {
            text.push_str(&format!("Duration: {:?}\n", frame.elapsed));
        }
        self.out.write_all(text.as_bytes())?;
        self.out.flush()?;
        Ok(())
    }
}

/// The most recent frame, owned so it can cross threads.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub generation: u64,
    pub grid: Grid,
    pub elapsed: Duration,
}

/// Publishes every frame into a `watch` channel; receivers only ever see the
/// latest completed generation.
pub struct SnapshotPublisher {
    tx: watch::Sender<Option<FrameSnapshot>>,
}

impl SnapshotPublisher {
    pub fn channel() -> (Self, watch::Receiver<Option<FrameSnapshot>>) {
        let (tx, rx) = watch::channel(None);
        (Self { tx }, rx)
    }
}

impl TickObserver for SnapshotPublisher {
    fn tick_completed(&mut self, frame: &Frame<'_>) -> Result<(), RenderError> {
        let snapshot = FrameSnapshot {
            generation: frame.generation,
            grid: frame.grid.clone(),
            elapsed: frame.elapsed,
        };
        self.tx.send(Some(snapshot)).map_err(|_| RenderError::Closed)
    }
}
