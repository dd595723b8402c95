use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::clock::Clock;
use crate::engine::SessionEngine;
use crate::error::Result;
use crate::store::ScoreStore;

/// Unified event type consumed by the play loop
#[derive(Clone, Debug)]
pub enum GameEvent {
    Key(KeyEvent),
    Resize,
    Tick,
}

/// What a key press means to a running session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Stand-in for the host recognizing the active gesture
    Gesture,
    Quit,
    Ignore,
}

impl Command {
    pub fn from_key(key: &KeyEvent) -> Self {
        if key.kind == KeyEventKind::Release {
            return Command::Ignore;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Command::Quit,
            KeyCode::Esc => Command::Quit,
            KeyCode::Char(' ') | KeyCode::Enter => Command::Gesture,
            _ => Command::Ignore,
        }
    }
}

/// Source of terminal events (keyboard, resize)
pub trait GameEventSource: Send + 'static {
    /// Wait up to `timeout` for the next event
    fn recv_timeout(&self, timeout: Duration) -> std::result::Result<GameEvent, RecvTimeoutError>;
}

/// Production event source; a background thread forwards crossterm events
pub struct CrosstermEventSource {
    rx: Receiver<GameEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let forwarded = match event::read() {
                Ok(CtEvent::Key(key)) => tx.send(GameEvent::Key(key)),
                Ok(CtEvent::Resize(_, _)) => tx.send(GameEvent::Resize),
                Ok(_) => Ok(()),
                Err(_) => break,
            };
            if forwarded.is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl GameEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> std::result::Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Channel-fed source for headless tests
pub struct TestEventSource {
    rx: Receiver<GameEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<GameEvent>) -> Self {
        Self { rx }
    }
}

impl GameEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> std::result::Result<GameEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Zero is bumped to 1 ms so the loop never spins
    pub fn from_millis(ms: u64) -> Self {
        Self::new(Duration::from_millis(ms.max(1)))
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// One loop iteration: what woke the runner and the seconds since the previous frame
#[derive(Clone, Debug)]
pub struct Frame {
    pub event: GameEvent,
    pub elapsed: f64,
}

/// Outcome of feeding one frame to the engine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    /// The session reached its terminal state
    Finished,
    /// The player asked to leave
    Quit,
}

/// Waits for input or the next tick and measures frame time against a [`Clock`]
pub struct Runner<E: GameEventSource, T: Ticker, C: Clock> {
    event_source: E,
    ticker: T,
    clock: C,
    last: Duration,
}

impl<E: GameEventSource, T: Ticker, C: Clock> Runner<E, T, C> {
    pub fn new(event_source: E, ticker: T, clock: C) -> Self {
        let last = clock.now();
        Self {
            event_source,
            ticker,
            clock,
            last,
        }
    }

    /// Blocks up to one tick interval; yields Tick when nothing arrives
    pub fn step(&mut self) -> Frame {
        let event = match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => GameEvent::Tick,
        };

        let now = self.clock.now();
        let elapsed = now.saturating_sub(self.last).as_secs_f64();
        self.last = now;

        Frame { event, elapsed }
    }
}

/// Advance `engine` by the frame's elapsed time, then route its key (if any).
///
/// Gesture keys are dropped while the engine is settling between locks.
pub fn apply<S: ScoreStore, C: Clock>(
    engine: &mut SessionEngine<S, C>,
    frame: &Frame,
) -> Result<Flow> {
    if engine.on_clock_tick(frame.elapsed)?.finished {
        return Ok(Flow::Finished);
    }

    if let GameEvent::Key(key) = &frame.event {
        match Command::from_key(key) {
            Command::Quit => return Ok(Flow::Quit),
            Command::Gesture if engine.accepts_input() => {
                if engine.on_gesture_completed()?.finished {
                    return Ok(Flow::Finished);
                }
            }
            Command::Gesture | Command::Ignore => {}
        }
    }

    Ok(Flow::Continue)
}
