//! Swipe classification.
//!
//! A two-state machine (`Idle`, `Tracking`) fed with touch samples. Start
//! records the origin and the page it landed on, each Move overwrites the
//! provisional end point, and End classifies the displacement into a
//! [`NavigationIntent`] using that page's thresholds. Every End
//! returns the machine to `Idle` with all coordinates cleared, and faults
//! are swallowed so the touch surface keeps working for the next gesture.

use thiserror::Error;

use crate::page::{NavigationIntent, LAST_PAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
}

/// Platform-neutral touch sample in screen coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    pub x: f64,
    pub y: f64,
    pub phase: TouchPhase,
}

impl TouchSample {
    pub fn start(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            phase: TouchPhase::Start,
        }
    }

    pub fn moved(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            phase: TouchPhase::Move,
        }
    }

    /// End events carry no position of their own; the last Move wins.
    pub fn end() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            phase: TouchPhase::End,
        }
    }
}

/// Malformed touch input. Logged, never surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GestureFault {
    #[error("{0:?} received while no gesture was being tracked")]
    Untracked(TouchPhase),

    #[error("non-finite touch coordinate ({x}, {y})")]
    NonFiniteCoordinate { x: f64, y: f64 },
}

/// Minimum horizontal travel and maximum vertical drift for a page swipe
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeThresholds {
    pub horizontal: f64,
    pub vertical: f64,
}

impl SwipeThresholds {
    pub const STANDARD: Self = Self {
        horizontal: 50.0,
        vertical: 100.0,
    };

    /// The last page scrolls more, so it accepts a shorter swipe and more drift.
    pub const LAST_PAGE: Self = Self {
        horizontal: 30.0,
        vertical: 150.0,
    };

    pub fn for_page(page: usize) -> Self {
        if page == LAST_PAGE {
            Self::LAST_PAGE
        } else {
            Self::STANDARD
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Point {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
enum GestureState {
    #[default]
    Idle,
    Tracking {
        start: Point,
        last: Option<Point>,
        page: usize,
    },
}

#[derive(Debug, Clone, Default)]
pub struct GestureClassifier {
    state: GestureState,
}

impl GestureClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, GestureState::Tracking { .. })
    }

    /// Feed one sample. Only End can produce something other than `None`.
    ///
    /// `current_page` is read on Start only; a page change mid-gesture does
    /// not alter the thresholds the gesture is judged by.
    pub fn handle(&mut self, sample: TouchSample, current_page: usize) -> NavigationIntent {
        let result = match sample.phase {
            TouchPhase::Start => self
                .start(sample, current_page)
                .map(|()| NavigationIntent::None),
            TouchPhase::Move => self.track(sample).map(|()| NavigationIntent::None),
            TouchPhase::End => self.finish(),
        };

        result.unwrap_or_else(|fault| {
            tracing::debug!("Touch {:?} ignored: {}", sample.phase, fault);
            self.state = GestureState::Idle;
            NavigationIntent::None
        })
    }

    fn start(&mut self, sample: TouchSample, page: usize) -> Result<(), GestureFault> {
        let point = finite_point(sample)?;
        if self.is_tracking() {
            tracing::debug!("Touch start while tracking, restarting gesture");
        }
        self.state = GestureState::Tracking {
            start: point,
            last: None,
            page,
        };
        Ok(())
    }

    fn track(&mut self, sample: TouchSample) -> Result<(), GestureFault> {
        let GestureState::Tracking { last, .. } = &mut self.state else {
            return Err(GestureFault::Untracked(TouchPhase::Move));
        };
        *last = Some(finite_point(sample)?);
        Ok(())
    }

    fn finish(&mut self) -> Result<NavigationIntent, GestureFault> {
        match std::mem::take(&mut self.state) {
            GestureState::Idle => Err(GestureFault::Untracked(TouchPhase::End)),
            GestureState::Tracking { start, last, page } => Ok(match last {
                Some(last) => classify(start, last, page),
                None => {
                    tracing::debug!("Touch ended without movement");
                    NavigationIntent::None
                }
            }),
        }
    }
}

fn finite_point(sample: TouchSample) -> Result<Point, GestureFault> {
    if sample.x.is_finite() && sample.y.is_finite() {
        Ok(Point {
            x: sample.x,
            y: sample.y,
        })
    } else {
        Err(GestureFault::NonFiniteCoordinate {
            x: sample.x,
            y: sample.y,
        })
    }
}

/// Positive `dx` means the finger travelled left.
fn classify(start: Point, last: Point, page: usize) -> NavigationIntent {
    let dx = start.x - last.x;
    let dy = (start.y - last.y).abs();
    let thresholds = SwipeThresholds::for_page(page);

    tracing::debug!(dx, dy, page, "Swipe distances");

    if dx.abs() > thresholds.horizontal && dy < thresholds.vertical {
        if dx > thresholds.horizontal {
            NavigationIntent::Next
        } else {
            NavigationIntent::Previous
        }
    } else {
        tracing::debug!("Movement too small or too vertical, leaving it to scroll");
        NavigationIntent::None
    }
}
