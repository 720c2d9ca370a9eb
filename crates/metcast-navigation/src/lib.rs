//! Swipe navigation for the three-page bulletin display.
//!
//! Raw touch samples flow through [`GestureClassifier`] into a
//! [`NavigationIntent`], which [`PageController`] applies to the page ring.
//! [`Navigator`] wires the two together for a presentation layer.

pub mod gesture;
pub mod navigator;
pub mod page;

pub use gesture::{GestureClassifier, GestureFault, SwipeThresholds, TouchPhase, TouchSample};
pub use navigator::Navigator;
pub use page::{NavigationIntent, Page, PageController, LAST_PAGE, PAGE_COUNT};
