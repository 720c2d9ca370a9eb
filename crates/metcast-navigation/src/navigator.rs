use crate::gesture::{GestureClassifier, TouchPhase, TouchSample};
use crate::page::{NavigationIntent, Page, PageController};

/// Touch surface state for the paged display.
///
/// Forward every platform touch event here, unmodified, after translating it
/// into a [`TouchSample`]. The classifier always sees the page the gesture
/// started on, so threshold selection matches what the user was looking at.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    classifier: GestureClassifier,
    pages: PageController,
}

impl Navigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle one touch sample and return the active page afterwards.
    pub fn on_touch(&mut self, sample: TouchSample) -> usize {
        let intent = self.classifier.handle(sample, self.pages.current_page());
        if sample.phase == TouchPhase::End && intent != NavigationIntent::None {
            tracing::debug!(?intent, "Swipe recognised");
        }
        self.pages.apply_intent(intent)
    }

    /// Page-selector tap.
    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.pages.go_to_page(page)
    }

    pub fn apply_intent(&mut self, intent: NavigationIntent) -> usize {
        self.pages.apply_intent(intent)
    }

    pub fn current_page(&self) -> usize {
        self.pages.current_page()
    }

    pub fn page(&self) -> Page {
        self.pages.page()
    }

    /// True between a touch start and its end
    pub fn is_touching(&self) -> bool {
        self.classifier.is_tracking()
    }
}
