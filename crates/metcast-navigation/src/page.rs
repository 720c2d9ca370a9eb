//! The page ring and its controller.

/// Number of pages in the ring
pub const PAGE_COUNT: usize = 3;

/// Index of the last page
pub const LAST_PAGE: usize = PAGE_COUNT - 1;

/// Screens in ring order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Forecast,
    Details,
    About,
}

impl Page {
    pub const ALL: [Page; PAGE_COUNT] = [Page::Forecast, Page::Details, Page::About];

    pub fn index(self) -> usize {
        match self {
            Self::Forecast => 0,
            Self::Details => 1,
            Self::About => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn title(self) -> &'static str {
        match self {
            Self::Forecast => "Forecast",
            Self::Details => "Detailed Forecast",
            Self::About => "About",
        }
    }
}

/// Classified outcome of a gesture or page-selector tap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NavigationIntent {
    #[default]
    None,
    Next,
    Previous,
    GoTo(usize),
}

/// Owns the current page. Wraps modulo [`PAGE_COUNT`], never clamps.
#[derive(Debug, Clone, Default)]
pub struct PageController {
    current: usize,
}

impl PageController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(page: Page) -> Self {
        Self {
            current: page.index(),
        }
    }

    pub fn current_page(&self) -> usize {
        self.current
    }

    pub fn page(&self) -> Page {
        Page::from_index(self.current).unwrap_or(Page::Forecast)
    }

    /// Apply an intent and return the resulting page index.
    pub fn apply_intent(&mut self, intent: NavigationIntent) -> usize {
        let next = match intent {
            NavigationIntent::None => self.current,
            NavigationIntent::Next => (self.current + 1) % PAGE_COUNT,
            NavigationIntent::Previous => (self.current + PAGE_COUNT - 1) % PAGE_COUNT,
            NavigationIntent::GoTo(page) if page < PAGE_COUNT => page,
            NavigationIntent::GoTo(page) => {
                tracing::warn!(page, "Ignoring jump to page outside the ring");
                self.current
            }
        };

        if next != self.current {
            tracing::debug!(from = self.current, to = next, ?intent, "Page changed");
        }
        self.current = next;
        next
    }

    /// Direct jump from a page selector.
    pub fn go_to_page(&mut self, page: usize) -> usize {
        self.apply_intent(NavigationIntent::GoTo(page))
    }
}
