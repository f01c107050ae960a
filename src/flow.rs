//! Page flow of the capture → preview → processing → results screens.
//!
//! Each page owns an optional enter hook and exit hook in an explicit
//! transition table; moving between pages runs the exit hook of the page
//! being left and then the enter hook of the page being shown.

use tracing::debug;

use crate::editor::PageFlow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Capture,
    Preview,
    Processing,
    Results,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Capture, Page::Preview, Page::Processing, Page::Results];

    pub fn index(self) -> usize {
        match self {
            Page::Capture => 0,
            Page::Preview => 1,
            Page::Processing => 2,
            Page::Results => 3,
        }
    }

    pub fn from_index(index: usize) -> Option<Page> {
        Page::ALL.get(index).copied()
    }
}

pub type PageHook = Box<dyn FnMut(Page)>;

#[derive(Default)]
struct Transition {
    on_enter: Option<PageHook>,
    on_exit: Option<PageHook>,
}

pub struct PageController {
    current: Page,
    table: [Transition; 4],
}

impl Default for PageController {
    fn default() -> Self {
        Self::new()
    }
}

impl PageController {
    pub fn new() -> Self {
        Self {
            current: Page::Capture,
            table: Default::default(),
        }
    }

    pub fn on_enter(mut self, page: Page, hook: impl FnMut(Page) + 'static) -> Self {
        self.table[page.index()].on_enter = Some(Box::new(hook));
        self
    }

    pub fn on_exit(mut self, page: Page, hook: impl FnMut(Page) + 'static) -> Self {
        self.table[page.index()].on_exit = Some(Box::new(hook));
        self
    }

    pub fn current(&self) -> Page {
        self.current
    }

    /// Runs the enter hook of the first page.
    pub fn start(&mut self) {
        self.enter(self.current);
    }

    pub fn show(&mut self, page: Page) {
        if page == self.current {
            return;
        }
        let previous = self.current;
        debug!("page {:?} -> {:?}", previous, page);
        if let Some(hook) = self.table[previous.index()].on_exit.as_mut() {
            hook(previous);
        }
        self.current = page;
        self.enter(page);
    }

    fn enter(&mut self, page: Page) {
        if let Some(hook) = self.table[page.index()].on_enter.as_mut() {
            hook(page);
        }
    }
}

impl PageFlow for PageController {
    fn advance(&mut self) {
        if let Some(next) = Page::from_index(self.current.index() + 1) {
            self.show(next);
        }
    }

    fn retreat(&mut self) {
        if let Some(previous) = self
            .current
            .index()
            .checked_sub(1)
            .and_then(Page::from_index)
        {
            self.show(previous);
        }
    }

    fn reset(&mut self) {
        self.show(Page::Capture);
    }
}
