use std::cell::RefCell;
use std::rc::Rc;

/// The document's location and referrer.
pub trait Location {
    /// Current URL.
    fn href(&self) -> String;
    /// Navigate to `url`.
    fn assign(&mut self, url: &str);
    /// URL of the page that linked here, empty if none.
    fn referrer(&self) -> String;
}

#[derive(Debug, Default)]
struct LocationState {
    href: String,
    referrer: String,
    navigations: Vec<String>,
}

/// A location that records navigations instead of performing them.
#[derive(Debug, Clone, Default)]
pub struct MemoryLocation {
    state: Rc<RefCell<LocationState>>,
}

impl MemoryLocation {
    pub fn new(href: &str, referrer: &str) -> Self {
        Self {
            state: Rc::new(RefCell::new(LocationState {
                href: href.to_string(),
                referrer: referrer.to_string(),
                navigations: Vec::new(),
            })),
        }
    }

    /// URLs assigned so far, in order.
    pub fn navigations(&self) -> Vec<String> {
        self.state.borrow().navigations.clone()
    }
}

impl Location for MemoryLocation {
    fn href(&self) -> String {
        self.state.borrow().href.clone()
    }

    fn assign(&mut self, url: &str) {
        let mut state = self.state.borrow_mut();
        state.href = url.to_string();
        state.navigations.push(url.to_string());
    }

    fn referrer(&self) -> String {
        self.state.borrow().referrer.clone()
    }
}
