//! In-memory implementations of the viewport collaborators.
//!
//! Each type is a cheap handle over shared state, so a clone can be handed
//! to a bridge while the original stays around for inspection.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::rc::Rc;

use tokio::sync::oneshot;

use crate::capability::{FullscreenHost, NativeOutcome, Scope, VisibilityHost, VisibilitySink};
use crate::error::{Result, ViewportError};
use crate::style::{StyleProperty, StyleTarget};
use crate::viewport::ViewportMeta;

/// Inline styles of a single element.
#[derive(Debug, Clone, Default)]
pub struct MemoryStyle {
    values: Rc<RefCell<HashMap<StyleProperty, String>>>,
}

impl MemoryStyle {
    /// Every tracked property with its current value.
    pub fn values(&self) -> Vec<(StyleProperty, String)> {
        StyleProperty::TRACKED
            .into_iter()
            .map(|property| (property, self.style(property)))
            .collect()
    }
}

impl StyleTarget for MemoryStyle {
    fn style(&self, property: StyleProperty) -> String {
        self.values
            .borrow()
            .get(&property)
            .cloned()
            .unwrap_or_default()
    }

    fn set_style(&mut self, property: StyleProperty, value: &str) {
        let mut values = self.values.borrow_mut();
        if value.is_empty() {
            values.remove(&property);
        } else {
            values.insert(property, value.to_string());
        }
    }
}

/// A viewport meta tag that may not exist yet.
#[derive(Debug, Clone, Default)]
pub struct MemoryViewport {
    content: Rc<RefCell<Option<String>>>,
}

impl MemoryViewport {
    pub fn with_content(content: &str) -> Self {
        Self {
            content: Rc::new(RefCell::new(Some(content.to_string()))),
        }
    }

    pub fn missing() -> Self {
        Self::default()
    }
}

impl ViewportMeta for MemoryViewport {
    fn content(&self) -> Option<String> {
        self.content.borrow().clone()
    }

    fn set_content(&mut self, content: &str) {
        *self.content.borrow_mut() = Some(content.to_string());
    }
}

/// How a [`MemoryFullscreen`] completes requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Methods return nothing; the change is immediate.
    Immediate,
    /// Methods return an awaitable resolved by [`MemoryFullscreen::complete`].
    Deferred,
}

#[derive(Debug)]
struct FullscreenState {
    methods: BTreeSet<String>,
    completion: Completion,
    really_fullscreen: bool,
    invocations: Vec<String>,
    fail_next: Option<ViewportError>,
    pending: Option<(Scope, oneshot::Sender<bool>)>,
}

/// A browser fullscreen implementation exposing a chosen set of methods.
#[derive(Debug, Clone)]
pub struct MemoryFullscreen {
    state: Rc<RefCell<FullscreenState>>,
}

impl MemoryFullscreen {
    /// Only the listed method names exist.
    pub fn with_methods(methods: &[&str]) -> Self {
        Self {
            state: Rc::new(RefCell::new(FullscreenState {
                methods: methods.iter().map(|name| name.to_string()).collect(),
                completion: Completion::Immediate,
                really_fullscreen: false,
                invocations: Vec::new(),
                fail_next: None,
                pending: None,
            })),
        }
    }

    /// The unprefixed W3C methods.
    pub fn standard() -> Self {
        Self::with_methods(&["requestFullscreen", "exitFullscreen"])
    }

    /// Switch between immediate and deferred completion.
    pub fn set_completion(&self, completion: Completion) {
        self.state.borrow_mut().completion = completion;
    }

    /// Make the next invocation throw.
    pub fn fail_next(&self, err: ViewportError) {
        self.state.borrow_mut().fail_next = Some(err);
    }

    /// Resolve a deferred request. Returns false if none was outstanding.
    pub fn complete(&self, success: bool) -> bool {
        let pending = self.state.borrow_mut().pending.take();
        match pending {
            Some((scope, sender)) => {
                if success {
                    self.state.borrow_mut().really_fullscreen = scope == Scope::Element;
                }
                let _ = sender.send(success);
                true
            }
            None => false,
        }
    }

    /// Leave fullscreen without going through any method, the way the
    /// browser does when the user presses Escape.
    pub fn leave_externally(&self) {
        self.state.borrow_mut().really_fullscreen = false;
    }

    /// Enter fullscreen without going through any method, the way a page
    /// script outside the bridge might.
    pub fn enter_externally(&self) {
        self.state.borrow_mut().really_fullscreen = true;
    }

    /// Method names invoked so far, in order.
    pub fn invocations(&self) -> Vec<String> {
        self.state.borrow().invocations.clone()
    }
}

impl FullscreenHost for MemoryFullscreen {
    fn has_method(&self, _scope: Scope, name: &str) -> bool {
        self.state.borrow().methods.contains(name)
    }

    fn invoke(&mut self, scope: Scope, name: &str) -> Result<NativeOutcome> {
        let mut state = self.state.borrow_mut();
        state.invocations.push(name.to_string());
        if let Some(err) = state.fail_next.take() {
            return Err(err);
        }
        match state.completion {
            Completion::Immediate => {
                state.really_fullscreen = scope == Scope::Element;
                Ok(NativeOutcome::Settled)
            }
            Completion::Deferred => {
                let (sender, receiver) = oneshot::channel();
                state.pending = Some((scope, sender));
                Ok(NativeOutcome::Pending(receiver))
            }
        }
    }

    fn is_really_fullscreen(&self) -> bool {
        self.state.borrow().really_fullscreen
    }
}

/// What loading the polyfill does in a [`MemoryVisibility`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolyfillBehavior {
    Installs,
    Fails,
}

#[derive(Debug)]
struct VisibilityState {
    supported: bool,
    polyfill: PolyfillBehavior,
    polyfill_loads: usize,
    observe_calls: usize,
    disconnect_calls: usize,
    threshold: Option<f64>,
    sink: Option<VisibilitySink>,
}

/// An intersection observer stand-in that records what was asked of it.
#[derive(Debug, Clone)]
pub struct MemoryVisibility {
    state: Rc<RefCell<VisibilityState>>,
}

impl MemoryVisibility {
    pub fn supported() -> Self {
        Self::build(true, PolyfillBehavior::Installs)
    }

    pub fn unsupported(polyfill: PolyfillBehavior) -> Self {
        Self::build(false, polyfill)
    }

    fn build(supported: bool, polyfill: PolyfillBehavior) -> Self {
        Self {
            state: Rc::new(RefCell::new(VisibilityState {
                supported,
                polyfill,
                polyfill_loads: 0,
                observe_calls: 0,
                disconnect_calls: 0,
                threshold: None,
                sink: None,
            })),
        }
    }

    pub fn polyfill_loads(&self) -> usize {
        self.state.borrow().polyfill_loads
    }

    pub fn observe_calls(&self) -> usize {
        self.state.borrow().observe_calls
    }

    pub fn disconnect_calls(&self) -> usize {
        self.state.borrow().disconnect_calls
    }

    /// Threshold of the running observation.
    pub fn threshold(&self) -> Option<f64> {
        self.state.borrow().threshold
    }

    /// Report the element crossing the threshold. Returns false if nothing
    /// is observing.
    pub fn cross(&self, visible: bool) -> bool {
        match self.state.borrow().sink.as_ref() {
            Some(sink) => sink.send(visible).is_ok(),
            None => false,
        }
    }
}

impl VisibilityHost for MemoryVisibility {
    fn is_supported(&self) -> bool {
        self.state.borrow().supported
    }

    fn observe(&mut self, threshold: f64, sink: VisibilitySink) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.supported {
            return Err(ViewportError::Unsupported("IntersectionObserver".to_string()));
        }
        state.observe_calls += 1;
        state.threshold = Some(threshold);
        state.sink = Some(sink);
        Ok(())
    }

    fn disconnect(&mut self) {
        let mut state = self.state.borrow_mut();
        state.disconnect_calls += 1;
        state.threshold = None;
        state.sink = None;
    }

    fn load_polyfill(&mut self) -> oneshot::Receiver<bool> {
        let (sender, receiver) = oneshot::channel();
        let mut state = self.state.borrow_mut();
        state.polyfill_loads += 1;
        let installed = state.polyfill == PolyfillBehavior::Installs;
        if installed {
            state.supported = true;
        }
        let _ = sender.send(installed);
        receiver
    }
}
