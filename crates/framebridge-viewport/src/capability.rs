use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use crate::error::Result;

/// Visible fraction at which a visibility crossing is reported.
pub const DEFAULT_VISIBILITY_THRESHOLD: f64 = 0.5;

const REQUEST_NAMES: [&str; 4] = [
    "requestFullscreen",
    "requestFullScreen",
    "enterFullscreen",
    "enterFullScreen",
];
const REQUEST_SUFFIXES: [&str; 4] = [
    "RequestFullscreen",
    "RequestFullScreen",
    "EnterFullscreen",
    "EnterFullScreen",
];
const EXIT_NAMES: [&str; 4] = [
    "exitFullscreen",
    "exitFullScreen",
    "cancelFullscreen",
    "cancelFullScreen",
];
const EXIT_SUFFIXES: [&str; 4] = [
    "ExitFullscreen",
    "ExitFullScreen",
    "CancelFullscreen",
    "CancelFullScreen",
];
const VENDOR_PREFIXES: [&str; 5] = ["o", "ms", "moz", "webkit", "khtml"];

/// Where a fullscreen method is looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Entry methods live on the element being shown.
    Element,
    /// Exit methods live on the document.
    Document,
}

/// Result of invoking a native fullscreen method.
#[derive(Debug)]
pub enum NativeOutcome {
    /// No implementation was found, or invoking it threw.
    NotAccepted,
    /// The method completed synchronously.
    Settled,
    /// The method returned an awaitable; `true` is sent on success.
    Pending(oneshot::Receiver<bool>),
}

impl NativeOutcome {
    /// Returns true if an implementation was found and invoked.
    pub fn accepted(&self) -> bool {
        !matches!(self, NativeOutcome::NotAccepted)
    }
}

/// Browser surface the fullscreen half of the adapter probes.
pub trait FullscreenHost {
    /// Returns true if `name` is a callable method in `scope`.
    fn has_method(&self, scope: Scope, name: &str) -> bool;

    /// Invoke the method `name` in `scope`.
    fn invoke(&mut self, scope: Scope, name: &str) -> Result<NativeOutcome>;

    /// Returns true if any element is currently in real fullscreen.
    fn is_really_fullscreen(&self) -> bool;
}

/// Receives `true` when the watched element becomes visible past the
/// threshold and `false` when it drops below it.
pub type VisibilitySink = mpsc::UnboundedSender<bool>;

/// Browser surface the visibility half of the adapter drives.
pub trait VisibilityHost {
    /// Returns true if intersection observation is available.
    fn is_supported(&self) -> bool;

    /// Start observing the target element at `threshold`, reporting each
    /// crossing to `sink`.
    fn observe(&mut self, threshold: f64, sink: VisibilitySink) -> Result<()>;

    /// Stop any running observation and drop its sink.
    fn disconnect(&mut self);

    /// Start loading a polyfill; `true` is sent once it is installed.
    fn load_polyfill(&mut self) -> oneshot::Receiver<bool>;
}

/// Ordered method names probed for entering fullscreen.
pub fn request_candidates() -> Vec<String> {
    candidates(&REQUEST_NAMES, &REQUEST_SUFFIXES)
}

/// Ordered method names probed for leaving fullscreen.
pub fn exit_candidates() -> Vec<String> {
    candidates(&EXIT_NAMES, &EXIT_SUFFIXES)
}

fn candidates(names: &[&str], suffixes: &[&str]) -> Vec<String> {
    let mut out: Vec<String> = names.iter().map(|name| name.to_string()).collect();
    for prefix in VENDOR_PREFIXES {
        out.extend(suffixes.iter().map(|suffix| format!("{prefix}{suffix}")));
    }
    out
}

/// Resolves abstract fullscreen and visibility capabilities to whatever the
/// current browser implements.
pub struct CapabilityAdapter {
    fullscreen: Box<dyn FullscreenHost>,
    visibility: Option<Box<dyn VisibilityHost>>,
}

impl CapabilityAdapter {
    pub fn new(
        fullscreen: Box<dyn FullscreenHost>,
        visibility: Option<Box<dyn VisibilityHost>>,
    ) -> Self {
        Self {
            fullscreen,
            visibility,
        }
    }

    /// First entry method the browser implements, if any.
    pub fn resolve_request(&self) -> Option<String> {
        self.resolve(Scope::Element, request_candidates())
    }

    /// First exit method the browser implements, if any.
    pub fn resolve_exit(&self) -> Option<String> {
        self.resolve(Scope::Document, exit_candidates())
    }

    fn resolve(&self, scope: Scope, names: Vec<String>) -> Option<String> {
        names
            .into_iter()
            .find(|name| self.fullscreen.has_method(scope, name))
    }

    /// Ask the browser to show the target element fullscreen.
    pub fn request_fullscreen(&mut self) -> NativeOutcome {
        match self.resolve_request() {
            Some(name) => self.invoke(Scope::Element, &name),
            None => {
                debug!("no fullscreen request method available");
                NativeOutcome::NotAccepted
            }
        }
    }

    /// Ask the browser to leave fullscreen.
    pub fn exit_fullscreen(&mut self) -> NativeOutcome {
        match self.resolve_exit() {
            Some(name) => self.invoke(Scope::Document, &name),
            None => {
                debug!("no fullscreen exit method available");
                NativeOutcome::NotAccepted
            }
        }
    }

    fn invoke(&mut self, scope: Scope, name: &str) -> NativeOutcome {
        match self.fullscreen.invoke(scope, name) {
            Ok(outcome) => outcome,
            Err(err) => {
                debug!(method = name, error = %err, "fullscreen method threw");
                NativeOutcome::NotAccepted
            }
        }
    }

    /// Returns true if the browser reports real fullscreen.
    pub fn is_really_fullscreen(&self) -> bool {
        self.fullscreen.is_really_fullscreen()
    }

    /// (Re)start a visibility watch on the target element.
    ///
    /// Loads the polyfill first when observation is unavailable. Returns
    /// the stream of crossings, or `None` after logging a warning if
    /// observation cannot be set up. A previous stream ends when a new
    /// watch starts.
    pub async fn observe_visibility(
        &mut self,
        threshold: f64,
    ) -> Option<mpsc::UnboundedReceiver<bool>> {
        let Some(host) = self.visibility.as_mut() else {
            warn!("no visibility host configured");
            return None;
        };

        if !host.is_supported() {
            debug!("visibility observation unavailable, loading polyfill");
            let loaded = host.load_polyfill().await.unwrap_or(false);
            if !loaded || !host.is_supported() {
                warn!("visibility polyfill unavailable, not observing");
                return None;
            }
        }

        host.disconnect();
        let (sink, crossings) = mpsc::unbounded_channel();
        match host.observe(threshold, sink) {
            Ok(()) => Some(crossings),
            Err(err) => {
                warn!(error = %err, "failed to observe visibility");
                None
            }
        }
    }
}
