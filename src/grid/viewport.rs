//! Observable viewport geometry.
//!
//! Resize and scroll events are published through a [`Viewport`]. Interested
//! parties hold a [`ViewportObserver`]; dropping the observer is what
//! deregisters it, so a torn-down component can never be notified.

use tokio::sync::watch;

/// Viewport geometry in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewportState {
    /// Width, `None` until the host reports one
    pub width: Option<u32>,
    pub height: u32,
    pub scroll_y: u64,
}

impl ViewportState {
    pub fn new(width: Option<u32>, height: u32) -> Self {
        Self {
            width,
            height,
            scroll_y: 0,
        }
    }
}

/// Publisher of viewport changes
#[derive(Debug)]
pub struct Viewport {
    tx: watch::Sender<ViewportState>,
}

impl Viewport {
    pub fn new(initial: ViewportState) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    /// Current geometry
    pub fn state(&self) -> ViewportState {
        *self.tx.borrow()
    }

    /// Report a new size. Observers are only notified if it changed.
    pub fn resize(&self, width: Option<u32>, height: u32) {
        self.tx.send_if_modified(|state| {
            if state.width == width && state.height == height {
                return false;
            }
            state.width = width;
            state.height = height;
            true
        });
    }

    /// Report a new scroll position. Observers are only notified if it changed.
    pub fn scroll_to(&self, scroll_y: u64) {
        self.tx.send_if_modified(|state| {
            if state.scroll_y == scroll_y {
                return false;
            }
            state.scroll_y = scroll_y;
            true
        });
    }

    /// Register a new observer
    pub fn subscribe(&self) -> ViewportObserver {
        ViewportObserver {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live observers
    pub fn observer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

/// Handle receiving viewport changes; deregisters on drop
#[derive(Debug)]
pub struct ViewportObserver {
    rx: watch::Receiver<ViewportState>,
}

impl ViewportObserver {
    /// The latest state if it changed since the last call
    pub fn poll_change(&mut self) -> Option<ViewportState> {
        match self.rx.has_changed() {
            Ok(true) => Some(*self.rx.borrow_and_update()),
            _ => None,
        }
    }

    /// Wait for the next change; `None` once the viewport is gone
    pub async fn changed(&mut self) -> Option<ViewportState> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }

    /// Latest state without marking it seen
    pub fn current(&self) -> ViewportState {
        *self.rx.borrow()
    }
}
