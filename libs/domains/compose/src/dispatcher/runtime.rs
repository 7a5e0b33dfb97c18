//! Seams between the dispatcher and the host environment.
//!
//! The dispatcher never touches a real browser or timer directly. A host shell
//! (webview bridge, desktop launcher, test harness) supplies these.

use futures::future::BoxFuture;
use std::time::Duration;
use tokio::sync::watch;

/// Source of timed suspension points.
pub trait Clock: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// [`Clock`] backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        Box::pin(tokio::time::sleep(duration))
    }
}

/// Page visibility as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// Subscription point for page-visibility changes.
///
/// Dropping the returned receiver unsubscribes.
pub trait VisibilitySource: Send + Sync {
    fn subscribe(&self) -> watch::Receiver<Visibility>;
}

/// Watch-channel visibility state that the host updates on every change.
#[derive(Debug)]
pub struct PageVisibility {
    tx: watch::Sender<Visibility>,
}

impl PageVisibility {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Visibility::Visible);
        Self { tx }
    }

    /// Record a visibility change. Subscribers see only actual transitions.
    pub fn set(&self, visibility: Visibility) {
        self.tx.send_if_modified(|current| {
            let changed = *current != visibility;
            *current = visibility;
            changed
        });
    }

    pub fn current(&self) -> Visibility {
        *self.tx.borrow()
    }
}

impl Default for PageVisibility {
    fn default() -> Self {
        Self::new()
    }
}

impl VisibilitySource for PageVisibility {
    fn subscribe(&self) -> watch::Receiver<Visibility> {
        self.tx.subscribe()
    }
}

/// Handle to a newly opened browsing context (tab or window).
pub trait BrowsingContext: Send {
    /// True when the context was closed immediately, as popup blockers do.
    fn is_closed(&self) -> bool;
}

/// Side-effecting navigation primitives of the host.
pub trait Navigator: Send + Sync {
    /// Navigate the current context. Fire-and-forget: deep links and
    /// `mailto:` hand off to the OS and report nothing back.
    fn navigate(&self, uri: &str);

    /// Open `uri` in a new context. `None` means the popup was blocked.
    fn open_window(&self, uri: &str) -> Option<Box<dyn BrowsingContext>>;
}

/// Resolve once the page goes hidden after subscription.
///
/// A dropped sender means no further changes can arrive, so this then stays
/// pending and the caller's timeout decides.
pub(crate) async fn wait_until_hidden(mut rx: watch::Receiver<Visibility>) {
    loop {
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
        if *rx.borrow_and_update() == Visibility::Hidden {
            return;
        }
    }
}
