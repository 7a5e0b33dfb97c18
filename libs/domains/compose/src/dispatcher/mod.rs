//! Client-side compose dispatcher.
//!
//! Opens the best available compose surface, degrading through channels:
//!
//! ```text
//! Idle ─► AttemptingNative ─► AwaitingNativeResult ─┬─► Done            (page hidden: app opened)
//!  │           (mobile only)                          └─► AttemptingWeb  (timeout)
//!  └──────────────────────────────────────────────────────► AttemptingWeb ─┬─► Done (window opened)
//!                                                                            └─► AttemptingMailto ─► Done
//! ```
//!
//! There is no error state. The only failure reported to the caller is a
//! recipient from which not even a `mailto:` link can be built.
//!
//! "App opened" is inferred from the page going hidden before the timeout.
//! A user switching tabs inside that window produces a false positive; no
//! cross-platform signal confirms a deep-link launch, so this stays a
//! documented limitation of the heuristic.

mod runtime;


pub use runtime::{
    BrowsingContext, Clock, Navigator, PageVisibility, TokioClock, Visibility, VisibilitySource,
};

use crate::error::ComposeResult;
use crate::links::LinkBuilder;
use crate::models::{EmailLinks, EmailParams};
use crate::platform::PlatformClass;
use runtime::wait_until_hidden;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use strum::Display;
use tracing::{debug, info};

/// How long a deep link gets to take the page away before falling back.
///
/// Empirical app-launch latency; deliberately not caller-configurable.
pub const NATIVE_LAUNCH_TIMEOUT: Duration = Duration::from_millis(600);

/// Dispatcher state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum DispatchState {
    Idle,
    AttemptingNative,
    AwaitingNativeResult,
    AttemptingWeb,
    AttemptingMailto,
    Done,
}

/// Result of one dispatch call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum DispatchOutcome {
    /// Deep link issued and the page went hidden before the timeout.
    AppLaunchAttempted,
    /// Web compose opened in a new context.
    WebOpened,
    /// Web compose was blocked; the `mailto:` link was navigated instead.
    WebBlocked,
    /// No web compose link was available; the `mailto:` link was navigated.
    MailtoFallback,
    /// Another dispatch was in flight; nothing was done.
    AlreadyInProgress,
}

/// What a dispatch did, including every state it passed through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchReport {
    pub outcome: DispatchOutcome,
    pub platform: PlatformClass,
    pub trace: Vec<DispatchState>,
}

/// Process-wide "a dispatch is in flight" handle.
///
/// Clones share the flag, so every launcher built from the same handle is
/// mutually exclusive.
#[derive(Debug, Clone, Default)]
pub struct ActiveDispatch {
    busy: Arc<AtomicBool>,
}

impl ActiveDispatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    fn try_acquire(&self) -> Option<DispatchGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .ok()
            .map(|_| DispatchGuard {
                busy: Arc::clone(&self.busy),
            })
    }
}

/// Clears the busy flag when dropped, including when the dispatch future is
/// dropped mid-flight.
#[derive(Debug)]
struct DispatchGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for DispatchGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::SeqCst);
    }
}

/// Shared entry point. Construct once and reuse for every user action.
#[derive(Clone)]
pub struct ComposeLauncher {
    links: LinkBuilder,
    navigator: Arc<dyn Navigator>,
    clock: Arc<dyn Clock>,
    visibility: Arc<dyn VisibilitySource>,
    active: ActiveDispatch,
}

impl ComposeLauncher {
    pub fn new(
        navigator: Arc<dyn Navigator>,
        clock: Arc<dyn Clock>,
        visibility: Arc<dyn VisibilitySource>,
    ) -> Self {
        Self {
            links: LinkBuilder::default(),
            navigator,
            clock,
            visibility,
            active: ActiveDispatch::new(),
        }
    }

    pub fn with_link_builder(mut self, links: LinkBuilder) -> Self {
        self.links = links;
        self
    }

    /// Share the in-flight flag with other launchers.
    pub fn with_active_handle(mut self, active: ActiveDispatch) -> Self {
        self.active = active;
        self
    }

    pub fn is_busy(&self) -> bool {
        self.active.is_busy()
    }

    /// Open the best compose surface for `params` on `platform`.
    ///
    /// Returns `AlreadyInProgress` without side effects when another dispatch
    /// holds the flag. Errors only when the recipient is unusable.
    pub async fn dispatch(
        &self,
        params: &EmailParams,
        platform: PlatformClass,
    ) -> ComposeResult<DispatchReport> {
        let Some(guard) = self.active.try_acquire() else {
            info!(%platform, "Compose dispatch already in progress, ignoring");
            return Ok(DispatchReport {
                outcome: DispatchOutcome::AlreadyInProgress,
                platform,
                trace: vec![DispatchState::Idle, DispatchState::Done],
            });
        };

        let links = self.links.build(params, platform)?;

        let mut run = DispatchRun::new(platform, guard);
        let outcome = run.drive(self, &links).await;
        Ok(run.finish(outcome))
    }
}

/// Per-call state machine. Owns the guard until the terminal transition.
struct DispatchRun {
    platform: PlatformClass,
    state: DispatchState,
    trace: Vec<DispatchState>,
    guard: Option<DispatchGuard>,
}

impl DispatchRun {
    fn new(platform: PlatformClass, guard: DispatchGuard) -> Self {
        Self {
            platform,
            state: DispatchState::Idle,
            trace: vec![DispatchState::Idle],
            guard: Some(guard),
        }
    }

    fn transition(&mut self, next: DispatchState) {
        debug!(from = %self.state, to = %next, "Dispatch transition");
        self.state = next;
        self.trace.push(next);
        if next == DispatchState::Done {
            self.guard.take();
        }
    }

    async fn drive(&mut self, launcher: &ComposeLauncher, links: &EmailLinks) -> DispatchOutcome {
        if self.platform.is_mobile() {
            if let Some(app) = links.gmail_app.as_deref() {
                if self.try_native(launcher, app).await {
                    return DispatchOutcome::AppLaunchAttempted;
                }
            }
        }
        self.try_web(launcher, links)
    }

    /// Race the page going hidden against [`NATIVE_LAUNCH_TIMEOUT`].
    async fn try_native(&mut self, launcher: &ComposeLauncher, uri: &str) -> bool {
        self.transition(DispatchState::AttemptingNative);

        // Subscribe first so a hide triggered synchronously by navigation is seen.
        let visibility = launcher.visibility.subscribe();
        launcher.navigator.navigate(uri);
        self.transition(DispatchState::AwaitingNativeResult);

        // The losing branch, and with it the subscription, is dropped here.
        tokio::select! {
            biased;
            _ = wait_until_hidden(visibility) => true,
            _ = launcher.clock.sleep(NATIVE_LAUNCH_TIMEOUT) => {
                debug!("Native app did not take focus before timeout");
                false
            }
        }
    }

    fn try_web(&mut self, launcher: &ComposeLauncher, links: &EmailLinks) -> DispatchOutcome {
        let Some(web) = links.gmail_web.as_deref() else {
            self.open_mailto(launcher, links);
            return DispatchOutcome::MailtoFallback;
        };

        self.transition(DispatchState::AttemptingWeb);
        match launcher.navigator.open_window(web) {
            Some(context) if !context.is_closed() => DispatchOutcome::WebOpened,
            _ => {
                debug!("Web compose blocked, falling back to mailto");
                self.open_mailto(launcher, links);
                DispatchOutcome::WebBlocked
            }
        }
    }

    fn open_mailto(&mut self, launcher: &ComposeLauncher, links: &EmailLinks) {
        self.transition(DispatchState::AttemptingMailto);
        launcher.navigator.navigate(&links.mailto);
    }

    fn finish(mut self, outcome: DispatchOutcome) -> DispatchReport {
        self.transition(DispatchState::Done);
        info!(platform = %self.platform, %outcome, steps = self.trace.len(), "Compose dispatch finished");

        DispatchReport {
            outcome,
            platform: self.platform,
            trace: std::mem::take(&mut self.trace),
        }
    }
}
