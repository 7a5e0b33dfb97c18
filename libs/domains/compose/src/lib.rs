//! Compose Domain
//!
//! Builds pre-filled email compose links and opens the best one available on
//! the current device.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │   EmailParams   │  ← to / cc / bcc / subject / body
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │    sanitize     │  ← validate recipient, truncate once
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │   LinkBuilder   │  ← mailto, Gmail web, Gmail app, Outlook
//! └────────┬────────┘
//!          │
//! ┌────────▼────────┐
//! │ ComposeLauncher │  ← native app → web compose → mailto
//! └─────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_compose::{ComposeLauncher, EmailParams, PlatformClass, TokioClock};
//!
//! let launcher = ComposeLauncher::new(navigator, Arc::new(TokioClock), visibility);
//! let params = EmailParams::new("center@example.com").with_subject("Schedule Change");
//!
//! let report = launcher
//!     .dispatch(&params, PlatformClass::detect(user_agent))
//!     .await?;
//! ```

pub mod dispatcher;
pub mod error;
pub mod links;
pub mod models;
pub mod platform;
pub mod sanitize;

// Re-export commonly used types
pub use dispatcher::{
    ActiveDispatch, BrowsingContext, Clock, ComposeLauncher, DispatchOutcome, DispatchReport,
    DispatchState, Navigator, PageVisibility, TokioClock, Visibility, VisibilitySource,
};
pub use error::{ComposeError, ComposeResult};
pub use links::LinkBuilder;
pub use models::{EmailLinks, EmailParams};
pub use platform::PlatformClass;
pub use sanitize::{ContentLimits, SanitizedEmail};
