//! Application state management.

use domain_compose::LinkBuilder;
use domain_notifications::DeliveryService;
use std::sync::Arc;

/// Shared application state.
///
/// Cloned into every router; all fields are cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Renders and delivers server-originated email
    pub delivery: Arc<DeliveryService>,
    /// Builds prefilled compose links for browser clients
    pub links: LinkBuilder,
    /// Recipient used when a schedule change request names none
    pub center_email: Option<String>,
}

impl AppState {
    pub fn new(delivery: DeliveryService, center_email: Option<String>) -> Self {
        Self {
            delivery: Arc::new(delivery),
            links: LinkBuilder::new(),
            center_email,
        }
    }
}
