//! End-to-end compose flow through the public API.

use domain_compose::{
    BrowsingContext, ComposeError, ComposeLauncher, DispatchOutcome, EmailParams, LinkBuilder,
    Navigator, PageVisibility, PlatformClass, TokioClock,
};
use std::sync::{Arc, Mutex};

const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";
const CHROME_WINDOWS_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Default)]
struct BlockingBrowser {
    visited: Mutex<Vec<String>>,
}

impl Navigator for BlockingBrowser {
    fn navigate(&self, uri: &str) {
        self.visited.lock().unwrap().push(uri.to_string());
    }

    fn open_window(&self, uri: &str) -> Option<Box<dyn BrowsingContext>> {
        self.visited.lock().unwrap().push(uri.to_string());
        None
    }
}

fn change_request() -> EmailParams {
    EmailParams::new("center@example.com")
        .with_subject("Schedule Change – Jane Doe")
        .with_body("Student: Jane Doe\nCurrent: Monday 3:00 PM\nRequested: Tuesday 4:00 PM")
}

#[test]
fn desktop_links_for_change_request() {
    let platform = PlatformClass::detect(CHROME_WINDOWS_UA);
    let links = LinkBuilder::new().build(&change_request(), platform).unwrap();

    assert_eq!(platform, PlatformClass::Desktop);
    assert!(links.gmail_app.is_none());
    assert!(
        links
            .gmail_web
            .as_deref()
            .unwrap()
            .contains("su=Schedule%20Change%20%E2%80%93%20Jane%20Doe")
    );
    assert!(links.mailto.starts_with("mailto:center%40example.com?subject="));
    assert!(links.outlook.is_some());
}

#[test]
fn links_serialize_camel_case_without_missing_variants() {
    let links = LinkBuilder::new()
        .build(&change_request(), PlatformClass::Desktop)
        .unwrap();
    let json = serde_json::to_value(&links).unwrap();

    assert!(json.get("gmailWeb").is_some());
    assert!(json.get("gmailApp").is_none());
}

#[test]
fn unusable_recipient_is_rejected() {
    let result = LinkBuilder::new().build(
        &EmailParams::new("a@example.com, b@example.com"),
        PlatformClass::Desktop,
    );
    assert!(matches!(result, Err(ComposeError::InvalidAddress(_))));
}

#[tokio::test(start_paused = true)]
async fn iphone_without_app_or_popups_ends_in_mailto() {
    let browser = Arc::new(BlockingBrowser::default());
    let launcher = ComposeLauncher::new(
        browser.clone(),
        Arc::new(TokioClock),
        Arc::new(PageVisibility::new()),
    );

    let report = launcher
        .dispatch(&change_request(), PlatformClass::detect(IPHONE_UA))
        .await
        .unwrap();

    assert_eq!(report.platform, PlatformClass::Ios);
    assert_eq!(report.outcome, DispatchOutcome::WebBlocked);

    let visited = browser.visited.lock().unwrap().clone();
    assert_eq!(visited.len(), 3);
    assert!(visited[0].starts_with("googlegmail://co?"));
    assert!(visited[1].starts_with("https://mail.google.com/"));
    assert!(visited[2].starts_with("mailto:"));
    assert!(!launcher.is_busy());
}
