#![allow(dead_code)]

use std::sync::Arc;

use driver::fixture::{FixtureSandbox, PageFixture, SectionFixture, SubmitOutcome};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use session::store::memory::InMemoryPreferenceStore;
use session::{CartConfig, EventTarget};
use tracker::{
    BrowserNotice, BrowserSurface, CartNotification, CartTracker, NotificationSink,
    TrackerConfig, TrackerDeps, TrackerHandle,
};

pub const EVENT_ID: &str = "july-12";
pub const EVENT_URL: &str = "https://tickets.example/event/july-12";
pub const CART_URL: &str = "https://tickets.example/cart/abc";

#[derive(Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<CartNotification>>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().iter().map(|n| n.message.clone()).collect()
    }

    pub fn sent(&self) -> Vec<CartNotification> {
        self.sent.lock().clone()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.sent
            .lock()
            .iter()
            .filter(|n| n.message.contains(needle))
            .count()
    }
}

impl NotificationSink for RecordingSink {
    fn dispatch(&self, n: CartNotification) {
        self.sent.lock().push(n);
    }
}

#[derive(Default)]
pub struct RecordingSurface {
    notices: Mutex<Vec<BrowserNotice>>,
    opened: Mutex<Vec<String>>,
}

impl RecordingSurface {
    pub fn notices(&self) -> Vec<BrowserNotice> {
        self.notices.lock().clone()
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().clone()
    }
}

impl BrowserSurface for RecordingSurface {
    fn show(&self, notice: BrowserNotice) {
        self.notices.lock().push(notice);
    }

    fn open(&self, url: &str) {
        self.opened.lock().push(url.to_string());
    }
}

/// Everything a test needs to drive and inspect one tracker.
pub struct Harness {
    pub handle: TrackerHandle,
    pub sandbox: Arc<FixtureSandbox>,
    pub sink: Arc<RecordingSink>,
    pub surface: Arc<RecordingSurface>,
    pub store: Arc<InMemoryPreferenceStore>,
}

impl Harness {
    pub fn new(sandbox: FixtureSandbox, config: CartConfig) -> Self {
        Self::with_store(sandbox, config, Arc::new(InMemoryPreferenceStore::default()))
    }

    pub fn with_store(
        sandbox: FixtureSandbox,
        config: CartConfig,
        store: Arc<InMemoryPreferenceStore>,
    ) -> Self {
        let sandbox = Arc::new(sandbox);
        let sink = Arc::new(RecordingSink::default());
        let surface = Arc::new(RecordingSurface::default());

        let deps = TrackerDeps {
            sandbox: sandbox.clone(),
            sink: sink.clone(),
            surface: surface.clone(),
            store: store.clone(),
        };

        let handle = CartTracker::spawn(TrackerConfig::default(), config, deps);

        Self {
            handle,
            sandbox,
            sink,
            surface,
            store,
        }
    }

    pub fn deps(&self) -> TrackerDeps {
        TrackerDeps {
            sandbox: self.sandbox.clone(),
            sink: self.sink.clone(),
            surface: self.surface.clone(),
            store: self.store.clone(),
        }
    }
}

pub fn target() -> EventTarget {
    EventTarget::new(EVENT_ID, EVENT_URL, "July 12")
}

pub fn enabled(retries: u32) -> CartConfig {
    CartConfig {
        enabled: true,
        ticket_quantity: 2,
        max_price: Decimal::from(500),
        preferred_sections: vec!["floor".into()],
        fallback_to_any_section: true,
        auto_retry_attempts: retries,
        notifications: true,
    }
}

fn section(name: &str, price: &str) -> SectionFixture {
    SectionFixture {
        name: name.into(),
        price: Some(price.into()),
        available: true,
    }
}

/// Listing where the preferred section is over budget and the fallback
/// succeeds on the first verification poll.
pub fn carting_page() -> PageFixture {
    PageFixture {
        sections: vec![section("Floor", "$600"), section("Upper", "$200.00")],
        after_submit: SubmitOutcome::Cart {
            url: CART_URL.into(),
            after_polls: 0,
        },
        ..Default::default()
    }
}

/// Fails immediately with "No ticket sections found".
pub fn empty_page() -> PageFixture {
    PageFixture::default()
}

/// Submits, then never reaches the cart.
pub fn stuck_page() -> PageFixture {
    PageFixture {
        after_submit: SubmitOutcome::Nothing,
        ..carting_page()
    }
}

/// Picks a section, then finds no add-to-cart control (~1.5 s in).
pub fn no_submit_page() -> PageFixture {
    PageFixture {
        submit_control: false,
        ..carting_page()
    }
}
