//! Scripted pages for dry runs and tests.
//!
//! A `PageFixture` describes what the ticket page renders and how it reacts to
//! submit. `FixtureSandbox` opens a fresh `ScriptedPage` per attempt, taking
//! the n-th fixture for the n-th attempt of an event (the last one repeats),
//! so retry sequences can be scripted.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use listing::TicketSection;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use session::EventTarget;
use tracing::debug;

use crate::error::PageError;
use crate::page::{Sandbox, TicketPage};

fn yes() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionFixture {
    pub name: String,
    /// Raw price text as rendered, e.g. `"$120.00"`.
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default = "yes")]
    pub available: bool,
}

/// What the page shows after add-to-cart is clicked. `after_polls` is the
/// number of verification polls that still see the old page.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum SubmitOutcome {
    Cart {
        url: String,
        #[serde(default)]
        after_polls: u32,
    },
    Error {
        message: String,
        #[serde(default)]
        after_polls: u32,
    },
    #[default]
    Nothing,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFixture {
    /// Initial URL; empty means the event URL of the attempt.
    #[serde(default)]
    pub url: String,
    #[serde(default = "yes")]
    pub selection_page: bool,
    #[serde(default)]
    pub sections: Vec<SectionFixture>,
    #[serde(default = "yes")]
    pub quantity_control: bool,
    #[serde(default = "yes")]
    pub submit_control: bool,
    #[serde(default)]
    pub after_submit: SubmitOutcome,
    /// When set, reading sections fails with this script error.
    #[serde(default)]
    pub broken: Option<String>,
}

impl Default for PageFixture {
    fn default() -> Self {
        Self {
            url: String::new(),
            selection_page: true,
            sections: Vec::new(),
            quantity_control: true,
            submit_control: true,
            after_submit: SubmitOutcome::Nothing,
            broken: None,
        }
    }
}

impl PageFixture {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Vec<PageFixture>> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read page fixture {}", path.display()))?;

        // A single fixture or a per-attempt list.
        if let Ok(list) = serde_json::from_str::<Vec<PageFixture>>(&raw) {
            return Ok(list);
        }
        let one: PageFixture = serde_json::from_str(&raw)
            .with_context(|| format!("invalid page fixture {}", path.display()))?;
        Ok(vec![one])
    }
}

/// What the driver did to a scripted page.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Interactions {
    pub clicked_section: Option<usize>,
    pub quantity: Option<u8>,
    pub submitted: bool,
}

#[derive(Debug)]
struct PageState {
    url: String,
    polls_since_submit: u32,
    closed: bool,
    interactions: Interactions,
}

pub struct ScriptedPage {
    fixture: PageFixture,
    state: Mutex<PageState>,
}

impl ScriptedPage {
    pub fn new(fixture: PageFixture, url: String) -> Self {
        Self {
            fixture,
            state: Mutex::new(PageState {
                url,
                polls_since_submit: 0,
                closed: false,
                interactions: Interactions::default(),
            }),
        }
    }

    pub fn interactions(&self) -> Interactions {
        self.state.lock().interactions.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn close(&self) {
        self.state.lock().closed = true;
    }

    fn open_state(&self) -> Result<parking_lot::MutexGuard<'_, PageState>, PageError> {
        let st = self.state.lock();
        if st.closed {
            return Err(PageError::Closed);
        }
        Ok(st)
    }

    fn outcome_ready(&self, st: &PageState) -> bool {
        if !st.interactions.submitted {
            return false;
        }
        let after = match &self.fixture.after_submit {
            SubmitOutcome::Cart { after_polls, .. } | SubmitOutcome::Error { after_polls, .. } => {
                *after_polls
            }
            SubmitOutcome::Nothing => return false,
        };
        st.polls_since_submit > after
    }
}

#[async_trait]
impl TicketPage for ScriptedPage {
    async fn current_url(&self) -> Result<String, PageError> {
        let mut st = self.open_state()?;

        if st.interactions.submitted {
            st.polls_since_submit += 1;
            if self.outcome_ready(&st) {
                if let SubmitOutcome::Cart { url, .. } = &self.fixture.after_submit {
                    st.url = url.clone();
                }
            }
        }

        Ok(st.url.clone())
    }

    async fn is_selection_page(&self) -> Result<bool, PageError> {
        self.open_state()?;
        Ok(self.fixture.selection_page)
    }

    async fn has_cart_summary(&self) -> Result<bool, PageError> {
        self.open_state()?;
        Ok(false)
    }

    async fn sections(&self) -> Result<Vec<TicketSection>, PageError> {
        self.open_state()?;
        if let Some(msg) = &self.fixture.broken {
            return Err(PageError::Script(msg.clone()));
        }

        Ok(self
            .fixture
            .sections
            .iter()
            .map(|s| TicketSection::from_rendered(&s.name, s.price.as_deref(), s.available))
            .collect())
    }

    async fn click_section(&self, index: usize) -> Result<(), PageError> {
        let mut st = self.open_state()?;
        if index >= self.fixture.sections.len() {
            return Err(PageError::Script(format!("no section at index {index}")));
        }
        st.interactions.clicked_section = Some(index);
        Ok(())
    }

    async fn set_quantity(&self, quantity: u8) -> Result<bool, PageError> {
        let mut st = self.open_state()?;
        if !self.fixture.quantity_control {
            return Ok(false);
        }
        st.interactions.quantity = Some(quantity);
        Ok(true)
    }

    async fn submit(&self) -> Result<bool, PageError> {
        let mut st = self.open_state()?;
        if !self.fixture.submit_control {
            return Ok(false);
        }
        st.interactions.submitted = true;
        Ok(true)
    }

    async fn error_message(&self) -> Result<Option<String>, PageError> {
        let st = self.open_state()?;
        match &self.fixture.after_submit {
            SubmitOutcome::Error { message, .. } if self.outcome_ready(&st) => {
                Ok(Some(message.clone()))
            }
            _ => Ok(None),
        }
    }
}

/// Opens scripted pages; records opens and closes per event.
pub struct FixtureSandbox {
    fixtures: Vec<PageFixture>,
    open_error: Option<PageError>,
    pages: Mutex<HashMap<String, Arc<ScriptedPage>>>,
    opens: Mutex<HashMap<String, usize>>,
    closed: Mutex<Vec<String>>,
}

impl FixtureSandbox {
    pub fn new(fixtures: Vec<PageFixture>) -> Self {
        Self {
            fixtures,
            open_error: None,
            pages: Mutex::new(HashMap::new()),
            opens: Mutex::new(HashMap::new()),
            closed: Mutex::new(Vec::new()),
        }
    }

    pub fn single(fixture: PageFixture) -> Self {
        Self::new(vec![fixture])
    }

    /// Every `open` fails with `err`.
    pub fn failing(err: PageError) -> Self {
        let mut s = Self::new(Vec::new());
        s.open_error = Some(err);
        s
    }

    pub fn opened(&self, event_id: &str) -> usize {
        self.opens.lock().get(event_id).copied().unwrap_or(0)
    }

    pub fn closed(&self) -> Vec<String> {
        self.closed.lock().clone()
    }

    /// The most recently opened page for `event_id`.
    pub fn page(&self, event_id: &str) -> Option<Arc<ScriptedPage>> {
        self.pages.lock().get(event_id).cloned()
    }
}

#[async_trait]
impl Sandbox for FixtureSandbox {
    async fn open(&self, target: &EventTarget) -> Result<Arc<dyn TicketPage>, PageError> {
        if let Some(err) = &self.open_error {
            return Err(err.clone());
        }

        let n = {
            let mut opens = self.opens.lock();
            let n = opens.entry(target.event_id.clone()).or_insert(0);
            *n += 1;
            *n
        };

        let Some(fixture) = self.fixtures.get(n - 1).or(self.fixtures.last()).cloned() else {
            return Err(PageError::Navigation("no page fixture loaded".into()));
        };

        let url = if fixture.url.is_empty() {
            target.event_url.clone()
        } else {
            fixture.url.clone()
        };

        debug!(event_id = %target.event_id, open = n, %url, "scripted page opened");

        let page = Arc::new(ScriptedPage::new(fixture, url));
        self.pages
            .lock()
            .insert(target.event_id.clone(), Arc::clone(&page));
        Ok(page)
    }

    async fn close(&self, event_id: &str) {
        if let Some(page) = self.pages.lock().get(event_id) {
            page.close();
        }
        self.closed.lock().push(event_id.to_string());
    }
}
