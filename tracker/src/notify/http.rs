use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::{CartNotification, NotificationSink};

pub const NOTIFY_PATH: &str = "/api/send-cart-notification";

/// Posts notifications to `{base}/api/send-cart-notification`.
///
/// Each dispatch runs on its own task. Failures are logged and never
/// retried, so a slow or dead relay cannot stall the tracker.
#[derive(Clone)]
pub struct HttpNotificationSink {
    http: Client,
    url: String,
}

impl HttpNotificationSink {
    pub fn new(base_url: &str) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .pool_idle_timeout(Duration::from_secs(30))
            .tcp_keepalive(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            url: format!("{}{}", base_url.trim_end_matches('/'), NOTIFY_PATH),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn post(&self, n: &CartNotification) -> Result<(), reqwest::Error> {
        self.http
            .post(&self.url)
            .json(n)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

impl NotificationSink for HttpNotificationSink {
    fn dispatch(&self, n: CartNotification) {
        let sink = self.clone();
        tokio::spawn(async move {
            match sink.post(&n).await {
                Ok(()) => debug!(event_id = %n.event_id, "cart notification delivered"),
                Err(e) => warn!(
                    event_id = %n.event_id,
                    url = %sink.url,
                    error = %e,
                    "cart notification failed"
                ),
            }
        });
    }
}
