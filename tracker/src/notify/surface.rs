use tracing::info;

/// A desktop/browser notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserNotice {
    pub title: String,
    pub body: String,
    /// Opened when the notice is clicked.
    pub url: Option<String>,
}

impl BrowserNotice {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            url: None,
        }
    }

    pub fn linking(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// The user's local surface: notices and opening pages.
pub trait BrowserSurface: Send + Sync {
    fn show(&self, notice: BrowserNotice);
    fn open(&self, url: &str);
}

/// Logs notices and open requests. Used by the CLI.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSurface;

impl BrowserSurface for TracingSurface {
    fn show(&self, notice: BrowserNotice) {
        info!(
            target: "surface",
            title = %notice.title,
            body = %notice.body,
            url = notice.url.as_deref().unwrap_or(""),
            "notice"
        );
    }

    fn open(&self, url: &str) {
        info!(target: "surface", %url, "open page");
    }
}
