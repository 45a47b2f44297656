//! Detail modal presentation.
//!
//! An open modal holds a [`ScrollLock`] on its host; the lock is a guard, so
//! the host's scrolling is restored on close, when the presenter is dropped,
//! and during unwinding.

use log::{debug, warn};
use std::borrow::Cow;

use crate::i18n::{message, Lang, Message};

/// Overflow value applied while a modal is open.
pub const LOCKED_OVERFLOW: &str = "hidden";

/// Something whose scrolling can be locked, typically the page body.
pub trait ScrollHost {
    fn overflow(&self) -> Option<String>;
    fn set_overflow(&self, value: Option<&str>);
}

/// Scroll lock held for as long as a modal is open.
pub struct ScrollLock<'h, H: ScrollHost + ?Sized> {
    host: &'h H,
    previous: Option<String>,
}

impl<'h, H: ScrollHost + ?Sized> ScrollLock<'h, H> {
    pub fn acquire(host: &'h H) -> Self {
        let previous = host.overflow();
        host.set_overflow(Some(LOCKED_OVERFLOW));
        debug!("Scroll locked (previous overflow: {:?})", previous);
        Self { host, previous }
    }
}

impl<H: ScrollHost + ?Sized> Drop for ScrollLock<'_, H> {
    fn drop(&mut self) {
        self.host.set_overflow(self.previous.as_deref());
        debug!("Scroll restored to {:?}", self.previous);
    }
}

/// Content handed to the platform share sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharePayload {
    pub title: String,
    pub text: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The user dismissed the share sheet or print dialog
    Cancelled,
    Unsupported,
    Failed(String),
}

/// Platform capabilities used by the modal.
pub trait Platform {
    fn share(&self, payload: &SharePayload) -> Result<(), PlatformError>;
    fn print(&self) -> Result<(), PlatformError>;
}

/// Long text that is collapsed to a character budget until expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandableText {
    text: String,
    budget: usize,
    expanded: bool,
}

impl ExpandableText {
    pub fn new(text: impl Into<String>, budget: usize) -> Self {
        Self {
            text: text.into(),
            budget,
            expanded: false,
        }
    }

    /// Whether the text is long enough to need a toggle at all.
    pub fn is_collapsible(&self) -> bool {
        self.text.chars().count() > self.budget
    }

    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn toggle(&mut self) {
        self.expanded = !self.expanded;
    }

    /// Collapsed text ends in a fade, shown here as an ellipsis.
    pub fn shows_fade(&self) -> bool {
        !self.expanded && self.is_collapsible()
    }

    pub fn visible(&self) -> Cow<'_, str> {
        if !self.shows_fade() {
            return Cow::Borrowed(&self.text);
        }
        let end = self
            .text
            .char_indices()
            .nth(self.budget)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len());
        Cow::Owned(format!("{}…", self.text[..end].trim_end()))
    }

    pub fn toggle_label(&self, lang: Lang) -> Option<&'static str> {
        if !self.is_collapsible() {
            return None;
        }
        Some(if self.expanded {
            message(Message::ShowLess, lang)
        } else {
            message(Message::ShowMore, lang)
        })
    }
}

struct OpenModal<'h, H: ScrollHost + ?Sized, T> {
    item: T,
    text: Option<ExpandableText>,
    _lock: ScrollLock<'h, H>,
}

/// Presents one item at a time over the page.
pub struct ModalPresenter<'h, H: ScrollHost + ?Sized, T> {
    host: &'h H,
    budget: usize,
    current: Option<OpenModal<'h, H, T>>,
}

impl<'h, H: ScrollHost + ?Sized, T> ModalPresenter<'h, H, T> {
    pub fn new(host: &'h H, budget: usize) -> Self {
        Self {
            host,
            budget,
            current: None,
        }
    }

    /// Show `item`, with `long_text` as its collapsible section.
    pub fn open(&mut self, item: T, long_text: Option<String>) {
        let text = long_text.map(|t| ExpandableText::new(t, self.budget));
        match &mut self.current {
            // Already locked: swap the content, keep the original lock
            Some(open) => {
                open.item = item;
                open.text = text;
            }
            None => {
                self.current = Some(OpenModal {
                    item,
                    text,
                    _lock: ScrollLock::acquire(self.host),
                });
            }
        }
    }

    pub fn close(&mut self) {
        self.current = None;
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn item(&self) -> Option<&T> {
        self.current.as_ref().map(|open| &open.item)
    }

    pub fn text(&self) -> Option<&ExpandableText> {
        self.current.as_ref().and_then(|open| open.text.as_ref())
    }

    pub fn toggle_text(&mut self) {
        if let Some(text) = self.current.as_mut().and_then(|open| open.text.as_mut()) {
            text.toggle();
        }
    }

    /// Share the open item. Cancellation and failures never reach the caller.
    pub fn share<P: Platform + ?Sized>(&self, platform: &P, payload: &SharePayload) -> bool {
        if !self.is_open() {
            return false;
        }
        best_effort("share", platform.share(payload))
    }

    pub fn print<P: Platform + ?Sized>(&self, platform: &P) -> bool {
        if !self.is_open() {
            return false;
        }
        best_effort("print", platform.print())
    }
}

fn best_effort(action: &str, result: Result<(), PlatformError>) -> bool {
    match result {
        Ok(()) => true,
        Err(PlatformError::Cancelled) => {
            debug!("{} cancelled by user", action);
            false
        }
        Err(e) => {
            warn!("{} failed: {:?}", action, e);
            false
        }
    }
}
