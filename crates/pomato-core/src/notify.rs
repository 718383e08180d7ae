//! Desktop notifications.
//!
//! Fire-and-forget: a failed notification is logged and the cycle carries on.

use notify_rust::Notification;

pub const APP_TITLE: &str = "Pomato";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyKind {
    /// A break is starting or a round is over.
    Start,
    /// A break has ended.
    End,
}

impl NotifyKind {
    fn sound(self) -> &'static str {
        #[cfg(target_os = "macos")]
        match self {
            NotifyKind::Start => "Blow",
            NotifyKind::End => "Bottle",
        }
        #[cfg(not(target_os = "macos"))]
        match self {
            NotifyKind::Start => "message-new-instant",
            NotifyKind::End => "complete",
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NotifyKind, title: &str, body: &str);
}

/// OS notification through notify-rust, shown off the async threads.
#[derive(Debug, Clone, Copy, Default)]
pub struct DesktopNotifier;

impl DesktopNotifier {
    fn show(kind: NotifyKind, title: &str, body: &str) {
        let result = Notification::new()
            .appname("pomato")
            .summary(title)
            .body(body)
            .sound_name(kind.sound())
            .show();
        match result {
            Ok(_) => tracing::debug!(?kind, body, "notification shown"),
            Err(e) => tracing::warn!("notify fail: {e}"),
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, kind: NotifyKind, title: &str, body: &str) {
        let (title, body) = (title.to_string(), body.to_string());
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || Self::show(kind, &title, &body));
            }
            Err(_) => Self::show(kind, &title, &body),
        }
    }
}
