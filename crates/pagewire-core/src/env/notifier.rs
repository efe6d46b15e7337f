use serde::{Deserialize, Serialize};

use super::{Environment, Notifier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Granted,
    Denied,
    /// Not asked yet.
    Default,
}

/// Something the user was shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Notice {
    Notification { title: String, body: String },
    Alert { message: String },
}

/// Notifier that keeps everything it was asked to show.
#[derive(Debug, Clone)]
pub struct RecordingNotifier {
    permission: Permission,
    /// Answer given when permission is requested while still `Default`.
    grant_on_request: bool,
    notices: Vec<Notice>,
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::new(Permission::Default, true)
    }
}

impl RecordingNotifier {
    pub fn new(permission: Permission, grant_on_request: bool) -> Self {
        Self {
            permission,
            grant_on_request,
            notices: Vec::new(),
        }
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

impl Notifier for RecordingNotifier {
    fn permission(&self) -> Permission {
        self.permission
    }

    fn request_permission(&mut self) -> Permission {
        if self.permission == Permission::Default {
            self.permission = if self.grant_on_request {
                Permission::Granted
            } else {
                Permission::Denied
            };
        }
        self.permission
    }

    fn notify(&mut self, title: &str, body: &str) {
        self.notices.push(Notice::Notification {
            title: title.to_string(),
            body: body.to_string(),
        });
    }

    fn alert(&mut self, message: &str) {
        self.notices.push(Notice::Alert {
            message: message.to_string(),
        });
    }
}

/// Show a desktop notification when allowed (asking once if undecided),
/// then always raise an alert so the message is never lost.
pub fn announce(env: &mut dyn Environment, title: &str, body: &str) {
    let notifier = env.notifier_mut();
    let permission = match notifier.permission() {
        Permission::Default => notifier.request_permission(),
        other => other,
    };
    if permission == Permission::Granted {
        notifier.notify(title, body);
    } else {
        tracing::debug!(?permission, title, "notification suppressed");
    }
    notifier.alert(&format!("{title}\n{body}"));
}
