//! Forward ERROR-level log events to the operator channel.
//!
//! ```text
//! tracing::error!(...)
//!     ├─► fmt layer (stdout)
//!     └─► ErrorAlertLayer ─► tokio::spawn ─► BaseNotifier::notify
//! ```
//!
//! The layer is installed with the subscriber at startup, before the
//! notifier exists; `ErrorAlerts::attach` wires it up once `ServerDeps` is
//! built. Events logged before that are not forwarded.

use std::fmt::{self, Write as _};
use std::sync::{Arc, OnceLock};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::kernel::BaseNotifier;

/// Log target for notifier delivery failures. Events on this target are never
/// forwarded, so a failing channel cannot feed itself.
pub const NOTIFY_FAILURE_TARGET: &str = "notifier";

type NotifierSlot = Arc<OnceLock<Arc<dyn BaseNotifier>>>;

/// Tracing layer sending every ERROR event to the notifier, fire-and-forget.
pub struct ErrorAlertLayer {
    notifier: NotifierSlot,
}

/// Handle used to plug the notifier into an installed `ErrorAlertLayer`.
#[derive(Clone)]
pub struct ErrorAlerts {
    notifier: NotifierSlot,
}

impl ErrorAlertLayer {
    pub fn new() -> (Self, ErrorAlerts) {
        let notifier: NotifierSlot = Arc::new(OnceLock::new());
        (
            Self {
                notifier: notifier.clone(),
            },
            ErrorAlerts { notifier },
        )
    }
}

impl ErrorAlerts {
    /// Start forwarding to `notifier`. Only the first call takes effect.
    pub fn attach(&self, notifier: Arc<dyn BaseNotifier>) {
        let _ = self.notifier.set(notifier);
    }
}

impl<S: Subscriber> Layer<S> for ErrorAlertLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() != Level::ERROR || metadata.target() == NOTIFY_FAILURE_TARGET {
            return;
        }

        let Some(notifier) = self.notifier.get().cloned() else {
            return;
        };
        // Outside a runtime (e.g. after shutdown) there is nothing to send with
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return;
        };

        let mut visitor = AlertVisitor::default();
        event.record(&mut visitor);
        let text = format!(
            "[{}] Error:\n\n{}{}",
            metadata.target(),
            visitor.message,
            visitor.fields
        );

        runtime.spawn(async move {
            notifier.notify(&text).await;
        });
    }
}

#[derive(Default)]
struct AlertVisitor {
    message: String,
    fields: String,
}

impl AlertVisitor {
    fn push_field(&mut self, name: &str, value: fmt::Arguments<'_>) {
        let _ = write!(self.fields, "\n{}: {}", name, value);
    }
}

impl Visit for AlertVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push_field(field.name(), format_args!("{}", value));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        } else {
            self.push_field(field.name(), format_args!("{:?}", value));
        }
    }
}
