use crate::screen::error::TriageError;
use tracing::error;

/// Where screens surface failed operations. Each failure is reported once.
pub trait Notifier: Send + Sync {
    fn notify(&self, failure: &TriageError);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, failure: &TriageError) {
        error!("{}", failure);
    }
}
