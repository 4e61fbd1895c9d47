/// Progress events emitted by the sampling and quality-control workflows.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    TaskStart { total_steps: u64 },
    TaskIncrement,
    TaskFinish,

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards [`Progress`] events to an optional callback.
///
/// A reporter without a callback silently drops every event, so library code
/// can report unconditionally.
#[derive(Default)]
pub struct ProgressReporter<'a> {
    callback: Option<ProgressCallback<'a>>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback<'a>) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: Progress) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    pub fn message(&self, text: impl Into<String>) {
        self.report(Progress::Message(text.into()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn reporter_without_callback_drops_events() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::TaskIncrement);
        reporter.message("ignored");
    }

    #[test]
    fn reporter_forwards_events_in_order() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |event| {
            sink.lock().unwrap().push(event);
        }));

        reporter.report(Progress::PhaseStart { name: "QC" });
        reporter.message("hello");
        reporter.report(Progress::PhaseFinish);

        let events = events.lock().unwrap();
        assert_eq!(
            *events,
            vec![
                Progress::PhaseStart { name: "QC" },
                Progress::Message("hello".to_string()),
                Progress::PhaseFinish,
            ]
        );
    }
}
