/// Progress events emitted while an ensemble is compared and clustered.
#[derive(Debug, Clone, PartialEq)]
pub enum Progress {
    PhaseStart { name: &'static str },
    PhaseFinish,

    /// A worker starts computing its share of `total_pairs` model pairs.
    PartitionStart { worker_id: usize, total_pairs: u64 },
    PairComputed { worker_id: usize },
    PartitionFinish { worker_id: usize },

    Message(String),
}

pub type ProgressCallback<'a> = Box<dyn Fn(Progress) + Send + Sync + 'a>;

/// Forwards progress events to an optional callback.
///
/// Shared by reference across rayon workers, so the callback must be `Send + Sync`.
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
        if self.callback.is_some() {
            self.report(Progress::Message(text.into()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn silent_reporter_ignores_events() {
        let reporter = ProgressReporter::new();
        reporter.report(Progress::PhaseFinish);
        reporter.message("nobody listens");
    }

    #[test]
    fn callback_receives_events_in_order() {
        let events = Mutex::new(Vec::new());
        {
            let reporter = ProgressReporter::with_callback(Box::new(|event| {
                events.lock().unwrap().push(event);
            }));
            reporter.report(Progress::PartitionStart {
                worker_id: 0,
                total_pairs: 3,
            });
            reporter.report(Progress::PairComputed { worker_id: 0 });
            reporter.message("done");
        }

        let events = events.into_inner().unwrap();
        assert_eq!(
            events,
            vec![
                Progress::PartitionStart {
                    worker_id: 0,
                    total_pairs: 3
                },
                Progress::PairComputed { worker_id: 0 },
                Progress::Message("done".to_string()),
            ]
        );
    }
}
