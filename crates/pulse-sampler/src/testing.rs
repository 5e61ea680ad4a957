//! In-memory fakes of the listing and metrics ports.

use std::sync::Mutex;

use pulse_core::{
    JobLister, JobPage, JobState, JobSummary, MetricPoint, MetricsSink, PulseError, PulseResult,
};

/// Serves a fixed sequence of pages, keyed by call order.
pub struct ScriptedLister {
    page_sizes: Vec<usize>,
    fail_on_call: Option<usize>,
    cursors: Mutex<Vec<Option<String>>>,
    states: Mutex<Vec<JobState>>,
}

impl ScriptedLister {
    pub fn with_page_sizes(sizes: &[usize]) -> Self {
        Self {
            page_sizes: sizes.to_vec(),
            fail_on_call: None,
            cursors: Mutex::new(Vec::new()),
            states: Mutex::new(Vec::new()),
        }
    }

    /// Make the `call`-th request (0-based) fail.
    pub fn fail_on_call(mut self, call: usize) -> Self {
        self.fail_on_call = Some(call);
        self
    }

    pub fn calls(&self) -> usize {
        self.cursors.lock().unwrap().len()
    }

    pub fn cursors_seen(&self) -> Vec<Option<String>> {
        self.cursors.lock().unwrap().clone()
    }

    pub fn states_seen(&self) -> Vec<JobState> {
        self.states.lock().unwrap().clone()
    }
}

impl JobLister for ScriptedLister {
    async fn list_jobs(&self, state: JobState, cursor: Option<&str>) -> PulseResult<JobPage> {
        let call = {
            let mut cursors = self.cursors.lock().unwrap();
            cursors.push(cursor.map(str::to_string));
            cursors.len() - 1
        };
        self.states.lock().unwrap().push(state);

        if self.fail_on_call == Some(call) {
            return Err(PulseError::Listing(format!("throttled on call {call}")));
        }

        let index = match cursor {
            None => 0,
            Some(token) => token
                .strip_prefix("page-")
                .and_then(|n| n.parse::<usize>().ok())
                .ok_or_else(|| PulseError::Listing(format!("bad cursor {token}")))?,
        };
        let size = self.page_sizes.get(index).copied().unwrap_or(0);
        let jobs = (0..size)
            .map(|j| JobSummary {
                name: format!("job-{index}-{j}"),
                state,
            })
            .collect();
        let next_cursor = (index + 1 < self.page_sizes.len()).then(|| format!("page-{}", index + 1));

        Ok(JobPage { jobs, next_cursor })
    }
}

/// Records every publish call.
#[derive(Default)]
pub struct RecordingSink {
    published: Mutex<Vec<Vec<MetricPoint>>>,
    fail: bool,
}

impl RecordingSink {
    pub fn failing() -> Self {
        Self {
            published: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<Vec<MetricPoint>> {
        self.published.lock().unwrap().clone()
    }
}

impl MetricsSink for RecordingSink {
    async fn publish(&self, points: &[MetricPoint]) -> PulseResult<()> {
        if self.fail {
            return Err(PulseError::Publish("metrics backend unavailable".into()));
        }
        self.published.lock().unwrap().push(points.to_vec());
        Ok(())
    }
}
