//! Cursor-driven page walker over a [`JobLister`].
//!
//! Pages are fetched one at a time, on demand, in the order the backend
//! returns them. Nothing is buffered beyond the page handed to the caller.

use tracing::debug;

use pulse_core::{JobLister, JobPage, JobState, PulseResult};

/// Where the walk stands.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Cursor {
    Start,
    Next(String),
    Done,
}

/// Lazy, restartable sequence of job pages for one status filter.
pub struct JobPages<L> {
    lister: L,
    state: JobState,
    cursor: Cursor,
    pages_read: usize,
}

impl<L: JobLister> JobPages<L> {
    pub fn new(lister: L, state: JobState) -> Self {
        Self {
            lister,
            state,
            cursor: Cursor::Start,
            pages_read: 0,
        }
    }

    /// Whether another page can be requested.
    pub fn has_more(&self) -> bool {
        self.cursor != Cursor::Done
    }

    /// Number of pages fetched since the walk (re)started.
    pub fn pages_read(&self) -> usize {
        self.pages_read
    }

    /// Fetch the next page, or `None` once the backend signalled the end.
    ///
    /// On error the cursor is left where it was, so the failed page can be
    /// requested again.
    pub async fn next_page(&mut self) -> Option<PulseResult<JobPage>> {
        let cursor = match &self.cursor {
            Cursor::Done => return None,
            Cursor::Start => None,
            Cursor::Next(token) => Some(token.as_str()),
        };

        let page = match self.lister.list_jobs(self.state, cursor).await {
            Ok(page) => page,
            Err(e) => return Some(Err(e)),
        };

        self.pages_read += 1;
        self.cursor = match page.continuation() {
            Some(token) => Cursor::Next(token.to_string()),
            None => Cursor::Done,
        };
        debug!(
            page = self.pages_read,
            jobs = page.jobs.len(),
            more = self.has_more(),
            "job page fetched"
        );

        Some(Ok(page))
    }

    /// Rewind to the first page.
    pub fn restart(&mut self) {
        self.cursor = Cursor::Start;
        self.pages_read = 0;
    }
}
