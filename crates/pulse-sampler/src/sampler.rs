//! Concurrency sampler — counts in-progress jobs and publishes the count.
//!
//! One invocation walks every page of in-progress jobs, keeps only a
//! running count, and publishes exactly one metric point once the walk is
//! complete. A failed page discards the count; nothing is published for
//! that invocation and the next scheduled invocation takes a fresh sample.

use std::time::Duration;

use tracing::{debug, info, warn};

use pulse_core::{
    AlarmState, AlarmThreshold, JobLister, JobState, MetricPoint, MetricTarget, MetricsSink,
    PulseError, PulseResult, Sample,
};

use crate::pages::JobPages;

/// What one successful invocation published.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishResult {
    pub count: u64,
    pub pages: usize,
    pub point: MetricPoint,
    /// Local alarm evaluation, when a threshold is configured.
    pub alarm: Option<AlarmState>,
}

/// Samples in-progress jobs from `L` and publishes to `S`.
pub struct ConcurrencySampler<L, S> {
    lister: L,
    sink: S,
    alarm: Option<AlarmThreshold>,
}

impl<L: JobLister + Sync, S: MetricsSink> ConcurrencySampler<L, S> {
    pub fn new(lister: L, sink: S) -> Self {
        Self {
            lister,
            sink,
            alarm: None,
        }
    }

    /// Evaluate each published sample against `alarm` and log breaches.
    pub fn with_alarm(mut self, alarm: AlarmThreshold) -> Self {
        self.alarm = Some(alarm);
        self
    }

    /// Count in-progress jobs across all pages and publish one point.
    pub async fn sample_and_publish(&self, target: &MetricTarget) -> PulseResult<PublishResult> {
        target.validate()?;

        let (count, pages) = self.count_in_progress().await?;
        let sample = Sample::now(count);
        let point = MetricPoint::from_sample(target, &sample);

        self.sink.publish(std::slice::from_ref(&point)).await?;

        info!(
            namespace = %target.namespace,
            metric = %target.metric_name,
            count,
            pages,
            "published concurrent job count"
        );

        let alarm = self.alarm.as_ref().map(|alarm| {
            let state = alarm.evaluate(Some(count));
            if state == AlarmState::Breaching {
                warn!(
                    count,
                    threshold = alarm.threshold(),
                    quota = alarm.quota(),
                    "concurrent jobs at or above alarm threshold"
                );
            }
            state
        });

        Ok(PublishResult {
            count,
            pages,
            point,
            alarm,
        })
    }

    /// Like [`sample_and_publish`](Self::sample_and_publish), abandoned
    /// after `timeout`. An abandoned invocation publishes nothing.
    pub async fn sample_with_timeout(
        &self,
        target: &MetricTarget,
        timeout: Duration,
    ) -> PulseResult<PublishResult> {
        match tokio::time::timeout(timeout, self.sample_and_publish(target)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(?timeout, "sampling abandoned before completion");
                Err(PulseError::Timeout(timeout))
            }
        }
    }

    /// Stream every page and keep only the running total.
    async fn count_in_progress(&self) -> PulseResult<(u64, usize)> {
        let mut pages = JobPages::new(&self.lister, JobState::InProgress);
        let mut count: u64 = 0;

        while let Some(page) = pages.next_page().await {
            match page {
                Ok(page) => count += page.jobs.len() as u64,
                Err(e) => {
                    debug!(
                        pages_read = pages.pages_read(),
                        partial = count,
                        "listing failed; discarding partial count"
                    );
                    return Err(e);
                }
            }
        }

        Ok((count, pages.pages_read()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingSink, ScriptedLister};
    use pulse_core::{Dimensions, MetricUnit, Statistic};

    fn target() -> MetricTarget {
        let mut dims = Dimensions::new();
        dims.insert("Service".into(), "Transcribe".into());
        MetricTarget::new("TranscribeMonitoring", "ConcurrentTranscribeJobs", dims)
    }

    #[tokio::test]
    async fn count_is_independent_of_partitioning() {
        for sizes in [
            vec![7],
            vec![3, 4],
            vec![1, 1, 1, 1, 1, 1, 1],
            vec![0, 7, 0],
            vec![2, 0, 0, 5],
        ] {
            let lister = ScriptedLister::with_page_sizes(&sizes);
            let sink = RecordingSink::default();
            let sampler = ConcurrencySampler::new(&lister, &sink);

            let result = sampler.sample_and_publish(&target()).await.unwrap();
            assert_eq!(result.count, 7, "partition {sizes:?}");
            assert_eq!(result.pages, sizes.len());
            assert_eq!(sink.calls().len(), 1);
        }
    }

    #[tokio::test]
    async fn zero_jobs_still_publishes_once() {
        let lister = ScriptedLister::with_page_sizes(&[]);
        let sink = RecordingSink::default();
        let sampler = ConcurrencySampler::new(&lister, &sink);

        let result = sampler.sample_and_publish(&target()).await.unwrap();
        assert_eq!(result.count, 0);

        let calls = sink.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 1);
        let point = &calls[0][0];
        assert_eq!(point.value, 0.0);
        assert_eq!(point.unit, MetricUnit::Count);
        assert_eq!(point.statistic, Statistic::Maximum);
        assert_eq!(point.namespace, "TranscribeMonitoring");
        assert_eq!(point.metric_name, "ConcurrentTranscribeJobs");
    }

    #[tokio::test]
    async fn failure_on_any_page_publishes_nothing() {
        for failing_call in 0..3 {
            let lister = ScriptedLister::with_page_sizes(&[5, 5, 5]).fail_on_call(failing_call);
            let sink = RecordingSink::default();
            let sampler = ConcurrencySampler::new(&lister, &sink);

            let err = sampler.sample_and_publish(&target()).await.unwrap_err();
            assert!(matches!(err, PulseError::Listing(_)));
            assert!(sink.calls().is_empty(), "published after failure on call {failing_call}");
            // No internal retry: the walk stops at the failed call.
            assert_eq!(lister.calls(), failing_call + 1);
        }
    }

    #[tokio::test]
    async fn publish_failure_surfaces_without_retry() {
        let lister = ScriptedLister::with_page_sizes(&[2]);
        let sink = RecordingSink::failing();
        let sampler = ConcurrencySampler::new(&lister, &sink);

        let err = sampler.sample_and_publish(&target()).await.unwrap_err();
        assert!(matches!(err, PulseError::Publish(_)));
        assert_eq!(lister.calls(), 1);
    }

    #[tokio::test]
    async fn invalid_target_is_rejected_before_listing() {
        let lister = ScriptedLister::with_page_sizes(&[2]);
        let sink = RecordingSink::default();
        let sampler = ConcurrencySampler::new(&lister, &sink);

        let mut bad = target();
        bad.dimensions.clear();
        let err = sampler.sample_and_publish(&bad).await.unwrap_err();
        assert!(matches!(err, PulseError::InvalidInput(_)));
        assert_eq!(lister.calls(), 0);
        assert!(sink.calls().is_empty());
    }

    #[tokio::test]
    async fn repeated_invocations_are_independent() {
        let lister = ScriptedLister::with_page_sizes(&[1, 2]);
        let sink = RecordingSink::default();
        let sampler = ConcurrencySampler::new(&lister, &sink);

        sampler.sample_and_publish(&target()).await.unwrap();
        sampler.sample_and_publish(&target()).await.unwrap();
        assert_eq!(sink.calls().len(), 2);
        assert_eq!(lister.calls(), 4);
    }

    #[tokio::test]
    async fn alarm_state_reported() {
        let lister = ScriptedLister::with_page_sizes(&[50, 30]);
        let sink = RecordingSink::default();
        let sampler = ConcurrencySampler::new(&lister, &sink)
            .with_alarm(AlarmThreshold::new(100, 0.8).unwrap());

        let result = sampler.sample_and_publish(&target()).await.unwrap();
        assert_eq!(result.alarm, Some(AlarmState::Breaching));
    }

    struct StalledLister;

    impl JobLister for StalledLister {
        async fn list_jobs(
            &self,
            _state: JobState,
            _cursor: Option<&str>,
        ) -> PulseResult<pulse_core::JobPage> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(pulse_core::JobPage::default())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_abandons_without_publishing() {
        let sink = RecordingSink::default();
        let sampler = ConcurrencySampler::new(StalledLister, &sink);

        let err = sampler
            .sample_with_timeout(&target(), Duration::from_secs(60))
            .await
            .unwrap_err();
        assert!(matches!(err, PulseError::Timeout(d) if d == Duration::from_secs(60)));
        assert!(sink.calls().is_empty());
    }
}
