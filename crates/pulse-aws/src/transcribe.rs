//! Amazon Transcribe adapter — job listing and call-analytics job starts.

use aws_sdk_transcribe::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_transcribe::types::{
    CallAnalyticsJobStatus, ChannelDefinition, Media, ParticipantRole, TranscriptionJobStatus,
};
use aws_sdk_transcribe::Client;
use tracing::debug;

use pulse_core::config::MAX_PAGE_SIZE;
use pulse_core::{
    JobHandle, JobLister, JobPage, JobRequest, JobState, JobSubmitter, JobSummary,
    PulseError, PulseResult, SubmitError,
};

/// Transcribe client implementing [`JobLister`] and [`JobSubmitter`].
#[derive(Clone)]
pub struct TranscribeClient {
    client: Client,
    page_size: i32,
}

impl TranscribeClient {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::from_client(Client::new(sdk_config))
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Results requested per listing page, clamped to the API maximum.
    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }
}

impl JobLister for TranscribeClient {
    async fn list_jobs(&self, state: JobState, cursor: Option<&str>) -> PulseResult<JobPage> {
        let output = self
            .client
            .list_transcription_jobs()
            .status(to_transcription_status(state))
            .max_results(self.page_size)
            .set_next_token(cursor.map(str::to_string))
            .send()
            .await
            .map_err(|e| PulseError::Listing(DisplayErrorContext(&e).to_string()))?;

        let jobs = output
            .transcription_job_summaries()
            .iter()
            .map(|summary| JobSummary {
                name: summary.transcription_job_name().unwrap_or_default().to_string(),
                state: summary
                    .transcription_job_status()
                    .and_then(from_transcription_status)
                    .unwrap_or(state),
            })
            .collect();

        Ok(JobPage {
            jobs,
            next_cursor: output.next_token().map(str::to_string),
        })
    }
}

impl JobSubmitter for TranscribeClient {
    async fn start_job(&self, request: &JobRequest) -> Result<JobHandle, SubmitError> {
        let output = self
            .client
            .start_call_analytics_job()
            .call_analytics_job_name(&request.job_name)
            .media(Media::builder().media_file_uri(&request.media_uri).build())
            .data_access_role_arn(&request.role_arn)
            .output_location(&request.output_location)
            .channel_definitions(
                ChannelDefinition::builder()
                    .channel_id(0)
                    .participant_role(ParticipantRole::Agent)
                    .build(),
            )
            .channel_definitions(
                ChannelDefinition::builder()
                    .channel_id(1)
                    .participant_role(ParticipantRole::Customer)
                    .build(),
            )
            .send()
            .await
            .map_err(submit_error)?;

        let state = output
            .call_analytics_job()
            .and_then(|job| job.call_analytics_job_status())
            .and_then(from_call_analytics_status)
            .unwrap_or(JobState::Queued);
        debug!(job = %request.job_name, %state, "call analytics job accepted");

        Ok(JobHandle {
            job_name: request.job_name.clone(),
            state,
        })
    }
}

/// Classify an SDK failure.
///
/// Service errors are classified by their error code. Requests that
/// never reached the service (timeouts, dispatch and response failures)
/// are retryable, except requests that could not be built at all.
pub(crate) fn submit_error<E, R>(err: SdkError<E, R>) -> SubmitError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    let message = DisplayErrorContext(&err).to_string();
    match &err {
        SdkError::ServiceError(service) => SubmitError::from_code(service.err().code(), message),
        SdkError::ConstructionFailure(_) => SubmitError::fatal("ConstructionFailure", message),
        _ => SubmitError::from_code(None, message),
    }
}

pub(crate) fn to_transcription_status(state: JobState) -> TranscriptionJobStatus {
    match state {
        JobState::Queued => TranscriptionJobStatus::Queued,
        JobState::InProgress => TranscriptionJobStatus::InProgress,
        JobState::Completed => TranscriptionJobStatus::Completed,
        JobState::Failed => TranscriptionJobStatus::Failed,
    }
}

pub(crate) fn from_transcription_status(status: &TranscriptionJobStatus) -> Option<JobState> {
    match status {
        TranscriptionJobStatus::Queued => Some(JobState::Queued),
        TranscriptionJobStatus::InProgress => Some(JobState::InProgress),
        TranscriptionJobStatus::Completed => Some(JobState::Completed),
        TranscriptionJobStatus::Failed => Some(JobState::Failed),
        _ => None,
    }
}

pub(crate) fn from_call_analytics_status(status: &CallAnalyticsJobStatus) -> Option<JobState> {
    match status {
        CallAnalyticsJobStatus::Queued => Some(JobState::Queued),
        CallAnalyticsJobStatus::InProgress => Some(JobState::InProgress),
        CallAnalyticsJobStatus::Completed => Some(JobState::Completed),
        CallAnalyticsJobStatus::Failed => Some(JobState::Failed),
        _ => None,
    }
}
