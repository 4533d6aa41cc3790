//! Video Command Handlers

use std::sync::Arc;

use crate::application::commands::{SubmitVideo, SubmitVideoResponse};
use crate::application::error::ApplicationError;
use crate::application::ports::GenerativePlatformPort;
use crate::domain::generation::VideoRequest;

/// SubmitVideo Handler
pub struct SubmitVideoHandler {
    platform: Arc<dyn GenerativePlatformPort>,
}

impl SubmitVideoHandler {
    pub fn new(platform: Arc<dyn GenerativePlatformPort>) -> Self {
        Self { platform }
    }

    pub async fn handle(&self, command: SubmitVideo) -> Result<SubmitVideoResponse, ApplicationError> {
        let request = VideoRequest::new(
            command.model,
            command.prompt,
            command.prompt_optimizer,
            command.first_frame_image,
            command.subject_reference,
        )?;

        let task_id = self.platform.submit_video_task(&request).await?;

        tracing::info!(
            task_id = %task_id,
            model = %request.model,
            "Video task submitted"
        );

        Ok(SubmitVideoResponse { task_id })
    }
}
