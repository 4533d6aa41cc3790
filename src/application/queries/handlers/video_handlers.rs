//! Video Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::GenerativePlatformPort;
use crate::application::queries::{GetVideoStatus, ResolveFile};
use crate::domain::generation::{FileRef, TaskSnapshot};

/// GetVideoStatus Handler - 单次查询远端任务状态
pub struct GetVideoStatusHandler {
    platform: Arc<dyn GenerativePlatformPort>,
}

impl GetVideoStatusHandler {
    pub fn new(platform: Arc<dyn GenerativePlatformPort>) -> Self {
        Self { platform }
    }

    pub async fn handle(&self, query: GetVideoStatus) -> Result<TaskSnapshot, ApplicationError> {
        let task_id = query.task_id.trim();
        if task_id.is_empty() {
            return Err(ApplicationError::validation("Missing task_id parameter"));
        }
        let snapshot = self.platform.poll_video_task(task_id).await?;
        tracing::debug!(
            task_id = %task_id,
            status = %snapshot.status,
            progress = snapshot.progress.percent(),
            "Video status queried"
        );
        Ok(snapshot)
    }
}

/// ResolveFile Handler - 文件 ID 解析为下载地址
pub struct ResolveFileHandler {
    platform: Arc<dyn GenerativePlatformPort>,
}

impl ResolveFileHandler {
    pub fn new(platform: Arc<dyn GenerativePlatformPort>) -> Self {
        Self { platform }
    }

    pub async fn handle(&self, query: ResolveFile) -> Result<String, ApplicationError> {
        let file_id = query.file_id.trim();
        if file_id.is_empty() {
            return Err(ApplicationError::validation("Missing file_id parameter"));
        }
        Ok(self.platform.resolve_file(&FileRef::new(file_id)).await?)
    }
}
