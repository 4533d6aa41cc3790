//! Video Commands

use crate::domain::generation::{FileRef, VideoModel};

/// 提交视频生成任务命令
#[derive(Debug, Clone)]
pub struct SubmitVideo {
    pub model: VideoModel,
    pub prompt: String,
    pub prompt_optimizer: bool,
    pub first_frame_image: Option<FileRef>,
    pub subject_reference: Option<FileRef>,
}

/// 提交响应
#[derive(Debug, Clone)]
pub struct SubmitVideoResponse {
    pub task_id: String,
}
