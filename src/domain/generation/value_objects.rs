//! Generation Context - Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::GenerationError;

/// 远程文件引用（不透明标识）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileRef(String);

impl FileRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 任务状态
///
/// 状态机: pending -> running -> {completed | failed}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// 映射远程平台返回的状态字符串
    ///
    /// 平台原生状态（Preparing/Queueing/Processing/Success/Fail）与
    /// 代理层归一化后的状态（pending/running/completed/failed）都接受
    pub fn from_remote(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "pending" | "preparing" | "queueing" | "queued" => Some(TaskStatus::Pending),
            "running" | "processing" => Some(TaskStatus::Running),
            "completed" | "success" => Some(TaskStatus::Completed),
            "failed" | "fail" => Some(TaskStatus::Failed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// 检查状态迁移是否合法
    ///
    /// 终态不可迁出；非终态可以停留或前进（首次轮询可能直接观察到 running）
    pub fn can_transition_to(&self, next: TaskStatus) -> bool {
        match (self, next) {
            (TaskStatus::Completed, _) | (TaskStatus::Failed, _) => false,
            (TaskStatus::Running, TaskStatus::Pending) => false,
            _ => true,
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 进度百分比 [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Progress(u8);

impl Progress {
    pub const DONE: Progress = Progress(100);

    /// 超出范围的值被截断到 [0, 100]
    pub fn new(percent: i64) -> Self {
        Self(percent.clamp(0, 100) as u8)
    }

    pub fn percent(&self) -> u8 {
        self.0
    }
}

/// 单次轮询的结果快照
#[derive(Debug, Clone, PartialEq)]
pub struct TaskSnapshot {
    pub status: TaskStatus,
    pub progress: Progress,
    pub file_ref: Option<FileRef>,
}

impl TaskSnapshot {
    pub fn new(status: TaskStatus, progress: Progress, file_ref: Option<FileRef>) -> Self {
        // 完成但未上报进度时视为 100%
        let progress = if status == TaskStatus::Completed && progress.percent() == 0 {
            Progress::DONE
        } else {
            progress
        };
        Self {
            status,
            progress,
            file_ref,
        }
    }

    /// 面向用户的状态描述
    pub fn status_line(&self) -> String {
        match self.status {
            TaskStatus::Pending => format!("Waiting in queue... {}%", self.progress.percent()),
            TaskStatus::Running => format!("Generating video... {}%", self.progress.percent()),
            TaskStatus::Completed => "Video generated successfully!".to_string(),
            TaskStatus::Failed => "Video generation failed".to_string(),
        }
    }
}

/// 视频模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum VideoModel {
    /// 文生视频
    #[default]
    #[serde(rename = "video-01")]
    Video01,
    /// 图生视频，需要首帧
    #[serde(rename = "I2V-01")]
    I2V01,
    /// 主体参考视频，需要主体参考图
    #[serde(rename = "S2V-01")]
    S2V01,
}

impl VideoModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoModel::Video01 => "video-01",
            VideoModel::I2V01 => "I2V-01",
            VideoModel::S2V01 => "S2V-01",
        }
    }

    pub fn requires_first_frame(&self) -> bool {
        matches!(self, VideoModel::I2V01)
    }

    pub fn requires_subject_reference(&self) -> bool {
        matches!(self, VideoModel::S2V01)
    }

    /// 检查提交所需的输入是否齐全（上传参考图之前即可调用）
    pub fn check_inputs(
        &self,
        prompt: &str,
        has_first_frame: bool,
        has_subject_reference: bool,
    ) -> Result<(), GenerationError> {
        if prompt.trim().is_empty() {
            return Err(GenerationError::EmptyPrompt);
        }
        if self.requires_first_frame() && !has_first_frame {
            return Err(GenerationError::MissingReference {
                model: self.as_str(),
                reference: "first frame",
            });
        }
        if self.requires_subject_reference() && !has_subject_reference {
            return Err(GenerationError::MissingReference {
                model: self.as_str(),
                reference: "subject",
            });
        }
        Ok(())
    }
}

impl FromStr for VideoModel {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "video-01" => Ok(VideoModel::Video01),
            "I2V-01" => Ok(VideoModel::I2V01),
            "S2V-01" => Ok(VideoModel::S2V01),
            other => Err(GenerationError::UnknownModel(other.to_string())),
        }
    }
}

impl fmt::Display for VideoModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 视频生成请求
///
/// 不变量:
/// - prompt 去除首尾空白后非空
/// - I2V-01 必须带首帧，S2V-01 必须带主体参考
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRequest {
    pub model: VideoModel,
    pub prompt: String,
    pub prompt_optimizer: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_frame_image: Option<FileRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_reference: Option<FileRef>,
}

impl VideoRequest {
    pub fn new(
        model: VideoModel,
        prompt: impl Into<String>,
        prompt_optimizer: bool,
        first_frame_image: Option<FileRef>,
        subject_reference: Option<FileRef>,
    ) -> Result<Self, GenerationError> {
        let request = Self {
            model,
            prompt: prompt.into().trim().to_string(),
            prompt_optimizer,
            first_frame_image,
            subject_reference,
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), GenerationError> {
        self.model.check_inputs(
            &self.prompt,
            self.first_frame_image.is_some(),
            self.subject_reference.is_some(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_status_mapping() {
        assert_eq!(TaskStatus::from_remote("Queueing"), Some(TaskStatus::Pending));
        assert_eq!(TaskStatus::from_remote("Processing"), Some(TaskStatus::Running));
        assert_eq!(TaskStatus::from_remote("Success"), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::from_remote("Fail"), Some(TaskStatus::Failed));
        assert_eq!(TaskStatus::from_remote("completed"), Some(TaskStatus::Completed));
        assert_eq!(TaskStatus::from_remote("bogus"), None);
    }

    #[test]
    fn test_terminal_states_cannot_transition() {
        assert!(!TaskStatus::Completed.can_transition_to(TaskStatus::Running));
        assert!(!TaskStatus::Failed.can_transition_to(TaskStatus::Completed));
        assert!(!TaskStatus::Running.can_transition_to(TaskStatus::Pending));
        assert!(TaskStatus::Pending.can_transition_to(TaskStatus::Completed));
        assert!(TaskStatus::Running.can_transition_to(TaskStatus::Running));
    }

    #[test]
    fn test_completed_snapshot_without_progress_reports_done() {
        let snapshot = TaskSnapshot::new(TaskStatus::Completed, Progress::new(0), None);
        assert_eq!(snapshot.progress, Progress::DONE);
    }

    #[test]
    fn test_progress_is_clamped() {
        assert_eq!(Progress::new(150).percent(), 100);
        assert_eq!(Progress::new(-3).percent(), 0);
    }

    #[test]
    fn test_video_request_requires_prompt() {
        let result = VideoRequest::new(VideoModel::Video01, "   ", true, None, None);
        assert_eq!(result, Err(GenerationError::EmptyPrompt));
    }

    #[test]
    fn test_subject_model_requires_reference() {
        let result = VideoRequest::new(VideoModel::S2V01, "a cat", true, None, None);
        assert!(matches!(result, Err(GenerationError::MissingReference { .. })));

        let result = VideoRequest::new(
            VideoModel::S2V01,
            "a cat",
            true,
            None,
            Some(FileRef::new("ref-1")),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_video_model_wire_names() {
        assert_eq!("S2V-01".parse::<VideoModel>().unwrap(), VideoModel::S2V01);
        assert_eq!(
            serde_json::to_string(&VideoModel::I2V01).unwrap(),
            "\"I2V-01\""
        );
        assert!("v2".parse::<VideoModel>().is_err());
    }
}
