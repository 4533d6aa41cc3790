//! Studio Event Port - 进度与播放事件
//!
//! 轮询器与播放器通过此端口同步上报状态，UI 侧订阅展示

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::generation::TaskStatus;

/// 工作室事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum StudioEvent {
    /// 视频任务已提交
    VideoTaskSubmitted { task_id: String },
    /// 单次轮询结果
    VideoProgress {
        task_id: String,
        status: TaskStatus,
        progress: u8,
        status_line: String,
    },
    /// 视频产物已解析
    VideoReady { task_id: String, url: String },
    /// 视频生成失败
    VideoFailed { task_id: String, error: String },
    /// 开始解码片段
    ChunkDecodeStarted { session_id: Uuid, seq: u64 },
    /// 开始播放片段
    ChunkPlaybackStarted {
        session_id: Uuid,
        seq: u64,
        duration_ms: u64,
    },
    /// 片段播放结束
    ChunkPlaybackFinished { session_id: Uuid, seq: u64 },
    /// 播放会话结束
    PlaybackEnded {
        session_id: Uuid,
        chunks_played: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// Studio Event Port
pub trait StudioEventPort: Send + Sync {
    fn publish(&self, event: StudioEvent);
}

/// 丢弃所有事件
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEvents;

impl StudioEventPort for NoopEvents {
    fn publish(&self, _event: StudioEvent) {}
}
