//! Application Services - 客户端核心
//!
//! - TaskPoller: 视频任务轮询
//! - StreamingAudioPlayer: 流式语音播放
//! - StudioSession: 用户会话上下文

pub mod audio_player;
pub mod studio_session;
pub mod task_poller;

pub use audio_player::{
    chunks_from_event_stream, ChunkStream, PlaybackError, PlaybackHandle, PlaybackReport,
    StreamingAudioPlayer,
};
pub use studio_session::{CloneOutcome, MediaFile, StudioSession, StudioSessionConfig, VideoDraft};
pub use task_poller::{PollerError, TaskHandle, TaskPoller, TaskPollerConfig, VideoArtifact};
