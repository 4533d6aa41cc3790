//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（生成平台、音频解码/输出、事件、操作登记）
//! - services: 客户端核心（任务轮询、流式播放、会话）
//! - commands: CQRS 命令及处理器（代理服务端用例）
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod services;

// Re-exports
pub use commands::{
    handlers::{
        ChatHandler, CloneVoiceHandler, GenerateMusicHandler, SubmitVideoHandler,
        SynthesizeSpeechHandler, UploadFileHandler, UploadMusicHandler,
    },
    CloneVoice, GenerateMusic, SendChat, SendChatResponse, SubmitVideo, SubmitVideoResponse,
    SynthesizeSpeech, UploadMedia,
};

pub use error::ApplicationError;

pub use ports::{
    AudioDecoderPort, AudioOutput, AudioSinkPort, CloneVoiceRequest, ConflictPolicy, DecodeError,
    GenerativePlatformPort, NoopEvents, OperationChannel, OperationRegistryPort, OperationTicket,
    PlatformError, RegistryError, SinkError, SpeechByteStream, SpeechOutput, SpeechRequest,
    StudioEvent, StudioEventPort, UploadFile,
};

pub use queries::{
    handlers::{GetVideoStatusHandler, ResolveFileHandler},
    GetVideoStatus, ResolveFile,
};

pub use services::{
    PlaybackError, PlaybackHandle, PollerError, StreamingAudioPlayer, StudioSession,
    StudioSessionConfig, TaskPoller, TaskPollerConfig,
};
