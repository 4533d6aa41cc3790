//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio;
mod events;
mod operation_registry;
mod platform;

pub use audio::{AudioDecoderPort, AudioOutput, AudioSinkPort, DecodeError, SinkError};
pub use events::{NoopEvents, StudioEvent, StudioEventPort};
pub use operation_registry::{
    ConflictPolicy, OperationChannel, OperationRegistryPort, OperationTicket, RegistryError,
};
pub use platform::{
    CloneVoiceRequest, GenerativePlatformPort, PlatformError, SpeechByteStream, SpeechOutput,
    SpeechRequest, UploadFile,
};
