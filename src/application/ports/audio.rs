//! Audio Ports - 音频解码与输出抽象
//!
//! 解码器把平台返回的音频字节转为 PCM；
//! 输出端口代表一个独占的音频设备（或其替身）。

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::audio::DecodedAudio;

/// 解码错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum DecodeError {
    #[error("Invalid base64 payload: {0}")]
    InvalidEncoding(String),

    #[error("Unsupported or corrupt audio: {0}")]
    Undecodable(String),

    #[error("Audio payload is empty")]
    Empty,
}

/// 音频输出错误
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Audio output unavailable: {0}")]
    Unavailable(String),

    #[error("Audio output failed: {0}")]
    Io(String),
}

impl From<std::io::Error> for SinkError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

/// Audio Decoder Port
pub trait AudioDecoderPort: Send + Sync {
    /// 解码完整的音频文件字节（MP3 / WAV）
    fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio, DecodeError>;
}

/// 已打开的音频输出
///
/// 同一时刻只被一个播放会话持有
#[async_trait]
pub trait AudioOutput: Send {
    /// 播放一段音频，直到渲染结束才返回
    async fn render(&mut self, audio: &DecodedAudio) -> Result<(), SinkError>;

    /// 释放设备，可重复调用
    async fn release(&mut self);
}

/// Audio Sink Port - 打开音频输出
pub trait AudioSinkPort: Send + Sync {
    fn open(&self) -> Result<Box<dyn AudioOutput>, SinkError>;
}
