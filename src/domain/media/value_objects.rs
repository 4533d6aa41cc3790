//! Media Context - Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use super::MediaError;

/// 上传用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPurpose {
    /// 音色克隆的参考音频
    VoiceClone,
    /// 视频首帧图片
    FirstFrame,
    /// 视频主体参考图片
    SubjectReference,
    /// 音乐参考：整首歌曲
    Song,
    /// 音乐参考：人声
    Voice,
    /// 音乐参考：伴奏
    Instrumental,
}

impl UploadPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadPurpose::VoiceClone => "voice_clone",
            UploadPurpose::FirstFrame => "first_frame",
            UploadPurpose::SubjectReference => "subject_reference",
            UploadPurpose::Song => "song",
            UploadPurpose::Voice => "voice",
            UploadPurpose::Instrumental => "instrumental",
        }
    }

    /// 是否为音乐参考上传（走 music upload 接口）
    pub fn is_music_reference(&self) -> bool {
        matches!(
            self,
            UploadPurpose::Song | UploadPurpose::Voice | UploadPurpose::Instrumental
        )
    }
}

impl FromStr for UploadPurpose {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "voice_clone" => Ok(UploadPurpose::VoiceClone),
            "first_frame" => Ok(UploadPurpose::FirstFrame),
            "subject_reference" => Ok(UploadPurpose::SubjectReference),
            "song" => Ok(UploadPurpose::Song),
            "voice" => Ok(UploadPurpose::Voice),
            "instrumental" => Ok(UploadPurpose::Instrumental),
            other => Err(MediaError::UnknownPurpose(other.to_string())),
        }
    }
}

impl fmt::Display for UploadPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 克隆参考音频的上传策略
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AudioUploadPolicy {
    pub max_bytes: u64,
    pub min_duration: Duration,
    pub max_duration: Duration,
}

impl Default for AudioUploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 20 * 1024 * 1024,
            min_duration: Duration::from_secs(10),
            max_duration: Duration::from_secs(300),
        }
    }
}

impl AudioUploadPolicy {
    /// 检查文件大小（解码前的廉价检查）
    pub fn check_size(&self, size: u64) -> Result<(), MediaError> {
        if size == 0 {
            return Err(MediaError::EmptyFile);
        }
        if size > self.max_bytes {
            return Err(MediaError::TooLarge {
                size,
                max: self.max_bytes,
            });
        }
        Ok(())
    }

    /// 检查解码后的音频时长
    pub fn check_duration(&self, duration: Duration) -> Result<(), MediaError> {
        if duration < self.min_duration || duration > self.max_duration {
            return Err(MediaError::DurationOutOfRange {
                actual: duration,
                min: self.min_duration,
                max: self.max_duration,
            });
        }
        Ok(())
    }
}

/// 音乐参考上传结果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicReferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrumental_id: Option<String>,
}

/// 音乐生成请求
///
/// 不变量:
/// - 歌词非空
/// - 至少带一个参考（人声或伴奏）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MusicRequest {
    pub lyrics: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refer_voice: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refer_instrumental: Option<String>,
}

impl MusicRequest {
    pub fn new(
        lyrics: impl Into<String>,
        refer_voice: Option<String>,
        refer_instrumental: Option<String>,
    ) -> Result<Self, MediaError> {
        let non_empty = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let request = Self {
            lyrics: lyrics.into().trim().to_string(),
            refer_voice: non_empty(refer_voice),
            refer_instrumental: non_empty(refer_instrumental),
        };
        request.validate()?;
        Ok(request)
    }

    pub fn validate(&self) -> Result<(), MediaError> {
        if self.refer_voice.is_none() && self.refer_instrumental.is_none() {
            return Err(MediaError::MissingReference);
        }
        if self.lyrics.trim().is_empty() {
            return Err(MediaError::EmptyLyrics);
        }
        Ok(())
    }
}
