//! Speech Commands

use crate::domain::voice::{VoiceId, VoiceSettings};
use crate::domain::generation::FileRef;

/// 语音合成命令
#[derive(Debug, Clone)]
pub struct SynthesizeSpeech {
    pub text: String,
    pub stream: bool,
    pub voice_setting: VoiceSettings,
    /// 原样透传，"auto" 视为不指定
    pub language_boost: Option<String>,
}

/// 音色克隆命令
#[derive(Debug, Clone)]
pub struct CloneVoice {
    pub file_id: FileRef,
    pub voice_id: VoiceId,
    pub noise_reduction: bool,
    pub preview_text: Option<String>,
}
