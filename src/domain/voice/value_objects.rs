//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};
use std::fmt;

use super::VoiceError;

/// 克隆音色 ID
///
/// 不变量:
/// - 至少 8 个字符
/// - 首字符为 ASCII 字母，其余为 ASCII 字母或数字
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VoiceId(String);

impl VoiceId {
    pub const MIN_LEN: usize = 8;

    pub fn parse(id: impl Into<String>) -> Result<Self, VoiceError> {
        let id = id.into().trim().to_string();
        let mut chars = id.chars();
        let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        let rest_alphanumeric = chars.all(|c| c.is_ascii_alphanumeric());

        if id.chars().count() < Self::MIN_LEN || !starts_with_letter || !rest_alphanumeric {
            return Err(VoiceError::InvalidVoiceId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for VoiceId {
    type Error = VoiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<VoiceId> for String {
    fn from(id: VoiceId) -> Self {
        id.0
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// 语音合成参数（上游 voice_setting）
///
/// 反序列化时缺省字段取默认值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSettings {
    /// 系统音色或克隆音色 ID
    pub voice_id: String,
    /// 语速 (0.5 - 2.0)
    pub speed: f32,
    /// 音量 (0, 10]
    pub vol: f32,
    /// 音调 (-12 - 12)
    pub pitch: i32,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            voice_id: "male-qn-qingse".to_string(),
            speed: 1.0,
            vol: 1.0,
            pitch: 0,
        }
    }
}

impl VoiceSettings {
    pub fn with_voice(voice_id: impl Into<String>) -> Self {
        Self {
            voice_id: voice_id.into(),
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), VoiceError> {
        if self.voice_id.trim().is_empty() {
            return Err(VoiceError::InvalidSettings("voice_id cannot be empty"));
        }
        if !(0.5..=2.0).contains(&self.speed) {
            return Err(VoiceError::InvalidSettings("speed must be between 0.5 and 2.0"));
        }
        if !(self.vol > 0.0 && self.vol <= 10.0) {
            return Err(VoiceError::InvalidSettings("vol must be in (0, 10]"));
        }
        if !(-12..=12).contains(&self.pitch) {
            return Err(VoiceError::InvalidSettings("pitch must be between -12 and 12"));
        }
        Ok(())
    }
}

/// 语种增强，"auto" 表示不指定
pub fn normalize_language_boost(value: Option<&str>) -> Option<String> {
    match value.map(str::trim) {
        None | Some("") => None,
        Some(v) if v.eq_ignore_ascii_case("auto") => None,
        Some(v) => Some(v.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_id_too_short_rejected() {
        assert!(matches!(
            VoiceId::parse("ab"),
            Err(VoiceError::InvalidVoiceId(_))
        ));
    }

    #[test]
    fn test_voice_id_must_start_with_letter() {
        assert!(VoiceId::parse("1abcdefgh").is_err());
        assert!(VoiceId::parse("abc_defgh").is_err());
        assert!(VoiceId::parse("MyVoice01").is_ok());
        assert!(VoiceId::parse("abcdefgh").is_ok());
    }

    #[test]
    fn test_voice_id_deserialize_validates() {
        let ok: Result<VoiceId, _> = serde_json::from_str("\"narrator01\"");
        assert!(ok.is_ok());
        let bad: Result<VoiceId, _> = serde_json::from_str("\"ab\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_voice_settings_ranges() {
        assert!(VoiceSettings::default().validate().is_ok());

        let mut settings = VoiceSettings::default();
        settings.speed = 3.0;
        assert!(settings.validate().is_err());

        let mut settings = VoiceSettings::default();
        settings.pitch = 13;
        assert!(settings.validate().is_err());

        let mut settings = VoiceSettings::default();
        settings.vol = 0.0;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_language_boost_auto_is_none() {
        assert_eq!(normalize_language_boost(Some("auto")), None);
        assert_eq!(normalize_language_boost(None), None);
        assert_eq!(
            normalize_language_boost(Some("Chinese")),
            Some("Chinese".to_string())
        );
    }
}
