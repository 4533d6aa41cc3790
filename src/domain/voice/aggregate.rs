//! Voice Context - Aggregate Root

use std::collections::BTreeSet;

use super::VoiceId;

/// 会话内克隆的音色集合
///
/// 按 ID 排序，便于在选择列表中稳定展示
#[derive(Debug, Clone, Default)]
pub struct ClonedVoices {
    voices: BTreeSet<VoiceId>,
}

impl ClonedVoices {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录新克隆的音色，已存在时返回 false
    pub fn record(&mut self, id: VoiceId) -> bool {
        self.voices.insert(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.voices.iter().any(|v| v.as_str() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &VoiceId> {
        self.voices.iter()
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn clear(&mut self) {
        self.voices.clear();
    }
}
