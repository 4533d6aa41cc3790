//! 流式语音片段
//!
//! 上游流式响应是按行分隔的事件流，每个 `data:` 行携带一个 JSON，
//! 其中 `data.audio` 为 base64 编码的可独立解码音频片段。

use serde::{Deserialize, Serialize};

/// 音频片段，按到达顺序编号
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioChunk {
    pub seq: u64,
    /// base64 编码的音频数据
    pub payload: String,
}

impl AudioChunk {
    pub fn new(seq: u64, payload: impl Into<String>) -> Self {
        Self {
            seq,
            payload: payload.into(),
        }
    }
}

/// 事件流行缓冲
///
/// 网络读取可能在任意字节处切断一行，只有遇到换行符才产出完整行
#[derive(Debug, Default)]
pub struct EventLineBuffer {
    pending: Vec<u8>,
}

impl EventLineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一次读取的字节，返回其中所有完整行
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            let text = String::from_utf8_lossy(&line);
            let text = text.trim_end_matches(['\n', '\r']);
            if !text.trim().is_empty() {
                lines.push(text.to_string());
            }
        }
        lines
    }

    /// 流结束时取出未以换行结尾的最后一行
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        let text = String::from_utf8_lossy(&rest).trim().to_string();
        (!text.is_empty()).then_some(text)
    }
}

#[derive(Deserialize)]
struct EventEnvelope {
    data: Option<EventData>,
}

#[derive(Deserialize)]
struct EventData {
    audio: Option<String>,
}

/// 从事件行中提取音频数据
///
/// 非 `data:` 行、非法 JSON、缺少 `data.audio` 均返回 None
pub fn parse_chunk_line(line: &str) -> Option<String> {
    let body = line.trim().strip_prefix("data:")?;
    let envelope: EventEnvelope = serde_json::from_str(body.trim()).ok()?;
    envelope
        .data?
        .audio
        .filter(|audio| !audio.is_empty())
}
