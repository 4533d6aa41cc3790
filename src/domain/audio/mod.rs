//! Audio Context - 语音片段与解码结果
//!
//! 职责:
//! - 流式语音的事件行切分与片段提取
//! - 解码后的 PCM 数据及 WAV 编码

mod chunk;
mod pcm;

pub use chunk::{parse_chunk_line, AudioChunk, EventLineBuffer};
pub use pcm::DecodedAudio;
