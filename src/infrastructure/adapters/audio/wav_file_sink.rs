//! WAV File Sink - 把播放的音频落盘为 WAV 文件
//!
//! 终端客户端使用：每次打开输出创建一个会话目录，
//! 每个渲染片段写成 segment_{n}.wav，并按片段时长实时计时

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::{AudioOutput, AudioSinkPort, SinkError};
use crate::domain::audio::DecodedAudio;

/// WAV 文件输出
pub struct WavFileSink {
    /// 输出根目录
    base_dir: PathBuf,
    /// 是否按音频时长等待（关闭后渲染立即返回）
    realtime: bool,
}

impl WavFileSink {
    pub fn new(base_dir: impl AsRef<Path>, realtime: bool) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            realtime,
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }
}

impl AudioSinkPort for WavFileSink {
    fn open(&self) -> Result<Box<dyn AudioOutput>, SinkError> {
        let session_dir = self.base_dir.join(Uuid::new_v4().to_string());
        std::fs::create_dir_all(&session_dir)
            .map_err(|e| SinkError::Unavailable(format!("{}: {}", session_dir.display(), e)))?;

        tracing::debug!(dir = %session_dir.display(), "WAV output opened");

        Ok(Box::new(WavFileOutput {
            session_dir,
            realtime: self.realtime,
            next_segment: 0,
            released: false,
        }))
    }
}

struct WavFileOutput {
    session_dir: PathBuf,
    realtime: bool,
    next_segment: usize,
    released: bool,
}

#[async_trait]
impl AudioOutput for WavFileOutput {
    async fn render(&mut self, audio: &DecodedAudio) -> Result<(), SinkError> {
        if self.released {
            return Err(SinkError::Unavailable("output already released".to_string()));
        }

        let path = self
            .session_dir
            .join(format!("segment_{}.wav", self.next_segment));
        fs::write(&path, audio.to_wav_bytes()).await?;
        self.next_segment += 1;

        tracing::debug!(
            path = %path.display(),
            duration_ms = audio.duration().as_millis() as u64,
            "Rendered audio segment"
        );

        if self.realtime {
            tokio::time::sleep(audio.duration()).await;
        }
        Ok(())
    }

    async fn release(&mut self) {
        if !self.released {
            self.released = true;
            tracing::debug!(
                dir = %self.session_dir.display(),
                segments = self.next_segment,
                "WAV output released"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_segments_written_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let sink = WavFileSink::new(temp_dir.path(), false);
        let mut output = sink.open().unwrap();

        let clip = DecodedAudio::silence(Duration::from_millis(100), 8000, 1);
        output.render(&clip).await.unwrap();
        output.render(&clip).await.unwrap();
        output.release().await;

        let session_dir = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .next()
            .unwrap()
            .unwrap()
            .path();
        let first = std::fs::read(session_dir.join("segment_0.wav")).unwrap();
        assert_eq!(&first[0..4], b"RIFF");
        assert!(session_dir.join("segment_1.wav").exists());
    }

    #[tokio::test]
    async fn test_render_after_release_fails() {
        let temp_dir = TempDir::new().unwrap();
        let sink = WavFileSink::new(temp_dir.path(), false);
        let mut output = sink.open().unwrap();
        output.release().await;

        let clip = DecodedAudio::silence(Duration::from_millis(10), 8000, 1);
        assert!(matches!(
            output.render(&clip).await,
            Err(SinkError::Unavailable(_))
        ));
    }
}
