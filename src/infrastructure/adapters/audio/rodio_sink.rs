//! Rodio Sink - 声卡音频输出
//!
//! 设备流（`OutputStream`）不能跨线程移动，由专用线程持有；
//! 各输出通过其句柄创建独立的 `Sink`，渲染时等待队列播放完毕。

use async_trait::async_trait;
use rodio::buffer::SamplesBuffer;
use rodio::{OutputStream, OutputStreamHandle, Sink};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::application::ports::{AudioOutput, AudioSinkPort, SinkError};
use crate::domain::audio::DecodedAudio;

/// 检查播放是否结束的间隔
const DRAIN_POLL: Duration = Duration::from_millis(20);

/// 默认声卡输出
pub struct RodioSink {
    handle: OutputStreamHandle,
    /// 丢弃后设备线程退出并关闭设备流
    _shutdown: mpsc::Sender<()>,
}

impl RodioSink {
    /// 打开系统默认输出设备
    pub fn open_default() -> Result<Self, SinkError> {
        let (handle_tx, handle_rx) = mpsc::channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        thread::Builder::new()
            .name("audio-device".to_string())
            .spawn(move || match OutputStream::try_default() {
                Ok((stream, handle)) => {
                    let _ = handle_tx.send(Ok(handle));
                    // 发送端丢弃时 recv 返回错误，线程结束
                    let _ = shutdown_rx.recv();
                    drop(stream);
                    tracing::debug!("Audio device closed");
                }
                Err(e) => {
                    let _ = handle_tx.send(Err(e.to_string()));
                }
            })?;

        let handle = handle_rx
            .recv()
            .map_err(|_| SinkError::Unavailable("audio device thread exited".to_string()))?
            .map_err(SinkError::Unavailable)?;

        tracing::info!("Audio device opened");
        Ok(Self {
            handle,
            _shutdown: shutdown_tx,
        })
    }
}

impl AudioSinkPort for RodioSink {
    fn open(&self) -> Result<Box<dyn AudioOutput>, SinkError> {
        let sink = Sink::try_new(&self.handle).map_err(|e| SinkError::Unavailable(e.to_string()))?;
        Ok(Box::new(RodioOutput {
            sink,
            released: false,
        }))
    }
}

struct RodioOutput {
    sink: Sink,
    released: bool,
}

impl RodioOutput {
    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.sink.stop();
        }
    }
}

/// 转换为 rodio 采样缓冲，空音频或格式无效时返回 None
fn samples_buffer(audio: &DecodedAudio) -> Option<SamplesBuffer<f32>> {
    if audio.samples.is_empty() || audio.channels == 0 || audio.sample_rate == 0 {
        return None;
    }
    Some(SamplesBuffer::new(
        audio.channels,
        audio.sample_rate,
        audio.samples.clone(),
    ))
}

#[async_trait]
impl AudioOutput for RodioOutput {
    async fn render(&mut self, audio: &DecodedAudio) -> Result<(), SinkError> {
        if self.released {
            return Err(SinkError::Unavailable("output already released".to_string()));
        }
        let Some(buffer) = samples_buffer(audio) else {
            return Ok(());
        };

        self.sink.append(buffer);
        while !self.sink.empty() {
            tokio::time::sleep(DRAIN_POLL).await;
        }
        Ok(())
    }

    async fn release(&mut self) {
        self.release_once();
    }
}

impl Drop for RodioOutput {
    fn drop(&mut self) {
        self.release_once();
    }
}
