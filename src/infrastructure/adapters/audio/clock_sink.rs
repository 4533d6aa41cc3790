//! Clock Sink - 不发声的音频输出
//!
//! 按音频时长计时，用于无声卡环境与测试；
//! 记录同时打开的输出数量，便于验证设备独占

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::application::ports::{AudioOutput, AudioSinkPort, SinkError};
use crate::domain::audio::DecodedAudio;

#[derive(Debug, Default)]
struct Counters {
    active: AtomicUsize,
    max_concurrent: AtomicUsize,
}

/// 计时音频输出
#[derive(Debug, Default, Clone)]
pub struct ClockSink {
    counters: Arc<Counters>,
}

impl ClockSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前打开的输出数
    pub fn active_outputs(&self) -> usize {
        self.counters.active.load(Ordering::SeqCst)
    }

    /// 历史最大并发输出数
    pub fn max_concurrent_outputs(&self) -> usize {
        self.counters.max_concurrent.load(Ordering::SeqCst)
    }
}

impl AudioSinkPort for ClockSink {
    fn open(&self) -> Result<Box<dyn AudioOutput>, SinkError> {
        let active = self.counters.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.max_concurrent.fetch_max(active, Ordering::SeqCst);
        tracing::trace!(active, "Clock output opened");

        Ok(Box::new(ClockOutput {
            counters: self.counters.clone(),
            released: false,
        }))
    }
}

struct ClockOutput {
    counters: Arc<Counters>,
    released: bool,
}

impl ClockOutput {
    fn release_once(&mut self) {
        if !self.released {
            self.released = true;
            self.counters.active.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl AudioOutput for ClockOutput {
    async fn render(&mut self, audio: &DecodedAudio) -> Result<(), SinkError> {
        if self.released {
            return Err(SinkError::Unavailable("output already released".to_string()));
        }
        tokio::time::sleep(audio.duration()).await;
        Ok(())
    }

    async fn release(&mut self) {
        self.release_once();
    }
}

impl Drop for ClockOutput {
    fn drop(&mut self) {
        self.release_once();
    }
}
