//! Event Publisher Implementation
//!
//! 基于 broadcast 的事件分发：全局通道接收所有事件，
//! 主题通道只接收某个视频任务或播放会话的事件

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::application::ports::{StudioEvent, StudioEventPort};

const CHANNEL_CAPACITY: usize = 100;

/// 事件所属主题：视频任务 ID 或播放会话 ID
fn topic_of(event: &StudioEvent) -> String {
    match event {
        StudioEvent::VideoTaskSubmitted { task_id }
        | StudioEvent::VideoProgress { task_id, .. }
        | StudioEvent::VideoReady { task_id, .. }
        | StudioEvent::VideoFailed { task_id, .. } => task_id.clone(),
        StudioEvent::ChunkDecodeStarted { session_id, .. }
        | StudioEvent::ChunkPlaybackStarted { session_id, .. }
        | StudioEvent::ChunkPlaybackFinished { session_id, .. }
        | StudioEvent::PlaybackEnded { session_id, .. } => session_id.to_string(),
    }
}

fn is_final(event: &StudioEvent) -> bool {
    matches!(
        event,
        StudioEvent::VideoReady { .. }
            | StudioEvent::VideoFailed { .. }
            | StudioEvent::PlaybackEnded { .. }
    )
}

/// 事件发布器
pub struct EventPublisher {
    /// topic -> broadcast sender
    topic_channels: DashMap<String, broadcast::Sender<StudioEvent>>,
    global_channel: broadcast::Sender<StudioEvent>,
}

impl Default for EventPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher {
    pub fn new() -> Self {
        let (global_tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            topic_channels: DashMap::new(),
            global_channel: global_tx,
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 订阅全部事件
    pub fn subscribe(&self) -> broadcast::Receiver<StudioEvent> {
        self.global_channel.subscribe()
    }

    /// 订阅单个任务或会话的事件
    ///
    /// 主题的终结事件发出后通道随即移除
    pub fn subscribe_topic(&self, topic: &str) -> broadcast::Receiver<StudioEvent> {
        self.topic_channels
            .entry(topic.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// 当前有订阅者的主题数
    pub fn topic_count(&self) -> usize {
        self.topic_channels.len()
    }
}

impl StudioEventPort for EventPublisher {
    fn publish(&self, event: StudioEvent) {
        let topic = topic_of(&event);
        tracing::trace!(topic = %topic, ?event, "Publishing event");

        if let Some(sender) = self.topic_channels.get(&topic) {
            let _ = sender.send(event.clone());
        }
        if is_final(&event) {
            self.topic_channels.remove(&topic);
        }

        // 没有订阅者时发送失败，忽略
        let _ = self.global_channel.send(event);
    }
}
