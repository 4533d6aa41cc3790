//! Operation Registry Port - 单槽操作登记
//!
//! 每个逻辑通道同一时刻只允许一个进行中的操作。
//! chat 采用拒绝策略，speech / video 采用抢占策略（取消旧操作）。

use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// 逻辑通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationChannel {
    Chat,
    Speech,
    VideoTask,
}

impl OperationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationChannel::Chat => "chat",
            OperationChannel::Speech => "speech",
            OperationChannel::VideoTask => "video_task",
        }
    }

    /// 通道的默认冲突策略
    pub fn default_policy(&self) -> ConflictPolicy {
        match self {
            OperationChannel::Chat => ConflictPolicy::Reject,
            OperationChannel::Speech | OperationChannel::VideoTask => ConflictPolicy::Preempt,
        }
    }
}

impl fmt::Display for OperationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 冲突策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictPolicy {
    /// 已有操作时拒绝新操作
    Reject,
    /// 取消已有操作并接管通道
    Preempt,
}

#[derive(Debug, Error, PartialEq)]
pub enum RegistryError {
    #[error("Operation already in progress on channel '{0}'")]
    Busy(OperationChannel),
}

/// Operation Registry Port
pub trait OperationRegistryPort: Send + Sync {
    /// 登记操作，返回 (操作 ID, 取消令牌)
    fn register(
        &self,
        channel: OperationChannel,
        policy: ConflictPolicy,
    ) -> Result<(Uuid, CancellationToken), RegistryError>;

    /// 仅当通道仍由该操作占用时释放
    fn release(&self, channel: OperationChannel, id: Uuid) -> bool;

    fn is_busy(&self, channel: OperationChannel) -> bool;

    /// 取消所有通道上的操作
    fn cancel_all(&self) -> usize;
}

/// 操作票据，离开作用域时释放通道
pub struct OperationTicket {
    id: Uuid,
    channel: OperationChannel,
    token: CancellationToken,
    registry: Arc<dyn OperationRegistryPort>,
}

impl OperationTicket {
    /// 按通道默认策略登记
    pub fn acquire(
        registry: &Arc<dyn OperationRegistryPort>,
        channel: OperationChannel,
    ) -> Result<Self, RegistryError> {
        Self::acquire_with(registry, channel, channel.default_policy())
    }

    pub fn acquire_with(
        registry: &Arc<dyn OperationRegistryPort>,
        channel: OperationChannel,
        policy: ConflictPolicy,
    ) -> Result<Self, RegistryError> {
        let (id, token) = registry.register(channel, policy)?;
        Ok(Self {
            id,
            channel,
            token,
            registry: Arc::clone(registry),
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn channel(&self) -> OperationChannel {
        self.channel
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for OperationTicket {
    fn drop(&mut self) {
        self.registry.release(self.channel, self.id);
    }
}

impl fmt::Debug for OperationTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationTicket")
            .field("id", &self.id)
            .field("channel", &self.channel)
            .finish()
    }
}
