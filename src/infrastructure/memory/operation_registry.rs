//! In-Memory Operation Registry Implementation

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::ports::{
    ConflictPolicy, OperationChannel, OperationRegistryPort, RegistryError,
};

/// 内存操作登记表
#[derive(Default)]
pub struct InMemoryOperationRegistry {
    /// channel -> (operation_id, token)
    slots: DashMap<OperationChannel, (Uuid, CancellationToken)>,
}

impl InMemoryOperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl OperationRegistryPort for InMemoryOperationRegistry {
    fn register(
        &self,
        channel: OperationChannel,
        policy: ConflictPolicy,
    ) -> Result<(Uuid, CancellationToken), RegistryError> {
        let id = Uuid::new_v4();
        let token = CancellationToken::new();

        match self.slots.entry(channel) {
            Entry::Vacant(slot) => {
                slot.insert((id, token.clone()));
            }
            Entry::Occupied(mut slot) => {
                let (previous_id, previous_token) = slot.get();
                // 已取消但尚未释放的操作不再占用通道
                if policy == ConflictPolicy::Reject && !previous_token.is_cancelled() {
                    tracing::debug!(channel = %channel, "Operation rejected, channel busy");
                    return Err(RegistryError::Busy(channel));
                }
                tracing::debug!(
                    channel = %channel,
                    preempted = %previous_id,
                    "Preempting previous operation"
                );
                previous_token.cancel();
                slot.insert((id, token.clone()));
            }
        }

        tracing::trace!(channel = %channel, operation_id = %id, "Operation registered");
        Ok((id, token))
    }

    fn release(&self, channel: OperationChannel, id: Uuid) -> bool {
        self.slots
            .remove_if(&channel, |_, (owner, _)| *owner == id)
            .is_some()
    }

    fn is_busy(&self, channel: OperationChannel) -> bool {
        self.slots
            .get(&channel)
            .is_some_and(|slot| !slot.1.is_cancelled())
    }

    fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        for slot in self.slots.iter() {
            if !slot.1.is_cancelled() {
                slot.1.cancel();
                cancelled += 1;
            }
        }
        self.slots.clear();

        if cancelled > 0 {
            tracing::debug!(count = cancelled, "Cancelled all operations");
        }
        cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::OperationTicket;

    fn registry() -> Arc<dyn OperationRegistryPort> {
        Arc::new(InMemoryOperationRegistry::new())
    }

    #[test]
    fn test_reject_policy_when_busy() {
        let registry = registry();
        let _first = OperationTicket::acquire(&registry, OperationChannel::Chat).unwrap();

        let second = OperationTicket::acquire(&registry, OperationChannel::Chat);
        assert_eq!(
            second.unwrap_err(),
            RegistryError::Busy(OperationChannel::Chat)
        );
    }

    #[test]
    fn test_preempt_cancels_previous() {
        let registry = registry();
        let first = OperationTicket::acquire(&registry, OperationChannel::Speech).unwrap();
        let second = OperationTicket::acquire(&registry, OperationChannel::Speech).unwrap();

        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(registry.is_busy(OperationChannel::Speech));
    }

    #[test]
    fn test_stale_ticket_does_not_release_new_owner() {
        let registry = registry();
        let first = OperationTicket::acquire(&registry, OperationChannel::VideoTask).unwrap();
        let _second = OperationTicket::acquire(&registry, OperationChannel::VideoTask).unwrap();

        drop(first);
        assert!(registry.is_busy(OperationChannel::VideoTask));
    }

    #[test]
    fn test_drop_releases_channel() {
        let registry = registry();
        {
            let _ticket = OperationTicket::acquire(&registry, OperationChannel::Chat).unwrap();
            assert!(registry.is_busy(OperationChannel::Chat));
        }
        assert!(!registry.is_busy(OperationChannel::Chat));
        assert!(OperationTicket::acquire(&registry, OperationChannel::Chat).is_ok());
    }

    #[test]
    fn test_cancel_all() {
        let registry = registry();
        let chat = OperationTicket::acquire(&registry, OperationChannel::Chat).unwrap();
        let video = OperationTicket::acquire(&registry, OperationChannel::VideoTask).unwrap();

        assert_eq!(registry.cancel_all(), 2);
        assert!(chat.is_cancelled());
        assert!(video.is_cancelled());
        assert!(!registry.is_busy(OperationChannel::Chat));
        assert_eq!(registry.cancel_all(), 0);
    }
}
