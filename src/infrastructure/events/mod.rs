//! Events - 事件分发

mod publisher;

pub use publisher::EventPublisher;
