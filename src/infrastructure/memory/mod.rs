//! Memory Layer - In-Memory State Management
//!
//! 进程内的操作登记表

mod operation_registry;

pub use operation_registry::InMemoryOperationRegistry;
