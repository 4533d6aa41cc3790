//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：只读的状态查询

mod video_queries;

pub mod handlers;

pub use video_queries::*;
