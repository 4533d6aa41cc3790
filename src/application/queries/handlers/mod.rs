//! Query Handlers 实现

mod video_handlers;

pub use video_handlers::*;
