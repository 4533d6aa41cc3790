//! HTTP Layer - 代理服务端 RESTful API
//!
//! 注入平台凭证，统一响应格式，转发流式语音

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::create_routes;
pub use server::{HttpServer, ServerConfig};
pub use state::AppState;
