//! Platform Adapters - 生成式平台客户端实现

mod fake_platform;
mod minimax_client;
mod proxy_client;

pub use fake_platform::FakePlatform;
pub use minimax_client::*;
pub use proxy_client::ProxyClient;
