//! HTTP Handlers

mod chat;
mod media;
mod ping;
mod speech;
mod video;

pub use chat::*;
pub use media::*;
pub use ping::*;
pub use speech::*;
pub use video::*;
