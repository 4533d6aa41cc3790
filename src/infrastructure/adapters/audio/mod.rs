//! Audio Adapters - 音频解码与输出实现

mod clock_sink;
#[cfg(feature = "speaker")]
mod rodio_sink;
mod symphonia_decoder;
mod wav_file_sink;

pub use clock_sink::ClockSink;
#[cfg(feature = "speaker")]
pub use rodio_sink::RodioSink;
pub use symphonia_decoder::SymphoniaDecoder;
pub use wav_file_sink::WavFileSink;
