//! Streaming Audio Player - 流式语音播放
//!
//! 解码阶段与播放阶段之间只有一个槽位：
//! 片段 n 播放结束后才会拉取并解码片段 n+1，严格按到达顺序播放。
//! 同一时刻只有一个播放会话持有音频输出，新会话会先停止旧会话。

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures_util::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex, OwnedSemaphorePermit, Semaphore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::application::ports::{
    AudioDecoderPort, AudioOutput, AudioSinkPort, DecodeError, PlatformError, SinkError,
    SpeechByteStream, SpeechOutput, StudioEvent, StudioEventPort,
};
use crate::domain::audio::{parse_chunk_line, AudioChunk, DecodedAudio, EventLineBuffer};

/// 播放错误
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Failed to decode audio chunk {seq}: {source}")]
    Decode { seq: u64, source: DecodeError },

    #[error("Audio source failed: {0}")]
    Source(PlatformError),

    #[error(transparent)]
    Sink(#[from] SinkError),

    #[error("Playback stopped")]
    Stopped,
}

/// 按到达顺序排列的片段流
pub type ChunkStream = BoxStream<'static, Result<AudioChunk, PlatformError>>;

/// 播放完成报告
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackReport {
    pub session_id: Uuid,
    pub chunks_played: u64,
    pub duration: Duration,
}

/// 播放会话句柄
#[derive(Debug)]
pub struct PlaybackHandle {
    session_id: Uuid,
    done: oneshot::Receiver<Result<PlaybackReport, PlaybackError>>,
}

impl PlaybackHandle {
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// 等待会话自然结束、失败或被停止
    pub async fn finished(self) -> Result<PlaybackReport, PlaybackError> {
        self.done.await.unwrap_or(Err(PlaybackError::Stopped))
    }
}

struct ActiveSession {
    id: Uuid,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

pub struct StreamingAudioPlayer {
    decoder: Arc<dyn AudioDecoderPort>,
    sink: Arc<dyn AudioSinkPort>,
    events: Arc<dyn StudioEventPort>,
    active: Mutex<Option<ActiveSession>>,
}

impl StreamingAudioPlayer {
    pub fn new(
        decoder: Arc<dyn AudioDecoderPort>,
        sink: Arc<dyn AudioSinkPort>,
        events: Arc<dyn StudioEventPort>,
    ) -> Self {
        Self {
            decoder,
            sink,
            events,
            active: Mutex::new(None),
        }
    }

    /// 播放单个 base64 音频
    pub async fn play_single(&self, payload: String) -> Result<PlaybackHandle, PlaybackError> {
        let chunks = stream::iter(vec![Ok(AudioChunk::new(0, payload))]).boxed();
        self.start(chunks).await
    }

    /// 播放 `data:` 事件行组成的字节流
    pub async fn play_stream(&self, bytes: SpeechByteStream) -> Result<PlaybackHandle, PlaybackError> {
        self.start(chunks_from_event_stream(bytes)).await
    }

    /// 播放语音合成结果
    pub async fn play(&self, output: SpeechOutput) -> Result<PlaybackHandle, PlaybackError> {
        match output {
            SpeechOutput::Single(payload) => self.play_single(payload).await,
            SpeechOutput::Stream(bytes) => self.play_stream(bytes).await,
        }
    }

    /// 立即停止并释放音频输出，空闲时无操作
    pub async fn stop(&self) -> bool {
        let previous = self.active.lock().await.take();
        match previous {
            Some(session) => {
                Self::shutdown(session).await;
                true
            }
            None => false,
        }
    }

    /// 是否有未结束的播放会话
    pub async fn is_playing(&self) -> bool {
        self.active
            .lock()
            .await
            .as_ref()
            .is_some_and(|session| !session.task.is_finished())
    }

    async fn start(&self, chunks: ChunkStream) -> Result<PlaybackHandle, PlaybackError> {
        let mut active = self.active.lock().await;
        if let Some(previous) = active.take() {
            tracing::debug!(session_id = %previous.id, "Preempting active playback");
            Self::shutdown(previous).await;
        }

        let mut output = self.sink.open()?;
        let session_id = Uuid::new_v4();
        let cancel = CancellationToken::new();
        let (done_tx, done_rx) = oneshot::channel();

        let decoder = Arc::clone(&self.decoder);
        let events = Arc::clone(&self.events);
        let token = cancel.clone();

        let task = tokio::spawn(async move {
            // 停止或失败时也要报告已播放的片段数
            let played = AtomicU64::new(0);
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => Err(PlaybackError::Stopped),
                result = run_pipeline(session_id, chunks, decoder, output.as_mut(), Arc::clone(&events), &played) => result,
            };
            output.release().await;

            let chunks_played = played.load(Ordering::SeqCst);
            let error = result.as_ref().err().map(ToString::to_string);
            match &result {
                Ok(_) => tracing::debug!(session_id = %session_id, chunks = chunks_played, "Playback finished"),
                Err(PlaybackError::Stopped) => tracing::debug!(session_id = %session_id, "Playback stopped"),
                Err(e) => tracing::warn!(session_id = %session_id, error = %e, "Playback aborted"),
            }
            events.publish(StudioEvent::PlaybackEnded {
                session_id,
                chunks_played,
                error,
            });

            let _ = done_tx.send(result.map(|duration| PlaybackReport {
                session_id,
                chunks_played,
                duration,
            }));
        });

        *active = Some(ActiveSession {
            id: session_id,
            cancel,
            task,
        });

        Ok(PlaybackHandle {
            session_id,
            done: done_rx,
        })
    }

    async fn shutdown(session: ActiveSession) {
        session.cancel.cancel();
        if let Err(e) = session.task.await {
            tracing::warn!(session_id = %session.id, error = %e, "Playback task panicked");
        }
    }
}

/// 解码阶段 -> 单槽 -> 播放阶段
///
/// 每个解码结果携带一个许可，播放完毕后归还；解码阶段先取得许可再拉取下一片段。
async fn run_pipeline(
    session_id: Uuid,
    mut chunks: ChunkStream,
    decoder: Arc<dyn AudioDecoderPort>,
    output: &mut dyn AudioOutput,
    events: Arc<dyn StudioEventPort>,
    played: &AtomicU64,
) -> Result<Duration, PlaybackError> {
    let (slot_tx, mut slot_rx) = mpsc::channel::<(u64, DecodedAudio, OwnedSemaphorePermit)>(1);
    let gate = Arc::new(Semaphore::new(1));

    let decode_events = Arc::clone(&events);
    let decode_stage = async move {
        loop {
            let permit = Arc::clone(&gate)
                .acquire_owned()
                .await
                .map_err(|_| PlaybackError::Stopped)?;

            let chunk = match chunks.next().await {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => return Err(PlaybackError::Source(e)),
                None => break,
            };

            let seq = chunk.seq;
            decode_events.publish(StudioEvent::ChunkDecodeStarted { session_id, seq });
            let decoder = Arc::clone(&decoder);
            let decoded = tokio::task::spawn_blocking(move || decode_payload(decoder.as_ref(), &chunk.payload))
                .await
                .map_err(|e| PlaybackError::Decode {
                    seq,
                    source: DecodeError::Undecodable(e.to_string()),
                })?
                .map_err(|source| PlaybackError::Decode { seq, source })?;

            if slot_tx.send((seq, decoded, permit)).await.is_err() {
                break;
            }
        }
        Ok::<(), PlaybackError>(())
    };

    let play_stage = async {
        let mut total = Duration::ZERO;
        while let Some((seq, audio, permit)) = slot_rx.recv().await {
            let duration = audio.duration();
            events.publish(StudioEvent::ChunkPlaybackStarted {
                session_id,
                seq,
                duration_ms: duration.as_millis() as u64,
            });
            output.render(&audio).await?;
            events.publish(StudioEvent::ChunkPlaybackFinished { session_id, seq });
            tracing::trace!(session_id = %session_id, seq = seq, "Chunk played");

            played.fetch_add(1, Ordering::SeqCst);
            total += duration;
            drop(permit);
        }
        Ok::<Duration, PlaybackError>(total)
    };

    let ((), total) = tokio::try_join!(decode_stage, play_stage)?;
    Ok(total)
}

fn decode_payload(decoder: &dyn AudioDecoderPort, payload: &str) -> Result<DecodedAudio, DecodeError> {
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(DecodeError::Empty);
    }
    let bytes = BASE64
        .decode(payload)
        .map_err(|e| DecodeError::InvalidEncoding(e.to_string()))?;
    decoder.decode(&bytes)
}

struct EventChunkState {
    bytes: SpeechByteStream,
    lines: EventLineBuffer,
    ready: VecDeque<String>,
    next_seq: u64,
    exhausted: bool,
}

impl EventChunkState {
    fn accept(&mut self, lines: impl IntoIterator<Item = String>) {
        for line in lines {
            match parse_chunk_line(&line) {
                Some(payload) => self.ready.push_back(payload),
                None => tracing::trace!(line = %line, "Skipping non-audio event line"),
            }
        }
    }
}

/// 将事件流字节转换为片段流
///
/// 跨读取切断的行会被缓冲，流结束时解析最后一行
pub fn chunks_from_event_stream(bytes: SpeechByteStream) -> ChunkStream {
    let state = EventChunkState {
        bytes,
        lines: EventLineBuffer::new(),
        ready: VecDeque::new(),
        next_seq: 0,
        exhausted: false,
    };

    stream::unfold(state, |mut state| async move {
        loop {
            if let Some(payload) = state.ready.pop_front() {
                let chunk = AudioChunk::new(state.next_seq, payload);
                state.next_seq += 1;
                return Some((Ok(chunk), state));
            }
            if state.exhausted {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(bytes)) => {
                    let lines = state.lines.push(&bytes);
                    state.accept(lines);
                }
                Some(Err(e)) => {
                    state.exhausted = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.exhausted = true;
                    let rest = state.lines.finish();
                    state.accept(rest);
                }
            }
        }
    })
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::NoopEvents;
    use crate::infrastructure::adapters::{ClockSink, SymphoniaDecoder};
    use crate::infrastructure::EventPublisher;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    type Log = Arc<StdMutex<Vec<String>>>;

    /// 把负载当作文本标签，标签 "A" / "BB" / "CCC" 分别解码为 100/200/300ms 静音
    struct LabelDecoder {
        log: Log,
    }

    impl AudioDecoderPort for LabelDecoder {
        fn decode(&self, bytes: &[u8]) -> Result<DecodedAudio, DecodeError> {
            let label = String::from_utf8_lossy(bytes).to_string();
            if label == "bad" {
                return Err(DecodeError::Undecodable("not audio".to_string()));
            }
            self.log.lock().unwrap().push(format!("decode {}", label));
            Ok(DecodedAudio::silence(
                Duration::from_millis(100 * label.len() as u64),
                8000,
                1,
            ))
        }
    }

    struct RecordingSink {
        log: Log,
    }

    struct RecordingOutput {
        log: Log,
    }

    impl AudioSinkPort for RecordingSink {
        fn open(&self) -> Result<Box<dyn AudioOutput>, SinkError> {
            Ok(Box::new(RecordingOutput {
                log: self.log.clone(),
            }))
        }
    }

    #[async_trait]
    impl AudioOutput for RecordingOutput {
        async fn render(&mut self, audio: &DecodedAudio) -> Result<(), SinkError> {
            let ms = audio.duration().as_millis();
            self.log.lock().unwrap().push(format!("start {}", ms));
            tokio::time::sleep(audio.duration()).await;
            self.log.lock().unwrap().push(format!("end {}", ms));
            Ok(())
        }

        async fn release(&mut self) {}
    }

    fn label_player(log: &Log) -> StreamingAudioPlayer {
        StreamingAudioPlayer::new(
            Arc::new(LabelDecoder { log: log.clone() }),
            Arc::new(RecordingSink { log: log.clone() }),
            Arc::new(NoopEvents),
        )
    }

    fn event_line(label: &str) -> String {
        format!("data: {{\"data\":{{\"audio\":\"{}\",\"status\":1}}}}\n", BASE64.encode(label))
    }

    fn byte_stream(parts: Vec<Vec<u8>>) -> SpeechByteStream {
        stream::iter(parts.into_iter().map(Ok)).boxed()
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_plays_in_order_one_at_a_time() {
        let log: Log = Arc::default();
        let player = label_player(&log);

        let body = format!(
            "{}event: ping\n{}data: garbage\n{}",
            event_line("A"),
            event_line("BB"),
            event_line("CCC")
        );
        // 故意在行中间切断
        let bytes = body.into_bytes();
        let (a, b) = bytes.split_at(17);
        let handle = player
            .play_stream(byte_stream(vec![a.to_vec(), b.to_vec()]))
            .await
            .unwrap();
        let report = handle.finished().await.unwrap();

        assert_eq!(report.chunks_played, 3);
        assert_eq!(report.duration, Duration::from_millis(600));
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "decode A", "start 100", "end 100",
                "decode BB", "start 200", "end 200",
                "decode CCC", "start 300", "end 300",
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_decode_failure_aborts_stream() {
        let log: Log = Arc::default();
        let player = label_player(&log);

        let body = format!("{}{}{}", event_line("A"), event_line("bad"), event_line("CCC"));
        let handle = player
            .play_stream(byte_stream(vec![body.into_bytes()]))
            .await
            .unwrap();
        let err = handle.finished().await.unwrap_err();

        assert!(matches!(err, PlaybackError::Decode { seq: 1, .. }));
        assert_eq!(*log.lock().unwrap(), vec!["decode A", "start 100", "end 100"]);
    }

    /// 等待下一个 PlaybackEnded 事件
    async fn playback_ended(
        events: &mut tokio::sync::broadcast::Receiver<StudioEvent>,
    ) -> (u64, Option<String>) {
        loop {
            if let StudioEvent::PlaybackEnded {
                chunks_played,
                error,
                ..
            } = events.recv().await.unwrap()
            {
                return (chunks_played, error);
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_ended_event_counts_chunks_before_failure() {
        let log: Log = Arc::default();
        let publisher = EventPublisher::new().arc();
        let mut events = publisher.subscribe();
        let player = StreamingAudioPlayer::new(
            Arc::new(LabelDecoder { log: log.clone() }),
            Arc::new(RecordingSink { log: log.clone() }),
            publisher,
        );

        let body = format!("{}{}{}", event_line("A"), event_line("BB"), event_line("bad"));
        let handle = player
            .play_stream(byte_stream(vec![body.into_bytes()]))
            .await
            .unwrap();
        assert!(handle.finished().await.is_err());

        let (chunks_played, error) = playback_ended(&mut events).await;
        assert_eq!(chunks_played, 2);
        assert!(error.unwrap().contains("chunk 2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_ended_event_counts_chunks_before_stop() {
        let log: Log = Arc::default();
        let publisher = EventPublisher::new().arc();
        let mut events = publisher.subscribe();
        let player = StreamingAudioPlayer::new(
            Arc::new(LabelDecoder { log: log.clone() }),
            Arc::new(RecordingSink { log: log.clone() }),
            publisher,
        );

        let body = format!("{}{}", event_line("A"), event_line("CCC"));
        let _handle = player
            .play_stream(byte_stream(vec![body.into_bytes()]))
            .await
            .unwrap();
        // A 播完（100ms），CCC 播放中
        tokio::time::sleep(Duration::from_millis(250)).await;
        assert!(player.stop().await);

        let (chunks_played, error) = playback_ended(&mut events).await;
        assert_eq!(chunks_played, 1);
        assert_eq!(error.as_deref(), Some("Playback stopped"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_base64_is_decode_error() {
        let log: Log = Arc::default();
        let player = label_player(&log);

        let handle = player.play_single("%%%".to_string()).await.unwrap();
        assert!(matches!(
            handle.finished().await,
            Err(PlaybackError::Decode {
                source: DecodeError::InvalidEncoding(_),
                ..
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_play_single_silent_clip_within_duration() {
        let sink = Arc::new(ClockSink::new());
        let player = StreamingAudioPlayer::new(
            Arc::new(SymphoniaDecoder::new()),
            sink.clone(),
            Arc::new(NoopEvents),
        );
        let clip = DecodedAudio::silence(Duration::from_secs(1), 16000, 1).to_wav_bytes();

        let started = tokio::time::Instant::now();
        let handle = player.play_single(BASE64.encode(clip)).await.unwrap();
        let report = handle.finished().await.unwrap();

        assert_eq!(report.chunks_played, 1);
        assert!(started.elapsed() <= Duration::from_millis(1001));
        assert_eq!(sink.active_outputs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_releases_output_and_is_idempotent() {
        let sink = Arc::new(ClockSink::new());
        let player = StreamingAudioPlayer::new(
            Arc::new(SymphoniaDecoder::new()),
            sink.clone(),
            Arc::new(NoopEvents),
        );
        let clip = DecodedAudio::silence(Duration::from_secs(5), 8000, 1).to_wav_bytes();

        let handle = player.play_single(BASE64.encode(clip)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(sink.active_outputs(), 1);

        assert!(player.stop().await);
        assert_eq!(sink.active_outputs(), 0);
        assert!(!player.stop().await);
        assert!(!player.is_playing().await);
        assert!(matches!(handle.finished().await, Err(PlaybackError::Stopped)));
    }

    #[tokio::test]
    async fn test_stop_when_idle_is_noop() {
        let log: Log = Arc::default();
        let player = label_player(&log);
        assert!(!player.stop().await);
        assert!(!player.stop().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_session_preempts_previous() {
        let sink = Arc::new(ClockSink::new());
        let player = StreamingAudioPlayer::new(
            Arc::new(SymphoniaDecoder::new()),
            sink.clone(),
            Arc::new(NoopEvents),
        );
        let long = DecodedAudio::silence(Duration::from_secs(10), 8000, 1).to_wav_bytes();
        let short = DecodedAudio::silence(Duration::from_millis(200), 8000, 1).to_wav_bytes();

        let first = player.play_single(BASE64.encode(long)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = player.play_single(BASE64.encode(short)).await.unwrap();

        assert!(matches!(first.finished().await, Err(PlaybackError::Stopped)));
        assert_eq!(sink.active_outputs(), 1);
        assert_eq!(second.finished().await.unwrap().chunks_played, 1);
        assert_eq!(sink.max_concurrent_outputs(), 1);
    }

    #[tokio::test]
    async fn test_trailing_line_without_newline() {
        let chunks: Vec<_> = chunks_from_event_stream(byte_stream(vec![
            event_line("A").into_bytes(),
            event_line("BB").trim_end().as_bytes().to_vec(),
        ]))
        .collect()
        .await;

        let chunks: Vec<AudioChunk> = chunks.into_iter().map(Result::unwrap).collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].seq, 0);
        assert_eq!(chunks[1].seq, 1);
        assert_eq!(chunks[1].payload, BASE64.encode("BB"));
    }
}
