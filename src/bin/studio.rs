//! studio - 终端客户端
//!
//! 通过代理服务端使用对话、语音、音色克隆、音乐和视频生成。
//! 普通输入作为聊天消息发送，以 `/` 开头的输入为命令（输入 /help 查看）。

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};

use genstudio::application::ports::{AudioSinkPort, StudioEvent, StudioEventPort};
use genstudio::application::services::{
    MediaFile, PlaybackHandle, StreamingAudioPlayer, StudioSession, TaskPoller, VideoDraft,
};
use genstudio::application::ApplicationError;
use genstudio::config::{load_config, AppConfig};
use genstudio::domain::generation::VideoModel;
use genstudio::domain::media::UploadPurpose;
#[cfg(feature = "speaker")]
use genstudio::infrastructure::adapters::RodioSink;
use genstudio::infrastructure::adapters::{ClockSink, ProxyClient, SymphoniaDecoder, WavFileSink};
use genstudio::infrastructure::{EventPublisher, InMemoryOperationRegistry};

const HELP: &str = "\
Commands:
  <text>                                  chat with the assistant
  /speak [text]                           read text aloud (default: last reply)
  /stop                                   stop audio playback
  /voice <voice_id>                       switch the speaking voice
  /voices                                 list voices cloned in this session
  /clone <audio> <voice_id> [preview]     clone a voice from a reference recording
  /video <prompt>                         text to video
  /i2v <image> <prompt>                   first frame image to video
  /s2v <image> <prompt>                   subject reference image to video
  /music-upload <audio> <song|voice|instrumental>
  /music <voice_id|-> <instrumental_id|-> <lyrics>
  /reset                                  start a new conversation
  /quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;
    genstudio::init_tracing(&config.log.level);

    let studio = Studio::connect(&config)?;
    studio.print_welcome().await;
    println!("(type /help for commands)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match studio.dispatch(line).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(e) => println!("! {}", e.user_message()),
        }
    }

    studio.session.close().await;
    Ok(())
}

enum Flow {
    Continue,
    Quit,
}

struct Studio {
    session: Arc<StudioSession>,
    output_dir: PathBuf,
}

impl Studio {
    fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let platform = Arc::new(
            ProxyClient::new(&config.client.proxy_url, config.platform.timeout_secs)
                .context("Failed to create proxy client")?,
        );

        let output_dir = config.client.output_dir.clone();
        let sink: Arc<dyn AudioSinkPort> = match config.client.sink.as_str() {
            "clock" => Arc::new(ClockSink::new()),
            "wav" => Arc::new(WavFileSink::new(output_dir.join("audio"), true)),
            _ => speaker_or_wav(&output_dir),
        };

        let publisher = EventPublisher::new().arc();
        spawn_progress_printer(&publisher);
        let events: Arc<dyn StudioEventPort> = publisher;

        let player = Arc::new(StreamingAudioPlayer::new(
            Arc::new(SymphoniaDecoder::new()),
            sink,
            events.clone(),
        ));
        let poller = Arc::new(TaskPoller::new(platform.clone(), events, config.poller()));
        let session = StudioSession::new(
            platform,
            Arc::new(InMemoryOperationRegistry::new()),
            player,
            poller,
            config.session(),
        );

        tracing::info!(proxy = %config.client.proxy_url, "Studio client started");
        Ok(Self {
            session: Arc::new(session),
            output_dir,
        })
    }

    async fn print_welcome(&self) {
        if let Some(welcome) = self.session.history().await.first() {
            println!("assistant> {}", welcome.content);
        }
    }

    async fn dispatch(&self, line: &str) -> Result<Flow, ApplicationError> {
        let Some(command) = line.strip_prefix('/') else {
            let reply = self.session.send_message(line).await?;
            println!("assistant> {}", reply);
            return Ok(Flow::Continue);
        };

        let (name, args) = command
            .split_once(char::is_whitespace)
            .map(|(name, args)| (name, args.trim()))
            .unwrap_or((command, ""));

        match name {
            "help" => println!("{}", HELP),
            "quit" | "exit" => return Ok(Flow::Quit),
            "reset" => {
                self.session.reset().await;
                self.print_welcome().await;
            }
            "speak" => {
                let handle = if args.is_empty() {
                    self.session.speak_last_reply().await?
                } else {
                    self.session.speak(args).await?
                };
                report_playback(handle);
            }
            "stop" => {
                if !self.session.stop_audio().await {
                    println!("(nothing playing)");
                }
            }
            "voice" => {
                self.session.use_voice(args).await?;
                println!("voice set to {}", self.session.voice().await.voice_id);
            }
            "voices" => {
                let voices = self.session.cloned_voices().await;
                if voices.is_empty() {
                    println!("(no cloned voices)");
                }
                for voice in voices {
                    println!("  {}", voice);
                }
            }
            "clone" => self.clone_voice(args).await?,
            "video" => self.video(VideoModel::Video01, None, args).await?,
            "i2v" | "s2v" => {
                let (image, prompt) = split_first(args)
                    .ok_or_else(|| ApplicationError::validation("Usage: /i2v <image> <prompt>"))?;
                let model = if name == "i2v" { VideoModel::I2V01 } else { VideoModel::S2V01 };
                let image = read_media(image).await?;
                self.video(model, Some(image), prompt).await?;
            }
            "music-upload" => {
                let (path, purpose) = split_first(args).ok_or_else(|| {
                    ApplicationError::validation("Usage: /music-upload <audio> <purpose>")
                })?;
                let purpose: UploadPurpose = purpose.parse()?;
                let refs = self.session.upload_music(read_media(path).await?, purpose).await?;
                if let Some(id) = refs.voice_id {
                    println!("voice reference: {}", id);
                }
                if let Some(id) = refs.instrumental_id {
                    println!("instrumental reference: {}", id);
                }
            }
            "music" => self.music(args).await?,
            other => println!("unknown command /{} (type /help)", other),
        }
        Ok(Flow::Continue)
    }

    async fn clone_voice(&self, args: &str) -> Result<(), ApplicationError> {
        let mut parts = args.splitn(3, char::is_whitespace);
        let (Some(path), Some(voice_id)) = (parts.next(), parts.next()) else {
            return Err(ApplicationError::validation(
                "Usage: /clone <audio> <voice_id> [preview]",
            ));
        };
        let preview = parts.next().map(str::to_string);

        let outcome = self
            .session
            .clone_voice(read_media(path).await?, voice_id, true, preview)
            .await?;
        println!("voice cloned: {}", outcome.voice_id);
        if let Some(handle) = outcome.preview {
            report_playback(handle);
        }
        Ok(())
    }

    async fn video(
        &self,
        model: VideoModel,
        image: Option<MediaFile>,
        prompt: &str,
    ) -> Result<(), ApplicationError> {
        let mut draft = VideoDraft::new(model, prompt);
        if model.requires_first_frame() {
            draft.first_frame = image;
        } else if model.requires_subject_reference() {
            draft.subject_reference = image;
        }

        let artifact = self.session.generate_video(draft).await?;
        let bytes = self.session.download_artifact(&artifact.url).await?;
        let path = self.output_dir.join(format!("video_{}.mp4", artifact.task_id));
        save(&path, &bytes).await?;
        println!("video saved to {} ({})", path.display(), artifact.url);
        Ok(())
    }

    async fn music(&self, args: &str) -> Result<(), ApplicationError> {
        let mut parts = args.splitn(3, char::is_whitespace);
        let (Some(voice), Some(instrumental), Some(lyrics)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(ApplicationError::validation(
                "Usage: /music <voice_id|-> <instrumental_id|-> <lyrics>",
            ));
        };
        let reference = |id: &str| (id != "-").then(|| id.to_string());

        let audio = self
            .session
            .generate_music(lyrics, reference(voice), reference(instrumental))
            .await?;
        let path = self
            .output_dir
            .join(format!("music_{}.mp3", chrono::Local::now().format("%Y%m%d_%H%M%S")));
        save(&path, &audio).await?;
        println!("music saved to {}", path.display());
        Ok(())
    }
}

/// 打开声卡，不可用时写入 WAV 文件
#[cfg(feature = "speaker")]
fn speaker_or_wav(output_dir: &Path) -> Arc<dyn AudioSinkPort> {
    match RodioSink::open_default() {
        Ok(sink) => Arc::new(sink),
        Err(e) => {
            tracing::warn!(error = %e, "Audio device unavailable, writing WAV files instead");
            Arc::new(WavFileSink::new(output_dir.join("audio"), true))
        }
    }
}

#[cfg(not(feature = "speaker"))]
fn speaker_or_wav(output_dir: &Path) -> Arc<dyn AudioSinkPort> {
    tracing::warn!("Built without the speaker feature, writing WAV files instead");
    Arc::new(WavFileSink::new(output_dir.join("audio"), true))
}

/// 视频进度打印到终端，播放事件只记日志
fn spawn_progress_printer(publisher: &EventPublisher) {
    let mut events = publisher.subscribe();
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(StudioEvent::VideoTaskSubmitted { task_id }) => {
                    println!("video task {} submitted", task_id);
                }
                Ok(StudioEvent::VideoProgress { status_line, .. }) => println!("  {}", status_line),
                Ok(StudioEvent::VideoFailed { error, .. }) => println!("  {}", error),
                Ok(event) => tracing::trace!(?event, "Studio event"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Progress printer lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

fn report_playback(handle: PlaybackHandle) {
    tokio::spawn(async move {
        match handle.finished().await {
            Ok(report) => tracing::info!(
                session_id = %report.session_id,
                chunks = report.chunks_played,
                duration_ms = report.duration.as_millis() as u64,
                "Playback finished"
            ),
            Err(e) => tracing::debug!(error = %e, "Playback ended early"),
        }
    });
}

fn split_first(args: &str) -> Option<(&str, &str)> {
    args.split_once(char::is_whitespace)
        .map(|(first, rest)| (first, rest.trim()))
        .filter(|(_, rest)| !rest.is_empty())
}

async fn read_media(path: &str) -> Result<MediaFile, ApplicationError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ApplicationError::validation(format!("Cannot read {}: {}", path, e)))?;
    let filename = Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string());
    Ok(MediaFile::new(bytes, filename))
}

async fn save(path: &Path, bytes: &[u8]) -> Result<(), ApplicationError> {
    if let Some(dir) = path.parent() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ApplicationError::internal(format!("Cannot create {}: {}", dir.display(), e)))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| ApplicationError::internal(format!("Cannot write {}: {}", path.display(), e)))
}
