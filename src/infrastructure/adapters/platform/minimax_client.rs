//! MiniMax Client - 调用上游生成式平台
//!
//! 实现 GenerativePlatformPort，负责注入凭证与重塑请求/响应体
//!
//! 上游 API（{base_url} 默认 https://api.minimaxi.chat/v1）:
//! - POST text/chatcompletion_v2?GroupId=
//! - POST t2a_v2?GroupId=                    (stream=true 时为 data: 事件流)
//! - POST video_generation
//! - GET  query/video_generation?task_id=
//! - GET  files/retrieve?GroupId=&file_id=
//! - POST files/upload?GroupId=              (multipart: file, purpose)
//! - POST voice_clone?GroupId=
//! - POST music_upload?GroupId=              (multipart: file, purpose)
//! - POST music_generation?GroupId=
//!
//! 所有响应都带 base_resp，status_code 非 0 即失败

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::application::ports::{
    CloneVoiceRequest, GenerativePlatformPort, PlatformError, SpeechOutput, SpeechRequest,
    UploadFile,
};
use crate::domain::conversation::ChatMessage;
use crate::domain::generation::{FileRef, Progress, TaskSnapshot, TaskStatus, VideoRequest};
use crate::domain::media::{MusicReferences, MusicRequest};
use crate::domain::voice::{VoiceId, VoiceSettings};

/// 对话模型参数
#[derive(Debug, Clone)]
pub struct ChatModelSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl Default for ChatModelSettings {
    fn default() -> Self {
        Self {
            model: "MiniMax-Text-01".to_string(),
            temperature: 0.1,
            max_tokens: 1000,
            top_p: 0.95,
        }
    }
}

/// 语音输出参数
#[derive(Debug, Clone)]
pub struct SpeechModelSettings {
    pub model: String,
    pub sample_rate: u32,
    pub bitrate: u32,
    pub format: String,
    pub channel: u8,
}

impl Default for SpeechModelSettings {
    fn default() -> Self {
        Self {
            model: "speech-01-turbo".to_string(),
            sample_rate: 32000,
            bitrate: 128000,
            format: "mp3".to_string(),
            channel: 1,
        }
    }
}

/// 音乐输出参数
#[derive(Debug, Clone)]
pub struct MusicModelSettings {
    pub model: String,
    pub sample_rate: u32,
    pub bitrate: u32,
    pub format: String,
}

impl Default for MusicModelSettings {
    fn default() -> Self {
        Self {
            model: "music-01".to_string(),
            sample_rate: 44100,
            bitrate: 256000,
            format: "mp3".to_string(),
        }
    }
}

/// MiniMax 客户端配置
#[derive(Debug, Clone)]
pub struct MiniMaxClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub group_id: String,
    /// 请求超时时间（秒）
    pub timeout_secs: u64,
    pub chat: ChatModelSettings,
    pub speech: SpeechModelSettings,
    pub music: MusicModelSettings,
}

impl Default for MiniMaxClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.minimaxi.chat/v1".to_string(),
            api_key: String::new(),
            group_id: String::new(),
            timeout_secs: 120,
            chat: ChatModelSettings::default(),
            speech: SpeechModelSettings::default(),
            music: MusicModelSettings::default(),
        }
    }
}

impl MiniMaxClientConfig {
    pub fn new(api_key: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            group_id: group_id.into(),
            ..Default::default()
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
struct BaseResp {
    #[serde(default)]
    status_code: i64,
    #[serde(default)]
    status_msg: String,
}

#[derive(Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    top_p: f32,
    mask_sensitive_info: bool,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[derive(Serialize)]
struct AudioSetting<'a> {
    sample_rate: u32,
    bitrate: u32,
    format: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    channel: Option<u8>,
}

#[derive(Serialize)]
struct T2aBody<'a> {
    model: &'a str,
    text: &'a str,
    stream: bool,
    voice_setting: &'a VoiceSettings,
    audio_setting: AudioSetting<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    language_boost: Option<&'a str>,
}

#[derive(Default, Deserialize)]
struct AudioData {
    #[serde(default)]
    audio: String,
}

#[derive(Deserialize)]
struct AudioReply {
    #[serde(default)]
    data: Option<AudioData>,
}

#[derive(Serialize)]
struct VideoBody<'a> {
    model: &'a str,
    prompt: &'a str,
    prompt_optimizer: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    first_frame_image: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    subject_reference: Option<&'a str>,
}

#[derive(Deserialize)]
struct TaskIdReply {
    #[serde(default)]
    task_id: String,
}

#[derive(Deserialize)]
struct VideoStatusReply {
    #[serde(default)]
    status: String,
    #[serde(default)]
    progress: Option<i64>,
    #[serde(default)]
    file_id: Option<Value>,
}

#[derive(Deserialize)]
struct FileInfo {
    #[serde(default)]
    file_id: Option<Value>,
    #[serde(default)]
    download_url: Option<String>,
}

#[derive(Deserialize)]
struct FileReply {
    #[serde(default)]
    file: Option<FileInfo>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Serialize)]
struct CloneBody<'a> {
    file_id: Value,
    voice_id: &'a str,
    noise_reduction: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
    model: &'a str,
}

#[derive(Deserialize)]
struct MusicUploadReply {
    #[serde(default)]
    voice_id: Option<String>,
    #[serde(default)]
    instrumental_id: Option<String>,
}

#[derive(Serialize)]
struct MusicBody<'a> {
    model: &'a str,
    lyrics: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    refer_voice: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refer_instrumental: Option<&'a str>,
    audio_setting: AudioSetting<'a>,
}

/// 上游 ID 可能是数字也可能是字符串
fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// 数字形式的文件 ID 按数字发送
fn id_to_value(file_ref: &FileRef) -> Value {
    file_ref
        .as_str()
        .parse::<i64>()
        .map(Value::from)
        .unwrap_or_else(|_| Value::from(file_ref.as_str()))
}

/// 解析响应体并检查 base_resp
fn parse_reply<T: DeserializeOwned>(body: &[u8]) -> Result<T, PlatformError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| PlatformError::InvalidResponse(format!("Failed to parse API response: {}", e)))?;

    if let Some(base) = value.get("base_resp") {
        let base: BaseResp = serde_json::from_value(base.clone()).unwrap_or_default();
        if base.status_code != 0 {
            let message = if base.status_msg.is_empty() {
                "API request failed".to_string()
            } else {
                base.status_msg
            };
            return Err(PlatformError::remote(base.status_code, message));
        }
    }

    serde_json::from_value(value)
        .map_err(|e| PlatformError::InvalidResponse(format!("Unexpected response shape: {}", e)))
}

fn map_send_error(e: reqwest::Error) -> PlatformError {
    if e.is_timeout() {
        PlatformError::Timeout
    } else if e.is_connect() {
        PlatformError::Transport(format!("Cannot connect to platform: {}", e))
    } else {
        PlatformError::Transport(e.to_string())
    }
}

/// MiniMax 客户端
pub struct MiniMaxClient {
    client: Client,
    config: MiniMaxClientConfig,
}

impl MiniMaxClient {
    pub fn new(config: MiniMaxClientConfig) -> Result<Self, PlatformError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlatformError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.config.api_key)
    }

    fn with_group(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.query(&[("GroupId", self.config.group_id.as_str())])
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    /// 带总时限的请求，时限覆盖读取响应体
    async fn send(&self, builder: RequestBuilder) -> Result<Response, PlatformError> {
        self.dispatch(builder.timeout(self.timeout())).await
    }

    /// 流式请求：响应头必须在时限内到达，之后按下游读取速度转发，不设总时限
    async fn send_streaming(&self, builder: RequestBuilder) -> Result<Response, PlatformError> {
        tokio::time::timeout(self.timeout(), self.dispatch(builder))
            .await
            .map_err(|_| PlatformError::Timeout)?
    }

    async fn dispatch(&self, builder: RequestBuilder) -> Result<Response, PlatformError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            // 优先使用上游的 base_resp 错误信息
            if let Err(e) = parse_reply::<Value>(&body) {
                if matches!(e, PlatformError::RemoteStatus { .. }) {
                    return Err(e);
                }
            }
            return Err(PlatformError::remote(
                status.as_u16() as i64,
                format!("HTTP {}: {}", status, String::from_utf8_lossy(&body)),
            ));
        }
        Ok(response)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, PlatformError> {
        let response = self.send(builder).await?;
        let body = response
            .bytes()
            .await
            .map_err(|e| PlatformError::Transport(format!("Failed to read response: {}", e)))?;
        parse_reply(&body)
    }

    fn multipart(file: UploadFile) -> Result<Form, PlatformError> {
        let part = Part::bytes(file.bytes)
            .file_name(file.filename)
            .mime_str("application/octet-stream")
            .map_err(|e| PlatformError::Transport(e.to_string()))?;
        Ok(Form::new()
            .part("file", part)
            .text("purpose", file.purpose.as_str().to_string()))
    }
}

#[async_trait]
impl GenerativePlatformPort for MiniMaxClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, PlatformError> {
        let settings = &self.config.chat;
        let body = ChatBody {
            model: &settings.model,
            messages,
            temperature: settings.temperature,
            max_tokens: settings.max_tokens,
            top_p: settings.top_p,
            mask_sensitive_info: false,
        };

        tracing::debug!(messages = messages.len(), model = %settings.model, "Sending chat request");

        let builder = self.with_group(self.client.post(self.url("text/chatcompletion_v2")));
        let reply: ChatReply = self.send_json(builder.json(&body)).await?;
        reply
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| PlatformError::InvalidResponse("No choices found in API response".to_string()))
    }

    async fn synthesize_speech(&self, request: SpeechRequest) -> Result<SpeechOutput, PlatformError> {
        let settings = &self.config.speech;
        let body = T2aBody {
            model: &settings.model,
            text: &request.text,
            stream: request.stream,
            voice_setting: &request.voice_setting,
            audio_setting: AudioSetting {
                sample_rate: settings.sample_rate,
                bitrate: settings.bitrate,
                format: &settings.format,
                channel: Some(settings.channel),
            },
            language_boost: request.language_boost.as_deref(),
        };

        tracing::debug!(
            text_len = request.text.len(),
            stream = request.stream,
            voice_id = %request.voice_setting.voice_id,
            "Sending speech request"
        );

        let builder = self.with_group(self.client.post(self.url("t2a_v2"))).json(&body);
        let response = if request.stream {
            self.send_streaming(builder).await?
        } else {
            self.send(builder).await?
        };

        let is_event_stream = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/event-stream"));

        if request.stream && is_event_stream {
            let bytes = response.bytes_stream().map(|chunk| {
                chunk
                    .map(|b| b.to_vec())
                    .map_err(|e| PlatformError::Transport(e.to_string()))
            });
            return Ok(SpeechOutput::Stream(bytes.boxed()));
        }

        // 非流式，或上游以 JSON 返回（包括流式请求的错误）
        let body = tokio::time::timeout(self.timeout(), response.bytes())
            .await
            .map_err(|_| PlatformError::Timeout)?
            .map_err(|e| PlatformError::Transport(format!("Failed to read response: {}", e)))?;
        let reply: AudioReply = parse_reply(&body)?;
        let audio = reply.data.unwrap_or_default().audio;
        if audio.is_empty() {
            return Err(PlatformError::InvalidResponse("No audio data in response".to_string()));
        }
        Ok(SpeechOutput::Single(audio))
    }

    async fn submit_video_task(&self, request: &VideoRequest) -> Result<String, PlatformError> {
        let body = VideoBody {
            model: request.model.as_str(),
            prompt: &request.prompt,
            prompt_optimizer: request.prompt_optimizer,
            first_frame_image: request.first_frame_image.as_ref().map(FileRef::as_str),
            subject_reference: request.subject_reference.as_ref().map(FileRef::as_str),
        };

        let reply: TaskIdReply = self
            .send_json(self.client.post(self.url("video_generation")).json(&body))
            .await?;
        if reply.task_id.is_empty() {
            return Err(PlatformError::InvalidResponse("No task_id in response".to_string()));
        }
        Ok(reply.task_id)
    }

    async fn poll_video_task(&self, task_id: &str) -> Result<TaskSnapshot, PlatformError> {
        let builder = self
            .client
            .get(self.url("query/video_generation"))
            .query(&[("task_id", task_id)]);
        let reply: VideoStatusReply = self.send_json(builder).await?;

        let status = TaskStatus::from_remote(&reply.status).ok_or_else(|| {
            PlatformError::InvalidResponse(format!("Unknown task status '{}'", reply.status))
        })?;
        let file_ref = reply.file_id.as_ref().and_then(id_from_value).map(FileRef::new);

        Ok(TaskSnapshot::new(
            status,
            Progress::new(reply.progress.unwrap_or(0)),
            file_ref,
        ))
    }

    async fn resolve_file(&self, file_ref: &FileRef) -> Result<String, PlatformError> {
        let builder = self
            .with_group(self.client.get(self.url("files/retrieve")))
            .query(&[("file_id", file_ref.as_str())]);
        let reply: FileReply = self.send_json(builder).await?;

        reply
            .file
            .and_then(|f| f.download_url)
            .or(reply.url)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| PlatformError::InvalidResponse("No download url in response".to_string()))
    }

    async fn upload_file(&self, file: UploadFile) -> Result<FileRef, PlatformError> {
        let purpose = file.purpose;
        let form = Self::multipart(file)?;
        let builder = self.with_group(self.client.post(self.url("files/upload")));
        let reply: FileReply = self.send_json(builder.multipart(form)).await?;

        let file_id = reply
            .file
            .and_then(|f| f.file_id)
            .as_ref()
            .and_then(id_from_value)
            .ok_or_else(|| PlatformError::InvalidResponse("No file_id in response".to_string()))?;

        tracing::debug!(file_id = %file_id, purpose = %purpose, "File uploaded to platform");
        Ok(FileRef::new(file_id))
    }

    async fn clone_voice(&self, request: CloneVoiceRequest) -> Result<VoiceId, PlatformError> {
        let body = CloneBody {
            file_id: id_to_value(&request.file_id),
            voice_id: request.voice_id.as_str(),
            noise_reduction: request.noise_reduction,
            text: request.text.as_deref(),
            model: &self.config.speech.model,
        };
        let builder = self.with_group(self.client.post(self.url("voice_clone")));
        let _: Value = self.send_json(builder.json(&body)).await?;
        Ok(request.voice_id)
    }

    async fn upload_music(&self, file: UploadFile) -> Result<MusicReferences, PlatformError> {
        let form = Self::multipart(file)?;
        let builder = self.with_group(self.client.post(self.url("music_upload")));
        let reply: MusicUploadReply = self.send_json(builder.multipart(form)).await?;
        Ok(MusicReferences {
            voice_id: reply.voice_id,
            instrumental_id: reply.instrumental_id,
        })
    }

    async fn generate_music(&self, request: &MusicRequest) -> Result<Vec<u8>, PlatformError> {
        let settings = &self.config.music;
        let body = MusicBody {
            model: &settings.model,
            lyrics: &request.lyrics,
            refer_voice: request.refer_voice.as_deref(),
            refer_instrumental: request.refer_instrumental.as_deref(),
            audio_setting: AudioSetting {
                sample_rate: settings.sample_rate,
                bitrate: settings.bitrate,
                format: &settings.format,
                channel: None,
            },
        };
        let builder = self.with_group(self.client.post(self.url("music_generation")));
        let reply: AudioReply = self.send_json(builder.json(&body)).await?;

        let audio = reply.data.unwrap_or_default().audio;
        if audio.is_empty() {
            return Err(PlatformError::InvalidResponse("No audio data in response".to_string()));
        }
        BASE64
            .decode(audio.trim())
            .map_err(|e| PlatformError::InvalidResponse(format!("Invalid audio encoding: {}", e)))
    }

    async fn download_artifact(&self, url: &str) -> Result<Vec<u8>, PlatformError> {
        // 下载地址为预签名 URL，不带凭证
        let response = self
            .client
            .get(url)
            .timeout(self.timeout())
            .send()
            .await
            .map_err(map_send_error)?;
        if !response.status().is_success() {
            return Err(PlatformError::remote(
                response.status().as_u16() as i64,
                "Download failed",
            ));
        }
        Ok(response
            .bytes()
            .await
            .map_err(|e| PlatformError::Transport(e.to_string()))?
            .to_vec())
    }

    async fn health_check(&self) -> bool {
        !self.config.api_key.is_empty()
            && self
                .client
                .get(&self.config.base_url)
                .timeout(Duration::from_secs(5))
                .send()
                .await
                .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = MiniMaxClientConfig::new("key", "group")
            .with_base_url("http://localhost:9000/v1")
            .with_timeout(30);
        assert_eq!(config.base_url, "http://localhost:9000/v1");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.chat.model, "MiniMax-Text-01");
        assert_eq!(config.speech.sample_rate, 32000);
    }

    #[test]
    fn test_base_resp_error_becomes_remote_status() {
        let body = br#"{"base_resp":{"status_code":1004,"status_msg":"authentication failed"}}"#;
        let err = parse_reply::<Value>(body).unwrap_err();
        assert_eq!(err, PlatformError::remote(1004, "authentication failed"));
    }

    #[test]
    fn test_success_reply_parsed() {
        let body = br#"{"task_id":"106916112212032","base_resp":{"status_code":0,"status_msg":"success"}}"#;
        let reply: TaskIdReply = parse_reply(body).unwrap();
        assert_eq!(reply.task_id, "106916112212032");
    }

    #[test]
    fn test_numeric_file_ids() {
        assert_eq!(id_from_value(&serde_json::json!(205258526306433_i64)).as_deref(), Some("205258526306433"));
        assert_eq!(id_from_value(&serde_json::json!("abc")).as_deref(), Some("abc"));
        assert_eq!(id_from_value(&serde_json::json!(null)), None);
        assert_eq!(id_to_value(&FileRef::new("42")), serde_json::json!(42));
        assert_eq!(id_to_value(&FileRef::new("f-1")), serde_json::json!("f-1"));
    }

    #[test]
    fn test_video_body_omits_missing_refs() {
        let body = VideoBody {
            model: "video-01",
            prompt: "a cat",
            prompt_optimizer: true,
            first_frame_image: None,
            subject_reference: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("first_frame_image").is_none());
        assert_eq!(json["prompt_optimizer"], serde_json::json!(true));
    }

    #[tokio::test]
    async fn test_speech_stream_is_not_cut_by_request_timeout() {
        use axum::{body::Body, routing::post, Router};
        use futures_util::stream;

        let events = || {
            stream::unfold(0, |i| async move {
                if i == 3 {
                    return None;
                }
                tokio::time::sleep(Duration::from_millis(600)).await;
                let line = format!("data: {{\"data\":{{\"audio\":\"part{}\"}}}}\n\n", i);
                Some((Ok::<_, std::io::Error>(line), i + 1))
            })
        };
        let router = Router::new().route(
            "/v1/t2a_v2",
            post(move || async move {
                (
                    [(header::CONTENT_TYPE, "text/event-stream")],
                    Body::from_stream(events()),
                )
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let config = MiniMaxClientConfig::new("key", "group")
            .with_base_url(format!("http://{}/v1", addr))
            .with_timeout(1);
        let client = MiniMaxClient::new(config).unwrap();
        let request = SpeechRequest::new("hello there", VoiceSettings::default()).streamed(true);

        let SpeechOutput::Stream(mut bytes) = client.synthesize_speech(request).await.unwrap() else {
            panic!("expected an event stream");
        };
        let mut relayed = Vec::new();
        while let Some(chunk) = bytes.next().await {
            relayed.extend(chunk.unwrap());
        }
        let relayed = String::from_utf8(relayed).unwrap();
        assert_eq!(relayed.matches("data:").count(), 3);
    }
}
