//! Proxy Client - 经由本服务 /api/* 调用平台
//!
//! 终端客户端使用。凭证由代理注入，本客户端只负责解析统一响应:
//! `{errno, error, data}`，errno 非 0 即失败

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::application::ports::{
    CloneVoiceRequest, GenerativePlatformPort, PlatformError, SpeechOutput, SpeechRequest,
    UploadFile,
};
use crate::domain::conversation::ChatMessage;
use crate::domain::generation::{FileRef, Progress, TaskSnapshot, VideoRequest};
use crate::domain::media::{MusicReferences, MusicRequest};
use crate::domain::voice::VoiceId;
use crate::infrastructure::http::dto::{
    ApiResponse, AudioResponse, ChatRequest, ChatResponse, CloneVoiceBody, FileIdResponse,
    MusicGenerateBody, PingResponse, T2aRequest, TaskIdResponse, UrlResponse, VideoGenerateBody,
    VideoStatusResponse, VoiceIdResponse,
};

/// 代理客户端
pub struct ProxyClient {
    client: Client,
    base_url: String,
    /// 单次请求的总时限；流式语音只限制等待响应头
    timeout: Duration,
}

impl ProxyClient {
    pub fn new(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self, PlatformError> {
        let timeout = Duration::from_secs(timeout_secs);
        let client = Client::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| PlatformError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// 带总时限的请求，时限覆盖读取响应体
    async fn send(&self, builder: RequestBuilder) -> Result<Response, PlatformError> {
        self.dispatch(builder.timeout(self.timeout)).await
    }

    /// 流式请求：响应头必须在时限内到达，响应体按播放速度读取，不设总时限
    async fn send_streaming(&self, builder: RequestBuilder) -> Result<Response, PlatformError> {
        tokio::time::timeout(self.timeout, self.dispatch(builder))
            .await
            .map_err(|_| PlatformError::Timeout)?
    }

    async fn dispatch(&self, builder: RequestBuilder) -> Result<Response, PlatformError> {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                PlatformError::Timeout
            } else {
                PlatformError::Transport(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PlatformError::remote(
                status.as_u16() as i64,
                format!("HTTP {}", status),
            ));
        }
        Ok(response)
    }

    async fn envelope<T: DeserializeOwned>(&self, response: Response) -> Result<T, PlatformError> {
        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| PlatformError::InvalidResponse(e.to_string()))?;

        if !body.is_success() {
            return Err(PlatformError::remote(body.errno as i64, body.error));
        }
        body.data
            .ok_or_else(|| PlatformError::InvalidResponse("Missing data in response".to_string()))
    }

    async fn call<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, PlatformError> {
        let response = self.send(builder).await?;
        self.envelope(response).await
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
impl GenerativePlatformPort for ProxyClient {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, PlatformError> {
        let body = ChatRequest {
            messages: messages.to_vec(),
        };
        let reply: ChatResponse = self.call(self.client.post(self.url("chat")).json(&body)).await?;
        Ok(reply.reply)
    }

    async fn synthesize_speech(&self, request: SpeechRequest) -> Result<SpeechOutput, PlatformError> {
        let body = T2aRequest {
            text: request.text,
            stream: request.stream,
            voice_setting: request.voice_setting,
            language_boost: request.language_boost,
        };
        let builder = self.client.post(self.url("t2a")).json(&body);
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

        if is_event_stream {
            let bytes = response.bytes_stream().map(|chunk| {
                chunk
                    .map(|b| b.to_vec())
                    .map_err(|e| PlatformError::Transport(e.to_string()))
            });
            return Ok(SpeechOutput::Stream(bytes.boxed()));
        }

        let audio: AudioResponse = tokio::time::timeout(self.timeout, self.envelope(response))
            .await
            .map_err(|_| PlatformError::Timeout)??;
        Ok(SpeechOutput::Single(audio.audio))
    }

    async fn submit_video_task(&self, request: &VideoRequest) -> Result<String, PlatformError> {
        let body = VideoGenerateBody {
            model: Some(request.model.as_str().to_string()),
            prompt: request.prompt.clone(),
            prompt_optimizer: Some(request.prompt_optimizer),
            first_frame_image: request.first_frame_image.as_ref().map(|f| f.to_string()),
            subject_reference: request.subject_reference.as_ref().map(|f| f.to_string()),
        };
        let reply: TaskIdResponse = self
            .call(self.client.post(self.url("video/generate")).json(&body))
            .await?;
        Ok(reply.task_id)
    }

    async fn poll_video_task(&self, task_id: &str) -> Result<TaskSnapshot, PlatformError> {
        let builder = self
            .client
            .get(self.url("video/status"))
            .query(&[("task_id", task_id)]);
        let reply: VideoStatusResponse = self.call(builder).await?;

        Ok(TaskSnapshot::new(
            reply.status,
            Progress::new(reply.progress as i64),
            reply.file_id.map(FileRef::new),
        ))
    }

    async fn resolve_file(&self, file_ref: &FileRef) -> Result<String, PlatformError> {
        let builder = self
            .client
            .get(self.url("video/download"))
            .query(&[("file_id", file_ref.as_str())]);
        let reply: UrlResponse = self.call(builder).await?;
        Ok(reply.url)
    }

    async fn upload_file(&self, file: UploadFile) -> Result<FileRef, PlatformError> {
        let form = Self::multipart(file)?;
        let reply: FileIdResponse = self
            .call(self.client.post(self.url("files/upload")).multipart(form))
            .await?;
        Ok(FileRef::new(reply.file_id))
    }

    async fn clone_voice(&self, request: CloneVoiceRequest) -> Result<VoiceId, PlatformError> {
        let body = CloneVoiceBody {
            file_id: request.file_id.to_string(),
            voice_id: request.voice_id.to_string(),
            noise_reduction: request.noise_reduction,
            text: request.text,
        };
        let reply: VoiceIdResponse = self
            .call(self.client.post(self.url("voice/clone")).json(&body))
            .await?;
        VoiceId::parse(reply.voice_id).map_err(|e| PlatformError::InvalidResponse(e.to_string()))
    }

    async fn upload_music(&self, file: UploadFile) -> Result<MusicReferences, PlatformError> {
        let form = Self::multipart(file)?;
        self.call(self.client.post(self.url("music/upload")).multipart(form))
            .await
    }

    async fn generate_music(&self, request: &MusicRequest) -> Result<Vec<u8>, PlatformError> {
        let body = MusicGenerateBody {
            lyrics: request.lyrics.clone(),
            refer_voice: request.refer_voice.clone(),
            refer_instrumental: request.refer_instrumental.clone(),
        };
        let reply: AudioResponse = self
            .call(self.client.post(self.url("music/generate")).json(&body))
            .await?;
        BASE64
            .decode(reply.audio.trim())
            .map_err(|e| PlatformError::InvalidResponse(format!("Invalid audio encoding: {}", e)))
    }

    async fn download_artifact(&self, url: &str) -> Result<Vec<u8>, PlatformError> {
        let response = self.send(self.client.get(url)).await?;
        Ok(response
            .bytes()
            .await
            .map_err(|e| PlatformError::Transport(e.to_string()))?
            .to_vec())
    }

    async fn health_check(&self) -> bool {
        let Ok(response) = self.send(self.client.get(self.url("ping"))).await else {
            return false;
        };
        self.envelope::<PingResponse>(response).await.is_ok()
    }
}
