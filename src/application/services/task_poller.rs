//! Task Poller - 远程视频任务轮询
//!
//! 提交 -> 按固定间隔查询 -> 终态时解析产物或报错。
//! 每次查询结果都会同步发布进度事件。

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{
    GenerativePlatformPort, PlatformError, StudioEvent, StudioEventPort,
};
use crate::domain::generation::{FileRef, GenerationTask, TaskSnapshot, TaskStatus, VideoRequest};

/// 轮询错误
#[derive(Debug, Error)]
pub enum PollerError {
    #[error("Submission failed: {0}")]
    Submission(PlatformError),

    #[error("Status query failed: {0}")]
    Poll(PlatformError),

    #[error("Failed to resolve artifact: {0}")]
    Resolve(PlatformError),

    #[error("Video generation failed for task {task_id}")]
    GenerationFailed { task_id: String },

    #[error("Task {task_id} completed without a file reference")]
    MissingArtifact { task_id: String },

    #[error("Task {task_id} not finished after {polls} polls")]
    PollLimitExceeded { task_id: String, polls: u32 },

    #[error("Polling cancelled")]
    Cancelled,
}

/// 轮询配置
#[derive(Debug, Clone)]
pub struct TaskPollerConfig {
    pub interval: Duration,
    /// None 表示不限次数
    pub max_polls: Option<u32>,
}

impl Default for TaskPollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            max_polls: None,
        }
    }
}

/// 已提交任务的句柄
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    task_id: String,
}

impl TaskHandle {
    pub fn new(task_id: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
        }
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }
}

/// 生成完成的视频
#[derive(Debug, Clone, PartialEq)]
pub struct VideoArtifact {
    pub task_id: String,
    pub file_ref: FileRef,
    pub url: String,
}

pub struct TaskPoller {
    platform: Arc<dyn GenerativePlatformPort>,
    events: Arc<dyn StudioEventPort>,
    config: TaskPollerConfig,
}

impl TaskPoller {
    pub fn new(
        platform: Arc<dyn GenerativePlatformPort>,
        events: Arc<dyn StudioEventPort>,
        config: TaskPollerConfig,
    ) -> Self {
        Self {
            platform,
            events,
            config,
        }
    }

    /// 提交生成请求
    pub async fn submit(&self, request: &VideoRequest) -> Result<TaskHandle, PollerError> {
        let task_id = self
            .platform
            .submit_video_task(request)
            .await
            .map_err(PollerError::Submission)?;

        tracing::info!(
            task_id = %task_id,
            model = %request.model,
            "Video task submitted"
        );
        self.events.publish(StudioEvent::VideoTaskSubmitted {
            task_id: task_id.clone(),
        });

        Ok(TaskHandle::new(task_id))
    }

    /// 单次状态查询
    pub async fn poll(&self, handle: &TaskHandle) -> Result<TaskSnapshot, PollerError> {
        self.platform
            .poll_video_task(handle.task_id())
            .await
            .map_err(PollerError::Poll)
    }

    /// 轮询直到终态
    ///
    /// 完成时解析产物地址（只解析一次），失败时返回 GenerationFailed
    pub async fn run(
        &self,
        handle: &TaskHandle,
        cancel: &CancellationToken,
    ) -> Result<VideoArtifact, PollerError> {
        let task_id = handle.task_id().to_string();
        let mut task = GenerationTask::submitted(task_id.clone());
        let mut polls: u32 = 0;

        loop {
            let snapshot = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(&task_id)),
                result = self.poll(handle) => result?,
            };
            polls += 1;

            if let Err(e) = task.apply(&snapshot) {
                tracing::warn!(task_id = %task_id, error = %e, "Ignoring out-of-order task status");
            } else {
                self.publish_progress(&task_id, &snapshot);

                match task.status() {
                    TaskStatus::Completed => return self.finish(&task, cancel).await,
                    TaskStatus::Failed => {
                        let err = PollerError::GenerationFailed {
                            task_id: task_id.clone(),
                        };
                        tracing::warn!(task_id = %task_id, polls = polls, "Video task failed");
                        self.events.publish(StudioEvent::VideoFailed {
                            task_id: task_id.clone(),
                            error: err.to_string(),
                        });
                        return Err(err);
                    }
                    TaskStatus::Pending | TaskStatus::Running => {}
                }
            }

            if let Some(max) = self.config.max_polls {
                if polls >= max {
                    tracing::warn!(task_id = %task_id, polls = polls, "Poll limit reached");
                    return Err(PollerError::PollLimitExceeded { task_id, polls });
                }
            }

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(self.cancelled(&task_id)),
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }
    }

    async fn finish(
        &self,
        task: &GenerationTask,
        cancel: &CancellationToken,
    ) -> Result<VideoArtifact, PollerError> {
        let task_id = task.id().to_string();
        let file_ref = task
            .result_ref()
            .cloned()
            .ok_or_else(|| PollerError::MissingArtifact {
                task_id: task_id.clone(),
            })?;

        let url = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(self.cancelled(&task_id)),
            result = self.platform.resolve_file(&file_ref) => result.map_err(PollerError::Resolve)?,
        };

        tracing::info!(task_id = %task_id, file_id = %file_ref, "Video artifact resolved");
        self.events.publish(StudioEvent::VideoReady {
            task_id: task_id.clone(),
            url: url.clone(),
        });

        Ok(VideoArtifact {
            task_id,
            file_ref,
            url,
        })
    }

    fn publish_progress(&self, task_id: &str, snapshot: &TaskSnapshot) {
        tracing::debug!(
            task_id = %task_id,
            status = %snapshot.status,
            progress = snapshot.progress.percent(),
            "Video task polled"
        );
        self.events.publish(StudioEvent::VideoProgress {
            task_id: task_id.to_string(),
            status: snapshot.status,
            progress: snapshot.progress.percent(),
            status_line: snapshot.status_line(),
        });
    }

    fn cancelled(&self, task_id: &str) -> PollerError {
        tracing::info!(task_id = %task_id, "Video polling cancelled");
        PollerError::Cancelled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::generation::{Progress, VideoModel};
    use crate::infrastructure::adapters::FakePlatform;
    use crate::infrastructure::events::EventPublisher;

    fn snapshot(status: TaskStatus, progress: i64, file: Option<&str>) -> TaskSnapshot {
        TaskSnapshot::new(status, Progress::new(progress), file.map(FileRef::new))
    }

    fn poller(platform: Arc<FakePlatform>, events: Arc<EventPublisher>, max_polls: Option<u32>) -> TaskPoller {
        TaskPoller::new(
            platform,
            events,
            TaskPollerConfig {
                interval: Duration::from_millis(2000),
                max_polls,
            },
        )
    }

    fn progress_events(rx: &mut tokio::sync::broadcast::Receiver<StudioEvent>) -> Vec<u8> {
        let mut seen = Vec::new();
        while let Ok(event) = rx.try_recv() {
            if let StudioEvent::VideoProgress { progress, .. } = event {
                seen.push(progress);
            }
        }
        seen
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_resolves_artifact_once() {
        let platform = Arc::new(FakePlatform::new().with_poll_script(vec![
            Ok(snapshot(TaskStatus::Pending, 0, None)),
            Ok(snapshot(TaskStatus::Running, 40, None)),
            Ok(snapshot(TaskStatus::Completed, 100, Some("f1"))),
        ]));
        let events = Arc::new(EventPublisher::new());
        let poller = poller(platform.clone(), events, None);

        let artifact = poller
            .run(&TaskHandle::new("task-1"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(artifact.file_ref, FileRef::new("f1"));
        assert_eq!(artifact.url, "https://files.fake/f1");
        assert_eq!(platform.calls_to("poll_video_task"), 3);
        assert_eq!(platform.calls_to("resolve_file"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_published_in_poll_order() {
        let platform = Arc::new(FakePlatform::new().with_poll_script(vec![
            Ok(snapshot(TaskStatus::Running, 10, None)),
            Ok(snapshot(TaskStatus::Running, 55, None)),
            Ok(snapshot(TaskStatus::Completed, 100, Some("f1"))),
        ]));
        let events = Arc::new(EventPublisher::new());
        let mut rx = events.subscribe();
        let poller = poller(platform.clone(), events, None);

        let artifact = poller
            .run(&TaskHandle::new("task-1"), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(progress_events(&mut rx), vec![10, 55, 100]);
        assert_eq!(artifact.file_ref.as_str(), "f1");
        assert_eq!(platform.calls_to("resolve_file"), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_task_stops_polling() {
        let platform = Arc::new(FakePlatform::new().with_poll_script(vec![
            Ok(snapshot(TaskStatus::Running, 30, None)),
            Ok(snapshot(TaskStatus::Failed, 30, None)),
            Ok(snapshot(TaskStatus::Completed, 100, Some("f1"))),
        ]));
        let poller = poller(platform.clone(), Arc::new(EventPublisher::new()), None);

        let err = poller
            .run(&TaskHandle::new("task-9"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err, PollerError::GenerationFailed { ref task_id } if task_id == "task-9"));
        assert_eq!(platform.calls_to("poll_video_task"), 2);
        assert_eq!(platform.calls_to("resolve_file"), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_fixed_interval() {
        let platform = Arc::new(FakePlatform::new().with_poll_script(vec![
            Ok(snapshot(TaskStatus::Running, 10, None)),
            Ok(snapshot(TaskStatus::Running, 20, None)),
            Ok(snapshot(TaskStatus::Completed, 100, Some("f1"))),
        ]));
        let poller = poller(platform, Arc::new(EventPublisher::new()), None);

        let started = tokio::time::Instant::now();
        poller
            .run(&TaskHandle::new("task-1"), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(started.elapsed(), Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_without_file_is_error() {
        let platform = Arc::new(
            FakePlatform::new().with_poll_script(vec![Ok(snapshot(TaskStatus::Completed, 100, None))]),
        );
        let poller = poller(platform, Arc::new(EventPublisher::new()), None);

        let err = poller
            .run(&TaskHandle::new("task-1"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PollerError::MissingArtifact { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_limit() {
        let platform = Arc::new(
            FakePlatform::new().with_poll_script(vec![Ok(snapshot(TaskStatus::Running, 10, None))]),
        );
        let poller = poller(platform.clone(), Arc::new(EventPublisher::new()), Some(3));

        let err = poller
            .run(&TaskHandle::new("task-1"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PollerError::PollLimitExceeded { polls: 3, .. }));
        assert_eq!(platform.calls_to("poll_video_task"), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_error_surfaces() {
        let platform = Arc::new(FakePlatform::new().with_poll_script(vec![Err(
            PlatformError::remote(2013, "invalid task id"),
        )]));
        let poller = poller(platform, Arc::new(EventPublisher::new()), None);

        let err = poller
            .run(&TaskHandle::new("task-1"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PollerError::Poll(PlatformError::RemoteStatus { status: 2013, .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_loop() {
        let platform = Arc::new(
            FakePlatform::new().with_poll_script(vec![Ok(snapshot(TaskStatus::Running, 10, None))]),
        );
        let poller = Arc::new(poller(platform.clone(), Arc::new(EventPublisher::new()), None));
        let cancel = CancellationToken::new();

        let run = {
            let poller = poller.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { poller.run(&TaskHandle::new("task-1"), &cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(5000)).await;
        cancel.cancel();
        let err = run.await.unwrap().unwrap_err();
        assert!(matches!(err, PollerError::Cancelled));

        let polls = platform.calls_to("poll_video_task");
        assert_eq!(polls, 3);
        tokio::time::sleep(Duration::from_millis(10_000)).await;
        assert_eq!(platform.calls_to("poll_video_task"), polls);
    }

    #[tokio::test]
    async fn test_submit_returns_handle() {
        let platform = Arc::new(FakePlatform::new());
        let poller = poller(platform, Arc::new(EventPublisher::new()), None);
        let request = VideoRequest::new(VideoModel::Video01, "a cat", true, None, None).unwrap();

        let handle = poller.submit(&request).await.unwrap();
        assert_eq!(handle.task_id(), "task-1");
    }

    #[tokio::test]
    async fn test_submit_failure() {
        let platform = Arc::new(
            FakePlatform::new().with_submit_error(PlatformError::remote(1008, "insufficient balance")),
        );
        let poller = poller(platform, Arc::new(EventPublisher::new()), None);
        let request = VideoRequest::new(VideoModel::Video01, "a cat", true, None, None).unwrap();

        assert!(matches!(
            poller.submit(&request).await,
            Err(PollerError::Submission(_))
        ));
    }
}
