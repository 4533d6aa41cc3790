//! Generation Context - Aggregate Root

use chrono::{DateTime, Utc};

use super::{FileRef, GenerationError, Progress, TaskSnapshot, TaskStatus};

/// 远程生成任务聚合根
///
/// 不变量:
/// - 提交时创建，初始状态为 pending
/// - 只由轮询结果修改
/// - completed / failed 为终态，不再迁出
#[derive(Debug, Clone)]
pub struct GenerationTask {
    id: String,
    status: TaskStatus,
    progress: Progress,
    result_ref: Option<FileRef>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl GenerationTask {
    /// 提交成功后创建任务
    pub fn submitted(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: TaskStatus::Pending,
            progress: Progress::default(),
            result_ref: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// 应用一次轮询结果
    pub fn apply(&mut self, snapshot: &TaskSnapshot) -> Result<(), GenerationError> {
        if !self.status.can_transition_to(snapshot.status) {
            return Err(GenerationError::InvalidTransition {
                from: self.status,
                to: snapshot.status,
            });
        }

        self.status = snapshot.status;
        self.progress = snapshot.progress;
        if snapshot.file_ref.is_some() {
            self.result_ref = snapshot.file_ref.clone();
        }
        if self.status.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        Ok(())
    }

    // Getters
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn result_ref(&self) -> Option<&FileRef> {
        self.result_ref.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
