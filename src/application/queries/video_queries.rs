//! Video Queries - 任务状态与文件解析

/// 查询视频任务状态
#[derive(Debug, Clone)]
pub struct GetVideoStatus {
    pub task_id: String,
}

/// 解析文件下载地址
#[derive(Debug, Clone)]
pub struct ResolveFile {
    pub file_id: String,
}
