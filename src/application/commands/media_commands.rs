//! Media Commands - 文件上传与音乐生成

use crate::domain::media::UploadPurpose;

/// 上传文件命令
#[derive(Debug, Clone)]
pub struct UploadMedia {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub purpose: UploadPurpose,
}

/// 音乐生成命令
#[derive(Debug, Clone)]
pub struct GenerateMusic {
    pub lyrics: String,
    pub refer_voice: Option<String>,
    pub refer_instrumental: Option<String>,
}
