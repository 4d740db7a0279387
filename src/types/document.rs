use serde::{Deserialize, Serialize};

/// 用户上传的纯文本文档
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct UploadedDocument {
    /// 文件名
    pub name: String,
    pub content: String,
}

/// 单个文档的摘要
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DocumentSummary {
    pub file_name: String,
    /// 正文前 1000 个字符
    pub excerpt: String,
    pub summary: String,
}
