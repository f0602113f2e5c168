//! 文档存储服务 - 业务能力层
//!
//! 只负责持久化文档的读、合并、写能力，不关心流程
//!
//! 两条硬约束：
//! - 合并只重写 `analysisData` 键，其余顶层键（包括本服务不认识的键）原样透传，
//!   绝不按局部 schema 重建整个文档
//! - 写入从调用方视角是全有或全无：先写同目录临时文件再原子重命名，
//!   失败时磁盘上保留原文档

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::AnalysisData;

/// 合并时重写的唯一顶层键
const ANALYSIS_KEY: &str = "analysisData";

/// 文档存储服务
pub struct DocumentStore {
    data_file: PathBuf,
}

impl DocumentStore {
    /// 根据配置创建文档存储
    pub fn new(config: &Config) -> Self {
        Self {
            data_file: PathBuf::from(&config.data_file),
        }
    }

    /// 使用自定义文件路径创建
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            data_file: path.into(),
        }
    }

    /// 数据文件路径（用于日志和错误信息）
    pub fn path(&self) -> &Path {
        &self.data_file
    }

    fn path_str(&self) -> String {
        self.data_file.display().to_string()
    }

    /// 读取并解析持久化文档
    pub fn load(&self) -> AppResult<Value> {
        let raw = fs::read_to_string(&self.data_file)
            .map_err(|e| AppError::read_failed(self.path_str(), e))?;

        let document: Value = serde_json::from_str(&raw)
            .map_err(|e| AppError::invalid_document(self.path_str(), e))?;

        Ok(document)
    }

    /// 把分析结果段合并进文档
    ///
    /// 只替换 `analysisData` 键；其余顶层键逐一原样保留。
    /// 文档顶层必须是 JSON 对象，否则无处放置分析段
    pub fn merge(&self, mut document: Value, data: &AnalysisData) -> AppResult<Value> {
        let object = document
            .as_object_mut()
            .ok_or_else(|| AppError::not_an_object(self.path_str()))?;

        let analysis_value = serde_json::to_value(data)
            .map_err(|e| AppError::write_failed(self.path_str(), e))?;
        object.insert(ANALYSIS_KEY.to_string(), analysis_value);

        Ok(document)
    }

    /// 原子写回文档（美化缩进的 UTF-8 JSON）
    ///
    /// 先写同目录的临时文件，再重命名覆盖；任何一步失败都不会
    /// 留下半写状态的文档
    pub fn save(&self, document: &Value) -> AppResult<()> {
        let pretty = serde_json::to_string_pretty(document)
            .map_err(|e| AppError::write_failed(self.path_str(), e))?;

        let tmp_path = self.data_file.with_extension("json.tmp");

        fs::write(&tmp_path, pretty).map_err(|e| AppError::write_failed(self.path_str(), e))?;

        fs::rename(&tmp_path, &self.data_file).map_err(|e| {
            // 重命名失败时清掉临时文件，别在数据目录里留垃圾
            let _ = fs::remove_file(&tmp_path);
            AppError::write_failed(self.path_str(), e)
        })?;

        debug!("文档已写回: {}", self.data_file.display());

        Ok(())
    }
}
