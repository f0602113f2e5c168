use std::fmt;

/// 应用程序错误类型
#[derive(Debug)]
pub enum AppError {
    /// 推理服务（LLM）调用错误
    Oracle(OracleError),
    /// 分析响应解析错误
    Analysis(AnalysisError),
    /// 持久化文档读写错误
    Persistence(PersistenceError),
    /// 其他错误（用于包装第三方库错误）
    Other(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Oracle(e) => write!(f, "推理服务错误: {}", e),
            AppError::Analysis(e) => write!(f, "分析响应错误: {}", e),
            AppError::Persistence(e) => write!(f, "持久化错误: {}", e),
            AppError::Other(msg) => write!(f, "错误: {}", msg),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Oracle(e) => Some(e),
            AppError::Analysis(e) => Some(e),
            AppError::Persistence(e) => Some(e),
            AppError::Other(_) => None,
        }
    }
}

/// 推理服务调用错误
///
/// 每次分析只调用一次，不做任何重试；调用方把失败视为整次分析失败
#[derive(Debug)]
pub enum OracleError {
    /// 网络层请求失败（连接失败、超时等）
    TransportFailure {
        endpoint: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 服务返回非成功状态码
    BadStatus {
        endpoint: String,
        status: u16,
        message: String,
    },
    /// 服务返回了响应但没有可用文本（结构缺失或内容为空）
    EmptyResponse {
        model: String,
    },
}

impl fmt::Display for OracleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OracleError::TransportFailure { endpoint, source } => {
                write!(f, "请求推理服务失败 ({}): {}", endpoint, source)
            }
            OracleError::BadStatus {
                endpoint,
                status,
                message,
            } => {
                write!(
                    f,
                    "推理服务返回错误状态 ({}): status={}, message={}",
                    endpoint, status, message
                )
            }
            OracleError::EmptyResponse { model } => {
                write!(f, "推理服务返回内容为空 (模型: {})", model)
            }
        }
    }
}

impl std::error::Error for OracleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            OracleError::TransportFailure { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            _ => None,
        }
    }
}

/// 分析响应解析错误
///
/// 区分三种情况：修复后仍不是合法 JSON、缺少聚合键、聚合键存在但结构不符
#[derive(Debug)]
pub enum AnalysisError {
    /// 清洗修复后仍无法解析为 JSON
    MalformedAnalysis {
        /// 出错文本的截断摘录（用于诊断）
        excerpt: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// JSON 中缺少 aggregate_analysis 键
    MissingAggregateKey,
    /// aggregate_analysis 存在但结构不符合预期
    SchemaMismatch {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalysisError::MalformedAnalysis { excerpt, source } => {
                write!(f, "响应不是合法 JSON: {} (摘录: {})", source, excerpt)
            }
            AnalysisError::MissingAggregateKey => {
                write!(f, "响应 JSON 中缺少 'aggregate_analysis' 键")
            }
            AnalysisError::SchemaMismatch { source } => {
                write!(f, "'aggregate_analysis' 结构不符合预期: {}", source)
            }
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AnalysisError::MalformedAnalysis { source, .. }
            | AnalysisError::SchemaMismatch { source } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            AnalysisError::MissingAggregateKey => None,
        }
    }
}

/// 持久化文档读写错误
#[derive(Debug)]
pub enum PersistenceError {
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败（写临时文件或原子重命名失败）
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 文件内容不是合法 JSON
    InvalidDocument {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 文档顶层不是 JSON 对象，无法合并
    NotAnObject {
        path: String,
    },
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::ReadFailed { path, source } => {
                write!(f, "读取文档失败 ({}): {}", path, source)
            }
            PersistenceError::WriteFailed { path, source } => {
                write!(f, "写入文档失败 ({}): {}", path, source)
            }
            PersistenceError::InvalidDocument { path, source } => {
                write!(f, "文档不是合法 JSON ({}): {}", path, source)
            }
            PersistenceError::NotAnObject { path } => {
                write!(f, "文档顶层不是 JSON 对象 ({})", path)
            }
        }
    }
}

impl std::error::Error for PersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PersistenceError::ReadFailed { source, .. }
            | PersistenceError::WriteFailed { source, .. }
            | PersistenceError::InvalidDocument { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            PersistenceError::NotAnObject { .. } => None,
        }
    }
}

// ========== 从常见错误类型转换 ==========
// 注意：不需要手动实现 From<AppError> for anyhow::Error，
// 因为 anyhow 已经为所有实现了 std::error::Error 的类型提供了自动实现

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::Other(format!("正则表达式错误: {}", err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建网络层请求失败错误
    pub fn transport_failure(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Oracle(OracleError::TransportFailure {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建非成功状态码错误
    pub fn bad_status(
        endpoint: impl Into<String>,
        status: u16,
        message: impl Into<String>,
    ) -> Self {
        AppError::Oracle(OracleError::BadStatus {
            endpoint: endpoint.into(),
            status,
            message: message.into(),
        })
    }

    /// 创建空响应错误
    pub fn empty_response(model: impl Into<String>) -> Self {
        AppError::Oracle(OracleError::EmptyResponse {
            model: model.into(),
        })
    }

    /// 创建响应不可解析错误
    pub fn malformed_analysis(
        excerpt: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Analysis(AnalysisError::MalformedAnalysis {
            excerpt: excerpt.into(),
            source: Box::new(source),
        })
    }

    /// 创建缺少聚合键错误
    pub fn missing_aggregate_key() -> Self {
        AppError::Analysis(AnalysisError::MissingAggregateKey)
    }

    /// 创建结构不符错误
    pub fn schema_mismatch(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        AppError::Analysis(AnalysisError::SchemaMismatch {
            source: Box::new(source),
        })
    }

    /// 创建文档读取失败错误
    pub fn read_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Persistence(PersistenceError::ReadFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文档写入失败错误
    pub fn write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Persistence(PersistenceError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文档非法 JSON 错误
    pub fn invalid_document(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Persistence(PersistenceError::InvalidDocument {
            path: path.into(),
            source: Box::new(source),
        })
    }

    /// 创建文档顶层非对象错误
    pub fn not_an_object(path: impl Into<String>) -> Self {
        AppError::Persistence(PersistenceError::NotAnObject { path: path.into() })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
