//! Gemini 客户端 - 业务能力层
//!
//! 只负责"调用一次推理服务拿到原始文本"能力，不关心流程
//!
//! 对上层而言这是一个不透明的黑盒：输入提示词，输出原始文本或错误。
//! 单次分析只调用一次，超时固定，失败不重试（重试是调度方的事）

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// 推理服务的能力接口
///
/// workflow 层只依赖这个接口，测试时可以用假实现替换真实服务
#[async_trait]
pub trait AnalysisOracle: Send + Sync {
    /// 发送提示词，返回推理服务的原始文本
    async fn analyze(&self, prompt: &str) -> AppResult<String>;
}

// ========== Gemini generateContent 请求/响应结构 ==========

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// Gemini 客户端
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    api_base_url: String,
    model_name: String,
    timeout: Duration,
}

impl GeminiClient {
    /// 根据配置创建新的 Gemini 客户端
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config.gemini_api_key.clone(),
            api_base_url: config.gemini_api_base_url.clone(),
            model_name: config.gemini_model_name.clone(),
            timeout: Duration::from_secs(config.llm_timeout_secs),
        }
    }

    /// 请求端点（不含 key 参数，可安全写入日志）
    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.api_base_url, self.model_name
        )
    }
}

#[async_trait]
impl AnalysisOracle for GeminiClient {
    async fn analyze(&self, prompt: &str) -> AppResult<String> {
        let endpoint = self.endpoint();
        debug!("调用 Gemini API，模型: {}", self.model_name);

        let body = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
        };

        let response = self
            .client
            .post(format!("{}?key={}", endpoint, self.api_key))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("Gemini API 请求失败: {}", e);
                AppError::transport_failure(&endpoint, e)
            })?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Gemini API 返回状态 {}: {}", status, message);
            return Err(AppError::bad_status(&endpoint, status.as_u16(), message));
        }

        // 响应体解析失败和文本字段缺失统一按空响应处理
        let parsed: GenerateContentResponse = match response.json().await {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Gemini 响应不是合法 JSON: {}", e);
                return Err(AppError::empty_response(&self.model_name));
            }
        };

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                warn!("Gemini 响应中找不到文本字段");
                AppError::empty_response(&self.model_name)
            })?;

        debug!("Gemini API 调用成功，响应长度: {}", text.len());

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> GeminiClient {
        GeminiClient::new(&Config::default())
    }

    #[test]
    fn test_endpoint_omits_api_key() {
        let client = test_client();
        let endpoint = client.endpoint();

        assert!(endpoint.ends_with("/models/gemini-2.0-flash:generateContent"));
        assert!(!endpoint.contains("key="));
    }

    #[test]
    fn test_response_text_extraction() {
        let raw = r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":1}"}]}}]}"#;
        let parsed: GenerateContentResponse = serde_json::from_str(raw).unwrap();

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .and_then(|p| p.text);

        assert_eq!(text.as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn test_response_without_candidates_is_tolerated() {
        // 结构缺失不应在反序列化阶段报错，由调用方统一归为空响应
        let parsed: GenerateContentResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.candidates.is_empty());
    }

    /// 真实调用 Gemini API（需要设置 GEMINI_API_KEY）
    #[tokio::test]
    #[ignore] // 默认忽略，需要手动运行：cargo test -- --ignored
    async fn test_analyze_live() {
        let config = Config::from_env();
        let client = GeminiClient::new(&config);

        let result = client.analyze("Reply with exactly: {\"ok\": true}").await;

        match result {
            Ok(text) => {
                println!("Gemini 响应: {}", text);
                assert!(!text.is_empty());
            }
            Err(e) => panic!("Gemini 调用失败: {}", e),
        }
    }
}
