//! 响应清洗服务 - 业务能力层
//!
//! 只负责"把推理服务返回的半结构化文本修复成合法 JSON"能力
//!
//! 推理服务的输出不可信：尽管提示词三令五申只返回纯 JSON，
//! 实际响应里仍常见 markdown 围栏、尾随逗号、注释和 BOM。
//! 修复是保守的纯文本重写，修完必须通过一次完整的结构化解析门禁，
//! 过不了就带诊断摘录报错，绝不猜测、绝不降级为默认值

use regex::Regex;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// 诊断摘录的最大字符数
const EXCERPT_MAX_CHARS: usize = 1000;

/// 清洗推理服务返回的原始文本
///
/// 步骤依次为：
/// 1. 如果有 ``` 围栏（可带 json 标注），只取最内层围栏内容，丢弃围栏外的说明文字
/// 2. 去除首尾空白和开头的 BOM
/// 3. 文本修复：去掉 `}` / `]` 前的尾随逗号、`//` 行注释、`/*...*/` 块注释
/// 4. 结构化解析门禁：修复结果必须是合法 JSON
///
/// 对一次成功的输入重复调用结果不变（幂等）
///
/// # 返回
/// 成功时返回语法合法的 JSON 文本；
/// 失败时返回带摘录的 `MalformedAnalysis` 错误
pub fn sanitize(raw: &str) -> AppResult<String> {
    debug!("原始响应长度: {}", raw.len());

    // 提取 markdown 围栏内容
    let fence_re = Regex::new(r"(?s)```(?:json)?\n?(.*?)\n?```")?;
    let mut text = match fence_re.captures(raw).and_then(|c| c.get(1)) {
        Some(inner) => {
            let inner = inner.as_str().trim().to_string();
            debug!("从 markdown 围栏中提取 JSON，新长度: {}", inner.len());
            inner
        }
        None => raw.to_string(),
    };

    // 去除首尾空白和 BOM
    text = text.trim().trim_start_matches('\u{feff}').to_string();

    // 文本修复；行注释替换成换行符会留下新的首尾空白，修完必须再修剪一次，
    // 否则对同一输入跑两遍结果不同
    text = fix_common_json_issues(&text)?.trim().to_string();

    // 结构化解析门禁：过不了就报错，不再继续猜
    if let Err(e) = serde_json::from_str::<serde_json::Value>(&text) {
        return Err(AppError::malformed_analysis(excerpt(&text), e));
    }

    Ok(text)
}

/// 修复推理服务常见的 JSON 格式问题
///
/// 纯文本重写，不做 JSON 感知的解析。已知局限：字符串字面量内部的
/// `//` 和 `/*` 序列可能被误删，由后面的解析门禁兜底报错
fn fix_common_json_issues(text: &str) -> AppResult<String> {
    // 去掉闭合括号前的尾随逗号
    let re_brace = Regex::new(r",\s*\}")?;
    let text = re_brace.replace_all(text, "}");

    let re_bracket = Regex::new(r",\s*\]")?;
    let text = re_bracket.replace_all(&text, "]");

    // 去掉 JSON 中不合法的注释
    let re_line = Regex::new(r"//.*?\n")?;
    let text = re_line.replace_all(&text, "\n");

    let re_block = Regex::new(r"/\*.*?\*/")?;
    let text = re_block.replace_all(&text, "");

    Ok(text.into_owned())
}

/// 截取出错文本的有界摘录（按字符截断，避免落在多字节边界上）
fn excerpt(text: &str) -> String {
    if text.chars().count() > EXCERPT_MAX_CHARS {
        text.chars().take(EXCERPT_MAX_CHARS).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
