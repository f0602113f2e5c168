//! 分析流程端到端测试
//!
//! 用假的推理服务跑完整流程，不触网

use std::fs;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use class_insight::error::AppResult;
use class_insight::services::gemini_client::AnalysisOracle;
use class_insight::services::DocumentStore;
use class_insight::workflow::AnalysisFlow;
use class_insight::AppError;

/// 返回预设响应的假推理服务，并记录收到的提示词
struct ScriptedOracle {
    response: String,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedOracle {
    fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl AnalysisOracle for ScriptedOracle {
    async fn analyze(&self, prompt: &str) -> AppResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self.response.clone())
    }
}

/// 永远失败的假推理服务
struct FailingOracle;

#[async_trait]
impl AnalysisOracle for FailingOracle {
    async fn analyze(&self, _prompt: &str) -> AppResult<String> {
        Err(AppError::empty_response("mock-model"))
    }
}

/// 构造规范场景的文档：
/// 学生 7 有两条提交（T2 > T1），学生 9 有一条，上次评级 {7: Incorrect}
fn seed_document() -> Value {
    json!({
        "problemDescription": {"problem_description": "求列表最大值，不许用 max()"},
        "codeSnapshots": {"entries": [
            {"student_id": 7, "timestamp": "2025-03-01 10:00:00", "content": "v1", "grade": "", "snapshot_id": 1},
            {"student_id": 7, "timestamp": "2025-03-01 11:00:00", "content": "v2", "grade": "", "snapshot_id": 2},
            {"student_id": 9, "timestamp": "2025-03-01 10:30:00", "content": "w1", "grade": "", "snapshot_id": 3}
        ]},
        "analysisData": {"individual_assessment": [
            {"student_id": 7, "performance_level": "Incorrect"}
        ]},
        "dashboardConfig": {"theme": "dark", "未知配置": [1, 2, 3]}
    })
}

/// 围栏包裹、带尾随逗号的"典型脏响应"
fn messy_response() -> String {
    "Sure! Here is the JSON:\n```json\n{\n  \"aggregate_analysis\": {\n    \"top_errors\": [{\n      \"category\": \"Logic Error\",\n      \"occurrence_count\": 1,\n      \"occurrence_percentage\": \"100.00%\",\n      \"description\": \"d\",\n      \"example_code\": [\"x\"],\n      \"student_ids\": [7],\n    }],\n    \"error_correlations\": [],\n    \"potential_misconceptions\": [],\n  }\n}\n```".to_string()
}

fn setup(dir: &tempfile::TempDir) -> DocumentStore {
    let path = dir.path().join("data.json");
    fs::write(&path, serde_json::to_string_pretty(&seed_document()).unwrap()).unwrap();
    DocumentStore::with_path(path)
}

#[tokio::test]
async fn test_full_pipeline_merges_analysis() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let oracle = ScriptedOracle::new(messy_response());

    let flow = AnalysisFlow::new(store, oracle);
    let merged = flow.run().await.expect("流程应当成功");

    // 本地统计：两个学生，评级 {7: Incorrect, 9: NotAssessed}
    let analysis = &merged["analysisData"];
    assert_eq!(analysis["overall_assessment"]["total_entries"], 2);

    let individual = analysis["individual_assessment"].as_array().unwrap();
    let mut levels: Vec<(i64, &str)> = individual
        .iter()
        .map(|e| {
            (
                e["student_id"].as_i64().unwrap(),
                e["performance_level"].as_str().unwrap(),
            )
        })
        .collect();
    levels.sort();
    assert_eq!(levels, vec![(7, "Incorrect"), (9, "NotAssessed")]);

    // 聚合分析来自（清洗后的）推理服务响应
    assert_eq!(
        analysis["aggregate_analysis"]["top_errors"][0]["category"],
        "Logic Error"
    );
    assert_eq!(analysis["isEnable"], true);

    // 无关的顶层键原样保留
    assert_eq!(merged["dashboardConfig"]["theme"], "dark");
    assert_eq!(
        merged["problemDescription"]["problem_description"],
        "求列表最大值，不许用 max()"
    );
}

#[tokio::test]
async fn test_prompt_uses_latest_snapshot_only() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let oracle = ScriptedOracle::new(messy_response());

    let flow = AnalysisFlow::new(store, oracle);
    flow.run().await.unwrap();

    let prompt = flow.oracle().last_prompt();

    // 学生 7 的旧提交 v1 被归并掉，只有 v2 进入提示词
    assert!(prompt.contains("\"v2\""));
    assert!(!prompt.contains("\"v1\""));
    assert!(prompt.contains("Total Students:\n2"));
    assert!(prompt.contains("求列表最大值"));
}

#[tokio::test]
async fn test_merged_document_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let oracle = ScriptedOracle::new(messy_response());

    let flow = AnalysisFlow::new(store, oracle);
    let merged = flow.run().await.unwrap();

    // 磁盘上的文档和返回值一致
    let on_disk = flow.store().load().unwrap();
    assert_eq!(on_disk, merged);
}

#[tokio::test]
async fn test_oracle_failure_leaves_document_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let before = fs::read_to_string(dir.path().join("data.json")).unwrap();

    let flow = AnalysisFlow::new(store, FailingOracle);
    let result = flow.run().await;

    assert!(result.is_err());
    let after = fs::read_to_string(dir.path().join("data.json")).unwrap();
    assert_eq!(before, after, "失败的分析不应触碰文档");
}

#[tokio::test]
async fn test_malformed_response_leaves_document_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);
    let before = fs::read_to_string(dir.path().join("data.json")).unwrap();

    let oracle = ScriptedOracle::new("抱歉，我无法生成有效的分析结果。");
    let flow = AnalysisFlow::new(store, oracle);
    let result = flow.run().await;

    assert!(result.is_err());
    let after = fs::read_to_string(dir.path().join("data.json")).unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_missing_aggregate_key_is_error_not_empty_result() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);

    // 合法 JSON 但没有 aggregate_analysis 键
    let oracle = ScriptedOracle::new(r#"{"top_errors": []}"#);
    let flow = AnalysisFlow::new(store, oracle);
    let err = flow.run().await.unwrap_err();

    assert!(err.to_string().contains("aggregate_analysis"));
}

#[tokio::test]
async fn test_comment_wrapped_response_is_accepted() {
    let dir = tempfile::tempdir().unwrap();
    let store = setup(&dir);

    let oracle = ScriptedOracle::new(
        "// comment\n{\"aggregate_analysis\": {\"top_errors\": [], \"error_correlations\": [], \"potential_misconceptions\": []}}",
    );
    let flow = AnalysisFlow::new(store, oracle);
    let merged = flow.run().await.expect("注释剥离后应当接受");

    assert!(merged["analysisData"]["aggregate_analysis"]["top_errors"]
        .as_array()
        .unwrap()
        .is_empty());
}
