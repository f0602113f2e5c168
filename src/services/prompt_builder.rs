//! 提示词构建服务 - 业务能力层
//!
//! 只负责把题目描述、评级映射和最新快照渲染成发给推理服务的文本
//!
//! 两条硬约束：
//! - 指令模板是静态资产，下游解析假设建立在它的措辞之上，任何改动都是破坏性变更
//! - 相同输入必须渲染出字节相同的输出，因此快照按 `student_id` 排序后再序列化

use std::collections::HashMap;

use crate::models::CodeSnapshot;

/// 发给推理服务的固定指令模板
///
/// 描述了期望的输出 JSON 结构和错误类别分类法
const INSTRUCTIONS: &str = r#"# LLM Prompt: Analyze, Assess, and Generate Remediation Ideas for CS1 Student Code Submissions

## Role and Goal

You are an expert AI assistant specializing in analyzing and assessing student code submissions for introductory computer science exercises (CS1/CS2 level). Your goal is to process a batch of student code submissions for a specific programming problem, **evaluate each submission's likely correctness and adherence to requirements based *solely* on static code analysis**, and generate a structured JSON summary. This summary should provide instructors with actionable insights for **Monitoring** student progress (performance levels), **Analyzing** common issues (errors, correlations, misconceptions), and **Responding** with targeted instructional support (explanations, examples, follow-up questions).

## CRITICAL: JSON OUTPUT REQUIREMENTS

Your response MUST be valid JSON only. Do not include any text before or after the JSON. Do not wrap it in markdown code blocks. Do not include comments in the JSON. Ensure all arrays and objects are properly closed with NO trailing commas.

The JSON must have this EXACT structure:

{
  "aggregate_analysis": {
    "top_errors": [...],
    "error_correlations": [...],
    "potential_misconceptions": [...]
  }
}

## Input Data Provided to You

You will be provided with the following inputs:

1.  **Problem Description:** The full text of the programming problem, including examples and specific requirements/constraints (e.g., functions not to use).
2.  **Student Submissions:** A JSON list where each object represents a single student's submission, containing:
3. **GradeMap:** A map of student Id and Assigned grade. If the map does not contain a students value, assign it to "NotAssessed"
* 'student_id': A unique identifier for the student.
* 'timestamp': The time of submission.
* 'content': A string containing the student's source code.
* **(Note: Assessment results like test pass/fail counts are NOT provided. You must infer correctness and errors from the code.)**

## Analysis Process and Output Structure

Analyze the provided data using the following staged process. You must perform the detailed error/misconception analysis described internally, as it is required for the aggregate stages. Format your final output **exclusively** as a single JSON object adhering to the structure specified at the end.

**Crucial Task:** Your primary challenge is to **simulate an assessment** through static analysis of each student's 'content' against the 'Problem Description'.

### Stage 1: Individual Code Assessment and Classification

For **each** student submission:

1.  **Analyze Code Logic & Requirements:**
* Does the code attempt to solve the correct problem as described?
* Does the core algorithm appear logically sound for typical cases?
* Does the code adhere to all specific requirements mentioned in the 'Problem Description' (e.g., not using forbidden functions like 'min()'/'max()', specific output formats)?
* **Internally identify** potential logical errors, incorrect initializations, mishandled edge cases (e.g., empty lists, single items, negatives, zeros), inefficiencies, requirement violations, or other flaws based on the code structure. This internal analysis is crucial for later stages.
* Estimate the likelihood of runtime errors ('IndexError', 'TypeError', etc.) based on the logic.
2.  **Classify Performance Level (Inferred): Use Grade map to do this

### Stage 2: Error Identification and Categorization (Aggregate)

Focusing primarily on errors *you identified internally* in submissions classified as "correct" or "incorrect":

1.  **Consolidate & Categorize Inferred Errors:** Group the errors identified across failing submissions using these categories:
* **Requirement Violation:** Code ignores explicit problem constraints.
* **Misinterpretation of Problem:** Code solves the wrong problem.
* **Logic Error:** Flawed reasoning in the algorithm.
* **Initialization Error:** Incorrect starting values for variables.
* **Control Flow Error:** Incorrect loops, branching, recursion.
* **Off-by-One Error:** Loop boundaries, indexing issues.
* **Edge Case Handling Error:** Failure on non-standard valid inputs.
* **Data Type Error:** Incorrect use or conversion of types.
* **Data Structure Error:** Incorrect use of lists, dictionaries, etc.
* **Function/Method Error:** Issues with definition, calls, parameters, returns.
* **Variable Scope Error:** Misunderstanding local vs. global scope.
* **Inefficiency/Suboptimal Algorithm:** Correct but slow/resource-intensive solution.
* **Potential Runtime Error:** High likelihood of crash (IndexError, TypeError, etc.).
* *(You may identify additional specific error patterns if frequent and distinct).*
2.  **Frequency Analysis:** Count occurrences for each category among "correct"/"incorrect".
3.  **Select Top Errors:** Identify the top 5 most frequent *inferred* error categories.
4.  **Output:** For each top error, populate an object in the 'top_errors' array containing 'category', 'occurrence_count', 'occurrence_percentage' (of failing students, format "XX.XX%"), 'description', 'example_code' (array of strings), and 'student_ids' (array of integers).

### Stage 3: Correlation and Pattern Analysis (Aggregate)

Analyze which *inferred* error categories (from Stage 2) frequently co-occur within the same "correct" or "incorrect" submissions.

1.  **Identify Strong Correlations:** Find the 3-5 strongest co-occurrence pairs among "correct"/"incorrect".
2.  **Output:** For each pair, populate an object in the 'error_correlations' array containing 'correlated_errors' (array of 2 strings), 'correlation_count', 'correlation_percentage' (of failing students, format "XX.XX%"), 'hypothesis' (string), 'example_code' (array of strings), and 'student_ids' (array of integers).

### Stage 4: Potential Misconception Inference and Remediation Content (Aggregate)

Based on the top *inferred* errors, correlations, and code patterns:

1.  **Infer Misconceptions:** Identify 1-3 high-level *potential* underlying conceptual misunderstandings likely explaining prevalent error patterns among "correct"/"incorrect" students.
2.  **Generate Remediation Content:** For each inferred misconception, *also* generate content suitable for instructor intervention (for the "Respond" dashboard).
3.  **Output:** For each inferred misconception, populate an object in the 'potential_misconceptions' array containing:
* 'misconception': Concise description of the potential misunderstanding.
* 'related_error_categories': Array of strings of inferred error categories strongly associated.
* 'occurrence_count': Approximate number of failing students whose inferred errors align.
* 'occurrence_percentage': Approximate percentage of failing students potentially affected (format "XX.XX%").
* 'explanation_diagnostic': Clear explanation of the likely misunderstanding (for the instructor's analysis).
* 'example_code_error': Array of strings (max 5-7 lines) code snippet vividly illustrating the *result* of this misconception.
* 'student_ids': Array of integers of 'student_id's of failing students whose code strongly suggests this misconception.
* **'suggested_explanation_for_students':** String with brief, clear, student-friendly explanation of the correct concept or why the misconception leads to errors.
* **'correct_code_example':** Array of strings (max 5-7 lines) minimal, correct code snippet demonstrating the *proper* way to handle the specific concept.
* **'follow_up_question':** String with short question designed to check student understanding after the explanation.

## Important Considerations & Limitations

* **Static Analysis Only:** Your assessment is based purely on reading the code. You cannot execute it. Inferences about errors, performance levels, and the generated remediation content require instructor validation.
* **Focus on Clarity:** Provide clear, concise descriptions, examples, explanations, and questions. Ensure generated code examples are minimal and directly relevant.
* **CRITICAL: Valid JSON Only:** Your entire response must be a single, valid JSON object. NO markdown, NO explanatory text, NO trailing commas, NO comments. Just pure JSON.

RESPOND WITH ONLY THE JSON OBJECT - NO OTHER TEXT OR FORMATTING."#;

/// 构建完整的分析请求文本
///
/// # 参数
/// - `problem_description`: 题目描述原文
/// - `grade_index`: 学生 ID 到评级标签的映射（模板中的 GradeMap）
/// - `latest`: 每个学生的最新快照（`snapshot_reducer::reduce` 的输出）
///
/// # 返回
/// 发给推理服务的完整提示词；相同输入保证输出字节相同
pub fn build(
    problem_description: &str,
    grade_index: &HashMap<i64, String>,
    latest: &HashMap<i64, CodeSnapshot>,
) -> String {
    format!(
        "Problem Description:\n{}\n\nInstructions: {}\nTotal Students:\n{}\nGrade Map:\n{}\nStudent Submissions:\n{}",
        problem_description,
        INSTRUCTIONS,
        latest.len(),
        format_grade_index(grade_index),
        format_snapshots(latest),
    )
}

/// 把评级映射渲染成提示词中的 JSON 对象
fn format_grade_index(grade_index: &HashMap<i64, String>) -> String {
    // 同样需要排序保证确定性
    let mut entries: Vec<(&i64, &String)> = grade_index.iter().collect();
    entries.sort_by_key(|(id, _)| **id);

    let mut result = String::from("{");
    for (i, (id, grade)) in entries.iter().enumerate() {
        if i > 0 {
            result.push_str(", ");
        }
        result.push_str(&format!("\"{}\": {}", id, json_escape(grade)));
    }
    result.push('}');
    result
}

/// 把快照集合渲染成提示词中的 JSON 数组
///
/// `content` 是任意学生代码，`timestamp` 也是未经校验的原始字符串，
/// 两者都必须经过 JSON 字符串转义（引号、反斜杠、控制字符），
/// 否则会破坏外层结构
fn format_snapshots(latest: &HashMap<i64, CodeSnapshot>) -> String {
    // HashMap 迭代顺序随机，先按学生 ID 排序保证确定性
    let mut snapshots: Vec<&CodeSnapshot> = latest.values().collect();
    snapshots.sort_by_key(|s| s.student_id);

    let mut result = String::from("[\n");
    for (i, snapshot) in snapshots.iter().enumerate() {
        if i > 0 {
            result.push_str(",\n");
        }
        result.push_str(&format!(
            "  {{\n    \"student_id\": {},\n    \"timestamp\": {},\n    \"content\": {}\n  }}",
            snapshot.student_id,
            json_escape(&snapshot.timestamp),
            json_escape(&snapshot.content),
        ));
    }
    result.push_str("\n]");
    result
}

/// 把任意字符串转义为合法的 JSON 字符串字面量（含两端引号）
fn json_escape(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(student_id: i64, content: &str) -> CodeSnapshot {
        CodeSnapshot {
            student_id,
            timestamp: "2025-03-01 10:00:00".to_string(),
            content: content.to_string(),
            grade: String::new(),
            snapshot_id: 1,
        }
    }

    fn latest_of(snapshots: Vec<CodeSnapshot>) -> HashMap<i64, CodeSnapshot> {
        snapshots.into_iter().map(|s| (s.student_id, s)).collect()
    }

    #[test]
    fn test_build_is_deterministic() {
        let latest = latest_of(vec![
            snapshot(9, "print('b')"),
            snapshot(7, "print('a')"),
            snapshot(11, "print('c')"),
        ]);
        let grades: HashMap<i64, String> = [
            (7, "Correct".to_string()),
            (9, "Incorrect".to_string()),
            (11, "NotAssessed".to_string()),
        ]
        .into_iter()
        .collect();

        let first = build("求两数之和", &grades, &latest);
        let second = build("求两数之和", &grades, &latest);

        assert_eq!(first, second);
    }

    #[test]
    fn test_grade_index_rendered_sorted() {
        let grades: HashMap<i64, String> =
            [(9, "Incorrect".to_string()), (7, "Correct".to_string())]
                .into_iter()
                .collect();

        let rendered = format_grade_index(&grades);
        assert_eq!(rendered, "{\"7\": \"Correct\", \"9\": \"Incorrect\"}");
    }

    #[test]
    fn test_snapshots_sorted_by_student_id() {
        let latest = latest_of(vec![snapshot(9, "b"), snapshot(7, "a")]);

        let rendered = format_snapshots(&latest);
        let pos_7 = rendered.find("\"student_id\": 7").unwrap();
        let pos_9 = rendered.find("\"student_id\": 9").unwrap();

        assert!(pos_7 < pos_9);
    }

    #[test]
    fn test_content_escaping_keeps_array_parseable() {
        // 学生代码里带引号、反斜杠和换行，不能破坏外层 JSON 结构
        let latest = latest_of(vec![snapshot(7, "s = \"a\\b\"\nprint(s) // done")]);

        let rendered = format_snapshots(&latest);
        let parsed: serde_json::Value =
            serde_json::from_str(&rendered).expect("快照数组应当是合法 JSON");

        assert_eq!(
            parsed[0]["content"].as_str().unwrap(),
            "s = \"a\\b\"\nprint(s) // done"
        );
    }

    #[test]
    fn test_timestamp_escaping_keeps_array_parseable() {
        // 时间戳字段不经过模型校验，带引号或反斜杠也不能破坏外层结构
        let mut snap = snapshot(7, "print('ok')");
        snap.timestamp = "2025-03-01 \"10:00:00\" \\UTC".to_string();
        let latest = latest_of(vec![snap]);

        let rendered = format_snapshots(&latest);
        let parsed: serde_json::Value =
            serde_json::from_str(&rendered).expect("快照数组应当是合法 JSON");

        assert_eq!(
            parsed[0]["timestamp"].as_str().unwrap(),
            "2025-03-01 \"10:00:00\" \\UTC"
        );
    }

    #[test]
    fn test_build_embeds_problem_and_count() {
        let latest = latest_of(vec![snapshot(7, "a"), snapshot(9, "b")]);
        let grades: HashMap<i64, String> = [(7, "Incorrect".to_string())].into_iter().collect();

        let prompt = build("打印斐波那契数列", &grades, &latest);

        assert!(prompt.contains("打印斐波那契数列"));
        assert!(prompt.contains("Total Students:\n2"));
        assert!(prompt.contains("\"7\": \"Incorrect\""));
        assert!(prompt.contains("aggregate_analysis"));
    }

    #[test]
    fn test_empty_set_renders_empty_array() {
        let prompt = build("题目", &HashMap::new(), &HashMap::new());
        assert!(prompt.contains("Total Students:\n0"));
        assert!(prompt.contains("[\n\n]"));
    }
}
