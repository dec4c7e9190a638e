//! Prompt construction for plan generation

use crate::completion::CompletionRequest;

const SYSTEM_PROMPT: &str = "\
You are an expert code editor for the repository described below.
Your job: propose minimal, safe patches to implement the user task.
Rules:
- Return ONLY a JSON object with keys \"summary\" and \"patches\".
- Prefer small, focused changes; avoid refactors unless required.
- If creating files, include complete content.
- If updating files, include the full new content of the file.
- Follow the language and conventions already used in the repository.
- Never invent secrets; read them from the environment.
- Ensure the project still builds.";

const CONTRACT: &str = r#"{
  "summary": string,
  "patches": [
    { "path": string, "op": "create"|"update"|"delete", "content"?: string }
  ]
}"#;

/// Build the completion request for a task
pub fn build_plan_request(task: &str, tree_summary: Option<&str>) -> CompletionRequest {
    let tree = tree_summary
        .filter(|t| !t.trim().is_empty())
        .unwrap_or("(no tree provided)");

    let user = format!(
        "Repository tree (may be partial):\n{tree}\n\nTask:\n{task}\n\nReturn JSON strictly matching:\n{CONTRACT}"
    );

    CompletionRequest {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// Summarize a repository file listing for the prompt
///
/// Lists at most `limit` paths but always reports the full count.
pub fn summarize_tree(branch: &str, files: &[String], limit: usize) -> String {
    let mut summary = format!("Branch: {branch}\nFiles ({}):\n", files.len());
    let shown: Vec<&str> = files.iter().take(limit).map(String::as_str).collect();
    summary.push_str(&shown.join("\n"));
    summary
}
