//! Model server discovery.
//!
//! Before the `llm` generator is used, the CLI asks the server for its
//! model list (Ollama's `/api/tags`) so a missing model is reported up
//! front instead of on the first chat turn.

use serde::Deserialize;

/// A single model entry returned by `/api/tags`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerModel {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<ServerModel>,
}

/// Fetch the list of models the server has available.
pub fn fetch_models(base_url: &str) -> Result<Vec<ServerModel>, String> {
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    let response = reqwest::blocking::get(&url)
        .map_err(|e| format!("model server unreachable at {}: {}", url, e))?;

    if !response.status().is_success() {
        return Err(format!("model server returned HTTP {}", response.status()));
    }

    let tags: TagsResponse = response
        .json()
        .map_err(|e| format!("Failed to parse model list: {}", e))?;
    Ok(tags.models)
}

/// Whether `model` is in `models`. A bare name also matches any tag of it,
/// so `llama3` matches `llama3:latest`.
pub fn has_model(models: &[ServerModel], model: &str) -> bool {
    models.iter().any(|m| {
        m.name == model
            || m.name
                .strip_prefix(model)
                .is_some_and(|rest| rest.starts_with(':'))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn models(names: &[&str]) -> Vec<ServerModel> {
        names
            .iter()
            .map(|n| ServerModel { name: n.to_string() })
            .collect()
    }

    #[test]
    fn tags_response_parses() {
        let body = r#"{"models":[{"name":"llama3:latest","size":1},{"name":"mistral:7b"}]}"#;
        let tags: TagsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(tags.models.len(), 2);
        assert_eq!(tags.models[1].name, "mistral:7b");
    }

    #[test]
    fn bare_name_matches_tagged_model() {
        assert!(has_model(&models(&["llama3:latest"]), "llama3"));
    }

    #[test]
    fn exact_tag_matches() {
        assert!(has_model(&models(&["mistral:7b"]), "mistral:7b"));
    }

    #[test]
    fn prefix_of_another_name_does_not_match() {
        assert!(!has_model(&models(&["llama3.1:8b"]), "llama3"));
        assert!(!has_model(&[], "llama3"));
    }
}
