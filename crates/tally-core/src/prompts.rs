//! Prompt library
//!
//! Prompts are loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/tally/prompts/overrides/)
//! 2. Fall back to embedded defaults (compiled into binary)
//!
//! A prompt file is YAML frontmatter followed by `# System` and `# User`
//! sections. `{{var}}` placeholders are substituted at render time and
//! `{{#if var}}...{{/if}}` blocks are dropped when `var` is missing or empty.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Embedded default prompts (compiled into binary)
mod defaults {
    pub const PARSE_EXPENSE: &str = include_str!("../../../prompts/parse_expense.md");
}

/// Known prompt IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptId {
    /// Free text to `{amount, category, description}` JSON
    ParseExpense,
}

impl PromptId {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ParseExpense => "parse_expense",
        }
    }

    pub fn all() -> &'static [PromptId] {
        &[Self::ParseExpense]
    }

    fn default_content(&self) -> &'static str {
        match self {
            Self::ParseExpense => defaults::PARSE_EXPENSE,
        }
    }
}

/// Prompt frontmatter metadata
#[derive(Debug, Clone, Deserialize)]
pub struct PromptMetadata {
    pub id: String,
    /// Bumped whenever the wording changes
    pub version: u32,
    pub task_type: String,
}

/// A loaded prompt with metadata and content
#[derive(Debug, Clone)]
pub struct Prompt {
    pub metadata: PromptMetadata,
    /// Body after the frontmatter (system + user sections)
    pub content: String,
    pub is_override: bool,
    pub override_path: Option<PathBuf>,
}

impl Prompt {
    pub fn system_section(&self) -> Option<&str> {
        extract_section(&self.content, "# System")
    }

    pub fn user_section(&self) -> Option<&str> {
        extract_section(&self.content, "# User")
    }

    /// Render the system section; the whole body if it has no sections
    pub fn render_system(&self, vars: &HashMap<&str, &str>) -> String {
        render_template(self.system_section().unwrap_or(&self.content), vars)
    }

    /// Render the user section; `None` if the prompt has none
    pub fn render_user(&self, vars: &HashMap<&str, &str>) -> Option<String> {
        self.user_section().map(|user| render_template(user, vars))
    }
}

/// Prompt library for loading and caching prompts
pub struct PromptLibrary {
    override_dir: Option<PathBuf>,
    cache: HashMap<PromptId, Prompt>,
}

impl PromptLibrary {
    /// Create a new prompt library with default paths
    pub fn new() -> Self {
        Self {
            override_dir: default_prompts_dir(),
            cache: HashMap::new(),
        }
    }

    pub fn with_override_dir(path: PathBuf) -> Self {
        Self {
            override_dir: Some(path),
            cache: HashMap::new(),
        }
    }

    /// Embedded prompts only; override files are ignored
    pub fn embedded_only() -> Self {
        Self {
            override_dir: None,
            cache: HashMap::new(),
        }
    }

    /// Get a prompt by ID, loading from override or default
    pub fn get(&mut self, id: PromptId) -> Result<&Prompt> {
        if !self.cache.contains_key(&id) {
            let prompt = self.load(id)?;
            self.cache.insert(id, prompt);
        }
        self.cache
            .get(&id)
            .ok_or_else(|| Error::InvalidData(format!("Prompt not cached: {}", id.as_str())))
    }

    fn load(&self, id: PromptId) -> Result<Prompt> {
        if let Some(override_path) = self.override_path(id).filter(|p| p.exists()) {
            let content = fs::read_to_string(&override_path).map_err(|e| {
                Error::InvalidData(format!("Failed to read prompt override: {}", e))
            })?;
            let (metadata, body) = parse_prompt(&content)?;
            tracing::debug!(prompt = id.as_str(), path = %override_path.display(), "Using prompt override");
            return Ok(Prompt {
                metadata,
                content: body,
                is_override: true,
                override_path: Some(override_path),
            });
        }

        let (metadata, body) = parse_prompt(id.default_content())?;
        Ok(Prompt {
            metadata,
            content: body,
            is_override: false,
            override_path: None,
        })
    }

    fn override_path(&self, id: PromptId) -> Option<PathBuf> {
        self.override_dir
            .as_ref()
            .map(|d| d.join(format!("{}.md", id.as_str())))
    }

    pub fn has_override(&self, id: PromptId) -> bool {
        self.override_path(id).is_some_and(|p| p.exists())
    }

    pub fn override_dir(&self) -> Option<&PathBuf> {
        self.override_dir.as_ref()
    }
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self::new()
    }
}

/// Default prompts override directory
pub fn default_prompts_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("tally").join("prompts").join("overrides"))
}

/// Parse a prompt file into metadata and body
fn parse_prompt(content: &str) -> Result<(PromptMetadata, String)> {
    let content = content.trim();

    let rest = content.strip_prefix("---").ok_or_else(|| {
        Error::InvalidData("Prompt must start with YAML frontmatter (---)".into())
    })?;

    let end = rest.find("---").ok_or_else(|| {
        Error::InvalidData("Prompt frontmatter not closed (missing second ---)".into())
    })?;

    let frontmatter = rest[..end].trim();
    let body = rest[end + 3..].trim();

    let metadata: PromptMetadata = serde_yaml::from_str(frontmatter)
        .map_err(|e| Error::InvalidData(format!("Invalid prompt frontmatter: {}", e)))?;

    Ok((metadata, body.to_string()))
}

/// Extract a section from the prompt content
fn extract_section<'a>(content: &'a str, header: &str) -> Option<&'a str> {
    let start = content.find(header)?;
    let after_header = &content[start + header.len()..];

    // Runs until the next top-level header
    let end = after_header.find("\n# ").unwrap_or(after_header.len());

    Some(after_header[..end].trim())
}

/// Substitute `{{var}}` placeholders in one pass; inserted values are not
/// scanned again, and unknown placeholders are left as written
fn render_template(template: &str, vars: &HashMap<&str, &str>) -> String {
    let resolved = remove_unmatched_conditionals(template, vars);
    let mut result = String::with_capacity(resolved.len());
    let mut rest = resolved.as_str();

    while let Some(open) = rest.find("{{") {
        result.push_str(&rest[..open]);
        let after = &rest[open + 2..];
        let Some(close) = after.find("}}") else {
            result.push_str(&rest[open..]);
            return result;
        };
        match vars.get(&after[..close]) {
            Some(value) => result.push_str(value),
            None => result.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &after[close + 2..];
    }
    result.push_str(rest);
    result
}

/// Resolve `{{#if var}}...{{/if}}` blocks
fn remove_unmatched_conditionals(content: &str, vars: &HashMap<&str, &str>) -> String {
    let mut result = content.to_string();

    while let Some(if_start) = result.find("{{#if ") {
        let var_start = if_start + 6;
        let Some(var_end) = result[var_start..].find("}}") else {
            break;
        };
        let var_name = &result[var_start..var_start + var_end];
        let block_start = var_start + var_end + 2;

        let Some(endif_pos) = result[block_start..].find("{{/if}}") else {
            break;
        };
        let block_content = &result[block_start..block_start + endif_pos];
        let full_end = block_start + endif_pos + 7;

        let keep = vars.get(var_name).is_some_and(|v| !v.is_empty());
        result = if keep {
            format!("{}{}{}", &result[..if_start], block_content, &result[full_end..])
        } else {
            format!("{}{}", &result[..if_start], &result[full_end..])
        };
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"---
id: sample
version: 2
task_type: structured_extraction
---

# System
Pick one of:
{{categories}}
{{#if hint}}Hint: {{hint}}{{/if}}

# User
{{input}}
"#;

    fn sample_prompt() -> Prompt {
        let (metadata, content) = parse_prompt(SAMPLE).unwrap();
        Prompt {
            metadata,
            content,
            is_override: false,
            override_path: None,
        }
    }

    #[test]
    fn test_parse_prompt() {
        let (metadata, body) = parse_prompt(SAMPLE).unwrap();
        assert_eq!(metadata.id, "sample");
        assert_eq!(metadata.version, 2);
        assert_eq!(metadata.task_type, "structured_extraction");
        assert!(body.starts_with("# System"));
    }

    #[test]
    fn test_parse_prompt_requires_frontmatter() {
        assert!(parse_prompt("# System\nhello").is_err());
        assert!(parse_prompt("---\nid: x\n# System").is_err());
    }

    #[test]
    fn test_sections_and_render() {
        let prompt = sample_prompt();
        let mut vars = HashMap::new();
        vars.insert("categories", "- FOOD");
        vars.insert("input", "lunch 150");

        let system = prompt.render_system(&vars);
        assert!(system.contains("- FOOD"));
        assert!(!system.contains("Hint"));
        assert!(!system.contains("lunch 150"));
        assert_eq!(prompt.render_user(&vars).unwrap(), "lunch 150");

        vars.insert("hint", "be brief");
        assert!(prompt.render_system(&vars).contains("Hint: be brief"));
    }

    #[test]
    fn test_placeholder_like_values_are_not_expanded_as_conditionals() {
        let prompt = sample_prompt();
        let mut vars = HashMap::new();
        vars.insert("categories", "{{#if x}}kept{{/if}}");
        assert!(prompt.render_system(&vars).contains("{{#if x}}kept{{/if}}"));
    }

    #[test]
    fn test_inserted_values_are_not_substituted_again() {
        let prompt = sample_prompt();
        let mut vars = HashMap::new();
        vars.insert("categories", "Costco {{input}} -> SHOPPING");
        vars.insert("input", "lunch 150");

        for _ in 0..20 {
            let system = prompt.render_system(&vars);
            assert!(system.contains("Costco {{input}} -> SHOPPING"));
            assert!(!system.contains("lunch 150"));
        }
    }

    #[test]
    fn test_render_template_leaves_unknown_placeholders() {
        let mut vars = HashMap::new();
        vars.insert("a", "1");
        assert_eq!(render_template("{{a}} {{b}} {{a", &vars), "1 {{b}} {{a");
    }

    #[test]
    fn test_embedded_prompts_parse() {
        let mut lib = PromptLibrary::embedded_only();
        for id in PromptId::all() {
            let prompt = lib.get(*id).unwrap();
            assert_eq!(prompt.metadata.id, id.as_str());
            assert!(!prompt.is_override);
            assert!(prompt.system_section().is_some());
            assert!(prompt.user_section().is_some());
        }
    }

    #[test]
    fn test_parse_expense_placeholders() {
        let mut lib = PromptLibrary::embedded_only();
        let prompt = lib.get(PromptId::ParseExpense).unwrap();
        let system = prompt.system_section().unwrap();
        assert!(system.contains("{{categories}}"));
        assert!(system.contains("{{learning_context}}"));
        assert_eq!(prompt.user_section().unwrap(), "{{input}}");
    }

    #[test]
    fn test_override_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("parse_expense.md"),
            "---\nid: parse_expense\nversion: 9\ntask_type: custom\n---\n# System\nCustom\n# User\n{{input}}",
        )
        .unwrap();

        let mut lib = PromptLibrary::with_override_dir(dir.path().to_path_buf());
        assert!(lib.has_override(PromptId::ParseExpense));
        let prompt = lib.get(PromptId::ParseExpense).unwrap();
        assert!(prompt.is_override);
        assert_eq!(prompt.metadata.version, 9);
        assert_eq!(prompt.system_section(), Some("Custom"));
    }
}
