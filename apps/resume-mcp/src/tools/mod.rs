//! Agent-facing tools. Each tool is a declaration (name, description, JSON
//! schema) plus an async handler over the shared repository and renderer.

mod context;
mod entries;
mod params;
mod preview;
mod resume;
mod template;

use std::fmt::Display;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::AuthContext;
use crate::render::TemplateRenderer;
use crate::repository::Repository;
use crate::urls::PreviewUrls;

/// Tool declaration as advertised by `tools/list`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

/// Result of a tool call. Failures the agent can act on are returned here
/// with `is_error` set rather than as protocol errors.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutput {
    pub content: Vec<ContentBlock>,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        ToolOutput {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ToolOutput {
            content: texts
                .into_iter()
                .map(|t| ContentBlock::Text { text: t.into() })
                .collect(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        ToolOutput {
            is_error: true,
            ..ToolOutput::text(text)
        }
    }

    /// Concatenated text of every block.
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(|ContentBlock::Text { text }| text.as_str())
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("{0}")]
    InvalidParams(String),

    /// Becomes an `is_error` tool result; never leaves this module as an `Err`.
    #[error("{0}")]
    Failed(String),
}

pub(crate) trait OrFail<T> {
    /// Maps any error into `ToolError::Failed` prefixed with `context`.
    fn or_fail(self, context: &str) -> Result<T, ToolError>;
}

impl<T, E: Display> OrFail<T> for Result<T, E> {
    fn or_fail(self, context: &str) -> Result<T, ToolError> {
        self.map_err(|e| ToolError::Failed(format!("{context}: {e}")))
    }
}

pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String, ToolError> {
    serde_json::to_string(value).or_fail("Error encoding result")
}

/// Shared services every handler runs against.
#[derive(Clone)]
pub struct Toolbox {
    pub repo: Repository,
    pub renderer: TemplateRenderer,
    pub urls: PreviewUrls,
}

impl Toolbox {
    pub fn new(repo: Repository, renderer: TemplateRenderer, urls: PreviewUrls) -> Self {
        Toolbox {
            repo,
            renderer,
            urls,
        }
    }

    pub fn definitions() -> Vec<ToolDefinition> {
        let mut tools = Vec::new();
        tools.extend(resume::definitions());
        tools.extend(entries::definitions());
        tools.extend(template::definitions());
        tools.extend(preview::definitions());
        tools.extend(context::definitions());
        tools
    }

    /// Runs a tool. `Err` is reserved for protocol-level failures:
    /// an unknown tool name or missing/mistyped arguments.
    pub async fn call(
        &self,
        name: &str,
        args: &Value,
        auth: &AuthContext,
    ) -> Result<ToolOutput, ToolError> {
        debug!(tool = name, owner = auth.owner_id(), "Tool call");
        let result = match name {
            "create_resume" => resume::create_resume(self, auth, args).await,
            "update_basic_info" => resume::update_basic_info(self, auth, args).await,
            "get_resume_by_name" => resume::get_resume_by_name(self, auth, args).await,
            "list_resumes" => resume::list_resumes(self, auth).await,
            "delete_resume" => resume::delete_resume(self, auth, args).await,
            "add_contact_info" => entries::add_contact_info(self, auth, args).await,
            "delete_contact" => entries::delete_contact(self, auth, args).await,
            "add_work_experience" => entries::add_work_experience(self, auth, args).await,
            "add_education" => entries::add_education(self, auth, args).await,
            "add_other_experience" => entries::add_other_experience(self, auth, args).await,
            "delete_experience" => entries::delete_experience(self, auth, args).await,
            "add_feature_map" => entries::add_feature_map(self, auth, args).await,
            "update_feature_map" => entries::update_feature_map(self, auth, args).await,
            "delete_feature_map" => entries::delete_feature_map(self, auth, args).await,
            "create_template" => template::create_template(self, auth, args).await,
            "get_template" => template::get_template(self, auth, args).await,
            "list_templates" => template::list_templates(self, auth, args).await,
            "update_template" => template::update_template(self, auth, args).await,
            "delete_template" => template::delete_template(self, auth, args).await,
            "generate_preview" => preview::generate_preview(self, auth, args).await,
            "update_preview_style" => preview::update_preview_style(self, auth, args).await,
            "get_resume_context" => context::get_resume_context(self, auth, args).await,
            other => return Err(ToolError::UnknownTool(other.to_string())),
        };

        match result {
            Ok(output) => Ok(output),
            Err(ToolError::Failed(message)) => {
                info!(tool = name, "Tool failed: {message}");
                Ok(ToolOutput::error(message))
            }
            Err(e) => Err(e),
        }
    }
}
