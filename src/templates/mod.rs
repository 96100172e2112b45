//! Template engine
//!
//! Renders the HTML screens with Tera. Templates are embedded in the binary
//! from the `templates/` directory, so the server runs without any files on
//! disk. Autoescaping is on for every `.html` template.

use anyhow::Result;
use chrono::Datelike;
use rust_embed::RustEmbed;
use serde::{Deserialize, Serialize};
use std::error::Error as StdError;
use tera::{Context as TeraContext, Tera};

mod error;

pub use error::TemplateError;

/// Embedded HTML templates
#[derive(RustEmbed)]
#[folder = "templates/"]
#[include = "*.html"]
struct TemplateAssets;

/// Tera wrapper holding every screen template
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Build the engine from the embedded templates
    pub fn new() -> Result<Self> {
        let mut templates = Vec::new();
        for name in TemplateAssets::iter() {
            let file = TemplateAssets::get(&name)
                .ok_or_else(|| TemplateError::NotFound(name.to_string()))?;
            let content = std::str::from_utf8(&file.data)
                .map_err(|_| TemplateError::InvalidEncoding(name.to_string()))?
                .to_string();
            templates.push((name.to_string(), content));
        }

        let engine = Self::from_templates(templates)?;
        tracing::debug!(
            count = engine.tera.get_template_names().count(),
            "Templates loaded"
        );
        Ok(engine)
    }

    /// Build the engine from `(name, source)` pairs
    pub fn from_templates(mut templates: Vec<(String, String)>) -> Result<Self> {
        // Parents before children
        templates.sort_by(|a, b| {
            let a_is_base = a.0 == "base.html" || a.0.ends_with("/base.html");
            let b_is_base = b.0 == "base.html" || b.0.ends_with("/base.html");
            b_is_base.cmp(&a_is_base).then_with(|| a.0.cmp(&b.0))
        });

        let mut tera = Tera::default();
        tera.add_raw_templates(templates).map_err(|e| {
            TemplateError::RenderError(format!("Failed to add templates: {}", describe(&e)))
        })?;

        Ok(Self { tera })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.tera.get_template_names().any(|n| n == name)
    }

    /// Render a template with context
    pub fn render(&self, template: &str, context: &TeraContext) -> Result<String> {
        self.tera.render(template, context).map_err(|e| {
            TemplateError::RenderError(format!("Failed to render '{}': {}", template, describe(&e)))
                .into()
        })
    }

    /// Render a screen with the per-request variables added
    pub fn render_page(
        &self,
        template: &str,
        context: &TeraContext,
        page: &PageContext,
    ) -> Result<String> {
        let mut full_context = context.clone();
        page.insert_into(&mut full_context);
        self.render(template, &full_context)
    }

    /// Render a template, falling back to `error.html` and then to plain HTML
    pub fn render_with_fallback(&self, template: &str, context: &TeraContext) -> String {
        match self.render(template, context) {
            Ok(html) => html,
            Err(e) => {
                tracing::error!("Failed to render template '{}': {}", template, e);

                let mut error_context = context.clone();
                if !error_context.contains_key("year") {
                    PageContext::new("/").insert_into(&mut error_context);
                }
                error_context.insert("status", &500);
                error_context.insert("message", "Something went wrong on our side.");

                match self.render("error.html", &error_context) {
                    Ok(html) => html,
                    Err(error_template_err) => {
                        tracing::error!("Failed to render error template: {}", error_template_err);
                        Self::simple_error_page()
                    }
                }
            }
        }
    }

    /// Last resort when even `error.html` cannot be rendered
    fn simple_error_page() -> String {
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Server Error</title>
</head>
<body>
    <h1>Server Error (500)</h1>
    <p>Something went wrong on our side.</p>
</body>
</html>"#
            .to_string()
    }
}

/// Tera errors nest the useful message in their sources
fn describe(e: &tera::Error) -> String {
    let mut message = e.to_string();
    let mut source = e.source();
    while let Some(s) = source {
        message.push_str(&format!("\n  Caused by: {}", s));
        source = s.source();
    }
    message
}

/// Logged-in redactor as exposed to templates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentRedactor {
    pub id: i64,
    pub username: String,
}

/// Variables every screen receives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContext {
    pub current_redactor: Option<CurrentRedactor>,
    pub request_path: String,
    /// Current year (footer)
    pub year: i32,
}

impl PageContext {
    pub fn new(request_path: impl Into<String>) -> Self {
        Self {
            current_redactor: None,
            request_path: request_path.into(),
            year: chrono::Utc::now().year(),
        }
    }

    pub fn with_redactor(mut self, redactor: Option<CurrentRedactor>) -> Self {
        self.current_redactor = redactor;
        self
    }

    /// Add `request_path`, `year`, `user` and `is_authenticated`
    pub fn insert_into(&self, context: &mut TeraContext) {
        context.insert("request_path", &self.request_path);
        context.insert("year", &self.year);
        context.insert("user", &self.current_redactor);
        context.insert("is_authenticated", &self.current_redactor.is_some());
    }
}
