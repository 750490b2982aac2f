//! HTML views
//!
//! Two pages are rendered: `welcome`, carrying the authorization link, and
//! `token`, showing the refresh token obtained on callback. When a layouts
//! directory is configured, pages are wrapped in `<layouts_dir>/main.html` at its
//! `{{{body}}}` placeholder.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Placeholder replaced by the page body in a layout file
pub const BODY_PLACEHOLDER: &str = "{{{body}}}";

/// File name of the layout inside the layouts directory
pub const LAYOUT_FILE: &str = "main.html";

/// View rendering errors
#[derive(Debug, Error)]
pub enum ViewError {
    /// Layout file could not be read
    #[error("Failed to read layout {}: {source}", .path.display())]
    LayoutRead {
        /// Path of the layout file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Layout file lacks the body placeholder
    #[error("Layout {} has no {{{{{{body}}}}}} placeholder", .0.display())]
    MissingBodyPlaceholder(PathBuf),
}

/// A page and the values it is rendered with
#[derive(Debug, Clone)]
pub enum View {
    /// Authorization page
    Welcome {
        /// Application id
        client_id: String,
        /// Opaque `state` value placed in the authorize link
        state: String,
        /// Callback URI registered with the provider
        redirect_uri: String,
        /// Full provider authorize link
        authorize_url: String,
    },
    /// Page showing the refresh token obtained on callback
    Token {
        /// Absent when the provider result had none
        refresh_token: Option<String>,
    },
}

impl View {
    /// Template name, used in logs
    pub fn name(&self) -> &'static str {
        match self {
            View::Welcome { .. } => "welcome",
            View::Token { .. } => "token",
        }
    }
}

/// Renders views to HTML
pub trait ViewRenderer: Send + Sync {
    /// Render `view` to a complete HTML document
    fn render(&self, view: &View) -> Result<String, ViewError>;
}

/// Built-in HTML pages with an optional layout
#[derive(Debug, Clone, Default)]
pub struct HtmlViews {
    layout: Option<String>,
}

impl HtmlViews {
    /// Load the layout from `layouts_dir`, if given
    pub fn new(layouts_dir: Option<&Path>) -> Result<Self, ViewError> {
        let layout = match layouts_dir {
            Some(dir) => {
                let path = dir.join(LAYOUT_FILE);
                let layout = std::fs::read_to_string(&path).map_err(|source| {
                    ViewError::LayoutRead {
                        path: path.clone(),
                        source,
                    }
                })?;
                if !layout.contains(BODY_PLACEHOLDER) {
                    return Err(ViewError::MissingBodyPlaceholder(path));
                }
                Some(layout)
            }
            None => None,
        };

        Ok(Self { layout })
    }

    fn wrap(&self, title: &str, body: String) -> String {
        match &self.layout {
            Some(layout) => layout.replace(BODY_PLACEHOLDER, &body),
            None => format!(
                r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{}</title>
    <style>
        body {{ font-family: Arial, sans-serif; max-width: 640px; margin: 50px auto; padding: 20px; }}
        .box {{ border: 1px solid #ccc; padding: 20px; border-radius: 5px; }}
        pre {{ white-space: pre-wrap; word-break: break-all; background: #f4f4f4; padding: 10px; }}
        .authorize {{ display: inline-block; padding: 10px 20px; background-color: #0078d4; color: white; text-decoration: none; }}
    </style>
</head>
<body>
{}
</body>
</html>"#,
                escape_html(title),
                body
            ),
        }
    }
}

impl ViewRenderer for HtmlViews {
    fn render(&self, view: &View) -> Result<String, ViewError> {
        debug!(view = view.name(), layout = self.layout.is_some(), "Rendering view");

        let html = match view {
            View::Welcome {
                client_id,
                state,
                redirect_uri,
                authorize_url,
            } => self.wrap(
                "Authorize",
                format!(
                    r#"<div class="box">
    <h2>Azure DevOps authorization</h2>
    <p><strong>Client:</strong> {}</p>
    <p><strong>Redirect URI:</strong> {}</p>
    <p><a class="authorize" href="{}" data-state="{}">Authorize</a></p>
</div>"#,
                    escape_html(client_id),
                    escape_html(redirect_uri),
                    escape_html(authorize_url),
                    escape_html(state),
                ),
            ),
            View::Token { refresh_token } => self.wrap(
                "Refresh token",
                match refresh_token {
                    Some(token) => format!(
                        r#"<div class="box">
    <h2>Refresh token</h2>
    <pre id="refresh-token">{}</pre>
</div>"#,
                        escape_html(token)
                    ),
                    None => r#"<div class="box">
    <h2>Refresh token</h2>
    <p>The provider did not return a refresh token.</p>
</div>"#
                        .to_string(),
                },
            ),
        };

        Ok(html)
    }
}

/// Escape text for use in HTML content and attribute values
pub fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
