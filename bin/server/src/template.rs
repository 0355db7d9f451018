//! The redirect notice page.
//!
//! The page is rendered with Handlebars in strict mode. Its only dynamic
//! value is `url`, the provider authorization URL.

use handlebars::Handlebars;
use serde_json::json;
use std::fmt;
use std::path::Path;
use token_bridge_core::Result;

const TEMPLATE_NAME: &str = "redirect_notice";

const BUILTIN_TEMPLATE: &str = include_str!("../templates/redirect_notice.hbs");

/// Static page served at `{base}/callback_success`.
pub const CALLBACK_SUCCESS_PAGE: &str = include_str!("../templates/callback_success.html");

/// Page template errors.
#[derive(Debug)]
pub enum PageError {
    /// The template could not be read or compiled.
    Load { template: String, details: String },
    /// Rendering failed.
    Render { details: String },
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { template, details } => {
                write!(f, "failed to load template {}: {}", template, details)
            }
            Self::Render { details } => write!(f, "failed to render template: {}", details),
        }
    }
}

impl std::error::Error for PageError {}

/// Compiled redirect notice template.
pub struct RedirectTemplate {
    registry: Handlebars<'static>,
}

impl fmt::Debug for RedirectTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedirectTemplate").finish_non_exhaustive()
    }
}

impl RedirectTemplate {
    /// Uses the template shipped with the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the built-in template does not compile.
    pub fn builtin() -> Result<Self, PageError> {
        Self::from_source("builtin", BUILTIN_TEMPLATE)
    }

    /// Loads a template from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not compile.
    pub fn from_file(path: &Path) -> Result<Self, PageError> {
        let source = std::fs::read_to_string(path).map_err(|e| PageError::Load {
            template: path.display().to_string(),
            details: e.to_string(),
        })?;
        Self::from_source(&path.display().to_string(), &source)
    }

    fn from_source(name: &str, source: &str) -> Result<Self, PageError> {
        let mut registry = Handlebars::new();
        registry.set_strict_mode(true);
        registry
            .register_template_string(TEMPLATE_NAME, source)
            .map_err(|e| PageError::Load {
                template: name.to_string(),
                details: e.to_string(),
            })?;

        Ok(Self { registry })
    }

    /// Renders the page pointing at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the template references values other than `url`.
    pub fn render(&self, url: &str) -> Result<String, PageError> {
        Ok(self
            .registry
            .render(TEMPLATE_NAME, &json!({ "url": url }))
            .map_err(|e| PageError::Render {
                details: e.to_string(),
            })?)
    }
}
