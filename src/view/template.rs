//! Template rendering.

use handlebars::Handlebars;
use serde_json::Value;

use crate::error::RenderError;

/// Renders a named template against a view model.
pub trait TemplateRenderer: Send + Sync {
    /// `Ok(None)` when no template of that name is registered.
    fn render(&self, name: &str, model: &Value) -> Result<Option<String>, RenderError>;
}

/// Handlebars-backed renderer.
pub struct HandlebarsRenderer {
    registry: Handlebars<'static>,
}

impl HandlebarsRenderer {
    pub fn new() -> Self {
        let mut registry = Handlebars::new();
        registry.register_helper("json", Box::new(json_helper));

        Self { registry }
    }

    pub fn register_template(&mut self, name: &str, source: &str) -> Result<(), RenderError> {
        self.registry
            .register_template_string(name, source)
            .map_err(|e| RenderError::Template {
                name: name.to_string(),
                message: e.to_string(),
            })
    }

    pub fn has_template(&self, name: &str) -> bool {
        self.registry.has_template(name)
    }
}

impl Default for HandlebarsRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateRenderer for HandlebarsRenderer {
    fn render(&self, name: &str, model: &Value) -> Result<Option<String>, RenderError> {
        if !self.has_template(name) {
            return Ok(None);
        }

        self.registry
            .render(name, model)
            .map(Some)
            .map_err(|e| RenderError::Render {
                name: name.to_string(),
                message: e.to_string(),
            })
    }
}

// Handlebars helper

fn json_helper(
    h: &handlebars::Helper,
    _: &Handlebars,
    _: &handlebars::Context,
    _: &mut handlebars::RenderContext,
    out: &mut dyn handlebars::Output,
) -> handlebars::HelperResult {
    if let Some(v) = h.param(0) {
        out.write(&serde_json::to_string(v.value()).unwrap_or_default())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_registered_template() {
        let mut renderer = HandlebarsRenderer::new();
        renderer
            .register_template("goals", "<h1>{{title}}</h1><pre>{{json ids}}</pre>")
            .unwrap();

        let html = renderer
            .render("goals", &json!({"title": "Goals", "ids": [1, 2]}))
            .unwrap();
        assert_eq!(html.as_deref(), Some("<h1>Goals</h1><pre>[1,2]</pre>"));
    }

    #[test]
    fn test_missing_template_is_none() {
        let renderer = HandlebarsRenderer::new();
        assert_eq!(renderer.render("nope", &json!({})).unwrap(), None);
    }

    #[test]
    fn test_escapes_model_text() {
        let mut renderer = HandlebarsRenderer::new();
        renderer.register_template("t", "{{name}}").unwrap();
        let html = renderer.render("t", &json!({"name": "<i>x</i>"})).unwrap();
        assert_eq!(html.as_deref(), Some("&lt;i&gt;x&lt;/i&gt;"));
    }

    #[test]
    fn test_invalid_template_rejected() {
        let mut renderer = HandlebarsRenderer::new();
        let err = renderer.register_template("bad", "{{#if ready}}unclosed").unwrap_err();
        assert!(matches!(err, RenderError::Template { ref name, .. } if name == "bad"));
    }
}
