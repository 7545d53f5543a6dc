//! Named HTML templates with `{{ name }}` placeholders.

use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::PathBuf;

use tracing::debug;

use crate::error::{PipelineError, Result};

/// Template of the air-pollution fragment.
pub const AIR_POLLUTION_TEMPLATE: &str = "viz/co2_plot_ap_plot_with_selectors.html";

const BUILTIN: &[(&str, &str)] = &[(
    AIR_POLLUTION_TEMPLATE,
    r#"<div class="viz viz-air-pollution">
  <label for="scenario-highlight">Highlight scenarios</label>
  {{ plot_div }}
</div>
{{ plot_script }}
"#,
)];

/// Looks templates up in an optional directory, then in the built-ins.
#[derive(Debug, Clone, Default)]
pub struct TemplateEnv {
    dir: Option<PathBuf>,
}

impl TemplateEnv {
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Loads `name`, preferring `<dir>/<name>` when it exists.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read or no template has that name.
    pub fn get_template(&self, name: &str) -> Result<Template> {
        if let Some(dir) = &self.dir {
            let path = dir.join(name);
            if path.is_file() {
                let source = fs::read_to_string(&path).map_err(|e| PipelineError::io(&path, e))?;
                debug!(path = %path.display(), "loaded template");
                return Ok(Template {
                    source: Cow::Owned(source),
                });
            }
        }
        BUILTIN
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, source)| Template {
                source: Cow::Borrowed(*source),
            })
            .ok_or_else(|| {
                PipelineError::io(name, io::Error::new(io::ErrorKind::NotFound, "no such template"))
            })
    }
}

/// A template source.
#[derive(Debug, Clone)]
pub struct Template {
    source: Cow<'static, str>,
}

impl Template {
    #[cfg(test)]
    pub(crate) fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: Cow::Owned(source.into()),
        }
    }

    /// Substitutes each `{{ key }}` (inner whitespace optional) with its value.
    /// Unknown placeholders are left as they are.
    pub fn render(&self, vars: &[(&str, &str)]) -> String {
        let src = self.source.as_ref();
        let mut out = String::with_capacity(src.len());
        let mut rest = src;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                out.push_str(&rest[start..]);
                return out;
            };
            let key = after[..end].trim();
            match vars.iter().find(|(k, _)| *k == key) {
                Some((_, value)) => out.push_str(value),
                None => out.push_str(&rest[start..start + 2 + end + 2]),
            }
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_known_keys() {
        let t = Template::from_source("<a>{{ plot_div }}</a>{{plot_script}}{{ other }}");
        let out = t.render(&[("plot_div", "DIV"), ("plot_script", "JS")]);
        assert_eq!(out, "<a>DIV</a>JS{{ other }}");
    }

    #[test]
    fn render_keeps_unterminated_braces() {
        let t = Template::from_source("x {{ y");
        assert_eq!(t.render(&[("y", "z")]), "x {{ y");
    }

    #[test]
    fn builtin_fallback() {
        let env = TemplateEnv::default();
        let out = env
            .get_template(AIR_POLLUTION_TEMPLATE)
            .expect("builtin should exist")
            .render(&[("plot_div", "DIV"), ("plot_script", "JS")]);
        assert!(out.contains("DIV"));
        assert!(out.contains("JS"));
    }

    #[test]
    fn directory_overrides_builtin() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        fs::create_dir_all(tmp.path().join("viz")).expect("dir should be created");
        fs::write(tmp.path().join(AIR_POLLUTION_TEMPLATE), "custom {{ plot_div }}")
            .expect("template write should succeed");
        let env = TemplateEnv::new(Some(tmp.path().to_path_buf()));
        let out = env
            .get_template(AIR_POLLUTION_TEMPLATE)
            .expect("template should load")
            .render(&[("plot_div", "D")]);
        assert_eq!(out, "custom D");
    }

    #[test]
    fn unknown_template_is_not_found() {
        let err = TemplateEnv::default().get_template("nope.html").expect_err("no such template");
        assert!(matches!(
            err,
            PipelineError::Io { ref source, .. } if source.kind() == io::ErrorKind::NotFound
        ));
    }
}
