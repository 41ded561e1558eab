use crate::error::{Error, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use tera::{Context, Tera, Value};
use tracing::trace;

/// Variables available to a job template, keyed by name.
pub type TemplateData = BTreeMap<String, String>;

/// Template engine evaluating Jenkins job XML templates.
///
/// Templates use Tera syntax. Each template is registered under its file
/// path the first time it is evaluated, so repositories sharing a template
/// parse it once. On top of Tera's built-in filters and functions the engine
/// registers a few helpers commonly needed when producing job XML.
pub struct TemplateEngine {
    tera: Tera,
    registered: HashSet<String>,
}

impl TemplateEngine {
    /// Creates a new template engine with the helper filters registered.
    #[must_use]
    pub fn new() -> Self {
        let mut tera = Tera::default();

        // Job templates are XML; values are inserted verbatim
        tera.autoescape_on(vec![]);

        Self::register_filters(&mut tera);

        Self {
            tera,
            registered: HashSet::new(),
        }
    }

    /// Registers custom Tera filters.
    fn register_filters(tera: &mut Tera) {
        tera.register_filter("xml_escape", Self::xml_escape_filter);
        tera.register_filter("json_encode", Self::json_encode_filter);
        tera.register_filter("trim_prefix", Self::trim_prefix_filter);
        tera.register_filter("trim_suffix", Self::trim_suffix_filter);
        tera.register_filter("quote", Self::quote_filter);
    }

    /// XML escape filter implementation.
    fn xml_escape_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        if let Some(s) = value.as_str() {
            let escaped = s
                .replace('&', "&amp;")
                .replace('<', "&lt;")
                .replace('>', "&gt;")
                .replace('"', "&quot;")
                .replace('\'', "&apos;");
            Ok(Value::String(escaped))
        } else {
            Ok(value.clone())
        }
    }

    /// JSON encode filter implementation.
    fn json_encode_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let pretty = args
            .get("pretty")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let result = if pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };

        result
            .map(Value::String)
            .map_err(|e| tera::Error::msg(format!("Failed to encode JSON: {e}")))
    }

    /// Removes a leading `prefix` argument when present.
    fn trim_prefix_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let prefix = Self::string_arg(args, "trim_prefix", "prefix")?;
        match value.as_str() {
            Some(s) => Ok(Value::String(
                s.strip_prefix(prefix.as_str()).unwrap_or(s).to_string(),
            )),
            None => Ok(value.clone()),
        }
    }

    /// Removes a trailing `suffix` argument when present.
    fn trim_suffix_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
        let suffix = Self::string_arg(args, "trim_suffix", "suffix")?;
        match value.as_str() {
            Some(s) => Ok(Value::String(
                s.strip_suffix(suffix.as_str()).unwrap_or(s).to_string(),
            )),
            None => Ok(value.clone()),
        }
    }

    /// Wraps the value in double quotes.
    fn quote_filter(value: &Value, _args: &HashMap<String, Value>) -> tera::Result<Value> {
        let inner = match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Ok(Value::String(format!("\"{inner}\"")))
    }

    fn string_arg(args: &HashMap<String, Value>, filter: &str, name: &str) -> tera::Result<String> {
        args.get(name)
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                tera::Error::msg(format!(
                    "Filter `{filter}` expected a string argument `{name}`"
                ))
            })
    }

    /// Evaluates `text` against `data`.
    ///
    /// `template_file` names the template in error messages and identifies it
    /// in the engine's registry.
    ///
    /// # Errors
    ///
    /// Returns an error if the template fails to parse or to render.
    pub fn render(&mut self, template_file: &str, text: &str, data: &TemplateData) -> Result<String> {
        if self.registered.insert(template_file.to_string()) {
            trace!("Registering template {}", template_file);
            if let Err(e) = self.tera.add_raw_template(template_file, text) {
                self.registered.remove(template_file);
                return Err(Error::template(template_file, &e));
            }
        }

        let context =
            Context::from_serialize(data).map_err(|e| Error::template(template_file, &e))?;

        self.tera
            .render(template_file, &context)
            .map_err(|e| Error::template(template_file, &e))
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}
