// Template engine for the narrative report

use crate::error::Result;
use serde::Serialize;
use std::collections::HashMap;
use tera::{Context, Tera, Value};

/// Name the embedded narrative template is registered under
pub const REPORT_TEMPLATE: &str = "report.txt";

/// Template engine wrapping Tera with custom filters and templates
pub struct TemplateEngine {
    tera: Tera,
}

impl TemplateEngine {
    /// Create a new template engine with embedded templates
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![(
            REPORT_TEMPLATE,
            include_str!("../../templates/report.txt.tera"),
        )])?;
        register_filters(&mut tera);
        Ok(Self { tera })
    }

    /// Create an engine from a single template string, registered as `name`
    #[cfg(test)]
    fn from_template(name: &str, template: &str) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template(name, template)?;
        register_filters(&mut tera);
        Ok(Self { tera })
    }

    /// Render a template with a serializable view
    pub fn render<T: Serialize>(&self, template_name: &str, view: &T) -> Result<String> {
        let context = Context::from_serialize(view)?;
        Ok(self.tera.render(template_name, &context)?)
    }
}

fn register_filters(tera: &mut Tera) {
    tera.register_filter("pluralize", pluralize);
    tera.register_filter("fixed", fixed);
    tera.register_filter("elide", elide);
}

/// `3 | pluralize(singular="cycle")` renders `3 cycles`
fn pluralize(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let count = value.as_u64().unwrap_or(0);
    let singular = args.get("singular").and_then(Value::as_str).unwrap_or("item");
    let word = match args.get("plural").and_then(Value::as_str) {
        _ if count == 1 => singular.to_string(),
        Some(plural) => plural.to_string(),
        None => format!("{}s", singular),
    };
    Ok(Value::String(format!("{} {}", count, word)))
}

/// Format a number with a fixed count of decimals
fn fixed(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let number = value
        .as_f64()
        .ok_or_else(|| tera::Error::msg("fixed filter expects a number"))?;
    let digits = args.get("digits").and_then(|v| v.as_u64()).unwrap_or(2) as usize;
    Ok(Value::String(format!("{:.*}", digits, number)))
}

/// Join a list with `, `, eliding past `max` entries with a `(+N more)` suffix
fn elide(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let items = value
        .as_array()
        .ok_or_else(|| tera::Error::msg("elide filter expects an array"))?;
    let max = args
        .get("max")
        .and_then(|v| v.as_u64())
        .map_or(items.len(), |m| m as usize);

    let shown: Vec<String> = items
        .iter()
        .take(max)
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect();
    let mut text = shown.join(", ");
    if items.len() > max {
        text.push_str(&format!(" (+{} more)", items.len() - max));
    }
    Ok(Value::String(text))
}
