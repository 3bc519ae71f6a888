//! Run context - variables available to banner templates

use std::collections::HashMap;

/// Variables for one run
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    pub variables: HashMap<String, String>,
}

impl RunContext {
    pub fn new(variables: HashMap<String, String>) -> Self {
        Self { variables }
    }

    pub fn set_variable(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.variables.insert(key.into(), value.into());
    }

    pub fn get_variable(&self, key: &str) -> Option<&String> {
        self.variables.get(key)
    }

    /// Render a template with variable substitution
    ///
    /// Placeholders have the form `{{ name }}`; unknown names are left as-is.
    pub fn render(&self, template: &str) -> String {
        let mut rendered = template.to_string();
        for (key, value) in &self.variables {
            let placeholder = format!("{{{{ {} }}}}", key);
            rendered = rendered.replace(&placeholder, value);
        }
        rendered
    }
}
