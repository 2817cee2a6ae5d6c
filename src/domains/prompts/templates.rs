//! Prompt templates module.
//!
//! A template is a named instruction text with optional `{{variable}}`
//! placeholders. Rendering substitutes supplied arguments and strips
//! placeholders that were left unset (optional arguments).

use rmcp::model::PromptArgument;
use std::collections::HashMap;

/// A prompt template that can be instantiated with arguments.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The unique name of the prompt.
    pub name: String,

    /// A description of what the prompt does.
    pub description: Option<String>,

    /// The arguments that this prompt accepts.
    pub arguments: Vec<PromptArgument>,

    /// The template string with `{{variable}}` placeholders.
    pub template: String,
}

impl PromptTemplate {
    /// Render the template with the given arguments.
    pub fn render(&self, arguments: &HashMap<String, String>) -> String {
        let mut result = self.template.clone();

        for (key, value) in arguments {
            let placeholder = format!("{{{{{}}}}}", key);
            result = result.replace(&placeholder, value);
        }

        clean_unmatched_placeholders(&result)
    }
}

/// Remove any placeholders left unset by the caller.
fn clean_unmatched_placeholders(template: &str) -> String {
    let mut result = template.to_string();
    let mut start = 0;

    while let Some(pos) = result[start..].find("{{") {
        let abs_pos = start + pos;
        match result[abs_pos..].find("}}") {
            Some(end_pos) => {
                let end_abs = abs_pos + end_pos + 2;
                result = format!("{}{}", &result[..abs_pos], &result[end_abs..]);
                start = abs_pos;
            }
            None => break,
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template(text: &str) -> PromptTemplate {
        PromptTemplate {
            name: "test".to_string(),
            description: None,
            arguments: vec![],
            template: text.to_string(),
        }
    }

    #[test]
    fn test_simple_substitution() {
        let mut args = HashMap::new();
        args.insert("topic".to_string(), "throttling".to_string());

        let result = template("Explain {{topic}} to the user.").render(&args);
        assert_eq!(result, "Explain throttling to the user.");
    }

    #[test]
    fn test_static_template_passes_through() {
        let result = template("No placeholders here.").render(&HashMap::new());
        assert_eq!(result, "No placeholders here.");
    }

    #[test]
    fn test_unset_placeholder_removed() {
        let result = template("Hello{{name}}!").render(&HashMap::new());
        assert_eq!(result, "Hello!");
    }

    #[test]
    fn test_unterminated_placeholder_left_alone() {
        let result = template("Broken {{tail").render(&HashMap::new());
        assert_eq!(result, "Broken {{tail");
    }
}
