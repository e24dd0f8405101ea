//! Prompt templates with `{name}` placeholders

use std::collections::HashMap;

use super::ChatMessage;
use super::ChatRole;
use crate::errors::Result;
use crate::errors::TeachRagError;

/// Template for generating prompts.
///
/// `{name}` is a placeholder; `{{` and `}}` are literal braces. Substitution
/// happens in a single pass, so values containing braces are inserted
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    template: String,
    variables: Vec<String>,
}

enum Segment<'a> {
    Literal(&'a str),
    Brace(char),
    Variable(&'a str),
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        let template = template.into();
        let mut variables = Vec::new();
        for segment in segments(&template) {
            if let Segment::Variable(name) = segment {
                if !variables.iter().any(|v| v == name) {
                    variables.push(name.to_string());
                }
            }
        }
        Self {
            template,
            variables,
        }
    }

    /// Fill in the template with variables
    ///
    /// # Errors
    /// - A placeholder has no value
    pub fn render(&self, values: &HashMap<String, String>) -> Result<String> {
        let mut result = String::with_capacity(self.template.len());
        for segment in segments(&self.template) {
            match segment {
                Segment::Literal(text) => result.push_str(text),
                Segment::Brace(c) => result.push(c),
                Segment::Variable(name) => {
                    let value = values.get(name).ok_or_else(|| {
                        TeachRagError::InvalidInput(format!(
                            "Missing value for prompt variable '{name}'"
                        ))
                    })?;
                    result.push_str(value);
                }
            }
        }
        Ok(result)
    }

    /// Get required variables
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }
}

/// Split a template into literal text, escaped braces and placeholders.
/// An unclosed `{` is kept as literal text.
fn segments(template: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut rest = template;

    while !rest.is_empty() {
        let Some(pos) = rest.find(['{', '}']) else {
            out.push(Segment::Literal(rest));
            break;
        };
        if pos > 0 {
            out.push(Segment::Literal(&rest[..pos]));
        }
        rest = &rest[pos..];

        if rest.starts_with("{{") {
            out.push(Segment::Brace('{'));
            rest = &rest[2..];
        } else if rest.starts_with("}}") {
            out.push(Segment::Brace('}'));
            rest = &rest[2..];
        } else if rest.starts_with('{') {
            match rest[1..].find(['{', '}']) {
                Some(end) if rest.as_bytes()[end + 1] == b'}' && end > 0 => {
                    out.push(Segment::Variable(&rest[1..=end]));
                    rest = &rest[end + 2..];
                }
                _ => {
                    out.push(Segment::Literal(&rest[..1]));
                    rest = &rest[1..];
                }
            }
        } else {
            out.push(Segment::Literal(&rest[..1]));
            rest = &rest[1..];
        }
    }

    out
}

/// A sequence of role-tagged message templates
#[derive(Debug, Clone)]
pub struct ChatPromptTemplate {
    messages: Vec<(ChatRole, PromptTemplate)>,
}

impl ChatPromptTemplate {
    #[must_use]
    pub fn from_messages(messages: Vec<(ChatRole, PromptTemplate)>) -> Self {
        Self { messages }
    }

    /// Every placeholder across all messages
    #[must_use]
    pub fn variables(&self) -> Vec<String> {
        let mut vars: Vec<String> = Vec::new();
        for (_, template) in &self.messages {
            for var in template.variables() {
                if !vars.contains(var) {
                    vars.push(var.clone());
                }
            }
        }
        vars
    }

    /// Render every message
    ///
    /// # Errors
    /// - A placeholder has no value
    pub fn format_messages(&self, values: &HashMap<String, String>) -> Result<Vec<ChatMessage>> {
        self.messages
            .iter()
            .map(|(role, template)| {
                Ok(ChatMessage {
                    role: *role,
                    content: template.render(values)?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_template_variables() {
        let template = PromptTemplate::new("Hello {name}, you are {age} years old, {name}.");
        assert_eq!(template.variables(), &["name", "age"]);
    }

    #[test]
    fn test_template_render() {
        let template = PromptTemplate::new("Hello {name}!");
        assert_eq!(
            template.render(&values(&[("name", "Alice")])).unwrap(),
            "Hello Alice!"
        );
    }

    #[test]
    fn test_escaped_braces() {
        let template = PromptTemplate::new("Set {{x}} to {value}");
        assert_eq!(template.variables(), &["value"]);
        assert_eq!(
            template.render(&values(&[("value", "2")])).unwrap(),
            "Set {x} to 2"
        );
    }

    #[test]
    fn test_values_with_braces_not_reexpanded() {
        let template = PromptTemplate::new("Context: {context}\nQ: {input}");
        let rendered = template
            .render(&values(&[("context", "f(x) = {input}"), ("input", "why?")]))
            .unwrap();
        assert_eq!(rendered, "Context: f(x) = {input}\nQ: why?");
    }

    #[test]
    fn test_unclosed_brace_is_literal() {
        let template = PromptTemplate::new("a { b");
        assert!(template.variables().is_empty());
        assert_eq!(template.render(&HashMap::new()).unwrap(), "a { b");
    }

    #[test]
    fn test_missing_variable_errors() {
        let template = PromptTemplate::new("Hi {name}");
        assert!(matches!(
            template.render(&HashMap::new()),
            Err(TeachRagError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_chat_prompt_format() {
        let prompt = ChatPromptTemplate::from_messages(vec![
            (ChatRole::System, PromptTemplate::new("Use this: {context}")),
            (ChatRole::User, PromptTemplate::new("{input}")),
        ]);
        assert_eq!(prompt.variables(), vec!["context", "input"]);

        let messages = prompt
            .format_messages(&values(&[("context", "cells"), ("input", "what?")]))
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert_eq!(messages[0].content, "Use this: cells");
        assert_eq!(messages[1].content, "what?");
    }
}
