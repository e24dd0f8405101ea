//! Context assembly from retrieved chunks

use crate::rag::RetrievedChunk;

/// Joins retrieved chunk texts into the `{context}` prompt value
pub struct ContextAssembler {
    separator: String,
    max_context_length: Option<usize>,
}

impl ContextAssembler {
    /// Create a new context assembler; `max_context_length` is in characters
    #[must_use]
    pub fn new(separator: impl Into<String>, max_context_length: Option<usize>) -> Self {
        Self {
            separator: separator.into(),
            max_context_length,
        }
    }

    /// Concatenate chunk texts in rank order.
    ///
    /// With a length limit, whole chunks are added until the next one would
    /// exceed it.
    #[must_use]
    pub fn assemble(&self, results: &[RetrievedChunk]) -> String {
        let mut context = String::new();
        let mut total_length = 0;

        for (idx, result) in results.iter().enumerate() {
            let sep_len = if idx == 0 {
                0
            } else {
                self.separator.chars().count()
            };
            let entry_len = result.text.chars().count() + sep_len;

            if let Some(max) = self.max_context_length {
                if total_length + entry_len > max {
                    break;
                }
            }

            if idx > 0 {
                context.push_str(&self.separator);
            }
            context.push_str(&result.text);
            total_length += entry_len;
        }

        context
    }
}

impl Default for ContextAssembler {
    fn default() -> Self {
        Self::new("\n\n", None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(text: &str) -> RetrievedChunk {
        RetrievedChunk {
            id: "id".to_string(),
            text: text.to_string(),
            source: "notes.pdf".to_string(),
            page: Some(0),
            score: 0.5,
        }
    }

    #[test]
    fn test_joins_with_blank_line() {
        let context = ContextAssembler::default().assemble(&[chunk("one"), chunk("two")]);
        assert_eq!(context, "one\n\ntwo");
    }

    #[test]
    fn test_empty_results() {
        assert_eq!(ContextAssembler::default().assemble(&[]), "");
    }

    #[test]
    fn test_length_limit_keeps_whole_chunks() {
        let assembler = ContextAssembler::new("\n\n", Some(12));
        let context = assembler.assemble(&[chunk("first"), chunk("second"), chunk("third")]);
        assert_eq!(context, "first");
    }
}
