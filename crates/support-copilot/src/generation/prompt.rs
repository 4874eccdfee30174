//! Prompt templates for reply drafting and tone classification

use crate::types::{RetrievedMatch, Tone};

/// System instruction for drafting replies
pub const SYSTEM_PROMPT: &str = "You are an expert customer support agent. Your role is to draft helpful, \
accurate, and professional responses to customer issues.

KEY INSTRUCTIONS:
1. Use the provided knowledge base context to ensure accuracy
2. Always maintain an empathetic and professional tone
3. If the context doesn't contain the answer, be honest and offer to escalate
4. Structure responses clearly with proper formatting
5. Reference specific policies or solutions when available
6. Always thank the customer for their patience

CRITICAL: Do not make up information outside the provided context.";

/// Placeholder used when retrieval returned nothing
const NO_CONTEXT: &str = "(No relevant knowledge base entries were found.)";

/// Prompt builder for support replies
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join passage texts with blank lines, in the order given
    pub fn build_context(context: &[RetrievedMatch]) -> String {
        context
            .iter()
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Build the user message for a drafting request
    pub fn build_user_prompt(issue: &str, context: &[RetrievedMatch], tone: &str) -> String {
        let context_text = if context.is_empty() {
            NO_CONTEXT.to_string()
        } else {
            Self::build_context(context)
        };

        format!(
            r#"CUSTOMER ISSUE:
{issue}

RELEVANT KNOWLEDGE BASE CONTEXT:
{context}

TONE REQUIREMENT: {tone}

Please draft a response that:
- Acknowledges the specific issue
- Provides solutions based on the knowledge base
- Shows empathy for their situation
- Maintains professional brand voice
- Includes clear next steps if needed

DRAFT YOUR RESPONSE:"#,
            issue = issue.trim(),
            context = context_text,
            tone = tone,
        )
    }

    /// One attribution per passage, in context order
    pub fn sources(context: &[RetrievedMatch]) -> Vec<String> {
        context.iter().map(RetrievedMatch::source_label).collect()
    }

    /// System instruction constraining the classifier to one label
    pub fn tone_system_prompt() -> String {
        let labels = Tone::ALL
            .iter()
            .map(|t| format!("'{}'", t.as_str()))
            .collect::<Vec<_>>();
        let (head, last) = labels.split_at(labels.len() - 1);

        format!(
            "Analyze the emotional tone of this customer message. Respond with ONLY one word: {}, or {}.",
            head.join(", "),
            last.join("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(idx: u32, text: &str, score: f32) -> RetrievedMatch {
        RetrievedMatch {
            text: text.to_string(),
            score,
            sequence_index: idx,
            source: "kb.txt".to_string(),
        }
    }

    #[test]
    fn test_user_prompt_sections() {
        let context = vec![
            passage(2, "[Billing] Refunds take 5 business days.", 0.82),
            passage(0, "Contact billing@example.com for invoices.", 0.61),
        ];
        let prompt = PromptBuilder::build_user_prompt("  Where is my refund?  ", &context, "reassuring");

        assert!(prompt.starts_with("CUSTOMER ISSUE:\nWhere is my refund?\n"));
        assert!(prompt.contains(
            "RELEVANT KNOWLEDGE BASE CONTEXT:\n[Billing] Refunds take 5 business days.\n\nContact billing@example.com for invoices.\n"
        ));
        assert!(prompt.contains("TONE REQUIREMENT: reassuring"));
        assert!(prompt.ends_with("DRAFT YOUR RESPONSE:"));
    }

    #[test]
    fn test_empty_context_is_explicit() {
        let prompt = PromptBuilder::build_user_prompt("Help", &[], "formal");
        assert!(prompt.contains(NO_CONTEXT));
    }

    #[test]
    fn test_sources_follow_context_order() {
        let context = vec![passage(7, "a", 0.934), passage(1, "b", 0.5012)];
        assert_eq!(
            PromptBuilder::sources(&context),
            vec![
                "Knowledge base chunk 7 (score: 0.93)".to_string(),
                "Knowledge base chunk 1 (score: 0.50)".to_string()
            ]
        );
    }

    #[test]
    fn test_tone_prompt_lists_every_label() {
        let prompt = PromptBuilder::tone_system_prompt();
        assert!(prompt.ends_with("'frustrated', 'urgent', 'calm', 'confused', or 'neutral'."));
        assert!(SYSTEM_PROMPT.contains("Do not make up information"));
    }
}
