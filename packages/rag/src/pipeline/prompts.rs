//! Prompt composition for chat and scribe modes.
//!
//! Message layout is always `[system, ...history, user(query)]`. The mode
//! only changes the instruction preamble inside the system message.

use crate::types::conversation::{ConversationTurn, Mode};

/// Default base instructions.
pub const CLINICAL_INSTRUCTIONS: &str = "You are a hospital-based clinical decision-support assistant. \
Provide concise, evidence-based guidance in **Markdown**.";

/// Opening line of every system message.
pub const SYSTEM_HEADER: &str = "You are a hospital-based clinical decision-support assistant.";

/// Scribe preamble; `{template}` is replaced with the template name.
pub const SCRIBE_PREAMBLE: &str = "You are a clinical scribe AI. \
Convert the transcript into a professional document using the template: {template}.\n\n";

/// Template used in scribe mode when none is named.
pub const DEFAULT_SCRIBE_TEMPLATE: &str = "General Scribe Template";

/// Placeholder shown when retrieval produced no context.
pub const NO_CONTEXT: &str = "_No relevant context_";

/// Builds the message list sent to the generation provider.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    base_instructions: String,
}

impl Default for PromptComposer {
    fn default() -> Self {
        Self {
            base_instructions: CLINICAL_INSTRUCTIONS.to_string(),
        }
    }
}

impl PromptComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the base instructions shared by every mode.
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.base_instructions = instructions.into();
        self
    }

    /// Full message list for one request.
    pub fn compose(
        &self,
        query: &str,
        context: &str,
        history: &[ConversationTurn],
        mode: Mode,
        template_name: Option<&str>,
    ) -> Vec<ConversationTurn> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ConversationTurn::system(
            self.system_prompt(context, mode, template_name),
        ));
        messages.extend(history.iter().cloned());
        messages.push(ConversationTurn::user(query));
        messages
    }

    /// System message: header, retrieved context, mode instructions.
    pub fn system_prompt(&self, context: &str, mode: Mode, template_name: Option<&str>) -> String {
        let context = if context.trim().is_empty() {
            NO_CONTEXT
        } else {
            context.trim_end()
        };

        format!(
            "{}\n\n### Retrieved Context\n{}\n\n{}\n\nRespond in **Markdown**.",
            SYSTEM_HEADER,
            context,
            self.instructions(mode, template_name)
        )
    }

    fn instructions(&self, mode: Mode, template_name: Option<&str>) -> String {
        match mode {
            Mode::Chat => self.base_instructions.clone(),
            Mode::Scribe => {
                let template = template_name
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .unwrap_or(DEFAULT_SCRIBE_TEMPLATE);
                format!(
                    "{}{}",
                    SCRIBE_PREAMBLE.replace("{template}", template),
                    self.base_instructions
                )
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::conversation::Role;

    #[test]
    fn test_message_order() {
        let history = vec![
            ConversationTurn::user("Is heparin indicated?"),
            ConversationTurn::assistant("It depends on bleeding risk."),
        ];
        let messages = PromptComposer::new().compose("And aspirin?", "ctx", &history, Mode::Chat, None);

        let roles: Vec<Role> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::User]
        );
        assert_eq!(messages[3].content, "And aspirin?");
    }

    #[test]
    fn test_empty_context_placeholder() {
        let prompt = PromptComposer::new().system_prompt("", Mode::Chat, None);
        assert!(prompt.contains("### Retrieved Context\n_No relevant context_"));
        assert!(prompt.ends_with("Respond in **Markdown**."));
    }

    #[test]
    fn test_scribe_default_template() {
        let prompt = PromptComposer::new().system_prompt("ctx", Mode::Scribe, None);
        assert!(prompt.contains(
            "You are a clinical scribe AI. Convert the transcript into a professional \
             document using the template: General Scribe Template."
        ));
    }

    #[test]
    fn test_mode_changes_only_preamble() {
        let composer = PromptComposer::new();
        let chat = composer.system_prompt("ctx", Mode::Chat, None);
        let scribe = composer.system_prompt("ctx", Mode::Scribe, Some("SOAP Note"));

        assert!(scribe.contains("using the template: SOAP Note."));
        let preamble = SCRIBE_PREAMBLE.replace("{template}", "SOAP Note");
        assert_eq!(scribe.replacen(&preamble, "", 1), chat);
    }
}
