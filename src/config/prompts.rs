//! System prompt templates for Tubechat.
//!
//! Prompts can be customized by placing a `prompts.toml` file in the custom
//! prompts directory.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// System prompts used to open a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    /// System prompt for a plain chat.
    pub system: String,
    /// System prompt when a transcript is loaded. Receives `{{transcript}}`.
    pub transcript_system: String,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            system: "You are a helpful assistant.".to_string(),

            transcript_system: r#"You are a helpful assistant.
You will help this user answer questions they have based on the transcript of a video.
You will begin with a very short synopsis of the video. It is important that your synopsis is short. However, when the user begins asking questions, feel free to elaborate in order to satisfy the user.
Here is the transcript: {{transcript}}"#
                .to_string(),

            variables: HashMap::new(),
        }
    }
}

impl Prompts {
    /// Load prompts, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(dir) = custom_dir {
            let path = PathBuf::from(shellexpand::tilde(dir).to_string()).join("prompts.toml");
            if path.exists() {
                let content = std::fs::read_to_string(&path)?;
                prompts = toml::from_str(&content)?;
            }
        }

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are substituted in a single pass over the template, so
    /// text inserted for one variable is never expanded again. Unknown
    /// placeholders are left as written.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let mut result = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(start) = rest.find("{{") {
            result.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                rest = &rest[start..];
                break;
            };
            let key = &after[..end];
            match vars.get(key) {
                Some(value) => result.push_str(value),
                None => {
                    result.push_str("{{");
                    result.push_str(key);
                    result.push_str("}}");
                }
            }
            rest = &after[end + 2..];
        }

        result.push_str(rest);
        result
    }

    /// Render a template with custom config variables underneath `vars`.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Text of the opening system message.
    pub fn system_prompt(&self, transcript: Option<&str>) -> String {
        let mut vars = HashMap::new();
        match transcript {
            Some(text) => {
                vars.insert("transcript".to_string(), text.trim().to_string());
                self.render_with_custom(&self.transcript_system, &vars)
            }
            None => self.render_with_custom(&self.system, &vars),
        }
    }
}
