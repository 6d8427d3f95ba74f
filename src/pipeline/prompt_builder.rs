use crate::config::PromptStyle;

pub struct PromptBuilder {
    style: PromptStyle,
}

impl PromptBuilder {
    pub fn new(style: PromptStyle) -> Self {
        Self { style }
    }

    pub fn build(&self, base_prompt: &str) -> String {
        format!(
            "{} -- Style: \"{}\". {}",
            base_prompt.trim(),
            self.style.style,
            self.style.constraint_text()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composed_prompt() {
        let builder = PromptBuilder::new(PromptStyle::new("line art").with_dimensions(800, 600));
        assert_eq!(
            builder.build("a ruler"),
            "a ruler -- Style: \"line art\". Image size 800x600 pixels. No borders, no background color, no text."
        );
    }

    #[test]
    fn test_custom_constraints() {
        let builder =
            PromptBuilder::new(PromptStyle::new("clay").with_constraints("Square, no shadows."));
        assert_eq!(builder.build("  a mug "), "a mug -- Style: \"clay\". Square, no shadows.");
    }
}
