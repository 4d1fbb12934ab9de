//! Greeting text and capability shortcuts shown on the welcome screen.

use chrono::{Local, Timelike};

/// Greeting for the given hour of the day (0-23).
#[must_use]
pub fn greeting_for_hour(hour: u32) -> String {
    let time_greeting = if hour < 12 {
        "Good morning"
    } else if hour < 18 {
        "Good afternoon"
    } else {
        "Good evening"
    };
    format!("{time_greeting}, How can I assist you today?")
}

/// Greeting for the current local time.
#[must_use]
pub fn current_greeting() -> String {
    greeting_for_hour(Local::now().hour())
}

/// Capability tags on the welcome screen, each mapped to a suggested prompt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    /// Web development help.
    WebDev,
    /// Research assistance.
    DeepResearch,
    /// Image generation.
    ImageGeneration,
    /// Video generation.
    VideoGeneration,
    /// Interactive artifacts.
    Artifacts,
}

impl Capability {
    /// Every capability, in display order.
    pub const ALL: [Self; 5] = [
        Self::WebDev,
        Self::DeepResearch,
        Self::ImageGeneration,
        Self::VideoGeneration,
        Self::Artifacts,
    ];

    /// Label shown on the tag.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::WebDev => "Web Dev",
            Self::DeepResearch => "Deep Research",
            Self::ImageGeneration => "Image Generation",
            Self::VideoGeneration => "Video Generation",
            Self::Artifacts => "Artifacts",
        }
    }

    /// Prompt placed in the input when the tag is chosen.
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::WebDev => "Help me build a modern web application",
            Self::DeepResearch => "I need help with research on artificial intelligence",
            Self::ImageGeneration => "Generate an image of a futuristic cityscape",
            Self::VideoGeneration => "Create a video about renewable energy",
            Self::Artifacts => "Show me an interactive component example",
        }
    }

    /// Look a capability up by its (whitespace-trimmed) tag label.
    #[must_use]
    pub fn from_tag(tag: &str) -> Option<Self> {
        let tag = tag.trim();
        Self::ALL.into_iter().find(|c| c.tag() == tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_tiers() {
        assert!(greeting_for_hour(0).starts_with("Good morning"));
        assert!(greeting_for_hour(11).starts_with("Good morning"));
        assert!(greeting_for_hour(12).starts_with("Good afternoon"));
        assert!(greeting_for_hour(17).starts_with("Good afternoon"));
        assert!(greeting_for_hour(18).starts_with("Good evening"));
        assert_eq!(
            greeting_for_hour(23),
            "Good evening, How can I assist you today?"
        );
    }

    #[test]
    fn test_capability_lookup() {
        assert_eq!(Capability::from_tag("  Web Dev "), Some(Capability::WebDev));
        assert_eq!(
            Capability::from_tag("Artifacts").map(Capability::prompt),
            Some("Show me an interactive component example")
        );
        assert_eq!(Capability::from_tag("Cooking"), None);
    }
}
