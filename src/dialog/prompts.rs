//! Fixed prompt and reply texts

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::Error;

/// Phrase that starts the two-step news flow
pub const NEWS_TRIGGER: &str = "Show me current news about";

/// Reply asking which region the news should cover
pub const REGION_PROMPT: &str = "Please specify the country or region you'd like news about (e.g., 'India', 'USA', 'Europe'):";

/// Reply when the chat service fails
pub const CHAT_ERROR_REPLY: &str = "Error getting response. Please try again.";

/// Reply when a remote call exceeds the service timeout
pub const TIMEOUT_REPLY: &str = "The service is unavailable right now. Please try again later.";

/// Prompt submitted for an unrecognized card
pub const GREETING_PROMPT: &str = "Hello, how can you assist me today?";

/// Whether `prompt` starts the news flow (case-sensitive substring)
#[must_use]
pub fn is_news_trigger(prompt: &str) -> bool {
    prompt.contains(NEWS_TRIGGER)
}

/// Quick-action cards offered on the start screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptCard {
    /// Current news for a region
    News,
    /// Prioritized to-do list
    Tasks,
    /// App ideas
    Brainstorm,
    /// Motivational story
    Motivate,
}

impl PromptCard {
    /// Every card, in display order
    pub const ALL: [Self; 4] = [Self::News, Self::Tasks, Self::Brainstorm, Self::Motivate];

    /// Card name used in routes
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::News => "news",
            Self::Tasks => "tasks",
            Self::Brainstorm => "brainstorm",
            Self::Motivate => "motivate",
        }
    }

    /// Prompt submitted when the card is chosen
    #[must_use]
    pub const fn prompt(self) -> &'static str {
        match self {
            Self::News => {
                "Show me current news about [specify country/region]. What area or region's current news would you like to explore? I'll provide the latest updates from the last 24-48 hours."
            }
            Self::Tasks => {
                "Give me a prioritized to-do list for today categorized as urgent, important, or neither."
            }
            Self::Brainstorm => "Brainstorm 5 ideas for a web app combining AI and productivity.",
            Self::Motivate => {
                "Send me a motivational story, quote, and advice for staying focused today."
            }
        }
    }
}

impl FromStr for PromptCard {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|card| card.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::Config(format!("unknown prompt card: {s}")))
    }
}

impl fmt::Display for PromptCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Prompt for a card name, falling back to the greeting
#[must_use]
pub fn card_prompt(name: &str) -> &'static str {
    name.parse::<PromptCard>()
        .map_or(GREETING_PROMPT, PromptCard::prompt)
}
