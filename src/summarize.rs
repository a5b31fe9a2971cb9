//! Optional title suggestions from a text-summarisation service.
//!
//! Task creation never depends on this: a missing API key, a network error
//! and an empty answer all look the same to callers (no suggestion).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Descriptions at or below this length are short enough to be a title.
pub const MIN_DESCRIPTION_LEN: usize = 50;

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const SYSTEM_PROMPT: &str = "You read a task description and answer with a concise, \
action-oriented phrase containing between three and eight words.";

/// Turns free text into a short title, if it can.
pub trait Summarizer {
    fn summarize(&self, text: &str) -> Option<String>;
}

/// Used when no service is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSummarizer;

impl Summarizer for NoSummarizer {
    fn summarize(&self, _text: &str) -> Option<String> {
        None
    }
}

/// Ask the summariser for a title for `description`, but only when the
/// description is long enough to be worth condensing.
pub fn suggest_title(summarizer: &dyn Summarizer, description: &str) -> Option<String> {
    if description.chars().count() <= MIN_DESCRIPTION_LEN {
        return None;
    }
    summarizer
        .summarize(description)
        .map(|s| s.trim().trim_matches('"').trim().to_string())
        .filter(|s| !s.is_empty())
}

/// The summariser configured through the environment: OpenAI when
/// `OPENAI_API_KEY` is set, otherwise none.
pub fn from_env() -> Box<dyn Summarizer> {
    match OpenAiSummarizer::from_env() {
        Some(s) => Box::new(s),
        None => Box::new(NoSummarizer),
    }
}

/// Chat-completions backed summariser.
pub struct OpenAiSummarizer {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

impl OpenAiSummarizer {
    /// Reads `OPENAI_API_KEY` and optionally `TASKDECK_SUMMARY_MODEL`.
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let model = std::env::var("TASKDECK_SUMMARY_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        Self::new(api_key, model)
    }

    pub fn new(api_key: String, model: String) -> Option<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| warn!(error = %e, "could not build HTTP client, summaries disabled"))
            .ok()?;
        Some(Self {
            client,
            api_key,
            model,
        })
    }

    fn request(&self, text: &str) -> reqwest::Result<Option<String>> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            max_tokens: 60,
            temperature: 0.2,
        };
        let response: ChatResponse = self
            .client
            .post(OPENAI_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;
        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content))
    }
}

impl Summarizer for OpenAiSummarizer {
    fn summarize(&self, text: &str) -> Option<String> {
        match self.request(text) {
            Ok(answer) => {
                debug!(model = %self.model, ?answer, "summary received");
                answer
            }
            Err(e) => {
                warn!(error = %e, "summary request failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Canned {
        answer: Option<&'static str>,
        calls: Cell<usize>,
    }

    impl Canned {
        fn new(answer: Option<&'static str>) -> Self {
            Self {
                answer,
                calls: Cell::new(0),
            }
        }
    }

    impl Summarizer for Canned {
        fn summarize(&self, _text: &str) -> Option<String> {
            self.calls.set(self.calls.get() + 1);
            self.answer.map(str::to_string)
        }
    }

    const LONG: &str = "Go through every open invoice from last quarter and chase the unpaid ones by email";

    #[test]
    fn short_descriptions_are_not_sent() {
        let s = Canned::new(Some("anything"));
        assert_eq!(suggest_title(&s, "fix the sink"), None);
        assert_eq!(s.calls.get(), 0);
    }

    #[test]
    fn suggestion_is_cleaned_up() {
        let s = Canned::new(Some("  \"Chase unpaid quarterly invoices\"\n"));
        assert_eq!(
            suggest_title(&s, LONG).as_deref(),
            Some("Chase unpaid quarterly invoices")
        );
        assert_eq!(s.calls.get(), 1);
    }

    #[test]
    fn blank_or_missing_answers_give_nothing() {
        assert_eq!(suggest_title(&Canned::new(Some("   ")), LONG), None);
        assert_eq!(suggest_title(&Canned::new(None), LONG), None);
        assert_eq!(suggest_title(&NoSummarizer, LONG), None);
    }
}
