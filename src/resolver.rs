//! Memory-augmented response resolution
//!
//! Every user input is first checked against the persistent exchange log;
//! a recall hit replays the stored response and nothing is written. On a
//! miss an ordered rule table produces the response, which is then
//! written back so the next similar input recalls it.

use chrono::Local;

use crate::db::ExchangeRepo;

/// Response used when no rule matches
const FALLBACK_RESPONSE: &str = "I'm still learning, but I can understand many languages!";

/// One entry in the rule table
struct Rule {
    name: &'static str,
    applies: fn(&str) -> bool,
    respond: fn() -> String,
}

fn is_greeting(input: &str) -> bool {
    input.contains("hello") || input.contains("hi")
}

fn is_identity(input: &str) -> bool {
    input.contains("your name")
}

fn is_time(input: &str) -> bool {
    input.contains("time")
}

fn is_farewell(input: &str) -> bool {
    input.contains("bye")
}

fn is_thanks(input: &str) -> bool {
    input.contains("thank")
}

fn greeting() -> String {
    "Hi there! How can I help you?".to_string()
}

fn identity() -> String {
    "I'm your hybrid voice assistant.".to_string()
}

fn current_time() -> String {
    format!(
        "The current time is {}.",
        Local::now().format("%I:%M %p")
    )
}

fn farewell() -> String {
    "Goodbye! Have a great day!".to_string()
}

fn thanks() -> String {
    "You're very welcome!".to_string()
}

/// The rule table, evaluated in order; first match wins
static RULES: &[Rule] = &[
    Rule {
        name: "greeting",
        applies: is_greeting,
        respond: greeting,
    },
    Rule {
        name: "identity",
        applies: is_identity,
        respond: identity,
    },
    Rule {
        name: "time",
        applies: is_time,
        respond: current_time,
    },
    Rule {
        name: "farewell",
        applies: is_farewell,
        respond: farewell,
    },
    Rule {
        name: "thanks",
        applies: is_thanks,
        respond: thanks,
    },
];

/// Resolves user input to a response, learning as it goes
#[derive(Clone)]
pub struct ResponseResolver {
    store: ExchangeRepo,
}

impl ResponseResolver {
    /// Create a new resolver over the exchange log
    #[must_use]
    pub const fn new(store: ExchangeRepo) -> Self {
        Self { store }
    }

    /// Resolve user input to a response
    ///
    /// The input is lower-cased, then recalled from memory; a hit is
    /// returned as-is with no rule evaluation and no write. On a miss the
    /// rule table answers and the exchange is persisted. A storage
    /// failure never costs the user their response; it is logged for
    /// the operator instead.
    pub fn resolve(&self, user_input: &str) -> String {
        let normalized = user_input.trim().to_lowercase();

        match self.store.recall(&normalized) {
            Ok(Some(recalled)) => {
                tracing::debug!(input = %normalized, "recall hit");
                return recalled;
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(error = %e, "memory recall failed, falling back to rules");
            }
        }

        let response = RULES
            .iter()
            .find(|rule| (rule.applies)(&normalized))
            .map_or_else(
                || FALLBACK_RESPONSE.to_string(),
                |rule| {
                    tracing::debug!(rule = rule.name, "rule matched");
                    (rule.respond)()
                },
            );

        if let Err(e) = self.store.append(&normalized, &response) {
            tracing::error!(error = %e, "failed to persist exchange, response returned anyway");
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_order_first_match_wins() {
        // "hi, what time is it" contains both a greeting keyword and
        // "time"; the greeting rule is earlier in the table
        let matched = RULES
            .iter()
            .find(|rule| (rule.applies)("hi, what time is it"))
            .unwrap();
        assert_eq!(matched.name, "greeting");
    }

    #[test]
    fn test_greeting_matches_substring() {
        // Substring semantics: "hi" inside "this" still matches, by design
        assert!(is_greeting("this is fine"));
        assert!(is_greeting("hello there"));
        assert!(!is_farewell("hello there"));
    }

    #[test]
    fn test_time_response_is_twelve_hour_clock() {
        let response = current_time();
        assert!(response.starts_with("The current time is "));
        assert!(response.ends_with("AM.") || response.ends_with("PM."));
    }

    #[test]
    fn test_no_rule_falls_back() {
        assert!(!RULES.iter().any(|rule| (rule.applies)("quantum flux capacitors")));
    }
}
