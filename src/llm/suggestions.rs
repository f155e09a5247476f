//! Follow-up suggestions attached to assistant replies

/// Offered with the greeting.
pub const WELCOME_SUGGESTIONS: [&str; 4] = [
    "When should I charge my EV over the next 48 hours?",
    "What are the best times tomorrow?",
    "Show me the cleanest hours this week",
    "Plan my energy usage for the weekend",
];

/// Offered when the assistant endpoint failed.
pub const ERROR_SUGGESTIONS: [&str; 3] = [
    "Try asking again",
    "Check current carbon intensity",
    "Show renewable energy mix",
];

/// Keyword groups checked in order; the first group with a matching
/// keyword wins.
const TOPICS: [(&[&str], [&str; 4]); 6] = [
    (
        &["48", "2 days", "tomorrow"],
        [
            "What about next week's forecast?",
            "Compare with last week's data",
            "Set energy reminders for best times",
            "Calculate potential savings",
        ],
    ),
    (
        &["ev", "car", "charge"],
        [
            "What about other appliances?",
            "Show me tomorrow's best times",
            "Compare charging costs by time",
            "Set charging reminders",
        ],
    ),
    (
        &["region", "area"],
        [
            "Why are some regions cleaner?",
            "Show generation mix by region",
            "Best times in my area over 48h",
            "Regional forecast trends",
        ],
    ),
    (
        &["renewable", "green", "clean"],
        [
            "What affects renewable percentage?",
            "Best green energy times this week",
            "48-hour renewable trends",
            "Solar vs wind over time",
        ],
    ),
    (
        &["forecast", "planning", "schedule"],
        [
            "Set smart energy reminders",
            "Weekly energy planning",
            "Best appliance schedules",
            "Compare weekend vs weekday",
        ],
    ),
    (
        &["cost", "save", "money"],
        [
            "Calculate 48-hour savings potential",
            "Smart home automation tips",
            "Energy tariff optimization",
            "Monthly savings tracker",
        ],
    ),
];

const DEFAULT_SUGGESTIONS: [&str; 4] = [
    "Plan my EV charging for 48 hours",
    "Show regional differences",
    "What's the weekend forecast?",
    "How can I save energy this week?",
];

/// Pick follow-ups from the user's question. Matching is a plain
/// case-insensitive substring test, so "every" matches "ev".
pub fn smart_suggestions(question: &str) -> Vec<String> {
    let input = question.to_lowercase();
    TOPICS
        .iter()
        .find(|(keywords, _)| keywords.iter().any(|k| input.contains(k)))
        .map_or(DEFAULT_SUGGESTIONS, |(_, suggestions)| *suggestions)
        .iter()
        .map(|s| (*s).to_string())
        .collect()
}

pub fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
