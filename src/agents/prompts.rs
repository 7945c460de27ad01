//! Prompt builders for the model-backed agents

use crate::memory::MemoryEntry;
use crate::notification::Notification;

const CLASSIFICATION_CONTEXT: &str = "\
You are a notification classification agent. Classify each notification into one of three categories:

1. URGENT: requires immediate attention (security alerts, time-sensitive messages, important reminders)
2. IRRELEVANT: spam, ads, or content not relevant to the user (promotions, game notifications)
3. LESS_URGENT: informative but needs no immediate action (news updates, weather)

Examples:

Notification: \"Your bank account has a suspicious login attempt\"
Classification: URGENT
Reasoning: Security-related notifications require immediate attention

Notification: \"50% off sale! Limited time only!\"
Classification: IRRELEVANT
Reasoning: Promotional content unrelated to the user's immediate needs

Notification: \"New article published: Tech trends 2024\"
Classification: LESS_URGENT
Reasoning: Informative content that can be reviewed later

Notification: \"Meeting reminder: Team standup in 5 minutes\"
Classification: URGENT
Reasoning: Time-sensitive reminder requires immediate attention

Notification: \"You have 3 new likes on your post\"
Classification: IRRELEVANT
Reasoning: Social media engagement is not urgent

Notification: \"Weather update: Sunny, 72F\"
Classification: LESS_URGENT
Reasoning: Informative but not time-critical
";

const CLASSIFICATION_REPLY_FORMAT: &str = "\
Reply with a single JSON object and nothing else:
{\"category\": \"URGENT\" | \"IRRELEVANT\" | \"LESS_URGENT\", \"confidence\": <number between 0 and 1>, \"reasoning\": \"<one sentence>\"}
";

const EXTRACTION_CONTEXT: &str = "\
You are a memory extraction agent. Extract key facts from notifications that should be remembered for future context.

Guidelines:
- Extract factual information (dates, times, names, events)
- Extract user preferences and patterns
- Extract important relationships or connections
- Avoid redundant or obvious information
- Write each fact as a concise, standalone statement

Examples:

Notification: \"Meeting with John at 3pm tomorrow in Conference Room A\"
Facts:
- User has a meeting with John
- Meeting scheduled for tomorrow at 3pm
- Location: Conference Room A

Notification: \"Your package from Amazon will arrive on Friday\"
Facts:
- User has a package delivery expected
- Delivery date: Friday
- Source: Amazon
";

const EXTRACTION_REPLY_FORMAT: &str = "\
Reply with a single JSON object and nothing else:
{\"facts\": [\"<fact>\", ...]}
";

/// Notification fields as presented to the model
pub fn notification_block(notification: &Notification) -> String {
    format!(
        "Title: {}\nBody: {}\nApp: {}\n",
        notification.title, notification.body, notification.app_name
    )
}

/// Full classification prompt, including recent memories as context
pub fn classification_prompt(notification: &Notification, recent: &[MemoryEntry]) -> String {
    let mut prompt = String::from(CLASSIFICATION_CONTEXT);

    if !recent.is_empty() {
        prompt.push_str("\nRelevant context from previous notifications:\n");
        for entry in recent {
            prompt.push_str("- ");
            prompt.push_str(&entry.content);
            prompt.push('\n');
        }
    }

    prompt.push_str("\nNotification to classify:\n");
    prompt.push_str(&notification_block(notification));
    prompt.push('\n');
    prompt.push_str(CLASSIFICATION_REPLY_FORMAT);
    prompt
}

/// Full fact extraction prompt
pub fn extraction_prompt(notification: &Notification) -> String {
    format!(
        "{}\nNotification:\n{}\n{}",
        EXTRACTION_CONTEXT,
        notification_block(notification),
        EXTRACTION_REPLY_FORMAT
    )
}
