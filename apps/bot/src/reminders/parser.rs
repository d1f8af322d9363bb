use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{error, info};

use crate::models::reminder::ReminderRow;
use crate::replies;
use crate::store::ChatStore;

/// Routes a message to reminder handling when present in its lowercased text.
pub const TRIGGER: &str = "hatırlat";

static MINUTES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(dakika|dk)").expect("valid minutes pattern"));
static HOURS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\s*(saat|sa)").expect("valid hours pattern"));
static DURATION_PHRASE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\d+\s*(dakika|dk|saat|sa)\s*sonra\s*").expect("valid duration phrase pattern")
});

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedReminder {
    pub delay_secs: i64,
    pub message: String,
}

pub fn contains_trigger(text: &str) -> bool {
    text.to_lowercase().contains(TRIGGER)
}

/// Extracts the delay and the reminder text. Minutes win over hours when
/// both appear. `None` when no usable duration is present.
///
/// Zero delays and empty messages are accepted as-is.
pub fn parse_reminder(text: &str) -> Option<ParsedReminder> {
    let lowered = text.to_lowercase();
    // A minutes match decides the outcome even when its number is unusable.
    let delay_secs = match first_amount(&MINUTES_RE, &lowered) {
        Some(minutes) => minutes?.checked_mul(60)?,
        None => first_amount(&HOURS_RE, &lowered)??.checked_mul(3600)?,
    };

    let message = DURATION_PHRASE_RE
        .replace_all(text, "")
        .replace(TRIGGER, "")
        .trim()
        .to_string();

    Some(ParsedReminder {
        delay_secs,
        message,
    })
}

/// Outer `None`: no match. Inner `None`: matched, but the number does not fit.
fn first_amount(pattern: &Regex, text: &str) -> Option<Option<i64>> {
    pattern
        .captures(text)
        .map(|caps| caps[1].parse::<i64>().ok())
}

/// Parses `text`, stores the reminder and returns the reply for the sender.
pub async fn handle_reminder_request(
    store: &dyn ChatStore,
    phone_number: &str,
    text: &str,
    now: i64,
) -> String {
    let Some(parsed) = parse_reminder(text) else {
        return replies::REMINDER_GUIDANCE.to_string();
    };
    let Some(remind_at) = now.checked_add(parsed.delay_secs) else {
        return replies::REMINDER_GUIDANCE.to_string();
    };

    let reminder = ReminderRow::new(phone_number, remind_at, parsed.message, now);
    match store.put_reminder(&reminder).await {
        Ok(()) => {
            info!(
                "Reminder {} scheduled for {phone_number} at {remind_at}",
                reminder.reminder_id
            );
            replies::reminder_confirmation(&reminder.message)
        }
        Err(e) => {
            error!("Failed to store reminder for {phone_number}: {e}");
            replies::REMINDER_FAILED.to_string()
        }
    }
}
