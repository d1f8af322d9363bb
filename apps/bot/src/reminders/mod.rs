//! Reminders: parsing "N dakika/saat sonra ... hatırlat" requests into
//! stored records, and the poller that delivers them.

pub mod parser;
pub mod poller;

pub use parser::{contains_trigger, handle_reminder_request};
pub use poller::ReminderPoller;
