//! Chat message formatters, one per event category.
//!
//! Every formatter is a pure function of its event and timestamp. Missing
//! input fields render as empty strings.

pub mod alarm;
pub mod catch_all;
pub mod scheduled;
pub mod task;

pub use alarm::{AlarmEvent, Trigger};
pub use catch_all::UnclassifiedEvent;
pub use scheduled::ScheduledRuleEvent;
pub use task::TaskStateEvent;
