pub mod file_storage;
pub mod mailer;
pub mod wizard;

pub use mailer::{Mailer, OutgoingMail};
pub use wizard::{WizardProgress, WizardStep};
