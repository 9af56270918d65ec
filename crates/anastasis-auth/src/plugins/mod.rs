pub mod command;
pub mod file;
pub mod iban;
pub mod question;
pub mod totp;

pub use command::CommandPlugin;
pub use file::FilePlugin;
pub use iban::IbanPlugin;
pub use question::QuestionPlugin;
pub use totp::TotpPlugin;
