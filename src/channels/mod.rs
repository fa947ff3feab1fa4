//! Outbound channels for relayed submissions.

pub mod messenger;
pub mod telegram;

pub use messenger::{DispatchReceipt, Messenger, OutgoingDocument};
pub use telegram::TelegramMessenger;
