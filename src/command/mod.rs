//! Voice command vocabulary, classification, and handler registration

mod classifier;
mod handlers;

pub use classifier::{classify, Command};
pub use handlers::{CommandHandler, CommandHandlerTable, HandlerUpdate};
