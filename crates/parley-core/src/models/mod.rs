pub mod message;

pub use message::{Button, Message, Sender};
