use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

/// A single chat message as persisted in a user's history.
///
/// `buttons` and `image` are carried for the UI and never inspected by
/// the store. Any other fields found on a stored record land in `extra`
/// and are written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub text: String,
    pub sender: Sender,
    #[serde(serialize_with = "iso_timestamp")]
    pub timestamp: jiff::Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buttons: Option<Vec<Button>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        sender: Sender,
        timestamp: jiff::Timestamp,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            sender,
            timestamp,
            buttons: None,
            image: None,
            extra: Map::new(),
        }
    }

    pub fn with_buttons(mut self, buttons: Vec<Button>) -> Self {
        self.buttons = Some(buttons);
        self
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

/// Write timestamps the way browsers do (`2024-05-01T09:30:00.000Z`).
/// Finer than millisecond precision is kept as is.
fn iso_timestamp<S: Serializer>(
    timestamp: &jiff::Timestamp,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    if timestamp.subsec_nanosecond() % 1_000_000 == 0 {
        serializer.collect_str(&format_args!("{timestamp:.3}"))
    } else {
        serializer.collect_str(timestamp)
    }
}

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// A quick-reply button attached to a bot message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Button {
    pub id: String,
    pub label: String,
}

impl Button {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}
