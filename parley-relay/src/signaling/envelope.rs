use parley_core::MessageKind;
use serde::Deserialize;

/// The only part of a client frame the relay looks at.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: MessageKind,
}

impl Envelope {
    /// `None` for anything that is not a JSON object with a known `type`.
    pub fn peek(text: &str) -> Option<MessageKind> {
        serde_json::from_str::<Envelope>(text)
            .ok()
            .map(|envelope| envelope.kind)
    }
}
