use arboard::Clipboard;

#[derive(Debug, thiserror::Error)]
pub enum ClipboardError {
    #[error("nothing to copy")]
    Empty,
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}

pub trait ClipboardProvider {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError>;
}

/// System clipboard through `arboard`; a fresh handle is opened per copy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClipboard;

impl ClipboardProvider for SystemClipboard {
    fn set_text(&self, text: &str) -> Result<(), ClipboardError> {
        if text.is_empty() {
            return Err(ClipboardError::Empty);
        }
        let mut clipboard =
            Clipboard::new().map_err(|error| ClipboardError::Unavailable(error.to_string()))?;
        clipboard
            .set_text(text)
            .map_err(|error| ClipboardError::Unavailable(error.to_string()))
    }
}
