use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    /// Substring a control's label must contain.
    pub keyword: String,
    pub case_sensitive: bool,
    /// Capacity of the click diagnostics channel.
    pub click_buffer: usize,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            keyword: "Post".into(),
            case_sensitive: true,
            click_buffer: 64,
        }
    }
}
