// Streaming session helpers: signaling URL normalization and player input flags.

use serde::{Deserialize, Serialize};

/// Normalize a user-supplied signaling server address into a WebSocket URL.
///
/// HTTP schemes map to their WebSocket counterparts, bare hosts get the page's preferred
/// scheme, and secure pages never connect over plain `ws://` (browsers block mixed content).
pub fn normalize_signaling_url(input: &str, page_is_secure: bool) -> String {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut url = if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if trimmed.starts_with("ws://") || trimmed.starts_with("wss://") {
        trimmed.to_string()
    } else {
        let scheme = if page_is_secure { "wss://" } else { "ws://" };
        format!("{scheme}{trimmed}")
    };

    if page_is_secure {
        if let Some(rest) = url.strip_prefix("ws://") {
            url = format!("wss://{rest}");
        }
    }

    url
}

/// How a mobile visitor drives the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StreamInputMode {
    /// On-screen move/look sticks relayed through this crate.
    #[default]
    Joystick,
    /// Direct touch on the video.
    Touch,
}

/// Input flags handed to the streaming player's initial settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InputFlags {
    pub hovering_mouse: bool,
    pub fake_mouse_with_touches: bool,
    pub touch_input: bool,
    pub mouse_input: bool,
    pub keyboard_input: bool,
}

impl InputFlags {
    /// Touch-to-mouse emulation is only for mobile devices; desktop keeps the native mouse path.
    /// `keyboard_enabled` is false while a page text field (chat) owns the keyboard.
    pub fn resolve(is_mobile: bool, mode: StreamInputMode, keyboard_enabled: bool) -> Self {
        let fake_mouse_with_touches =
            is_mobile && matches!(mode, StreamInputMode::Joystick | StreamInputMode::Touch);
        InputFlags {
            hovering_mouse: true,
            fake_mouse_with_touches,
            touch_input: !fake_mouse_with_touches,
            mouse_input: true,
            keyboard_input: keyboard_enabled,
        }
    }
}

/// Short label for status text.
pub fn input_label(is_mobile: bool, mode: StreamInputMode) -> &'static str {
    match (is_mobile, mode) {
        (false, _) => "desktop",
        (true, StreamInputMode::Touch) => "touch",
        (true, StreamInputMode::Joystick) => "joystick",
    }
}
