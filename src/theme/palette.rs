use bevy::prelude::*;

/// Off-white text for dark backgrounds
pub const LABEL_TEXT: Color = Color::srgb(0.953, 0.937, 0.906);

/// Off-white text for headers
pub const HEADER_TEXT: Color = Color::srgb(0.953, 0.937, 0.906);

/// Dark text for buttons
pub const BUTTON_TEXT: Color = Color::srgb(0.1, 0.1, 0.1);
/// #ffd166
pub const BUTTON_BACKGROUND: Color = Color::srgb(1.0, 0.820, 0.400);
/// #ffe09e
pub const BUTTON_HOVERED_BACKGROUND: Color = Color::srgb(1.0, 0.878, 0.620);
/// #d9a93f
pub const BUTTON_PRESSED_BACKGROUND: Color = Color::srgb(0.851, 0.663, 0.247);
