//! Context menu model: open state, placement and input-method tracking.

use crate::host::Viewport;

/// How the user is driving the menu right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMethod {
    #[default]
    Keyboard,
    Pointer,
}

impl InputMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Keyboard => "keyboard",
            Self::Pointer => "pointer",
        }
    }
}

/// What opened the menu. A context-menu key press arrives with the primary
/// button; a right click does not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTrigger {
    Keyboard,
    Pointer,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MenuPosition {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContextMenuState {
    pub open: bool,
    pub position: MenuPosition,
    pub input_method: InputMethod,
}

/// Place a `width` x `height` menu at the click point, pulled back so it stays
/// `padding` away from every viewport edge.
pub fn clamp_menu_position(
    click_x: f64,
    click_y: f64,
    width: f64,
    height: f64,
    viewport: Viewport,
    padding: f64,
) -> MenuPosition {
    let mut x = click_x;
    let mut y = click_y;
    if x + width > viewport.width - padding {
        x = viewport.width - width - padding;
    }
    if y + height > viewport.height - padding {
        y = viewport.height - height - padding;
    }
    MenuPosition {
        x: x.max(padding),
        y: y.max(padding),
    }
}
