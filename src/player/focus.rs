//! Keyboard focus rules for the about dialog and the context menu.

use crate::host::{NodeId, PageHost};

/// Remembers where focus was before the dialog opened. The remembered node may
/// disappear from the page at any time; it is only a lookup key.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FocusManager {
    last_focus_before_modal: Option<NodeId>,
}

impl FocusManager {
    /// Record the focused node. Focus inside `transient`, an overlay that is
    /// about to close, is not worth coming back to.
    pub fn remember(&mut self, page: &dyn PageHost, transient: &NodeId) {
        self.last_focus_before_modal = page
            .active_element()
            .filter(|node| !page.contains(transient, node));
    }

    pub fn remembered(&self) -> Option<&NodeId> {
        self.last_focus_before_modal.as_ref()
    }

    pub fn take_remembered(&mut self) -> Option<NodeId> {
        self.last_focus_before_modal.take()
    }

    /// Remembered node if it can still take focus, otherwise `fallback`.
    pub fn restoration_target(
        page: &dyn PageHost,
        remembered: Option<NodeId>,
        fallback: &NodeId,
    ) -> NodeId {
        remembered
            .filter(|node| page.is_focusable(node))
            .unwrap_or_else(|| fallback.clone())
    }

    /// Keep Tab inside `dialog`. Returns true when the browser's own tab
    /// handling must be suppressed.
    pub fn trap_tab(page: &dyn PageHost, dialog: &NodeId, close: &NodeId, shift: bool) -> bool {
        let focusable = page.focusable_within(dialog);
        let (Some(first), Some(last)) = (focusable.first(), focusable.last()) else {
            page.focus(close);
            return true;
        };
        let active = page.active_element();
        if !shift && active.as_ref() == Some(last) {
            page.focus(first);
            true
        } else if shift && active.as_ref() == Some(first) {
            page.focus(last);
            true
        } else {
            false
        }
    }

    /// Pull focus back to the close control when it escaped the dialog.
    pub fn redirect_focus_in(
        page: &dyn PageHost,
        dialog: &NodeId,
        close: &NodeId,
        target: &NodeId,
    ) -> bool {
        if page.contains(dialog, target) {
            return false;
        }
        page.focus(close);
        true
    }

    /// Focus the first candidate that is enabled, returning it.
    pub fn focus_first_enabled<I>(page: &dyn PageHost, candidates: I) -> Option<NodeId>
    where
        I: IntoIterator<Item = (NodeId, bool)>,
    {
        let (target, _) = candidates.into_iter().find(|(_, disabled)| !disabled)?;
        page.focus(&target);
        Some(target)
    }

    /// Drop focus if it currently sits inside `scope`.
    pub fn blur_within(page: &dyn PageHost, scope: &NodeId) {
        if let Some(active) = page.active_element() {
            if page.contains(scope, &active) {
                page.blur(&active);
            }
        }
    }
}
