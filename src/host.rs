//! Seams between the player core and the page it lives in.
//! Everything the core needs from the outside world goes through these traits,
//! so the same coordinator runs against the browser DOM and the headless page.

use futures_util::future::LocalBoxFuture;
use std::fmt;

/// Identifier of a node on the page. Holding one never keeps the node alive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Coarse element classification used by the shortcut guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Input,
    Button,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

/// Document-level collaborator: focus, geometry, fullscreen and
/// picture-in-picture state.
pub trait PageHost {
    fn active_element(&self) -> Option<NodeId>;
    fn element_kind(&self, node: &NodeId) -> ElementKind;
    fn focus(&self, node: &NodeId);
    fn blur(&self, node: &NodeId);
    /// True when `node` is `ancestor` or one of its descendants.
    fn contains(&self, ancestor: &NodeId, node: &NodeId) -> bool;
    /// Connected to the document and able to take focus.
    fn is_focusable(&self, node: &NodeId) -> bool;
    /// Tab-reachable descendants of `scope`, in document order.
    fn focusable_within(&self, scope: &NodeId) -> Vec<NodeId>;
    fn bounding_rect(&self, node: &NodeId) -> Rect;
    fn viewport(&self) -> Viewport;

    fn fullscreen_element(&self) -> Option<NodeId>;
    fn request_fullscreen(&self, node: &NodeId);
    fn exit_fullscreen(&self);

    fn picture_in_picture_supported(&self) -> bool;
    fn picture_in_picture_element(&self) -> Option<NodeId>;
    fn request_picture_in_picture(&self, video: &NodeId);
    fn exit_picture_in_picture(&self);

    fn document_title(&self) -> String;
    /// Location used to resolve relative media sources.
    fn base_url(&self) -> String;
    /// Removes a node from the document.
    fn detach(&self, node: &NodeId);
}

/// The event loop the core suspends on.
pub trait Scheduler {
    /// Runs `task` to completion independently of whoever spawned it.
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);
    /// Runs `task` once the next frame has been rendered.
    fn after_next_frame(&self, task: Box<dyn FnOnce()>);
}
