//! Fakes shared by the unit tests.

use crate::api::{MetadataProbe, ProbeError, ProbeResponse};
use crate::host::Scheduler;
use futures_util::future::LocalBoxFuture;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

pub fn ok_response(content_length: Option<&str>, content_type: Option<&str>) -> ProbeResponse {
    ProbeResponse {
        status: 200,
        content_length: content_length.map(str::to_string),
        content_type: content_type.map(str::to_string),
    }
}

/// Metadata server answering from a script, suspending once before each answer.
#[derive(Clone, Default)]
pub struct ScriptedServer {
    responses: Rc<RefCell<VecDeque<Result<ProbeResponse, ProbeError>>>>,
    calls: Rc<Cell<usize>>,
}

impl ScriptedServer {
    pub fn new(responses: Vec<Result<ProbeResponse, ProbeError>>) -> Self {
        Self {
            responses: Rc::new(RefCell::new(responses.into())),
            calls: Rc::new(Cell::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl MetadataProbe for ScriptedServer {
    fn probe(&self, _url: &str) -> LocalBoxFuture<'static, Result<ProbeResponse, ProbeError>> {
        self.calls.set(self.calls.get() + 1);
        let next = self
            .responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(ProbeError::Transport("script exhausted".to_string())));
        Box::pin(async move {
            tokio::task::yield_now().await;
            next
        })
    }
}

/// Spawns onto the surrounding `LocalSet`; frames run only when flushed.
#[derive(Default)]
pub struct ManualScheduler {
    frames: RefCell<Vec<Box<dyn FnOnce()>>>,
}

impl ManualScheduler {
    pub fn flush_frames(&self) {
        let frames = std::mem::take(&mut *self.frames.borrow_mut());
        for frame in frames {
            frame();
        }
    }

    pub fn queued_frames(&self) -> usize {
        self.frames.borrow().len()
    }
}

impl Scheduler for ManualScheduler {
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        tokio::task::spawn_local(task);
    }

    fn after_next_frame(&self, task: Box<dyn FnOnce()>) {
        self.frames.borrow_mut().push(task);
    }
}

/// Give spawned local tasks a chance to run to completion.
pub async fn settle() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}
