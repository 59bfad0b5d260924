//! Engine double replaying a fixed script of events.

use super::{
    EngineEvent, EngineEventKind, EngineFactory, ExtractedContent, RenderEngine, Ticket,
};
use std::path::Path;
use std::sync::mpsc::Sender;

/// Events a [`ScriptedEngine`] posts in response to each request.
#[derive(Debug, Clone, Default)]
pub struct Script {
    pub on_html: Vec<EngineEventKind>,
    pub on_text: Vec<EngineEventKind>,
    /// Posted as `ContentReady` on `save_content`
    pub content: Option<ExtractedContent>,
    /// Signalled whenever text is pushed
    pub started: Option<Sender<()>>,
}

impl Script {
    /// Loads, renders and returns `body`.
    pub fn rendering(body: &str) -> Self {
        Self {
            on_html: vec![EngineEventKind::LoadFinished],
            on_text: vec![EngineEventKind::WorkFinished],
            content: Some(ExtractedContent {
                head: String::new(),
                style: "p { margin: 0; }".to_string(),
                body: body.to_string(),
            }),
            started: None,
        }
    }

    /// Loads but never finishes rendering.
    pub fn stalling() -> Self {
        Self {
            on_html: vec![EngineEventKind::LoadFinished],
            ..Default::default()
        }
    }

    pub fn factory(self) -> Box<EngineFactory> {
        Box::new(move |events: Sender<EngineEvent>| {
            Box::new(ScriptedEngine {
                events,
                script: self.clone(),
            }) as Box<dyn RenderEngine>
        })
    }
}

pub struct ScriptedEngine {
    events: Sender<EngineEvent>,
    script: Script,
}

impl ScriptedEngine {
    fn post_all(&self, ticket: Ticket, kinds: &[EngineEventKind]) {
        for kind in kinds {
            let _ = self.events.send(EngineEvent::new(ticket, kind.clone()));
        }
    }
}

impl RenderEngine for ScriptedEngine {
    fn set_html(&mut self, ticket: Ticket, _html: &str, _base_dir: &Path) {
        self.post_all(ticket, &self.script.on_html);
    }

    fn set_text(&mut self, ticket: Ticket, _text: &str) {
        self.post_all(ticket, &self.script.on_text);
        if let Some(started) = &self.script.started {
            let _ = started.send(());
        }
    }

    fn save_content(&mut self, ticket: Ticket) {
        if let Some(content) = self.script.content.clone() {
            let _ = self
                .events
                .send(EngineEvent::new(ticket, EngineEventKind::ContentReady(content)));
        }
    }
}
