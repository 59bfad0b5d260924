//! Bundled markdown rendering engine
//!
//! Requests are queued to a worker thread which renders with comrak and
//! posts the outcome back as engine events, so callers observe the same
//! asynchronous behaviour as with an embedded browser engine.

use super::page::LoadedPage;
use super::{EngineEvent, EngineEventKind, ExtractedContent, RenderEngine, Ticket};
use crate::files::{path_to_url, resolve_local_reference, rewrite_image_sources};
use crate::template::WebGlobalOptions;
use comrak::{markdown_to_html, Options};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

static HEADING_OPEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<h([1-6])([^>]*)>").unwrap());
static PLANTUML_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<pre><code class="language-(?:plantuml|puml)">.*?</code></pre>"#).unwrap()
});
static GRAPHVIZ_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<pre><code class="language-(?:dot|graphviz)">.*?</code></pre>"#).unwrap()
});

enum Command {
    SetHtml {
        ticket: Ticket,
        html: String,
        base_dir: PathBuf,
    },
    SetText {
        ticket: Ticket,
        text: String,
    },
    SaveContent {
        ticket: Ticket,
    },
}

/// Engine rendering markdown on a dedicated worker thread.
pub struct MarkdownEngine {
    commands: Option<Sender<Command>>,
    worker: Option<JoinHandle<()>>,
    events: Sender<EngineEvent>,
}

impl MarkdownEngine {
    pub fn new(events: Sender<EngineEvent>) -> Self {
        let (tx, rx) = channel();
        let worker_events = events.clone();
        let spawned = thread::Builder::new()
            .name("quill-render".to_string())
            .spawn(move || Worker::new(worker_events).run(rx));

        match spawned {
            Ok(handle) => Self {
                commands: Some(tx),
                worker: Some(handle),
                events,
            },
            Err(err) => {
                warn!("Failed to start render worker: {}", err);
                Self {
                    commands: None,
                    worker: None,
                    events,
                }
            }
        }
    }

    fn send(&self, ticket: Ticket, command: Command) {
        let delivered = self
            .commands
            .as_ref()
            .map_or(false, |commands| commands.send(command).is_ok());

        if !delivered {
            let _ = self.events.send(EngineEvent::new(
                ticket,
                EngineEventKind::Failed("render worker is not running".to_string()),
            ));
        }
    }
}

impl RenderEngine for MarkdownEngine {
    fn set_html(&mut self, ticket: Ticket, html: &str, base_dir: &Path) {
        self.send(
            ticket,
            Command::SetHtml {
                ticket,
                html: html.to_string(),
                base_dir: base_dir.to_path_buf(),
            },
        );
    }

    fn set_text(&mut self, ticket: Ticket, text: &str) {
        self.send(
            ticket,
            Command::SetText {
                ticket,
                text: text.to_string(),
            },
        );
    }

    fn save_content(&mut self, ticket: Ticket) {
        self.send(ticket, Command::SaveContent { ticket });
    }
}

impl Drop for MarkdownEngine {
    fn drop(&mut self) {
        // Closing the queue ends the worker loop.
        self.commands.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!("Render worker panicked");
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Worker
// ─────────────────────────────────────────────────────────────────────────────

struct Worker {
    events: Sender<EngineEvent>,
    page: Option<LoadedPage>,
    base_dir: PathBuf,
    body: Option<String>,
    failed: Option<Ticket>,
}

impl Worker {
    fn new(events: Sender<EngineEvent>) -> Self {
        Self {
            events,
            page: None,
            base_dir: PathBuf::from("."),
            body: None,
            failed: None,
        }
    }

    fn run(mut self, commands: Receiver<Command>) {
        while let Ok(command) = commands.recv() {
            self.handle(command);
        }
        debug!("Render worker stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::SetHtml {
                ticket,
                html,
                base_dir,
            } => {
                self.failed = None;
                self.body = None;
                self.base_dir = base_dir.clone();
                match LoadedPage::parse(&html, &base_dir) {
                    Ok(page) => {
                        self.page = Some(page);
                        self.post(ticket, EngineEventKind::LoadFinished);
                    }
                    Err(err) => {
                        self.page = None;
                        self.fail(ticket, err.to_string());
                    }
                }
            }
            Command::SetText { ticket, text } => {
                if self.failed == Some(ticket) {
                    return;
                }
                let Some(options) = self.page.as_ref().map(|page| page.options) else {
                    self.fail(ticket, "no page loaded".to_string());
                    return;
                };
                let body = render_markdown(&text, &options);
                self.body = Some(absolutize_image_sources(&body, &self.base_dir));
                self.post(ticket, EngineEventKind::WorkFinished);
            }
            Command::SaveContent { ticket } => {
                if self.failed == Some(ticket) {
                    return;
                }
                match self.extract() {
                    Some(content) => self.post(ticket, EngineEventKind::ContentReady(content)),
                    None => self.fail(ticket, "nothing has been rendered".to_string()),
                }
            }
        }
    }

    fn extract(&self) -> Option<ExtractedContent> {
        let page = self.page.as_ref()?;
        let body = self.body.as_ref()?;

        let mut style = page.styles.clone();
        style.push_str(&option_styles(&page.options));
        Some(ExtractedContent {
            head: page.head.clone(),
            style,
            body: body.clone(),
        })
    }

    fn post(&self, ticket: Ticket, kind: EngineEventKind) {
        // The session may already be gone.
        let _ = self.events.send(EngineEvent::new(ticket, kind));
    }

    fn fail(&mut self, ticket: Ticket, reason: String) {
        self.failed = Some(ticket);
        self.post(ticket, EngineEventKind::Failed(reason));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Rendering
// ─────────────────────────────────────────────────────────────────────────────

/// Render markdown into the body fragment according to the page options.
pub fn render_markdown(text: &str, opts: &WebGlobalOptions) -> String {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.tasklist = true;
    options.extension.footnotes = true;
    options.extension.autolink = opts.linkify_enabled;
    options.extension.header_ids = Some(String::new());
    options.render.unsafe_ = opts.html_tag_enabled && !opts.protect_from_xss;
    options.render.hardbreaks = opts.auto_break_enabled;

    let mut html = markdown_to_html(text, &options);

    if opts.section_number_enabled {
        html = number_sections(&html, opts.section_number_base_level);
    }
    if opts.web_plant_uml {
        html = wrap_diagrams(&PLANTUML_BLOCK, &html, "plantuml");
    }
    if opts.web_graphviz {
        html = wrap_diagrams(&GRAPHVIZ_BLOCK, &html, "graphviz");
    }

    html
}

/// Point relative image references at the files they resolve to.
fn absolutize_image_sources(html: &str, base_dir: &Path) -> String {
    rewrite_image_sources(html, |src| {
        resolve_local_reference(src, base_dir)
            .and_then(|path| path_to_url(&path))
            .map(String::from)
    })
}

/// Prefix headings at or below `base_level` with hierarchical numbers.
fn number_sections(html: &str, base_level: u8) -> String {
    let base = usize::from(base_level.clamp(1, 6));
    let mut counters = [0u32; 7];

    HEADING_OPEN
        .replace_all(html, |caps: &Captures| {
            let level: usize = caps[1].parse().unwrap_or(1);
            if level < base {
                counters[base..].iter_mut().for_each(|c| *c = 0);
                return caps[0].to_string();
            }

            counters[level] += 1;
            counters[level + 1..].iter_mut().for_each(|c| *c = 0);
            let number = counters[base..=level]
                .iter()
                .map(u32::to_string)
                .collect::<Vec<_>>()
                .join(".");

            format!(
                "{}<span class=\"section-number\">{}.</span> ",
                &caps[0], number
            )
        })
        .into_owned()
}

fn wrap_diagrams(block: &Regex, html: &str, kind: &str) -> String {
    block
        .replace_all(html, |caps: &Captures| {
            format!("<div class=\"vx-diagram vx-{}\">{}</div>", kind, &caps[0])
        })
        .into_owned()
}

/// CSS rules implied by the page options.
fn option_styles(opts: &WebGlobalOptions) -> String {
    let mut css = String::new();
    if opts.constrain_image_width_enabled {
        css.push_str(".markdown-body img { max-width: 100%; height: auto; }\n");
    }
    if opts.indent_first_line_enabled {
        css.push_str(".markdown-body p { text-indent: 2em; }\n");
    }
    css
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const PAGE: &str = "<html><head><style>p { color: blue; }</style></head><body></body></html>";

    fn next(rx: &Receiver<EngineEvent>) -> EngineEvent {
        rx.recv_timeout(Duration::from_secs(5))
            .expect("engine posted no event")
    }

    #[test]
    fn test_engine_posts_lifecycle_events() {
        let (tx, rx) = channel();
        let mut engine = MarkdownEngine::new(tx);

        engine.set_html(1, PAGE, Path::new("."));
        engine.set_text(1, "# Title\n\nHello");
        assert_eq!(next(&rx), EngineEvent::new(1, EngineEventKind::LoadFinished));
        assert_eq!(next(&rx), EngineEvent::new(1, EngineEventKind::WorkFinished));

        engine.save_content(1);
        match next(&rx).kind {
            EngineEventKind::ContentReady(content) => {
                assert!(content.body.contains("Title"));
                assert!(content.body.contains("<p>Hello</p>"));
                assert!(content.style.starts_with("p { color: blue; }"));
            }
            other => panic!("expected content, got {:?}", other),
        }
    }

    #[test]
    fn test_engine_fails_on_blank_page() {
        let (tx, rx) = channel();
        let mut engine = MarkdownEngine::new(tx);

        engine.set_html(7, "", Path::new("."));
        engine.set_text(7, "text");
        assert!(matches!(
            next(&rx),
            EngineEvent { ticket: 7, kind: EngineEventKind::Failed(_) }
        ));
        // No further events for the failed ticket.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }

    #[test]
    fn test_save_before_render_fails() {
        let (tx, rx) = channel();
        let mut engine = MarkdownEngine::new(tx);
        engine.set_html(2, PAGE, Path::new("."));
        engine.save_content(2);
        assert_eq!(next(&rx).kind, EngineEventKind::LoadFinished);
        assert!(matches!(next(&rx).kind, EngineEventKind::Failed(_)));
    }

    #[test]
    fn test_image_sources_resolve_against_base_dir() {
        let (tx, rx) = channel();
        let mut engine = MarkdownEngine::new(tx);
        let base = std::env::temp_dir().join("notes");

        engine.set_html(3, PAGE, &base);
        engine.set_text(3, "![pic](img/a.png) ![web](https://example.com/b.png)");
        engine.save_content(3);
        next(&rx);
        next(&rx);

        let EngineEventKind::ContentReady(content) = next(&rx).kind else {
            panic!("expected content");
        };
        let expected = path_to_url(&base.join("img/a.png")).unwrap();
        assert!(content.body.contains(&format!("src=\"{}\"", expected)));
        assert!(content.body.contains("src=\"https://example.com/b.png\""));
    }

    #[test]
    fn test_raw_html_respects_xss_protection() {
        let mut opts = WebGlobalOptions::default();
        opts.html_tag_enabled = true;
        opts.protect_from_xss = false;
        assert!(render_markdown("<b>x</b>", &opts).contains("<b>x</b>"));

        opts.protect_from_xss = true;
        assert!(!render_markdown("<b>x</b>", &opts).contains("<b>x</b>"));
    }

    #[test]
    fn test_auto_break() {
        let mut opts = WebGlobalOptions::default();
        opts.auto_break_enabled = true;
        assert!(render_markdown("a\nb", &opts).contains("<br />"));
    }

    #[test]
    fn test_section_numbers_from_base_level() {
        let html = "<h1>T</h1><h2>A</h2><h3>A1</h3><h3>A2</h3><h2>B</h2><h3>B1</h3>";
        let numbered = number_sections(html, 2);

        assert!(numbered.starts_with("<h1>T</h1>"));
        assert!(numbered.contains("<h2><span class=\"section-number\">1.</span> A</h2>"));
        assert!(numbered.contains("<h3><span class=\"section-number\">1.2.</span> A2</h3>"));
        assert!(numbered.contains("<h2><span class=\"section-number\">2.</span> B</h2>"));
        assert!(numbered.contains("<h3><span class=\"section-number\">2.1.</span> B1</h3>"));
    }

    #[test]
    fn test_diagram_blocks_are_wrapped() {
        let mut opts = WebGlobalOptions::default();
        opts.web_graphviz = true;
        let html = render_markdown("```dot\ndigraph { a -> b }\n```\n", &opts);
        assert!(html.contains("<div class=\"vx-diagram vx-graphviz\"><pre><code class=\"language-dot\">"));
    }

    #[test]
    fn test_option_styles() {
        let mut opts = WebGlobalOptions::default();
        opts.constrain_image_width_enabled = false;
        opts.indent_first_line_enabled = true;
        assert_eq!(option_styles(&opts), ".markdown-body p { text-indent: 2em; }\n");
    }
}
