//! Parsing of the viewer page loaded into the engine.

use crate::files::{path_to_url, resolve_local_reference, rewrite_css_urls};
use crate::template::WebGlobalOptions;
use log::debug;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt;
use std::fs;
use std::path::Path;

static BODY_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<body[\s>]").unwrap());
static HEAD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<head[^>]*>(.*?)</head>").unwrap());
static OPTIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)window\.vxOptions\s*=\s*\{(.*?)\}").unwrap());
static OPTION_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s*:\s*(true|false|\d+)").unwrap());
static STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style[^>]*>(.*?)</style>").unwrap());
static SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script[^>]*>.*?</script>").unwrap());
static LINK_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<link\b[^>]*>").unwrap());
static HREF: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?i)href\s*=\s*"([^"]*)""#).unwrap());
static STYLESHEET_REL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)rel\s*=\s*"stylesheet""#).unwrap());
static META_CHARSET: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<meta\s+charset[^>]*>").unwrap());
static TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)<title>.*?</title>").unwrap());
static COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static CSS_PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/\*\s*VX_[A-Z_]+_PLACEHOLDER\s*\*/").unwrap());

/// Why a page could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageError {
    /// The page has no content at all
    Blank,
    /// The page has no `<body>` to render into
    NoBody,
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageError::Blank => write!(f, "viewer page is empty"),
            PageError::NoBody => write!(f, "viewer page has no <body>"),
        }
    }
}

impl std::error::Error for PageError {}

/// The parts of a viewer page the engine needs after loading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedPage {
    /// Options read from the page's `window.vxOptions` object
    pub options: WebGlobalOptions,
    /// Head markup other than styles, scripts, charset and title
    pub head: String,
    /// Inline styles followed by the text of linked stylesheets
    pub styles: String,
}

impl LoadedPage {
    pub fn parse(html: &str, base_dir: &Path) -> Result<Self, PageError> {
        if html.trim().is_empty() {
            return Err(PageError::Blank);
        }
        if !BODY_TAG.is_match(html) {
            return Err(PageError::NoBody);
        }

        let head = HEAD
            .captures(html)
            .and_then(|caps| caps.get(1))
            .map_or("", |m| m.as_str());

        Ok(Self {
            options: parse_options(html),
            head: remaining_head(head),
            styles: collect_styles(head, base_dir),
        })
    }
}

fn parse_options(html: &str) -> WebGlobalOptions {
    let mut options = WebGlobalOptions::default();
    let Some(body) = OPTIONS.captures(html).and_then(|caps| caps.get(1)) else {
        debug!("Viewer page carries no options object, using defaults");
        return options;
    };

    for caps in OPTION_ENTRY.captures_iter(body.as_str()) {
        let flag = &caps[2] == "true";
        match &caps[1] {
            "webPlantUml" => options.web_plant_uml = flag,
            "webGraphviz" => options.web_graphviz = flag,
            "constrainImageWidthEnabled" => options.constrain_image_width_enabled = flag,
            "protectFromXss" => options.protect_from_xss = flag,
            "htmlTagEnabled" => options.html_tag_enabled = flag,
            "autoBreakEnabled" => options.auto_break_enabled = flag,
            "linkifyEnabled" => options.linkify_enabled = flag,
            "indentFirstLineEnabled" => options.indent_first_line_enabled = flag,
            "sectionNumberEnabled" => options.section_number_enabled = flag,
            "sectionNumberBaseLevel" => {
                if let Ok(level) = caps[2].parse::<u8>() {
                    options.section_number_base_level = level.clamp(1, 6);
                }
            }
            other => debug!("Ignoring unknown viewer option {}", other),
        }
    }

    options
}

fn collect_styles(head: &str, base_dir: &Path) -> String {
    let mut styles = String::new();

    for caps in STYLE_BLOCK.captures_iter(head) {
        let css = CSS_PLACEHOLDER.replace_all(&caps[1], "");
        push_block(&mut styles, &absolutize_css_urls(&css, base_dir));
    }

    for tag in LINK_TAG.find_iter(head) {
        let tag = tag.as_str();
        if !STYLESHEET_REL.is_match(tag) {
            continue;
        }
        let Some(href) = HREF.captures(tag).map(|caps| caps[1].to_string()) else {
            continue;
        };
        let Some(path) = resolve_local_reference(&href, base_dir) else {
            debug!("Skipping remote stylesheet {}", href);
            continue;
        };
        match fs::read_to_string(&path) {
            Ok(css) => {
                let sheet_dir = path.parent().unwrap_or(base_dir);
                push_block(&mut styles, &absolutize_css_urls(&css, sheet_dir));
            }
            Err(err) => debug!("Stylesheet {} unavailable: {}", path.display(), err),
        }
    }

    styles
}

fn push_block(out: &mut String, block: &str) {
    let block = block.trim();
    if block.is_empty() {
        return;
    }
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(block);
    out.push('\n');
}

/// Rewrite `url()` references relative to a stylesheet into `file://` URLs.
pub fn absolutize_css_urls(css: &str, sheet_dir: &Path) -> String {
    rewrite_css_urls(css, |reference| {
        resolve_local_reference(reference, sheet_dir)
            .and_then(|path| path_to_url(&path))
            .map(String::from)
    })
}

fn remaining_head(head: &str) -> String {
    let stripped = STYLE_BLOCK.replace_all(head, "");
    let stripped = SCRIPT_BLOCK.replace_all(&stripped, "");
    let stripped = LINK_TAG.replace_all(&stripped, |caps: &Captures| {
        if STYLESHEET_REL.is_match(&caps[0]) {
            String::new()
        } else {
            caps[0].to_string()
        }
    });
    let stripped = META_CHARSET.replace_all(&stripped, "");
    let stripped = TITLE.replace_all(&stripped, "");
    let stripped = COMMENT.replace_all(&stripped, "");

    stripped
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
