//! Markdown viewer template assembly
//!
//! Builds the page given to the rendering engine by filling named
//! placeholders in the base template. Substitutions run in a fixed order so
//! that text inserted by one step can never be matched by a later one.
//!
//! # Architecture
//!
//! - `options.rs` - Feature flags serialized into the page's script context
//! - `cache.rs` - Revision-gated cache of the generated template

mod cache;
mod options;

pub use cache::{TemplateCache, TemplateKey};
pub use options::WebGlobalOptions;

use crate::config::{ResourceLocator, ViewerSettings};
use crate::files::path_to_url;
use std::path::Path;

// ─────────────────────────────────────────────────────────────────────────────
// Placeholders
// ─────────────────────────────────────────────────────────────────────────────

pub const GLOBAL_STYLES_PLACEHOLDER: &str = "/* VX_GLOBAL_STYLES_PLACEHOLDER */";
pub const THEME_STYLES_PLACEHOLDER: &str = "<!-- VX_THEME_STYLES_PLACEHOLDER -->";
pub const GLOBAL_OPTIONS_PLACEHOLDER: &str = "/* VX_GLOBAL_OPTIONS_PLACEHOLDER */";
pub const STYLES_PLACEHOLDER: &str = "<!-- VX_STYLES_PLACEHOLDER -->";
pub const SCRIPTS_PLACEHOLDER: &str = "<!-- VX_SCRIPTS_PLACEHOLDER -->";

// ─────────────────────────────────────────────────────────────────────────────
// Generation
// ─────────────────────────────────────────────────────────────────────────────

/// Generate the markdown viewer page.
///
/// `web_style_sheet` and `highlight_style_sheet` are file paths; empty paths
/// produce no tag. Missing resource files contribute empty content.
pub fn generate_template(
    viewer: &ViewerSettings,
    locator: &ResourceLocator,
    web_style_sheet: &str,
    highlight_style_sheet: &str,
) -> String {
    let mut template = locator.read_text(&viewer.template);

    fill_global_styles(&mut template, viewer, locator);

    fill_theme_styles(&mut template, web_style_sheet, highlight_style_sheet);

    fill_global_options(&mut template, &WebGlobalOptions::from_viewer(viewer));

    fill_resources(&mut template, viewer, locator);

    template
}

/// Inline the enabled `global_styles` group. Empty content leaves the
/// placeholder in place.
fn fill_global_styles(template: &mut String, viewer: &ViewerSettings, locator: &ResourceLocator) {
    let styles: String = viewer
        .resources
        .iter()
        .find(|group| group.is_global_styles())
        .filter(|group| group.enabled)
        .map(|group| {
            group
                .styles
                .iter()
                .map(|style| locator.read_text(style))
                .collect()
        })
        .unwrap_or_default();

    replace_if_not_empty(template, GLOBAL_STYLES_PLACEHOLDER, &styles);
}

fn fill_theme_styles(template: &mut String, web_style_sheet: &str, highlight_style_sheet: &str) {
    let mut styles = style_tag(web_style_sheet);
    styles.push_str(&style_tag(highlight_style_sheet));

    replace_if_not_empty(template, THEME_STYLES_PLACEHOLDER, &styles);
}

fn fill_global_options(template: &mut String, opts: &WebGlobalOptions) {
    *template = template.replace(GLOBAL_OPTIONS_PLACEHOLDER, &opts.to_javascript_object());
}

/// Link every other enabled group's styles and scripts, in group order.
fn fill_resources(template: &mut String, viewer: &ViewerSettings, locator: &ResourceLocator) {
    let (styles, scripts) = resource_tags(viewer, locator);
    fill_styles(template, &styles);
    fill_scripts(template, &scripts);
}

fn resource_tags(viewer: &ViewerSettings, locator: &ResourceLocator) -> (String, String) {
    let mut styles = String::new();
    let mut scripts = String::new();

    for group in viewer
        .resources
        .iter()
        .filter(|group| group.enabled && !group.is_global_styles())
    {
        for style in &group.styles {
            styles.push_str(&style_tag(&locator.resolve(style).to_string_lossy()));
        }
        for script in &group.scripts {
            scripts.push_str(&script_tag(&locator.resolve(script).to_string_lossy()));
        }
    }

    (styles, scripts)
}

fn fill_styles(template: &mut String, tags: &str) {
    replace_if_not_empty(template, STYLES_PLACEHOLDER, tags);
}

fn fill_scripts(template: &mut String, tags: &str) {
    replace_if_not_empty(template, SCRIPTS_PLACEHOLDER, tags);
}

fn replace_if_not_empty(template: &mut String, placeholder: &str, content: &str) {
    if !content.is_empty() {
        *template = template.replace(placeholder, content);
    }
}

fn style_tag(file: &str) -> String {
    if file.is_empty() {
        return String::new();
    }
    format!(
        "<link rel=\"stylesheet\" type=\"text/css\" href=\"{}\">\n",
        file_href(file)
    )
}

fn script_tag(file: &str) -> String {
    if file.is_empty() {
        return String::new();
    }
    format!(
        "<script type=\"text/javascript\" src=\"{}\"></script>\n",
        file_href(file)
    )
}

fn file_href(file: &str) -> String {
    path_to_url(Path::new(file))
        .map(|url| url.to_string())
        .unwrap_or_else(|| file.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
