//! User settings and preferences for Quill
//!
//! This module defines the `Settings` struct that holds the markdown viewer
//! configuration (template, resources, feature flags) and the export
//! preferences, with serde support for JSON persistence.

use crate::export::ExportHtmlOption;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Name of the resource group whose styles are inlined into the template.
pub const GLOBAL_STYLES_GROUP: &str = "global_styles";

// ─────────────────────────────────────────────────────────────────────────────
// Section Numbering
// ─────────────────────────────────────────────────────────────────────────────

/// Where section numbers are shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SectionNumberMode {
    /// No section numbers
    #[default]
    None,
    /// Numbers in the rendered (read) view, which is what exports see
    Read,
    /// Numbers only while editing
    Edit,
}

// ─────────────────────────────────────────────────────────────────────────────
// Viewer Resources
// ─────────────────────────────────────────────────────────────────────────────

/// A named group of style and script files loaded by the viewer page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewerResourceGroup {
    pub name: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub styles: Vec<String>,
    #[serde(default)]
    pub scripts: Vec<String>,
}

impl ViewerResourceGroup {
    /// Whether this is the group inlined as raw text instead of linked.
    pub fn is_global_styles(&self) -> bool {
        self.name == GLOBAL_STYLES_GROUP
    }
}

fn default_true() -> bool {
    true
}

// ─────────────────────────────────────────────────────────────────────────────
// Viewer Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Configuration of the markdown viewer page handed to the rendering engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    /// Base template file, resolved through the resource locator
    pub template: String,

    /// Ordered resource groups
    pub resources: Vec<ViewerResourceGroup>,

    /// Theme stylesheet for rendered content
    pub web_style_sheet: Option<String>,

    /// Theme stylesheet for code highlighting
    pub highlight_style_sheet: Option<String>,

    pub web_plant_uml: bool,
    pub web_graphviz: bool,
    pub constrain_image_width: bool,
    pub protect_from_xss: bool,
    pub html_tag_enabled: bool,
    pub auto_break_enabled: bool,
    pub linkify_enabled: bool,
    pub indent_first_line: bool,

    pub section_number_mode: SectionNumberMode,

    /// Heading level that section numbering starts from (1-6)
    pub section_number_base_level: u8,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            template: String::from("web/markdown-viewer-template.html"),
            resources: vec![
                ViewerResourceGroup {
                    name: GLOBAL_STYLES_GROUP.to_string(),
                    enabled: true,
                    styles: vec![String::from("web/css/globalstyles.css")],
                    scripts: Vec::new(),
                },
                ViewerResourceGroup {
                    name: String::from("markdown_viewer"),
                    enabled: true,
                    styles: Vec::new(),
                    scripts: Vec::new(),
                },
            ],
            web_style_sheet: None,
            highlight_style_sheet: None,
            web_plant_uml: false,
            web_graphviz: false,
            constrain_image_width: true,
            protect_from_xss: false,
            html_tag_enabled: true,
            auto_break_enabled: false,
            linkify_enabled: true,
            indent_first_line: false,
            section_number_mode: SectionNumberMode::default(),
            section_number_base_level: 2,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Export Settings
// ─────────────────────────────────────────────────────────────────────────────

/// Persistent export preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportSettings {
    /// Last directory used for export output
    pub last_output_directory: Option<PathBuf>,

    /// Whether to open exported files after export
    pub open_after_export: bool,

    /// Default HTML options when the command line doesn't override them
    pub html: ExportHtmlOption,

    /// Wrapper page for exported HTML, resolved through the resource locator
    pub page_template: String,

    /// How long one wait on the engine's event channel lasts
    pub poll_interval_ms: u64,

    /// Extra wait after the engine reports ready
    pub settle_delay_ms: u64,

    /// Upper bound on waiting for the engine, 0 waits forever
    pub render_timeout_secs: u64,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            last_output_directory: None,
            open_after_export: false,
            html: ExportHtmlOption::default(),
            page_template: String::from("web/export-template.html"),
            poll_interval_ms: 100,
            settle_delay_ms: 200,
            render_timeout_secs: 30,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// User preferences and application settings.
///
/// This struct is serialized to JSON and persisted to the user's config directory.
/// All fields have sensible defaults via the `Default` trait and `#[serde(default)]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub viewer: ViewerSettings,

    pub export: ExportSettings,

    /// Directory searched before the application directory for resources
    pub user_resource_dir: Option<PathBuf>,

    /// Application resource directory, defaults to the executable's directory
    pub app_resource_dir: Option<PathBuf>,
}

impl Settings {
    // ─────────────────────────────────────────────────────────────────────────
    // Validation Constants and Sanitization
    // ─────────────────────────────────────────────────────────────────────────

    /// Minimum section number base level.
    pub const MIN_SECTION_LEVEL: u8 = 1;
    /// Maximum section number base level.
    pub const MAX_SECTION_LEVEL: u8 = 6;
    /// Minimum poll interval in milliseconds.
    pub const MIN_POLL_INTERVAL_MS: u64 = 10;
    /// Maximum poll interval in milliseconds.
    pub const MAX_POLL_INTERVAL_MS: u64 = 1000;
    /// Maximum settle delay in milliseconds.
    pub const MAX_SETTLE_DELAY_MS: u64 = 5000;

    /// Sanitize settings by clamping values to valid ranges.
    ///
    /// This is useful after loading settings from a file that might have
    /// been manually edited with invalid values.
    pub fn sanitize(&mut self) {
        self.viewer.section_number_base_level = self
            .viewer
            .section_number_base_level
            .clamp(Self::MIN_SECTION_LEVEL, Self::MAX_SECTION_LEVEL);

        self.export.poll_interval_ms = self
            .export
            .poll_interval_ms
            .clamp(Self::MIN_POLL_INTERVAL_MS, Self::MAX_POLL_INTERVAL_MS);

        self.export.settle_delay_ms = self.export.settle_delay_ms.min(Self::MAX_SETTLE_DELAY_MS);

        if self.viewer.template.trim().is_empty() {
            self.viewer.template = ViewerSettings::default().template;
        }
        if self.export.page_template.trim().is_empty() {
            self.export.page_template = ExportSettings::default().page_template;
        }
    }

    /// Load settings and sanitize them to ensure validity.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
