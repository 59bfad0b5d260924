//! Global options handed to the viewer page's script context.

use crate::config::{SectionNumberMode, ViewerSettings};

/// Feature toggles serialized into the `window.vxOptions` object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebGlobalOptions {
    pub web_plant_uml: bool,
    pub web_graphviz: bool,
    pub constrain_image_width_enabled: bool,
    pub protect_from_xss: bool,
    pub html_tag_enabled: bool,
    pub auto_break_enabled: bool,
    pub linkify_enabled: bool,
    pub indent_first_line_enabled: bool,
    pub section_number_enabled: bool,
    pub section_number_base_level: u8,
}

impl Default for WebGlobalOptions {
    fn default() -> Self {
        Self::from_viewer(&ViewerSettings::default())
    }
}

impl WebGlobalOptions {
    /// Snapshot the current viewer settings.
    pub fn from_viewer(viewer: &ViewerSettings) -> Self {
        Self {
            web_plant_uml: viewer.web_plant_uml,
            web_graphviz: viewer.web_graphviz,
            constrain_image_width_enabled: viewer.constrain_image_width,
            protect_from_xss: viewer.protect_from_xss,
            html_tag_enabled: viewer.html_tag_enabled,
            auto_break_enabled: viewer.auto_break_enabled,
            linkify_enabled: viewer.linkify_enabled,
            indent_first_line_enabled: viewer.indent_first_line,
            section_number_enabled: viewer.section_number_mode == SectionNumberMode::Read,
            section_number_base_level: viewer.section_number_base_level,
        }
    }

    /// Render as a top-level script assignment.
    pub fn to_javascript_object(&self) -> String {
        format!(
            "window.vxOptions = {{\n\
             webPlantUml: {},\n\
             webGraphviz: {},\n\
             constrainImageWidthEnabled: {},\n\
             protectFromXss: {},\n\
             htmlTagEnabled: {},\n\
             autoBreakEnabled: {},\n\
             linkifyEnabled: {},\n\
             indentFirstLineEnabled: {},\n\
             sectionNumberEnabled: {},\n\
             sectionNumberBaseLevel: {}\n\
             }}",
            self.web_plant_uml,
            self.web_graphviz,
            self.constrain_image_width_enabled,
            self.protect_from_xss,
            self.html_tag_enabled,
            self.auto_break_enabled,
            self.linkify_enabled,
            self.indent_first_line_enabled,
            self.section_number_enabled,
            self.section_number_base_level,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_javascript_object_literals() {
        let opts = WebGlobalOptions {
            web_plant_uml: true,
            web_graphviz: false,
            constrain_image_width_enabled: true,
            protect_from_xss: false,
            html_tag_enabled: true,
            auto_break_enabled: false,
            linkify_enabled: true,
            indent_first_line_enabled: false,
            section_number_enabled: true,
            section_number_base_level: 3,
        };
        let js = opts.to_javascript_object();

        assert!(js.starts_with("window.vxOptions = {\n"));
        assert!(js.contains("webPlantUml: true,\n"));
        assert!(js.contains("webGraphviz: false,\n"));
        assert!(js.contains("sectionNumberEnabled: true,\n"));
        assert!(js.ends_with("sectionNumberBaseLevel: 3\n}"));
    }

    #[test]
    fn test_section_numbers_only_in_read_mode() {
        let mut viewer = ViewerSettings::default();
        viewer.section_number_mode = SectionNumberMode::Edit;
        assert!(!WebGlobalOptions::from_viewer(&viewer).section_number_enabled);

        viewer.section_number_mode = SectionNumberMode::Read;
        assert!(WebGlobalOptions::from_viewer(&viewer).section_number_enabled);
    }
}
