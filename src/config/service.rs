//! Configuration service
//!
//! Owns the live `Settings`, the revision counter bumped on every update,
//! the resource locator, and the viewer template cache. Shared between the
//! export coordinator and the command line through an `Arc`.

use super::{ResourceLocator, Settings};
use crate::template::{generate_template, TemplateCache, TemplateKey};
use log::info;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct Inner {
    settings: Settings,
    revision: u64,
}

pub struct ConfigService {
    inner: Mutex<Inner>,
    cache: Mutex<TemplateCache>,
}

impl ConfigService {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Mutex::new(Inner {
                settings,
                revision: 1,
            }),
            cache: Mutex::new(TemplateCache::new()),
        }
    }

    /// Snapshot of the current settings.
    pub fn settings(&self) -> Settings {
        self.lock_inner().settings.clone()
    }

    #[cfg(test)]
    pub fn revision(&self) -> u64 {
        self.lock_inner().revision
    }

    /// Apply a change to the settings and advance the revision.
    pub fn update<F>(&self, change: F)
    where
        F: FnOnce(&mut Settings),
    {
        let mut inner = self.lock_inner();
        change(&mut inner.settings);
        inner.settings.sanitize();
        inner.revision += 1;
        info!("Configuration updated to revision {}", inner.revision);
    }

    /// Resource locator for the current settings.
    pub fn locator(&self) -> ResourceLocator {
        let inner = self.lock_inner();
        locator_for(&inner.settings)
    }

    /// The markdown viewer page for the given theme stylesheets.
    ///
    /// `None` falls back to the theme sheets named in the settings. The
    /// result is served from the cache while neither the revision nor the
    /// stylesheets change.
    pub fn markdown_viewer_template(
        &self,
        web_style_sheet: Option<&Path>,
        highlight_style_sheet: Option<&Path>,
    ) -> String {
        let (settings, revision) = {
            let inner = self.lock_inner();
            (inner.settings.clone(), inner.revision)
        };
        let locator = locator_for(&settings);

        let sheet = |explicit: Option<&Path>, configured: &Option<String>| -> String {
            match (explicit, configured) {
                (Some(path), _) => path.to_string_lossy().into_owned(),
                (None, Some(name)) if !name.is_empty() => {
                    locator.resolve(name).to_string_lossy().into_owned()
                }
                _ => String::new(),
            }
        };

        let key = TemplateKey {
            revision,
            web_style_sheet: sheet(web_style_sheet, &settings.viewer.web_style_sheet),
            highlight_style_sheet: sheet(
                highlight_style_sheet,
                &settings.viewer.highlight_style_sheet,
            ),
        };

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let web = key.web_style_sheet.clone();
        let highlight = key.highlight_style_sheet.clone();
        cache
            .get_or_generate(key, || {
                generate_template(&settings.viewer, &locator, &web, &highlight)
            })
            .to_string()
    }

    fn lock_inner(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn locator_for(settings: &Settings) -> ResourceLocator {
    ResourceLocator::new(
        settings.user_resource_dir.clone(),
        settings
            .app_resource_dir
            .clone()
            .unwrap_or_else(ResourceLocator::default_app_dir),
    )
}
