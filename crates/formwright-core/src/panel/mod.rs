//! The widget's side panel: palette sections grouped by category.
//!
//! The widget renders a fresh `SidePanel` for every instance. Each section
//! has a toggle element (`builder-{instance}-group-{category}`) carrying a
//! `data-group` marker attribute, an expanded flag for its body, and an
//! expanded/collapsed indicator on the toggle itself.

pub mod accordion;

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use formwright_types::widget::GroupCategory;

use crate::widget::document::{DispatchReport, Document, DomEvent, MutationRecord};

pub use accordion::{AccordionController, ToggleOutcome};

/// Marker attribute naming the section a toggle belongs to.
pub const GROUP_MARKER: &str = "data-group";

/// State shown on a section's toggle control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Expanded,
    Collapsed,
}

#[derive(Debug, Clone)]
struct PanelSection {
    group: GroupCategory,
    expanded: bool,
    indicator: Indicator,
    icons: Vec<String>,
}

pub struct SidePanel {
    instance: u64,
    document: Arc<Document>,
    sections: Mutex<Vec<PanelSection>>,
}

impl SidePanel {
    /// A panel with every section collapsed.
    pub fn new(document: Arc<Document>, instance: u64, groups: &[GroupCategory]) -> Self {
        let sections = groups
            .iter()
            .map(|&group| PanelSection {
                group,
                expanded: false,
                indicator: Indicator::Collapsed,
                icons: Vec::new(),
            })
            .collect();
        Self {
            instance,
            document,
            sections: Mutex::new(sections),
        }
    }

    pub fn instance(&self) -> u64 {
        self.instance
    }

    pub fn document(&self) -> &Arc<Document> {
        &self.document
    }

    pub fn groups(&self) -> Vec<GroupCategory> {
        self.lock().iter().map(|s| s.group).collect()
    }

    pub fn contains(&self, group: GroupCategory) -> bool {
        self.lock().iter().any(|s| s.group == group)
    }

    /// Element id of a section's toggle control.
    pub fn toggle_id(&self, group: GroupCategory) -> String {
        format!("builder-{}-group-{group}", self.instance)
    }

    /// Attributes the toggle element carries when clicked.
    pub fn toggle_attributes(&self, group: GroupCategory) -> BTreeMap<String, String> {
        let mut attrs = BTreeMap::new();
        attrs.insert(GROUP_MARKER.to_string(), group.to_string());
        attrs.insert(
            "aria-expanded".to_string(),
            (self.indicator(group) == Some(Indicator::Expanded)).to_string(),
        );
        attrs
    }

    pub fn is_expanded(&self, group: GroupCategory) -> bool {
        self.lock().iter().any(|s| s.group == group && s.expanded)
    }

    pub fn expanded(&self) -> Vec<GroupCategory> {
        self.lock()
            .iter()
            .filter(|s| s.expanded)
            .map(|s| s.group)
            .collect()
    }

    pub fn indicator(&self, group: GroupCategory) -> Option<Indicator> {
        self.lock()
            .iter()
            .find(|s| s.group == group)
            .map(|s| s.indicator)
    }

    /// Expand or collapse one section and sync its toggle indicator.
    /// Returns false if the section does not exist.
    pub fn set_expanded(&self, group: GroupCategory, expanded: bool) -> bool {
        let mut sections = self.lock();
        match sections.iter_mut().find(|s| s.group == group) {
            Some(section) => {
                section.expanded = expanded;
                section.indicator = if expanded {
                    Indicator::Expanded
                } else {
                    Indicator::Collapsed
                };
                true
            }
            None => false,
        }
    }

    /// Widget-side rendering of a section body, bypassing the indicator.
    /// Used by widgets that open sections on their own.
    pub fn render_expanded(&self, group: GroupCategory, expanded: bool) {
        if let Some(section) = self.lock().iter_mut().find(|s| s.group == group) {
            section.expanded = expanded;
        }
        self.document.record_mutation(&MutationRecord {
            target: self.toggle_id(group),
        });
    }

    /// Widget-side icon insertion. Reported to mutation observers.
    pub fn add_icon(&self, group: GroupCategory, icon: impl Into<String>) {
        if let Some(section) = self.lock().iter_mut().find(|s| s.group == group) {
            section.icons.push(icon.into());
        }
        self.document.record_mutation(&MutationRecord {
            target: self.toggle_id(group),
        });
    }

    pub fn icons(&self, group: GroupCategory) -> Vec<String> {
        self.lock()
            .iter()
            .find(|s| s.group == group)
            .map(|s| s.icons.clone())
            .unwrap_or_default()
    }

    /// Drop repeated icons within each section, keeping the first of each.
    /// Returns how many were removed. Not reported as a mutation.
    pub fn dedupe_icons(&self) -> usize {
        let mut removed = 0;
        for section in self.lock().iter_mut() {
            let mut seen = HashSet::new();
            let before = section.icons.len();
            section.icons.retain(|icon| seen.insert(icon.clone()));
            removed += before - section.icons.len();
        }
        removed
    }

    /// Click a section's toggle through the document.
    pub fn click_toggle(&self, group: GroupCategory) -> DispatchReport {
        let mut event = DomEvent::click(self.toggle_id(group));
        event.attributes = self.toggle_attributes(group);
        self.document.dispatch(&mut event)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PanelSection>> {
        self.sections.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for SidePanel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SidePanel")
            .field("instance", &self.instance)
            .field("expanded", &self.expanded())
            .finish()
    }
}
