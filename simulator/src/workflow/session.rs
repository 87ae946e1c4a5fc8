use anyhow::{bail, Context};
use log::info;
use sightcore::processing::Granularity;
use sightcore::record::CategoryKey;
use sightcore::selection::{Focus, SelectionState};
use sightcore::store::CategoryEntry;
use std::collections::HashMap;
use std::sync::Arc;

use crate::gui_bridge::model::VisualizationModel;
use crate::workflow::runner::{LoadOrigin, Runner};

/// One user's browsing session: selection plus the loaded categories.
pub struct Session {
    runner: Runner,
    selection: SelectionState,
    origins: HashMap<CategoryKey, LoadOrigin>,
}

impl Session {
    /// Opens a session on the configured default category, loading it.
    pub fn start(runner: Runner) -> anyhow::Result<Self> {
        let config = runner.config();
        let selection = SelectionState::new(config.default_category.clone(), config.granularity);
        let mut session = Self {
            runner,
            selection,
            origins: HashMap::new(),
        };
        let category = session.selection.category().clone();
        session.ensure_loaded(&category)?;
        Ok(session)
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn origin(&self, category: &CategoryKey) -> Option<LoadOrigin> {
        self.origins.get(category).copied()
    }

    fn ensure_loaded(&mut self, category: &CategoryKey) -> anyhow::Result<Arc<CategoryEntry>> {
        if let Some(entry) = self.runner.store().get(category) {
            return Ok(entry);
        }
        let outcome = self.runner.load(category)?;
        info!(
            "category {} ready: {} detections from {:?}, {} rows skipped",
            category,
            outcome.entry.collection.len(),
            outcome.origin,
            outcome.skipped.len()
        );
        self.origins.insert(category.clone(), outcome.origin);
        Ok(outcome.entry)
    }

    fn active(&self) -> anyhow::Result<Arc<CategoryEntry>> {
        let category = self.selection.category();
        self.runner
            .store()
            .get(category)
            .with_context(|| format!("category {} has not been loaded", category))
    }

    pub fn select_category(&mut self, category: CategoryKey) -> anyhow::Result<()> {
        if !self.runner.config().knows(&category) {
            bail!("unknown category `{}`", category);
        }
        self.ensure_loaded(&category)?;
        self.selection.select_category(category);
        Ok(())
    }

    pub fn select_focus(&mut self, focus: Focus) -> anyhow::Result<()> {
        let entry = self.active()?;
        self.selection.select_focus(focus, &entry.identities)?;
        Ok(())
    }

    pub fn select_granularity(&mut self, granularity: Granularity) {
        self.selection.select_granularity(granularity);
    }

    /// Resolves the current selection into a renderable model.
    pub fn model(&self) -> anyhow::Result<VisualizationModel> {
        let entry = self.active()?;
        let view = self.selection.current_view().resolve(&entry.collection);
        Ok(VisualizationModel {
            selection: self.selection.clone(),
            categories: self.runner.config().categories.clone(),
            origin: self.origin(self.selection.category()),
            identities: entry.identities.clone(),
            view,
            metrics: self.runner.metrics(),
        })
    }
}
