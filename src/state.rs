use rusty_forest::config::WorkflowConfig;
use rusty_forest::data::iris;
use rusty_forest::data::model::Dataset;
use rusty_forest::model::Engine;
use rusty_forest::report;
use rusty_forest::workflow::{self, ModelReport, WorkflowReport};

use crate::color::ClassColors;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Central panel tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Data,
    Correlation,
    Metrics,
    Roc,
    Gain,
}

impl View {
    pub const ALL: [View; 5] = [View::Data, View::Correlation, View::Metrics, View::Roc, View::Gain];

    pub fn label(self) -> &'static str {
        match self {
            View::Data => "Data",
            View::Correlation => "Correlation",
            View::Metrics => "Metrics",
            View::Roc => "ROC curve",
            View::Gain => "Gain curve",
        }
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Source table (built-in iris until the user opens a file).
    pub dataset: Dataset,

    /// Where `dataset` came from, for the top bar.
    pub source: String,

    /// Editable run settings.
    pub config: WorkflowConfig,

    /// Text buffer behind the seed field ("" means unseeded).
    pub seed_text: String,

    /// Result of the last successful run.
    pub report: Option<WorkflowReport>,

    pub view: View,

    /// Engine whose curves are plotted.
    pub selected_engine: Engine,

    pub class_colors: ClassColors,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn new(config: WorkflowConfig) -> Self {
        let dataset = iris::dataset();
        let selected_engine = config.engines.first().copied().unwrap_or(Engine::Native);
        Self {
            class_colors: ClassColors::new(dataset.classes.len()),
            seed_text: config.seed.map(|s| s.to_string()).unwrap_or_default(),
            dataset,
            source: "built-in iris".to_string(),
            config,
            report: None,
            view: View::Data,
            selected_engine,
            status_message: None,
        }
    }

    /// Swap in a newly loaded dataset and rerun.
    pub fn set_dataset(&mut self, dataset: Dataset, source: String) {
        self.class_colors = ClassColors::new(dataset.classes.len());
        self.dataset = dataset;
        self.source = source;
        self.report = None;
        self.run();
    }

    /// Parse the seed field into the config.
    fn apply_seed_text(&mut self) -> Result<(), String> {
        let text = self.seed_text.trim();
        self.config.seed = if text.is_empty() {
            None
        } else {
            Some(text.parse().map_err(|_| format!("Seed '{text}' is not a whole number"))?)
        };
        Ok(())
    }

    /// Run the workflow synchronously on the current dataset and config.
    pub fn run(&mut self) {
        if let Err(msg) = self.apply_seed_text() {
            self.status_message = Some(msg);
            return;
        }
        match workflow::run(&self.config, self.dataset.clone()) {
            Ok(report) => {
                match report::render(&report) {
                    Ok(text) => println!("{text}"),
                    Err(e) => log::warn!("could not render console report: {e:#}"),
                }
                if report.model(self.selected_engine).is_none() {
                    if let Some(first) = report.models.first() {
                        self.selected_engine = first.engine;
                    }
                }
                self.status_message = None;
                self.report = Some(report);
            }
            Err(e) => {
                log::error!("workflow failed: {e:#}");
                self.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }

    pub fn selected_model(&self) -> Option<&ModelReport> {
        self.report.as_ref()?.model(self.selected_engine)
    }
}
