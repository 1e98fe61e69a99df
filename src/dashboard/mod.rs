//! Dashboard
//!
//! The visual report facade. A dashboard is configured with a list of
//! tabs, calculated over a reference dataset and an optional current
//! dataset, and rendered into a json payload of widgets.
pub mod tabs;
pub mod widgets;

pub use tabs::Tab;
pub use widgets::{WidgetInfo, WidgetType};

use crate::analyzers::{check_frames, AnalysisContext, DriftOptions};
use crate::data::DataFrame;
use crate::errors::DriftLensError;
use crate::mapping::{ColumnMapping, ResolvedColumns};
use crate::report::ReportIO;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Instant;

// Name stamped into every rendered dashboard payload.
const DASHBOARD_NAME: &str = "driftlens dashboard";

/// Rendered dashboard payload: a name and the widget list of every
/// calculated tab, in tab order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardInfo {
    pub name: String,
    pub widgets: Vec<WidgetInfo>,
}

impl ReportIO for DashboardInfo {}

/// Builds visual monitoring reports over tabular datasets.
///
/// ```no_run
/// use driftlens::{ColumnMapping, Dashboard, DataFrame, Tab};
///
/// # fn run(reference: DataFrame, current: DataFrame) -> Result<(), driftlens::DriftLensError> {
/// let mut dashboard = Dashboard::new(vec![Tab::DataDrift]);
/// dashboard.calculate(&reference, Some(&current), None)?;
/// let json = dashboard.json_dump()?;
/// # Ok(())
/// # }
/// ```
pub struct Dashboard {
    tabs: Vec<Tab>,
    options: DriftOptions,
    info: Option<DashboardInfo>,
}

impl Dashboard {
    /// Dashboard over the given tabs with default calculation options.
    pub fn new(tabs: Vec<Tab>) -> Self {
        Dashboard::with_options(tabs, DriftOptions::default())
    }

    /// Dashboard over the given tabs with explicit calculation options.
    pub fn with_options(tabs: Vec<Tab>, options: DriftOptions) -> Self {
        Dashboard {
            tabs,
            options,
            info: None,
        }
    }

    /// Run every tab's analysis and render the widget payload.
    ///
    /// * `reference` - Baseline dataset every analysis compares against.
    /// * `current` - Production dataset. Optional for the performance
    ///   tabs, required by the drift tabs.
    /// * `mapping` - Column role declaration, `None` uses the default
    ///   mapping.
    pub fn calculate(
        &mut self,
        reference: &DataFrame,
        current: Option<&DataFrame>,
        mapping: Option<&ColumnMapping>,
    ) -> Result<(), DriftLensError> {
        let timer = Instant::now();
        check_frames(reference, current)?;
        let mapping = mapping.cloned().unwrap_or_default();
        let columns = ResolvedColumns::resolve(reference, current, &mapping)?;
        let ctx = AnalysisContext {
            reference,
            current,
            columns: &columns,
            options: &self.options,
        };
        let mut widgets = Vec::new();
        for tab in &self.tabs {
            widgets.extend(tab.build_widgets(&ctx)?);
        }
        info!(
            "Calculated a dashboard with {} widgets in {:.3} seconds.",
            widgets.len(),
            timer.elapsed().as_secs_f64()
        );
        self.info = Some(DashboardInfo {
            name: DASHBOARD_NAME.to_string(),
            widgets,
        });
        Ok(())
    }

    /// The rendered payload of the last `calculate` call.
    pub fn info(&self) -> Result<&DashboardInfo, DriftLensError> {
        self.info.as_ref().ok_or(DriftLensError::NotCalculated)
    }

    /// Dump the rendered dashboard as a json object.
    pub fn json_dump(&self) -> Result<String, DriftLensError> {
        self.info()?.json_dump()
    }

    /// Save the rendered dashboard as a json file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), DriftLensError> {
        self.info()?.save_report(path)
    }
}
