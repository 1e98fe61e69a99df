// Modules
pub mod analyzers;
pub mod dashboard;
pub mod data;
pub mod datasets;
pub mod errors;
pub mod mapping;
pub mod profile;
pub mod report;
pub mod stats;
pub mod utils;

// Individual classes, and functions
pub use analyzers::DriftOptions;
pub use dashboard::{Dashboard, Tab};
pub use data::DataFrame;
pub use errors::DriftLensError;
pub use mapping::{ColumnMapping, PredictionColumn};
pub use profile::{Profile, Section};
pub use report::ReportIO;
