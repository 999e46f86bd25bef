//! Dashboard migration pipeline.
//!
//! Stages run in order, one file at a time:
//! 1. [`discovery`] finds input files
//! 2. [`normalize`] imports them into Grafana (schema update)
//! 3. [`export`] writes the updated dashboards to the schema tree
//! 4. [`migrate`] converts the schema tree into Perses dashboards, with
//!    optional [`datasource`] normalization
//!
//! Every stage records per-file outcomes in the run's [`MigrationSummary`].
//! A file that fails one stage never reaches the next.

pub mod datasource;
pub mod discovery;
pub mod export;
pub mod migrate;
pub mod naming;
pub mod normalize;
pub mod summary;

pub use datasource::strip_datasource_identity;
pub use discovery::{discover_dashboards, discover_dashboards_excluding, DiscoveredFile};
pub use export::run_export;
pub use migrate::{run_migration, MigrationOptions};
pub use naming::{is_valid_slug, sanitize_slug};
pub use normalize::{run_schema_update, DashboardInfo};
pub use summary::{MigrationSummary, StageOutcome};
