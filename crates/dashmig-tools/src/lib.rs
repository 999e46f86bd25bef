//! dashmig tools - the external programs a migration run drives.
//!
//! - [`DockerRuntime`] runs Grafana and Perses as containers
//! - [`Percli`] installs the Perses CLI and converts dashboards with it

pub mod container;
pub mod percli;

pub use container::DockerRuntime;
pub use percli::{Percli, PercliInstaller};
