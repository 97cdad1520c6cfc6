//! Configuration system for applycrypto.
//! TOML-based, layered resolution: overrides > env > project > user > defaults.

pub mod analysis_config;
pub mod applycrypto_config;
pub mod boundary_config;
pub mod scan_config;
pub mod sensitivity_config;

pub use analysis_config::{AnalysisConfig, SqlWrappingType};
pub use applycrypto_config::{ApplyCryptoConfig, ConfigOverrides};
pub use boundary_config::BoundaryConfig;
pub use scan_config::ScanConfig;
pub use sensitivity_config::AliasTable;
