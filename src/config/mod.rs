//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize)
//!     → loader.rs (overlay environment variables)
//!     → validation.rs (semantic checks, production vs development)
//!     → GuardConfig (validated, immutable)
//!     → shared via Arc to every component constructor
//! ```
//!
//! # Design Decisions
//! - Environment variables are read in exactly one place (`loader::apply_env`)
//! - All fields have defaults to allow minimal configs
//! - Secrets are wrapped in `SecretString` and never printed by `Debug`

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_config_with, ConfigError};
pub use validation::{soft_warnings, validate_config, ValidationError};
pub use schema::{
    AdminConfig, CockpitConfig, CsrfConfig, Environment, GuardConfig, ListenerConfig,
    ObservabilityConfig, ProviderConfig, RateLimitConfig, SecurityConfig, SessionConfig,
    TimeoutConfig,
};
