//! Document store connection layer.
//!
//! The pipeline persists notifications in MongoDB; this library owns the
//! connection lifecycle: configuration from the environment, pooled client
//! construction with a connectivity check, bounded startup retry through the
//! shared `retry` policy, and health probes.
//!
//! ```ignore
//! use core_config::FromEnv;
//! use database::mongodb::{MongoConfig, connect_from_config_with_retry};
//!
//! let config = MongoConfig::from_env()?;
//! let client = connect_from_config_with_retry(&config, None).await?;
//! let db = client.database(config.database());
//! ```

pub mod mongodb;
