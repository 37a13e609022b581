pub mod cli;
pub mod config;
pub mod dashboard;
pub mod database;
pub mod error;
pub mod ids;
pub mod logging;
pub mod models;
pub mod query;
pub mod repository;
pub mod status;
pub mod store;
pub mod utils;
pub mod workspace;

pub use config::Config;
pub use database::Database;
pub use error::{Error, Result, ValidationError};
pub use models::{Meeting, Note, Priority, Task};
pub use utils::Profile;
pub use workspace::Workspace;
