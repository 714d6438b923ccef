//! Local persistence: schema migrations and the preference store

pub mod schema;
pub mod store;

pub use schema::{get_schema_version, run_migrations, CURRENT_SCHEMA_VERSION};
pub use store::{connect_options, PreferenceStore};
