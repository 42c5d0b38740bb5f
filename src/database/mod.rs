//! Session database layer.
//!
//! Provides SQLite connection management and schema migrations.
//!
//! ```no_run
//! use tabbridge::database::Database;
//!
//! let db = Database::open("sessions.db").expect("failed to open database");
//! let memory = Database::open_in_memory().expect("failed to open in-memory database");
//! ```

pub mod connection;
pub mod migrations;

pub use connection::Database;
