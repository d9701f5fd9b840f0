use std::path::PathBuf;

#[derive(Debug, Clone)]
/// Configuration for the database used by the SDK.
pub enum DatabaseConfiguration {
    /// File-backed SQLite database, used to keep state across restarts.
    Sqlite {
        /// The file path to the SQLite database. Different users should use different files.
        file_path: PathBuf,
    },

    /// SQLite database living in memory. State is lost when the process exits.
    InMemory,
}
