use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags};

/// Open the staged database read-write. Unlike `Connection::open`, this never
/// creates the file: a missing database must surface as an error instead of
/// turning into an empty one that fails later with a confusing message.
pub fn open_database(path: &Path) -> rusqlite::Result<Connection> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX;
    Connection::open_with_flags(plain_path(path), flags)
}

/// The bundled SQLite reads any name starting with `file:` as a URI, even
/// without `SQLITE_OPEN_URI`. Anchoring relative paths at `.` keeps them plain.
fn plain_path(path: &Path) -> PathBuf {
    if path.is_relative() {
        Path::new(".").join(path)
    } else {
        path.to_path_buf()
    }
}
