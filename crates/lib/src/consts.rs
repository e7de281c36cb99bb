//! Constants shared across the crate.

/// Marker text opening the managed section.
pub const START_MARKER: &str = "OASIS_START";

/// Marker text closing the managed section.
pub const STOP_MARKER: &str = "OASIS_STOP";

/// Suffix tried first when backing up an edited file.
pub const BACKUP_SUFFIX: &str = "bak";

/// Prefix of the numbered fallback suffixes (`ba0`, `ba1`, ...).
pub const BACKUP_NUMBERED_PREFIX: &str = "ba";

/// Number of numbered fallback suffixes tried after [`BACKUP_SUFFIX`].
pub const DEFAULT_BACKUP_SLOTS: u8 = 10;

/// Upper bound accepted for a configured number of backup slots.
pub const MAX_BACKUP_SLOTS: u8 = 100;

/// Environment variable overriding the number of numbered backup slots.
pub const BACKUP_SLOTS_ENV: &str = "OASIS_BACKUP_SLOTS";

/// Permissions given to newly created files (rw-r--r--).
pub const DEFAULT_PERM: u32 = 0o644;
