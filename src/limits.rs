/// Largest capacity accepted for a default, schedule window, or override.
pub const MAX_CAPACITY: u32 = 100_000;

/// Platforms a single default or schedule entry may reference.
pub const MAX_PLATFORMS: usize = 64;

/// Instance ids accepted in one "delete selected" request.
pub const MAX_INSTANCE_SELECTION: usize = 1_000;

/// Override notes are free text from the admin form.
pub const MAX_NOTES_LEN: usize = 4_096;

/// Widest date range `overrides_between` will scan.
pub const MAX_OVERRIDE_RANGE_DAYS: i64 = 366;

/// Longest side key accepted when resolving a side.
pub const MAX_SIDE_KEY_LEN: usize = 64;
