// Small helpers shared across the install engine.

// `~` expansion and path-segment validation.
pub mod path_helpers;
// OS / architecture detection and normalization.
pub mod platform;
// Locating, moving and chmod-ing executables.
pub mod binary;
