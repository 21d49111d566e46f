/// Sentinel label emitted while no subject is in view.
pub const NO_SUBJECT_LABEL: &str = "no subject";

/// Label pushed into the stability window when the classifier fails,
/// so a single classifier gap is outvoted instead of muting the stream.
pub const UNKNOWN_LABEL: &str = "unknown";
