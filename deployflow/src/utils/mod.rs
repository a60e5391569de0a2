//! Small helpers shared by the assembler: name checks and fingerprints.

mod fingerprint;
mod names;

pub use fingerprint::fingerprint_json;
pub use names::{is_valid_name, MAX_NAME_LEN};
