//! Locate shared files used across test cases.

use std::path::PathBuf;

/// The sample configuration directory, relative to the project root.
pub const SAMPLE_CONFIGURATION_PATH: &str = "static/sample-configuration";

/// Find the project root via the crate root provided by `cargo test`,
/// and resolve a path relative to it.
/// This depends on this crate living at `crates/tests/tests-common`.
pub fn get_path_from_project_root(path: &str) -> PathBuf {
    let mut d = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    d.push("../../../");
    d.push(path);
    d
}
