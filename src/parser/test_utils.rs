use std::path::PathBuf;

/// Path of a fixture under `tests/resources`.
#[must_use]
pub fn resource_path(filename: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("resources")
    .join(filename)
}

/// Reads a fixture under `tests/resources`, panicking with the path if it is missing.
#[must_use]
pub fn read_resource(filename: &str) -> Vec<u8> {
  let path = resource_path(filename);
  std::fs::read(&path).unwrap_or_else(|_| panic!("Could not open test file: {}", path.display()))
}
