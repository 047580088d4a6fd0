fn main() {
    // Expose git/build metadata (GIT_COMMIT_HASH and friends) via the built crate.
    built::write_built_file().expect("Failed to gather build-time information");
}
