//! Build script: embeds information about the build into the program.
fn main() {
    built::write_built_file().expect("Failed to acquire build-time information");
}
