use std::env;
use std::fs;
use std::path::{Path, PathBuf};

fn main() {
    // Copy the runtime files next to the executable so it can find them
    copy_to_target("config.json");
    copy_to_target("results.json");
}

/// Returns the target profile directory (target/release or target/debug).
fn target_dir() -> Option<PathBuf> {
    let out_dir = env::var("OUT_DIR").ok()?;
    // OUT_DIR is something like target/release/build/uma-event-overlay-xxx/out
    // Go up 3 levels: out -> hash -> build -> release
    Path::new(&out_dir).ancestors().nth(3).map(Path::to_path_buf)
}

/// Copies a file from the crate root to the target directory if it exists.
fn copy_to_target(name: &str) {
    let src = Path::new(name);
    if !src.exists() {
        return;
    }

    if let Some(target) = target_dir() {
        let _ = fs::copy(src, target.join(name));
        println!("cargo:rerun-if-changed={}", name);
    }
}
