//! Build script for onto-enrich
//!
//! Captures build identification shown by `onto-enrich --version`.

use std::process::Command;

fn main() {
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout).ok()
            } else {
                None
            }
        })
        .map(|s| s.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let build_date = chrono::Utc::now().format("%Y-%m-%d").to_string();

    println!("cargo:rustc-env=ONTO_GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=ONTO_BUILD_DATE={}", build_date);
    println!("cargo:rerun-if-changed=.git/HEAD");
}
