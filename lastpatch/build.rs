//! Build script for lastpatch
//! Embeds the git revision and build time shown in the startup log

use chrono::Utc;
use std::process::Command;

fn git_hash() -> Option<String> {
    if let Ok(hash) = std::env::var("LASTPATCH_GIT_HASH") {
        return Some(hash);
    }

    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}

fn main() {
    let git_hash = git_hash().unwrap_or_else(|| "unknown".to_string());
    let build_time = Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string();

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=BUILD_TIME={}", build_time);

    // the workspace root holds .git
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-env-changed=LASTPATCH_GIT_HASH");
}
