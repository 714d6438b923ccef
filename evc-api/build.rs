//! Stamps the startup banner: short commit, build time and cargo profile.
//!
//! Source tarballs have no `.git`; set `EVC_GIT_HASH` there instead.

use std::process::Command;

const HASH_OVERRIDE_ENV: &str = "EVC_GIT_HASH";

fn git_short_hash() -> Option<String> {
    if let Ok(hash) = std::env::var(HASH_OVERRIDE_ENV) {
        if !hash.trim().is_empty() {
            return Some(hash.trim().to_string());
        }
    }

    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-env-changed={}", HASH_OVERRIDE_ENV);
    println!("cargo:rerun-if-changed=../.git/HEAD");

    let git_hash = git_short_hash().unwrap_or_else(|| "unknown".to_string());
    let built_at = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
    let profile = std::env::var("PROFILE").unwrap_or_else(|_| "unknown".to_string());

    println!("cargo:rustc-env=GIT_HASH={}", git_hash);
    println!("cargo:rustc-env=BUILD_TIMESTAMP={}", built_at);
    println!("cargo:rustc-env=BUILD_PROFILE={}", profile);
}
