//! Stamps the binaries with the source revision and the build time.

use std::env;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

/// Set by packagers building from a tarball, where there is no `.git`.
const REVISION_OVERRIDE: &str = "BOKJA_BUILD_REVISION";

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/index");
    println!("cargo:rerun-if-env-changed={REVISION_OVERRIDE}");
    println!("cargo:rerun-if-env-changed=SOURCE_DATE_EPOCH");

    println!("cargo:rustc-env=BOKJA_REVISION={}", revision());
    println!("cargo:rustc-env=BOKJA_BUILD_EPOCH={}", build_epoch());
}

fn revision() -> String {
    if let Some(pinned) = non_blank(env::var(REVISION_OVERRIDE).ok()) {
        return pinned;
    }

    let described = Command::new("git")
        .args(["describe", "--always", "--dirty", "--abbrev=8"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).into_owned());
    non_blank(described).unwrap_or_else(|| "unknown".to_string())
}

/// Seconds since the epoch. A numeric `SOURCE_DATE_EPOCH` wins.
fn build_epoch() -> u64 {
    env::var("SOURCE_DATE_EPOCH")
        .ok()
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or(0)
        })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
