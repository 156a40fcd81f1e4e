// Copyright (c) 2022 Unfolded Circle ApS, Markus Zehnder <markus.z@unfoldedcircle.com>
// SPDX-License-Identifier: MPL-2.0

use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

fn main() {
    built::write_built_file().expect("Failed to acquire build-time information");

    // `built` only knows git with the git2 feature, which we don't enable
    let version = git(&["describe", "--match", "v[0-9]*", "--tags", "HEAD"])
        .map(|v| v.trim_start_matches('v').to_string())
        .or_else(|| git(&["rev-parse", "--short", "HEAD"]));
    let dirty = git(&["diff-index", "--name-only", "HEAD", "--"]).is_some();

    let mut out = String::from("// Git information generated at build time\n");
    match version {
        Some(v) => out.push_str(&format!(
            "pub const GIT_VERSION: Option<&'static str> = Some({v:?});\n"
        )),
        None => out.push_str("pub const GIT_VERSION: Option<&'static str> = None;\n"),
    }
    if dirty {
        out.push_str("pub const GIT_DIRTY: Option<bool> = Some(true);\n");
    } else {
        out.push_str("pub const GIT_DIRTY: Option<bool> = None;\n");
    }

    let out_dir = env::var("OUT_DIR").expect("OUT_DIR not set");
    fs::write(Path::new(&out_dir).join("git_built.rs"), out)
        .expect("Failed to write git information");
}

/// Run a git command and return its trimmed stdout if it succeeded with a non-empty output.
fn git(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8(output.stdout).ok()?;
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}
