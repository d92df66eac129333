use std::process::Command;

/// `git describe` output for builds made from a checkout, if any.
fn describe() -> Option<String> {
    let out = Command::new("git")
        .args(["describe", "--tags", "--dirty", "--always"])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let s = String::from_utf8(out.stdout).ok()?.trim().to_string();
    (!s.is_empty()).then_some(s)
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/tags");

    let pkg = env!("CARGO_PKG_VERSION");
    let version = match describe() {
        Some(d) if d != format!("v{}", pkg) => format!("{} ({})", pkg, d),
        _ => pkg.to_string(),
    };
    println!("cargo:rustc-env=WTM_VERSION_STRING={}", version);
}
