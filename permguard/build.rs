use std::process::Command;

fn main() {
    // `abc1234` or `abc1234-dirty`; absent outside a git checkout.
    let described = Command::new("git")
        .args(["describe", "--always", "--dirty", "--abbrev=7", "--exclude=*"])
        .output()
        .ok()
        .filter(|out| out.status.success())
        .map(|out| String::from_utf8_lossy(&out.stdout).trim().to_string())
        .filter(|hash| !hash.is_empty());

    if let Some(hash) = described {
        println!("cargo:rustc-env=PERMGUARD_GIT_HASH={hash}");
    }

    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/index");
}
