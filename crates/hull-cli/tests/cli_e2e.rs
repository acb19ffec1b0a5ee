//! End-to-end tests driving the `hull` binary.

use std::path::{Path, PathBuf};
use std::process::Command;

fn hull() -> Command {
    Command::new(env!("CARGO_BIN_EXE_hull"))
}

fn make_package(root: &Path) -> PathBuf {
    let pkg = root.join("pkg");
    std::fs::create_dir(&pkg).expect("mkdir");
    std::fs::write(pkg.join("main.lua"), b"print('hi')").expect("write");
    std::fs::create_dir(pkg.join("lib")).expect("mkdir");
    std::fs::write(pkg.join("lib/util.lua"), b"return {}").expect("write");
    pkg
}

fn keygen(prefix: &Path) {
    let status = hull()
        .arg("keygen")
        .arg("--out")
        .arg(prefix)
        .status()
        .expect("run keygen");
    assert!(status.success(), "keygen should exit 0");
}

#[test]
fn keygen_sign_verify_round_trips() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pkg = make_package(dir.path());
    let prefix = dir.path().join("dev");
    keygen(&prefix);

    let status = hull()
        .arg("sign")
        .arg(&pkg)
        .arg("--key")
        .arg(prefix.with_extension("key"))
        .status()
        .expect("run sign");
    assert!(status.success(), "sign should exit 0");
    // Without --binary the signer emits the legacy document name.
    assert!(pkg.join("hull.sig").is_file());

    let status = hull()
        .arg("verify")
        .arg(&pkg)
        .arg("--pubkey")
        .arg(prefix.with_extension("pub"))
        .status()
        .expect("run verify");
    assert!(status.success(), "verify should exit 0");
}

#[test]
fn verify_with_wrong_key_exits_nonzero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pkg = make_package(dir.path());
    let dev = dir.path().join("dev");
    let other = dir.path().join("other");
    keygen(&dev);
    keygen(&other);

    let status = hull()
        .arg("sign")
        .arg(&pkg)
        .arg("--key")
        .arg(dev.with_extension("key"))
        .status()
        .expect("run sign");
    assert!(status.success());

    let status = hull()
        .arg("verify")
        .arg(&pkg)
        .arg("--pubkey")
        .arg(other.with_extension("pub"))
        .status()
        .expect("run verify");
    assert!(!status.success(), "verify under the wrong key should fail");
}

#[test]
fn verify_after_tamper_exits_nonzero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pkg = make_package(dir.path());
    let prefix = dir.path().join("dev");
    keygen(&prefix);

    let status = hull()
        .arg("sign")
        .arg(&pkg)
        .arg("--key")
        .arg(prefix.with_extension("key"))
        .status()
        .expect("run sign");
    assert!(status.success());

    std::fs::write(pkg.join("main.lua"), b"print('evil')").expect("tamper");
    let status = hull()
        .arg("verify")
        .arg(&pkg)
        .arg("--pubkey")
        .arg(prefix.with_extension("pub"))
        .status()
        .expect("run verify");
    assert!(!status.success(), "verify of a tampered package should fail");
}

#[test]
fn sign_with_binary_but_no_platform_is_a_usage_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pkg = make_package(dir.path());
    let prefix = dir.path().join("dev");
    keygen(&prefix);
    let binary = dir.path().join("host");
    std::fs::write(&binary, b"host binary").expect("write");

    // --binary selects the current format, which cannot be produced
    // without a platform attestation.
    let status = hull()
        .arg("sign")
        .arg(&pkg)
        .arg("--key")
        .arg(prefix.with_extension("key"))
        .arg("--binary")
        .arg(&binary)
        .status()
        .expect("run sign");
    assert!(!status.success(), "sign --binary without --platforms should fail");
}
