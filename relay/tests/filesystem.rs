//! Filesystem declaration roots and strategy overriding.

use std::fs;

use relay::{ExtensionHost, ScanFlags};

mod common;
use common::Transporter;

#[test]
fn external_location_overrides_embedded_bindings() {
    let dir = tempfile::tempdir().unwrap();
    let ext = dir.path().join("relay/ext");
    fs::create_dir_all(&ext).unwrap();
    fs::write(
        ext.join("relaytest.Transporter"),
        "tcp=relaytest::UdpTransporter\n",
    )
    .unwrap();

    let host = ExtensionHost::builder().root(dir.path()).build();
    let tcp = host.registry::<dyn Transporter>().get("tcp").unwrap();
    assert_eq!(tcp.id(), "udp");
}

#[test]
fn filesystem_declarations_add_new_names() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("relay");
    fs::create_dir_all(&main).unwrap();
    fs::write(
        main.join("relaytest.Transporter"),
        "disk=relaytest::UdpTransporter\n",
    )
    .unwrap();

    let host = ExtensionHost::builder().root(dir.path()).build();
    let registry = host.registry::<dyn Transporter>();

    assert_eq!(registry.get("disk").unwrap().id(), "udp");
    // Embedded declarations stay in effect alongside the file.
    assert!(registry.has("tcp").unwrap());
}

#[test]
fn embedded_only_hosts_ignore_the_filesystem() {
    let dir = tempfile::tempdir().unwrap();
    let main = dir.path().join("relay");
    fs::create_dir_all(&main).unwrap();
    fs::write(
        main.join("relaytest.Transporter"),
        "disk=relaytest::UdpTransporter\n",
    )
    .unwrap();

    let host = ExtensionHost::builder()
        .root(dir.path())
        .scan(ScanFlags::EMBEDDED)
        .build();
    assert!(!host.registry::<dyn Transporter>().has("disk").unwrap());
}
