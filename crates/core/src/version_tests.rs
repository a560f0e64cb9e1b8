// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::InstallVersion;

#[test]
fn ordering_matches_packed_form() {
    let a = InstallVersion::new(5, 4, 917);
    let b = InstallVersion::new(5, 5, 0);
    let c = InstallVersion::new(6, 0, 0);
    assert!(a < b && b < c);
    assert!(a.packed() < b.packed() && b.packed() < c.packed());
}

#[test]
fn packed_layout() {
    // 5.4.917 == 0x0005_0004_00000395
    assert_eq!(InstallVersion::new(5, 4, 917).packed(), 0x0005_0004_0000_0395);
}

#[test]
fn parse_and_format_round_trip() {
    let ver: InstallVersion = "5.4.917".parse().unwrap();
    assert_eq!(ver, InstallVersion::new(5, 4, 917));
    assert_eq!(ver.to_string(), "5.4.917");
    assert_eq!(ver.underscored(), "5_4_917");
}

#[test]
fn parse_rejects_garbage() {
    assert!("".parse::<InstallVersion>().is_err());
    assert!("5.4".parse::<InstallVersion>().is_err());
    assert!("5.4.9.1".parse::<InstallVersion>().is_err());
    assert!("a.b.c".parse::<InstallVersion>().is_err());
}
