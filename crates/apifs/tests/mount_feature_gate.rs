//! Warn when the mount bridge is compiled out.
//!
//! The FUSE bridge is behind the default `fuse` feature; building with
//! `--no-default-features` drops it and its unit tests. This keeps that
//! visible in the test output.

#[cfg(not(feature = "fuse"))]
#[test]
fn fuse_tests_skipped_warning() {
    eprintln!(
        "\n\x1b[33mwarning\x1b[0m: FUSE bridge tests skipped: built without the `fuse` feature.\n\
         Run them with: cargo test --features fuse\n"
    );
}

#[cfg(feature = "fuse")]
#[test]
fn fuse_bridge_maps_errors() {
    use apifs::fuse::errno;
    use apifs::FsError;

    assert_eq!(errno(&FsError::NotFound("/x".into())), libc::ENOENT);
    assert_eq!(errno(&FsError::ReadOnly("/x".into())), libc::EACCES);
}
