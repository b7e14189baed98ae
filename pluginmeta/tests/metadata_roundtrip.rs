//! Integration tests for converting records between formats.
//!
//! These tests verify that a release survives every conversion path:
//! - `metadata.txt` → record → `metadata.txt`
//! - record → flat mapping → record
//! - record → XML mapping → record
//!
//! Run with: `cargo test --test metadata_roundtrip`

use pluginmeta::schema::FieldValue;
use pluginmeta::{MetadataError, PluginMetadata, Version, VersionValueError};

// ============================================================================
// Helper Functions
// ============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("pluginmeta=trace")
        .with_test_writer()
        .try_init();
}

/// A typical `metadata.txt` as generated by Plugin Builder.
const METADATA_TXT: &str = r#"# This file contains metadata for your plugin.

[general]
name=Contour Painter
qgisMinimumVersion=3.16
qgisMaximumVersion=3.99
description=Paint contour lines from a DEM
version=1.2.0-beta1
author=Jane Doe
email=jane@example.com

about=Generates contour lines from the active raster layer and styles them by elevation.

tracker=https://example.com/contour_painter/issues
repository=https://example.com/contour_painter

hasProcessingProvider=yes
tags=raster,dem,contour

homepage=https://example.com/contour_painter
category=Raster
icon=icon.png
experimental=True
deprecated=False
server=False
"#;

fn contour_painter() -> PluginMetadata {
    PluginMetadata::from_metadata_txt("contour_painter", METADATA_TXT).unwrap()
}

// ============================================================================
// Integration Tests
// ============================================================================

#[test]
fn test_metadata_txt_import() {
    init_tracing();
    let meta = contour_painter();

    assert_eq!(meta.id(), "contour_painter");
    assert!(meta.required_fields_present(&[]));
    assert_eq!(meta.value("hasProcessingProvider"), Some(&FieldValue::Boolean(true)));
    assert_eq!(meta.value("server"), Some(&FieldValue::Boolean(false)));

    let version = meta.value("version").and_then(FieldValue::as_version).unwrap();
    assert_eq!(version.elements(), ["1", "2", "0", "BETA", "1"]);
    assert!(!version.is_stable());

    let qgis_max = meta
        .value("qgisMaximumVersion")
        .and_then(FieldValue::as_version)
        .unwrap();
    assert_eq!(qgis_max, &Version::from_qgis_version("4.0.0", false).unwrap());
    assert_eq!(qgis_max.original(), "3.99");
}

#[test]
fn test_metadata_txt_round_trip() {
    init_tracing();
    let first = contour_painter();
    let text = first.to_metadata_txt();

    assert!(text.starts_with("[general]\n"));
    assert!(text.contains("\nhasProcessingProvider = true\n"));
    assert!(text.contains("\nqgisMaximumVersion = 3.99\n"));
    assert!(text.contains("\ncategory = Raster\n"));
    assert!(!text.contains("\nid = "));

    let second = PluginMetadata::from_metadata_txt("contour_painter", &text).unwrap();
    assert_eq!(second, first);
}

#[test]
fn test_flat_mapping_round_trip() {
    init_tracing();
    let first = contour_painter();
    let fields = first.to_fields();

    assert_eq!(fields["id"], "contour_painter");
    assert_eq!(fields["version"], "1.2.0-beta1");

    let second =
        PluginMetadata::from_fields(fields.iter().map(|(key, value)| (key, Some(value)))).unwrap();
    assert_eq!(second, first);
}

#[test]
fn test_xml_mapping_round_trip() {
    init_tracing();
    let first = contour_painter();
    let xml_fields = first.to_xml_fields().unwrap();

    assert_eq!(xml_fields["file_name"], "contour_painter.1.2.0-beta1.zip");
    assert_eq!(xml_fields["@version"], "1.2.0-beta1");
    assert_eq!(xml_fields["@name"], "Contour Painter");
    assert_eq!(xml_fields["author_name"], "Jane Doe");

    let second =
        PluginMetadata::from_xml_fields(xml_fields.into_iter().map(|(key, value)| (key, Some(value))))
            .unwrap();

    assert_eq!(second.id(), first.id());
    let exported = second.to_fields();
    for (key, value) in first.to_fields() {
        assert_eq!(exported.get(&key), Some(&value), "{key}");
    }
    assert_eq!(exported["file_name"], "contour_painter.1.2.0-beta1.zip");
}

#[test]
fn test_multiline_values_are_indented() {
    init_tracing();
    let meta = PluginMetadata::from_fields([
        ("id", Some("contour_painter")),
        ("changelog", Some("1.2.0 new palette\n1.1.0 faster")),
    ])
    .unwrap();

    let text = meta.to_metadata_txt();
    assert_eq!(
        text,
        "[general]\nchangelog = 1.2.0 new palette\n\t1.1.0 faster\n\n"
    );

    let again = PluginMetadata::from_metadata_txt("contour_painter", &text).unwrap();
    let changelog = again.value("changelog").and_then(FieldValue::as_text).unwrap();
    assert!(changelog.starts_with("1.2.0 new palette\n"));
    assert!(changelog.ends_with("1.1.0 faster"));
}

#[test]
fn test_update_from_repository_release() {
    init_tracing();
    let mut local = contour_painter();
    let published = PluginMetadata::from_xml_fields([
        ("@name", Some("Contour Painter")),
        ("@version", Some("1.2.0")),
        ("version", Some("1.2.0")),
        ("file_name", Some("contour_painter.1.2.0.zip")),
        ("download_url", Some("https://example.com/contour_painter.1.2.0.zip")),
        ("experimental", Some("False")),
        ("downloads", Some("812")),
    ])
    .unwrap();

    local.update(&published).unwrap();

    let fields = local.to_fields();
    assert_eq!(fields["version"], "1.2.0");
    assert_eq!(fields["experimental"], "false");
    assert_eq!(fields["downloads"], "812");
    assert_eq!(fields["email"], "jane@example.com");
}

#[test]
fn test_bad_release_is_reported_by_kind() {
    init_tracing();
    let text = METADATA_TXT.replace("version=1.2.0-beta1", "version=v");

    assert_eq!(
        PluginMetadata::from_metadata_txt("contour_painter", &text),
        Err(MetadataError::Version(VersionValueError::NoElements(
            "v".to_string()
        )))
    );
}
