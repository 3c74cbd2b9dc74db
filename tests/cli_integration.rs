//! CLI Integration Tests
//!
//! Tests for the CLI interface using assert_cmd

use assert_cmd::Command;
use lopdf::{dictionary, Document, Object, Stream};
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn pagefit_cmd() -> Command {
    // Use CARGO_BIN_EXE_<name> environment variable set by cargo test
    Command::new(env!("CARGO_BIN_EXE_pagefit-pdf"))
}

fn number(obj: &Object) -> f64 {
    match obj {
        Object::Integer(i) => *i as f64,
        Object::Real(f) => *f as f64,
        other => panic!("expected number, got {other:?}"),
    }
}

/// MediaBox of the first page as [x0, y0, x1, y1].
fn first_page_media_box(path: &Path) -> [f64; 4] {
    let doc = Document::load(path).unwrap();
    let page_id = *doc.get_pages().values().next().unwrap();
    let dict = doc.get_object(page_id).unwrap().as_dict().unwrap();
    let mb = dict.get(b"MediaBox").unwrap().as_array().unwrap();
    [number(&mb[0]), number(&mb[1]), number(&mb[2]), number(&mb[3])]
}

/// Write a minimal two-page PDF (612x792 points) to `path`.
fn write_sample_pdf(path: &Path) {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids: Vec<Object> = Vec::new();
    for _ in 0..2 {
        let content = Stream::new(dictionary! {}, b"72 72 468 648 re f".to_vec());
        let content_id = doc.add_object(content);
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => 2i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).expect("failed to write sample PDF");
}

#[test]
fn test_help_command() {
    pagefit_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("pagefit-pdf"))
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("crop"))
        .stdout(predicate::str::contains("preview"))
        .stdout(predicate::str::contains("info"));
}

#[test]
fn test_version_command() {
    pagefit_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_info_command() {
    pagefit_cmd()
        .arg("info")
        .assert()
        .success()
        .stdout(predicate::str::contains("pagefit-pdf"))
        .stdout(predicate::str::contains("System Information"))
        .stdout(predicate::str::contains("Device Profiles"))
        .stdout(predicate::str::contains("paperwhite"));
}

#[test]
fn test_convert_no_input_argument() {
    pagefit_cmd()
        .args(["convert"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("required"));
}

#[test]
fn test_convert_missing_input() {
    pagefit_cmd()
        .args(["convert", "/nonexistent/path.pdf", "/tmp/out"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Input path does not exist"));
}

#[test]
fn test_convert_empty_directory() {
    let temp_dir = TempDir::new().unwrap();
    pagefit_cmd()
        .args(["convert", temp_dir.path().to_str().unwrap(), "/tmp/out"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("No PDF files found"));
}

#[test]
fn test_convert_dry_run_single_file() {
    let temp_dir = TempDir::new().unwrap();
    let pdf = temp_dir.path().join("sample.pdf");
    write_sample_pdf(&pdf);

    pagefit_cmd()
        .args([
            "convert",
            pdf.to_str().unwrap(),
            "/tmp/out",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry Run"))
        .stdout(predicate::str::contains("Execution Plan"))
        .stdout(predicate::str::contains("Files to process: 1"))
        .stdout(predicate::str::contains("paperwhite"));
}

#[test]
fn test_convert_dry_run_directory() {
    let temp_dir = TempDir::new().unwrap();
    write_sample_pdf(&temp_dir.path().join("a.pdf"));
    write_sample_pdf(&temp_dir.path().join("b.pdf"));

    pagefit_cmd()
        .args([
            "convert",
            temp_dir.path().to_str().unwrap(),
            "/tmp/out",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Files to process: 2"));
}

#[test]
fn test_convert_dry_run_with_options() {
    let temp_dir = TempDir::new().unwrap();
    let pdf = temp_dir.path().join("sample.pdf");
    write_sample_pdf(&pdf);

    pagefit_cmd()
        .args([
            "convert",
            pdf.to_str().unwrap(),
            "/tmp/out",
            "--dry-run",
            "--dpi",
            "300",
            "--mode",
            "components",
            "--device",
            "scribe",
            "--per-page",
            "-t",
            "4",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Detection DPI: 300"))
        .stdout(predicate::str::contains("Components"))
        .stdout(predicate::str::contains("scribe"))
        .stdout(predicate::str::contains("per-page"))
        .stdout(predicate::str::contains("Threads: 4"));
}

#[test]
fn test_convert_dry_run_no_device() {
    let temp_dir = TempDir::new().unwrap();
    let pdf = temp_dir.path().join("sample.pdf");
    write_sample_pdf(&pdf);

    pagefit_cmd()
        .args([
            "convert",
            pdf.to_str().unwrap(),
            "/tmp/out",
            "--dry-run",
            "--no-device",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Device: none"));
}

#[test]
fn test_convert_invalid_mode() {
    let temp_dir = TempDir::new().unwrap();
    let pdf = temp_dir.path().join("sample.pdf");
    write_sample_pdf(&pdf);

    pagefit_cmd()
        .args([
            "convert",
            pdf.to_str().unwrap(),
            "/tmp/out",
            "--mode",
            "magic",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown detection mode"));
}

#[test]
fn test_unknown_command() {
    pagefit_cmd()
        .args(["unknown"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

// ============ Config File Tests ============

#[test]
fn test_config_nonexistent_file_warning() {
    let temp_dir = TempDir::new().unwrap();
    let pdf = temp_dir.path().join("sample.pdf");
    write_sample_pdf(&pdf);

    pagefit_cmd()
        .args([
            "convert",
            pdf.to_str().unwrap(),
            "/tmp/out",
            "--dry-run",
            "--config",
            "/nonexistent/config.toml",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("Warning"))
        .stderr(predicate::str::contains("Failed to load config file"));
}

#[test]
fn test_config_valid_file() {
    let temp_dir = TempDir::new().unwrap();
    let pdf = temp_dir.path().join("sample.pdf");
    write_sample_pdf(&pdf);
    let config_path = temp_dir.path().join("test_config.toml");
    std::fs::write(
        &config_path,
        r#"
[detection]
dpi = 300
"#,
    )
    .unwrap();

    pagefit_cmd()
        .args([
            "convert",
            pdf.to_str().unwrap(),
            "/tmp/out",
            "--dry-run",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Detection DPI: 300"));
}

#[test]
fn test_config_cli_overrides_config() {
    let temp_dir = TempDir::new().unwrap();
    let pdf = temp_dir.path().join("sample.pdf");
    write_sample_pdf(&pdf);
    let config_path = temp_dir.path().join("test_config.toml");
    std::fs::write(&config_path, "[detection]\ndpi = 600\n").unwrap();

    pagefit_cmd()
        .args([
            "convert",
            pdf.to_str().unwrap(),
            "/tmp/out",
            "--dry-run",
            "--config",
            config_path.to_str().unwrap(),
            "--dpi",
            "450",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Detection DPI: 450"));
}

// ============ Crop Command Tests ============

#[test]
fn test_crop_missing_input() {
    pagefit_cmd()
        .args(["crop", "/nonexistent/path.pdf"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Input path does not exist"));
}

#[test]
fn test_crop_invalid_binding() {
    let temp_dir = TempDir::new().unwrap();
    let pdf = temp_dir.path().join("sample.pdf");
    write_sample_pdf(&pdf);

    pagefit_cmd()
        .args([
            "crop",
            pdf.to_str().unwrap(),
            "--binding",
            "sideways",
        ])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("unknown binding direction"));
}

#[test]
fn test_crop_applies_fixed_margins() {
    let temp_dir = TempDir::new().unwrap();
    let pdf = temp_dir.path().join("sample.pdf");
    write_sample_pdf(&pdf);
    let output = temp_dir.path().join("cropped.pdf");

    pagefit_cmd()
        .args([
            "crop",
            pdf.to_str().unwrap(),
            output.to_str().unwrap(),
            "--left",
            "10",
            "--right",
            "10",
            "--top",
            "5",
            "--bottom",
            "5",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cropped 2 pages"));

    assert!(output.exists());

    // 10% off each side of 612pt leaves [61.2, 550.8].
    let mb = first_page_media_box(&output);
    assert!((mb[0] - 61.2).abs() < 0.01, "x0 = {}", mb[0]);
    assert!((mb[2] - 550.8).abs() < 0.01, "x1 = {}", mb[2]);
}

#[test]
fn test_crop_default_output_name() {
    let temp_dir = TempDir::new().unwrap();
    let pdf = temp_dir.path().join("book.pdf");
    write_sample_pdf(&pdf);

    pagefit_cmd()
        .args(["crop", pdf.to_str().unwrap(), "--left", "5"])
        .assert()
        .success();

    assert!(temp_dir.path().join("book_optimized.pdf").exists());
}

#[test]
fn test_crop_with_device_scales_pages() {
    let temp_dir = TempDir::new().unwrap();
    let pdf = temp_dir.path().join("sample.pdf");
    write_sample_pdf(&pdf);
    let output = temp_dir.path().join("scaled.pdf");

    pagefit_cmd()
        .args([
            "crop",
            pdf.to_str().unwrap(),
            output.to_str().unwrap(),
            "--device",
            "paperwhite",
        ])
        .assert()
        .success();

    // 612x792 fits 1236x1648 at scale min(1236/612, 1648/792) = 1236/612.
    let scale: f64 = 1236.0 / 612.0;
    let mb = first_page_media_box(&output);
    assert!((mb[2] - 1236.0).abs() < 0.1, "x1 = {}", mb[2]);
    assert!((mb[3] - 792.0 * scale).abs() < 0.1, "y1 = {}", mb[3]);
}

// ============ Preview Command Tests ============

#[test]
fn test_preview_missing_input() {
    pagefit_cmd()
        .args(["preview", "/nonexistent/path.pdf"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Input path does not exist"));
}

#[test]
fn test_preview_help() {
    pagefit_cmd()
        .args(["preview", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("sample"))
        .stdout(predicate::str::contains("--report"));
}
