use std::fs;

use assert_cmd::Command;
use capa_core::models::invoice::ExtractedRecord;
use capa_core::{PdfRenderer, Renderer};
use predicates::prelude::*;
use tempfile::tempdir;

const RECORD: &str = r#"{
  "numero_nfe": "000123",
  "serie": "001",
  "chave_acesso": "23250106626253000151550010000001231000001234",
  "loja": "7042",
  "brand": "extrafarma",
  "destinatario_nome": ""
}"#;

fn capa() -> Command {
    Command::cargo_bin("capa").unwrap()
}

#[test]
fn render_record_to_pdf() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("record.json");
    fs::write(&input, RECORD).unwrap();

    capa()
        .arg("render")
        .arg(&input)
        .args(["--format", "pdf", "--volume", "2/3", "-o"])
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Capa_Frete_NF000123_Loja7042.pdf"));

    let bytes = fs::read(dir.path().join("Capa_Frete_NF000123_Loja7042.pdf")).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
}

#[test]
fn render_applies_overrides() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("record.json");
    fs::write(&input, RECORD).unwrap();

    capa()
        .arg("render")
        .arg(&input)
        .args(["--format", "docx", "--set", "numero_nfe=999", "--set", "loja=7001", "-o"])
        .arg(dir.path())
        .assert()
        .success();

    let bytes = fs::read(dir.path().join("Capa_Frete_NF999_Loja7001.docx")).unwrap();
    assert!(bytes.starts_with(b"PK"));
}

#[test]
fn render_rejects_unknown_field() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("record.json");
    fs::write(&input, RECORD).unwrap();

    capa()
        .arg("render")
        .arg(&input)
        .args(["--set", "bogus=1", "-o"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown field: bogus"));
}

#[test]
fn extract_rejects_unreadable_pdf() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("broken.pdf");
    fs::write(&input, b"not a pdf").unwrap();

    capa().arg("extract").arg(&input).assert().failure();
}

#[test]
fn extract_requires_existing_file() {
    capa()
        .args(["extract", "does-not-exist.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn batch_without_matches_fails() {
    let dir = tempdir().unwrap();
    let pattern = dir.path().join("*.pdf");

    capa()
        .arg("batch")
        .arg(pattern.to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files"));
}

#[test]
fn batch_continues_past_broken_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.pdf"), b"garbage").unwrap();
    let out = dir.path().join("out");
    let pattern = dir.path().join("*.pdf");

    capa()
        .arg("batch")
        .arg(pattern.to_str().unwrap())
        .args(["--continue-on-error", "--summary", "-o"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("Failed files:"));

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.starts_with("filename,status"));
    assert!(summary.contains("a.pdf,failed"));
}

/// A readable single-page PDF carrying DANFE-like text.
fn readable_pdf() -> Vec<u8> {
    let mut record = ExtractedRecord::new();
    record.numero_nfe = "000123".to_string();
    PdfRenderer::new().try_render(&record, "1/1").unwrap()
}

fn cover_sheets(dir: &std::path::Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with("Capa_Frete_"))
        .collect();
    names.sort();
    names
}

#[test]
fn batch_renders_files_after_a_broken_one() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a_bad.pdf"), b"garbage").unwrap();
    fs::write(dir.path().join("b_good.pdf"), readable_pdf()).unwrap();
    fs::write(dir.path().join("c_good.pdf"), readable_pdf()).unwrap();
    let out = dir.path().join("out");
    let pattern = dir.path().join("*.pdf");

    capa()
        .arg("batch")
        .arg(pattern.to_str().unwrap())
        .args(["--format", "pdf", "-o"])
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("1 of 3 files failed"));

    // Identical records get distinct names instead of overwriting each other
    let names = cover_sheets(&out);
    assert_eq!(names.len(), 2, "{names:?}");
    let (stem, _) = names[0].rsplit_once('.').unwrap();
    assert_eq!(names[1], format!("{stem}_2.pdf"));
}

#[test]
fn config_init_then_get() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    capa()
        .arg("-c")
        .arg(&path)
        .args(["config", "init"])
        .assert()
        .success();

    capa()
        .arg("-c")
        .arg(&path)
        .args(["config", "get", "render.volume_number"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"1/1\""));

    capa()
        .arg("-c")
        .arg(&path)
        .args(["config", "set", "render.volume_number", "2/2"])
        .assert()
        .success();

    capa()
        .arg("-c")
        .arg(&path)
        .args(["config", "get", "render.volume_number"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"2/2\""));
}

#[test]
fn config_set_rejects_unknown_key() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    capa()
        .arg("-c")
        .arg(&path)
        .args(["config", "set", "render.colour", "red"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn config_set_keeps_numeric_volume_as_text() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    capa()
        .arg("-c")
        .arg(&path)
        .args(["config", "set", "render.volume_number", "1"])
        .assert()
        .success();

    capa()
        .arg("-c")
        .arg(&path)
        .args(["config", "get", "render.volume_number"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"1\""));

    capa()
        .arg("-c")
        .arg(&path)
        .args(["config", "show"])
        .assert()
        .success();
}

#[test]
fn config_set_rejects_unknown_format() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.json");

    capa()
        .arg("-c")
        .arg(&path)
        .args(["config", "set", "render.format", "odt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported output format"));

    assert!(!path.exists());
}
