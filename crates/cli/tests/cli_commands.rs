use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;
use tempfile::tempdir;

/// Missing arguments are a usage error with clap's exit status.
#[test]
fn no_arguments_is_a_usage_error() {
    cargo_bin_cmd!("packscope").assert().failure().code(2);
}

#[test]
fn analyze_without_outputs_is_a_usage_error() {
    let dir = tempdir().unwrap();
    cargo_bin_cmd!("packscope")
        .arg("analyze")
        .arg(dir.path())
        .assert()
        .failure()
        .code(2)
        .stderr(contains("Usage"));
}

#[test]
fn pack_rejects_unknown_tool() {
    let dir = tempdir().unwrap();
    cargo_bin_cmd!("packscope")
        .arg("pack")
        .arg(dir.path())
        .arg("--tool")
        .arg("aspack")
        .assert()
        .failure()
        .code(2)
        .stderr(contains("Unsupported packer"));
}

#[test]
fn pack_fails_when_directory_missing() {
    let dir = tempdir().unwrap();
    cargo_bin_cmd!("packscope")
        .arg("pack")
        .arg(dir.path().join("missing"))
        .arg("--tool")
        .arg("upx")
        .assert()
        .failure()
        .code(1)
        .stderr(contains("Directory does not exist"));
}

#[test]
fn pack_fails_when_tool_missing() {
    let dir = tempdir().unwrap();
    let corpus = dir.path().join("corpus");
    fs::create_dir_all(&corpus).unwrap();
    fs::write(corpus.join("a.exe"), b"MZa").unwrap();

    cargo_bin_cmd!("packscope")
        .arg("pack")
        .arg(&corpus)
        .arg("--tool")
        .arg("upx")
        .arg("--tool-path")
        .arg(dir.path().join("no-such-upx"))
        .assert()
        .failure()
        .stderr(contains("not installed or not found"));
    assert!(!dir.path().join("corpus_upx").exists());
}

#[test]
fn tools_lists_every_packer_as_json() {
    let output = cargo_bin_cmd!("packscope").arg("tools").arg("--json").output().unwrap();
    assert!(output.status.success());
    let entries: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let names: Vec<&str> =
        entries.as_array().unwrap().iter().map(|e| e["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["diec", "upx", "mpress", "pecompact", "molebox", "petite"]);
    assert_eq!(entries[1]["arguments"], "-9 --force <file>");
}

#[cfg(unix)]
mod with_fake_tools {
    use super::*;
    use sha2::{Digest, Sha256};

    const FAKE_DIEC: &str = r#"
case "$4" in
  *app.exe) printf 'PE32\n    Packer: ASPack\n' ;;
  *) printf 'Binary\n' ;;
esac
"#;

    #[test]
    fn analyze_writes_csv_and_binary_table() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        fs::create_dir_all(&corpus).unwrap();
        fs::write(corpus.join("app.exe"), b"MZ\x90\x00").unwrap();
        fs::write(corpus.join("readme.txt"), b"README").unwrap();
        let diec = dir.path().join("diec.sh");
        fs::write(&diec, FAKE_DIEC).unwrap();
        let csv = dir.path().join("out.csv");
        let table = dir.path().join("out.pkl");

        cargo_bin_cmd!("packscope")
            .arg("analyze")
            .arg(&corpus)
            .arg(&csv)
            .arg(&table)
            .arg("--detector")
            .arg(&diec)
            .arg("--launcher")
            .arg("sh")
            .assert()
            .success()
            .stdout(contains("Results saved to"))
            .stdout(contains("packed: 1, not packed: 1, errors: 0"));

        let body = fs::read_to_string(&csv).unwrap();
        let app_hash = format!("{:x}", Sha256::digest(b"MZ\x90\x00"));
        assert!(body.starts_with("SHA256,Filename,Packed Status,Packer Name\n"));
        assert!(body.contains(&format!("{app_hash},app.exe,Packed,ASPack")));
        assert!(body.contains(",readme.txt,Not Packed,None"));

        cargo_bin_cmd!("packscope")
            .arg("show-table")
            .arg(&table)
            .assert()
            .success()
            .stdout(contains("app.exe | Packed | ASPack"))
            .stdout(contains("Rows: 2"));
    }

    #[test]
    fn pack_with_upx_mirrors_only_pe_files() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        fs::create_dir_all(corpus.join("nested")).unwrap();
        fs::write(corpus.join("nested/app.exe"), b"MZapp").unwrap();
        fs::write(corpus.join("readme.txt"), b"README").unwrap();
        let upx = dir.path().join("upx.sh");
        fs::write(&upx, "printf UPX! >> \"$3\"\n").unwrap();
        let summary = dir.path().join("summary.json");

        cargo_bin_cmd!("packscope")
            .arg("pack")
            .arg(&corpus)
            .arg("--tool")
            .arg("upx")
            .arg("--tool-path")
            .arg(&upx)
            .arg("--launcher")
            .arg("sh")
            .arg("--summary")
            .arg(&summary)
            .assert()
            .success()
            .stdout(contains("Packed: 1, skipped: 1, failed: 0"));

        let out_root = dir.path().join("corpus_upx");
        let outputs = packscope_core::corpus::collect_files(&out_root).unwrap();
        assert_eq!(outputs, vec![out_root.join("nested/app.exe")]);
        assert_eq!(fs::read(&outputs[0]).unwrap(), b"MZappUPX!");

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&summary).unwrap()).unwrap();
        assert_eq!(json["tool"], "upx");
        assert_eq!(json["aborted"], false);
        assert_eq!(json["packed"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn pack_through_symlinked_directory_writes_beside_the_link() {
        let dir = tempdir().unwrap();
        let real = dir.path().join("store/samples");
        fs::create_dir_all(&real).unwrap();
        fs::write(real.join("app.exe"), b"MZapp").unwrap();
        let link = dir.path().join("corpus");
        std::os::unix::fs::symlink(&real, &link).unwrap();
        let upx = dir.path().join("upx.sh");
        fs::write(&upx, "printf UPX! >> \"$3\"\n").unwrap();

        cargo_bin_cmd!("packscope")
            .arg("pack")
            .arg(&link)
            .arg("--tool")
            .arg("upx")
            .arg("--tool-path")
            .arg(&upx)
            .arg("--launcher")
            .arg("sh")
            .assert()
            .success()
            .stdout(contains("Packed: 1, skipped: 0, failed: 0"));

        assert_eq!(fs::read(dir.path().join("corpus_upx/app.exe")).unwrap(), b"MZappUPX!");
        assert!(!dir.path().join("store/samples_upx").exists());
    }

    #[test]
    fn pack_failure_aborts_with_nonzero_exit() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        fs::create_dir_all(&corpus).unwrap();
        fs::write(corpus.join("a.exe"), b"MZa").unwrap();
        fs::write(corpus.join("b.exe"), b"MZb").unwrap();
        let petite = dir.path().join("petite.sh");
        fs::write(&petite, "exit 2\n").unwrap();

        cargo_bin_cmd!("packscope")
            .arg("pack")
            .arg(&corpus)
            .arg("--tool")
            .arg("petite")
            .arg("--tool-path")
            .arg(&petite)
            .arg("--launcher")
            .arg("sh")
            .assert()
            .failure()
            .stdout(contains("Packed: 0, skipped: 0, failed: 1"))
            .stderr(contains("--keep-going"));
    }

    #[test]
    fn keep_going_packs_remaining_files() {
        let dir = tempdir().unwrap();
        let corpus = dir.path().join("corpus");
        fs::create_dir_all(&corpus).unwrap();
        fs::write(corpus.join("a.exe"), b"MZa").unwrap();
        fs::write(corpus.join("b.exe"), b"MZb").unwrap();
        let mpress = dir.path().join("mpress.sh");
        fs::write(&mpress, "case \"$1\" in *a.exe) exit 1 ;; esac\n").unwrap();

        cargo_bin_cmd!("packscope")
            .arg("pack")
            .arg(&corpus)
            .arg("--tool")
            .arg("mpress")
            .arg("--tool-path")
            .arg(&mpress)
            .arg("--launcher")
            .arg("sh")
            .arg("--keep-going")
            .assert()
            .failure()
            .stdout(contains("Packed: 1, skipped: 0, failed: 1"))
            .stderr(contains("1 file(s) failed to pack"));
    }
}
