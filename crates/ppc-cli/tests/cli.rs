use assert_cmd::prelude::*;
use ppc_extract::test_support::write_tar_zst;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

fn sha(i: usize) -> String {
    format!("{i:040x}")
}

/// Blocks of up to eight members under `input/`, a map file, an empty `output/`.
fn setup(root: &Path, n: usize) -> Result<(PathBuf, PathBuf, PathBuf), Box<dyn std::error::Error>> {
    let input = root.join("input");
    let output = root.join("output");
    fs::create_dir_all(&input)?;
    fs::create_dir_all(&output)?;

    let members: Vec<(String, Vec<u8>)> = (0..n)
        .map(|i| (sha(i), format!("contents of file {i}\n").into_bytes()))
        .collect();
    let mut map = String::new();
    for (b, chunk) in members.chunks(8).enumerate() {
        let block = format!("block{b}.tar.zst");
        let refs: Vec<(&str, &[u8])> = chunk
            .iter()
            .map(|(id, data)| (id.as_str(), data.as_slice()))
            .collect();
        write_tar_zst(&input.join(&block), &refs)?;
        for (id, _) in chunk {
            map.push_str(&format!("{id} {block}\n"));
        }
    }
    let map_path = root.join("filename_archive_map_test.txt");
    fs::write(&map_path, map)?;
    Ok((map_path, input, output))
}

fn leftovers(output: &Path) -> Vec<String> {
    fs::read_dir(output)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .filter(|n| n.starts_with("tmp.") || n.starts_with("rocksdb_"))
                .collect()
        })
        .unwrap_or_default()
}

fn ppc_access(map: &Path, input: &Path, output: &Path, mode: &str) -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("ppc-access")?;
    cmd.env_remove("PPC_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--extractor")
        .arg("native")
        .arg(map)
        .arg("zstd")
        .arg(input)
        .arg(output)
        .arg(mode);
    Ok(cmd)
}

#[test]
fn test_mode_two_entries_succeeds_and_cleans_up() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempdir()?;
    let (map, input, output) = setup(root.path(), 2)?;

    ppc_access(&map, &input, &output, "T")?
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Number of loaded keys: 2. Running 2 queries.")
                .and(predicate::str::contains(
                    "ALL the files in: filename_archive_map_test.txt are singularly decompressable!",
                )),
        );

    assert!(leftovers(&output).is_empty(), "left behind: {:?}", leftovers(&output));
    Ok(())
}

#[test]
fn benchmark_prints_one_csv_row() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempdir()?;
    let (map, input, output) = setup(root.path(), 100)?;

    let assert = ppc_access(&map, &input, &output, "B")?.assert().success();
    let stdout = String::from_utf8(assert.get_output().stdout.clone())?;
    let lines: Vec<&str> = stdout.lines().collect();

    assert_eq!(lines.len(), 2, "stdout was: {stdout}");
    assert_eq!(
        lines[0],
        "FILE_ARCHIVE_MAP,TIME_FILE_DECOMPRESSION(ms/file),FILE_ACCESS_SPEED(MiB/s),THROUGHPUT(files/s)"
    );
    let fields: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(fields.len(), 4);
    assert_eq!(fields[0], "filename_archive_map_test.txt");
    for field in &fields[1..] {
        let value: f64 = field.parse()?;
        assert!(value >= 0.0 && value.is_finite());
        assert_eq!(field.split('.').nth(1).map(str::len), Some(2));
    }
    assert!(leftovers(&output).is_empty());
    Ok(())
}

#[test]
fn missing_block_fails_before_extraction() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempdir()?;
    let (map, input, output) = setup(root.path(), 3)?;
    let mut contents = fs::read_to_string(&map)?;
    contents.push_str(&format!("{} block_gone.tar.zst\n", sha(50)));
    fs::write(&map, contents)?;

    ppc_access(&map, &input, &output, "T")?
        .assert()
        .failure()
        .stderr(predicate::str::contains("block_gone.tar.zst").and(predicate::str::contains("does not exist")))
        .stdout(predicate::str::contains("singularly decompressable").not());

    assert!(leftovers(&output).is_empty());
    Ok(())
}

#[test]
fn interactive_keeps_going_after_a_miss() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempdir()?;
    let (map, input, output) = setup(root.path(), 4)?;

    assert_cmd::Command::from_std(ppc_access(&map, &input, &output, "I")?)
        .write_stdin(format!("nope\n{}\nexit\n", sha(1)))
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Type a FILE ID")
                .and(predicate::str::contains("The file nope is not in these compressed archives"))
                .and(predicate::str::contains("has been copied to")),
        );

    assert_eq!(fs::read_to_string(output.join(sha(1)))?, "contents of file 1\n");
    assert!(leftovers(&output).is_empty());
    Ok(())
}

#[test]
fn wrong_argument_count_fails() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("ppc-access")?;
    cmd.arg("map.txt").arg("zstd").arg("in");
    cmd.assert().failure().stderr(predicate::str::contains("Usage"));
    Ok(())
}

#[test]
fn unknown_mode_only_builds_the_index() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempdir()?;
    let (map, input, output) = setup(root.path(), 2)?;

    ppc_access(&map, &input, &output, "X")?
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
    assert!(leftovers(&output).is_empty());
    Ok(())
}

#[test]
fn invalid_ids_rejected_when_validation_enabled() -> Result<(), Box<dyn std::error::Error>> {
    let root = tempdir()?;
    let (map, input, output) = setup(root.path(), 2)?;
    let mut contents = fs::read_to_string(&map)?;
    contents.push_str("NOT-A-HASH block0.tar.zst\n");
    fs::write(&map, contents)?;

    ppc_access(&map, &input, &output, "X")?.assert().success();
    ppc_access(&map, &input, &output, "X")?
        .arg("--validate-ids")
        .assert()
        .failure()
        .stderr(predicate::str::contains("NOT-A-HASH"));
    Ok(())
}

fn have(tool: &str) -> bool {
    Command::new(tool)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

#[test]
fn tar_extractor_matches_native() -> Result<(), Box<dyn std::error::Error>> {
    if !have("tar") || !have("zstd") {
        eprintln!("skipping: tar or zstd not installed");
        return Ok(());
    }
    let root = tempdir()?;
    let (map, input, output) = setup(root.path(), 5)?;

    let mut cmd = Command::cargo_bin("ppc-access")?;
    cmd.env_remove("PPC_CONFIG")
        .arg("--extractor")
        .arg("tar")
        .arg(&map)
        .arg("zstd")
        .arg(&input)
        .arg(&output)
        .arg("T");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("are singularly decompressable!"));
    assert!(leftovers(&output).is_empty());
    Ok(())
}
