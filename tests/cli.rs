//! Command-line tests for the `varsync` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const HEADER: &str = "##fileformat=VCFv4.2\n\
##contig=<ID=chr1,length=1000000>\n\
##contig=<ID=chr2,length=500000>\n\
##FORMAT=<ID=GT,Number=1,Type=String,Description=\"Genotype\">\n\
#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tS1\n";

/// Helper to create a VCF file in `dir`.
fn create_vcf(dir: &TempDir, name: &str, records: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    write!(file, "{}{}", HEADER, records).unwrap();
    path
}

fn varsync() -> Command {
    Command::cargo_bin("varsync").unwrap()
}

fn index(path: &Path) {
    varsync()
        .arg("index")
        .arg(path)
        .assert()
        .success()
        .stderr(predicate::str::contains(".vsi"));
}

#[test]
fn test_sync_reports_presence() {
    let dir = TempDir::new().unwrap();
    let a = create_vcf(&dir, "a.vcf", "chr1\t100\t.\tA\tG\t.\t.\t.\tGT\t0/1\nchr1\t200\t.\tA\tG\t.\t.\t.\tGT\t1/1\n");
    let b = create_vcf(&dir, "b.vcf", "chr1\t200\t.\tA\tC\t.\t.\t.\tGT\t0/1\n");

    varsync()
        .arg("sync")
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout("chr1\t100\t1\t1\t1\t0\nchr1\t200\t2\t1,2\t1\t1\n");
}

#[test]
fn test_sync_cluster_and_records() {
    let dir = TempDir::new().unwrap();
    let a = create_vcf(&dir, "a.vcf", "chr1\t100\t.\tA\tG\t.\t.\t.\tGT\t0/1\nchr1\t200\t.\tA\tG\t.\t.\t.\tGT\t1/1\n");
    let b = create_vcf(&dir, "b.vcf", "chr1\t200\t.\tA\tC\t.\t.\t.\tGT\t0|1\n");

    varsync()
        .args(["sync", "--cluster", "--records"])
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(
            "chr1\t200\t2\t1,2\t1\t1\n\
             1\tchr1\t200\t.\tA\tG\t.\t.\t.\tGT\t1/1\n\
             2\tchr1\t200\t.\tA\tC\t.\t.\t.\tGT\t0|1\n",
        );
}

#[test]
fn test_index_then_regions() {
    let dir = TempDir::new().unwrap();
    let a = create_vcf(&dir, "a.vcf", "chr1\t100\t.\tA\tG\t.\t.\t.\tGT\t0/1\nchr2\t50\t.\tA\tG\t.\t.\t.\tGT\t0/1\n");
    let b = create_vcf(&dir, "b.vcf", "chr2\t50\t.\tA\tG\t.\t.\t.\tGT\t1/1\nchr2\t90\t.\tA\tG\t.\t.\t.\tGT\t1/1\n");
    index(&a);
    index(&b);
    assert!(dir.path().join("a.vcf.vsi").exists());

    varsync()
        .args(["sync", "--header", "-r", "chr2:1-60"])
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("#contig\tpos\tcount\tlist"))
        .stdout(predicate::str::contains("chr2\t50\t2\t1,2\t1\t1\n"))
        .stdout(predicate::str::contains("chr2\t90").not())
        .stdout(predicate::str::contains("chr1").not());
}

#[test]
fn test_regions_without_index_fail() {
    let dir = TempDir::new().unwrap();
    let a = create_vcf(&dir, "a.vcf", "chr1\t100\t.\tA\tG\t.\t.\t.\tGT\t0/1\n");

    varsync()
        .args(["sync", "-r", "chr1"])
        .arg(&a)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No index found"));
}

#[test]
fn test_unsorted_input_fails() {
    let dir = TempDir::new().unwrap();
    let a = create_vcf(&dir, "a.vcf", "chr1\t200\t.\tA\tG\t.\t.\t.\tGT\t0/1\nchr1\t100\t.\tA\tG\t.\t.\t.\tGT\t0/1\n");

    varsync()
        .args(["sync", "--validate-sort"])
        .arg(&a)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not sorted"));

    varsync()
        .arg("index")
        .arg(&a)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not sorted"));
}

#[test]
fn test_missing_input() {
    varsync()
        .args(["sync", "/nonexistent/input.vcf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot open"));
}
