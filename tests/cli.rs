use std::io::Write;
use std::process::{Command, Output};

use tempfile::NamedTempFile;

fn segment_file(content: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(content).expect("write contents");
    file.flush().expect("flush contents");
    file
}

fn run(args: &[&str], segments: &[&NamedTempFile]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_multiseek"))
        .args(args)
        .args(segments.iter().map(|segment| segment.path()))
        .output()
        .expect("run multiseek")
}

#[test]
fn copies_whole_stream_by_default() {
    let (a, b) = (segment_file(b"ABCDE"), segment_file(b"FGH"));
    let output = run(&[], &[&a, &b]);

    assert!(output.status.success());
    assert_eq!(output.stdout, b"ABCDEFGH");
}

#[test]
fn copies_range_across_boundary() {
    let (a, b, c) = (segment_file(b"ABCDE"), segment_file(b"FGH"), segment_file(b"IJKL"));
    let output = run(&["--offset", "4", "--length", "3"], &[&a, &b, &c]);

    assert!(output.status.success());
    assert_eq!(output.stdout, b"EFG");
}

#[test]
fn copies_tail_from_end() {
    let (a, b, c) = (segment_file(b"ABCDE"), segment_file(b"FGH"), segment_file(b"IJKL"));
    let output = run(&["--offset", "-2", "--from-end"], &[&a, &b, &c]);

    assert!(output.status.success());
    assert_eq!(output.stdout, b"KL");
}

#[test]
fn rejects_positive_offset_from_end() {
    let a = segment_file(b"ABCDE");
    let output = run(&["--offset", "1", "--from-end"], &[&a]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("must be <= 0"), "stderr: {stderr}");
}

#[test]
fn prints_boundaries() {
    let (a, b) = (segment_file(b"ABCDE"), segment_file(b""));
    let output = run(&["--boundaries"], &[&a, &b]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0\t0\t4\t5\t"));
    assert!(stdout.contains("1\t5\t-\t0\t"));
    assert!(stdout.contains("total\t\t\t5"));
}

#[test]
fn missing_segment_fails() {
    let output = Command::new(env!("CARGO_BIN_EXE_multiseek"))
        .arg("/no/such/segment.001")
        .output()
        .expect("run multiseek");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Failed to open segments"), "stderr: {stderr}");
}
