use std::io::{Cursor, Write};
use std::process::{Command, Output};

use flate2::{write::GzEncoder, Compression};
use pretty_assertions::assert_eq;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

fn playground(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_playground"))
        .args(args)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("PLAYGROUND_ARCHIVE")
        .env_remove("PLAYGROUND_CONFIG")
        .output()
        .unwrap()
}

/// Prints a greeting and exits with code 7.
const GREET_AND_EXIT: &str = r#"
(module
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "proc_exit" (func $proc_exit (param i32)))
  (memory (export "memory") 1)
  (data (i32.const 64) "Hello from the sandbox\n")
  (func (export "_start")
    (i32.store (i32.const 0) (i32.const 64))
    (i32.store (i32.const 4) (i32.const 23))
    (drop (call $fd_write (i32.const 1) (i32.const 0) (i32.const 1) (i32.const 8)))
    (call $proc_exit (i32.const 7))))
"#;

const STUB_INTERPRETER: &[u8] = b"\0asm\x01\0\0\0";

fn distribution(interpreter: &[u8]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));
    for (path, contents) in [
        ("ruby/usr/local/bin/ruby", interpreter),
        ("ruby/usr/local/lib/ruby/set.rb", b"class Set; end".as_slice()),
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Regular);
        header.set_mode(0o644);
        header.set_size(contents.len() as u64);
        builder.append_data(&mut header, path, contents).unwrap();
    }
    let tarball = builder.into_inner().unwrap().finish().unwrap();

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    writer.start_file("ruby.wasm.tar.gz", options).unwrap();
    writer.write_all(&tarball).unwrap();
    writer.finish().unwrap().into_inner()
}

#[test]
fn split_prints_every_section() {
    let temp = tempfile::tempdir().unwrap();
    let source = temp.path().join("main.rb");
    std::fs::write(&source, "require_relative 'a'\n#--- a.rb\nputs :a\n").unwrap();

    let output = playground(&["split", source.to_str().unwrap()]);

    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "=== (main) ===\nrequire_relative 'a'\n=== a.rb (line 2) ===\nputs :a\n\n"
    );
}

#[test]
fn split_as_json() {
    let temp = tempfile::tempdir().unwrap();
    let source = temp.path().join("main.rb");
    std::fs::write(&source, "#--- a.rb\nputs :a").unwrap();

    let output = playground(&["split", "--json", source.to_str().unwrap()]);

    assert!(output.status.success(), "{output:?}");
    let split: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(split["files"]["a.rb"]["source_line"], 0);
    assert_eq!(split["files"]["a.rb"]["content"], "puts :a\n");
    assert_eq!(split["remaining"], "");
}

#[test]
fn install_lists_the_tree() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("ruby.zip");
    std::fs::write(&archive, distribution(STUB_INTERPRETER)).unwrap();

    let output = playground(&["install", "--quiet", "--archive", archive.to_str().unwrap()]);

    assert!(output.status.success(), "{output:?}");
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "/usr/\n/usr/local/\n/usr/local/bin/\n/usr/local/bin/ruby\t8\n\
         /usr/local/lib/\n/usr/local/lib/ruby/\n/usr/local/lib/ruby/set.rb\t14\n"
    );
}

#[test]
fn install_reports_progress_on_stderr() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("ruby.zip");
    std::fs::write(&archive, distribution(STUB_INTERPRETER)).unwrap();

    let output = playground(&["install", "--archive", archive.to_str().unwrap()]);

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Installing…"), "{stderr}");
    assert!(stderr.contains("Installed 2 files"), "{stderr}");
}

#[test]
fn missing_archives_are_reported() {
    let temp = tempfile::tempdir().unwrap();
    let source = temp.path().join("main.rb");
    std::fs::write(&source, "puts 1").unwrap();
    let archive = temp.path().join("missing.zip");

    let output = playground(&[
        "run",
        "--archive",
        archive.to_str().unwrap(),
        source.to_str().unwrap(),
    ]);

    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("missing.zip"), "{stderr}");
}

#[test]
fn run_streams_output_and_forwards_the_exit_code() {
    let temp = tempfile::tempdir().unwrap();
    let archive = temp.path().join("ruby.zip");
    let interpreter = wat::parse_str(GREET_AND_EXIT).unwrap();
    std::fs::write(&archive, distribution(&interpreter)).unwrap();
    let source = temp.path().join("main.rb");
    std::fs::write(&source, "puts 'hello'\n").unwrap();

    let output = playground(&[
        "run",
        "--quiet",
        "--archive",
        archive.to_str().unwrap(),
        source.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(7), "{output:?}");
    assert_eq!(
        String::from_utf8(output.stdout).unwrap(),
        "Hello from the sandbox\n"
    );
}
