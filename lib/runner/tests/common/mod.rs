//! Tiny WASI guests and the archives that ship them.

#![allow(dead_code)]

use std::io::{Cursor, Write};

use bytes::Bytes;
use flate2::{write::GzEncoder, Compression};
use playground_runner::HarnessConfig;
use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

/// Writes "Hello, World!\n" to stdout.
pub const HELLO: &str = r#"
(module
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 64) "Hello, World!\n")
  (func (export "_start")
    (i32.store (i32.const 0) (i32.const 64))
    (i32.store (i32.const 4) (i32.const 14))
    (drop (call $fd_write (i32.const 1) (i32.const 0) (i32.const 1) (i32.const 8)))))
"#;

/// Interleaves writes to stdout and stderr.
pub const INTERLEAVED: &str = r#"
(module
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 64) "out 1\n")
  (data (i32.const 72) "err 1\n")
  (data (i32.const 80) "out 2\n")
  (func $write (param $fd i32) (param $ptr i32)
    (i32.store (i32.const 0) (local.get $ptr))
    (i32.store (i32.const 4) (i32.const 6))
    (drop (call $fd_write (local.get $fd) (i32.const 0) (i32.const 1) (i32.const 8))))
  (func (export "_start")
    (call $write (i32.const 1) (i32.const 64))
    (call $write (i32.const 2) (i32.const 72))
    (call $write (i32.const 1) (i32.const 80))))
"#;

/// Writes "→" one byte at a time.
pub const SPLIT_CHARACTER: &str = r#"
(module
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 64) "\e2\86\92\0a")
  (func $write_byte (param $ptr i32)
    (i32.store (i32.const 0) (local.get $ptr))
    (i32.store (i32.const 4) (i32.const 1))
    (drop (call $fd_write (i32.const 1) (i32.const 0) (i32.const 1) (i32.const 8))))
  (func (export "_start")
    (call $write_byte (i32.const 64))
    (call $write_byte (i32.const 65))
    (call $write_byte (i32.const 66))
    (call $write_byte (i32.const 67))))
"#;

/// Writes every argument to stdout, each followed by a NUL.
pub const ECHO_ARGS: &str = r#"
(module
  (import "wasi_snapshot_preview1" "args_sizes_get"
    (func $args_sizes_get (param i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "args_get"
    (func $args_get (param i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (func (export "_start")
    (drop (call $args_sizes_get (i32.const 0) (i32.const 4)))
    (drop (call $args_get (i32.const 1024) (i32.const 4096)))
    (i32.store (i32.const 8) (i32.const 4096))
    (i32.store (i32.const 12) (i32.load (i32.const 4)))
    (drop (call $fd_write (i32.const 1) (i32.const 8) (i32.const 1) (i32.const 16)))))
"#;

/// Writes every environment variable to stdout, each followed by a NUL.
pub const ECHO_ENV: &str = r#"
(module
  (import "wasi_snapshot_preview1" "environ_sizes_get"
    (func $environ_sizes_get (param i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "environ_get"
    (func $environ_get (param i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (func (export "_start")
    (drop (call $environ_sizes_get (i32.const 0) (i32.const 4)))
    (drop (call $environ_get (i32.const 1024) (i32.const 4096)))
    (i32.store (i32.const 8) (i32.const 4096))
    (i32.store (i32.const 12) (i32.load (i32.const 4)))
    (drop (call $fd_write (i32.const 1) (i32.const 8) (i32.const 1) (i32.const 16)))))
"#;

/// Calls `proc_exit(3)`.
pub const EXIT_3: &str = r#"
(module
  (import "wasi_snapshot_preview1" "proc_exit" (func $proc_exit (param i32)))
  (memory (export "memory") 1)
  (func (export "_start")
    (call $proc_exit (i32.const 3))))
"#;

/// Writes "before the trap\n" and then executes `unreachable`.
pub const TRAP: &str = r#"
(module
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 64) "before the trap\n")
  (func (export "_start")
    (i32.store (i32.const 0) (i32.const 64))
    (i32.store (i32.const 4) (i32.const 16))
    (drop (call $fd_write (i32.const 1) (i32.const 0) (i32.const 1) (i32.const 8)))
    unreachable))
"#;

/// Truncates `main.rb`, writes "rewritten\n" into it, then prints the file
/// back. Prints "read-only\n" if `main.rb` can't be opened for writing.
pub const REWRITE_MAIN: &str = r#"
(module
  (import "wasi_snapshot_preview1" "path_open"
    (func $path_open (param i32 i32 i32 i32 i32 i64 i64 i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "fd_read"
    (func $fd_read (param i32 i32 i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "fd_write"
    (func $fd_write (param i32 i32 i32 i32) (result i32)))
  (import "wasi_snapshot_preview1" "fd_close"
    (func $fd_close (param i32) (result i32)))
  (memory (export "memory") 1)
  (data (i32.const 64) "main.rb")
  (data (i32.const 80) "rewritten\n")
  (data (i32.const 96) "read-only\n")
  ;; main.rb relative to the first preopened directory that can open it
  (func $open (param $oflags i32) (param $rights i64) (result i32)
    (local $dir i32)
    (local.set $dir (i32.const 3))
    (block $done
      (loop $next
        (br_if $done (i32.gt_u (local.get $dir) (i32.const 4)))
        (if (i32.eqz (call $path_open
              (local.get $dir) (i32.const 0) (i32.const 64) (i32.const 7)
              (local.get $oflags) (local.get $rights) (i64.const 0)
              (i32.const 0) (i32.const 0)))
          (then (return (i32.load (i32.const 0)))))
        (local.set $dir (i32.add (local.get $dir) (i32.const 1)))
        (br $next)))
    (i32.const -1))
  (func $write (param $fd i32) (param $ptr i32) (param $len i32)
    (i32.store (i32.const 8) (local.get $ptr))
    (i32.store (i32.const 12) (local.get $len))
    (drop (call $fd_write (local.get $fd) (i32.const 8) (i32.const 1) (i32.const 16))))
  (func (export "_start")
    (local $fd i32)
    ;; O_TRUNC with FD_WRITE
    (local.set $fd (call $open (i32.const 8) (i64.const 64)))
    (if (i32.lt_s (local.get $fd) (i32.const 0))
      (then
        (call $write (i32.const 1) (i32.const 96) (i32.const 10))
        (return)))
    (call $write (local.get $fd) (i32.const 80) (i32.const 10))
    (drop (call $fd_close (local.get $fd)))
    ;; FD_READ
    (local.set $fd (call $open (i32.const 0) (i64.const 2)))
    (i32.store (i32.const 8) (i32.const 256))
    (i32.store (i32.const 12) (i32.const 64))
    (drop (call $fd_read (local.get $fd) (i32.const 8) (i32.const 1) (i32.const 16)))
    (call $write (i32.const 1) (i32.const 256) (i32.load (i32.const 16)))))
"#;

/// A perfectly valid module that WASI can't start.
pub const NO_ENTRYPOINT: &str = r#"
(module
  (memory (export "memory") 1)
  (func (export "main")))
"#;

pub fn wasm(wat: &str) -> Vec<u8> {
    wat::parse_str(wat).unwrap()
}

/// A zipped distribution with `interpreter` at `/usr/local/bin/ruby` once
/// the leading directory is stripped.
pub fn distribution(interpreter: &[u8]) -> Bytes {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::fast()));

    for dir in [
        "ruby-wasm32-wasi/",
        "ruby-wasm32-wasi/usr/",
        "ruby-wasm32-wasi/usr/local/",
        "ruby-wasm32-wasi/usr/local/bin/",
        "ruby-wasm32-wasi/usr/local/lib/",
    ] {
        let mut header = tar::Header::new_gnu();
        header.set_entry_type(tar::EntryType::Directory);
        header.set_mode(0o755);
        header.set_size(0);
        builder
            .append_data(&mut header, dir, std::io::empty())
            .unwrap();
    }

    for (path, contents) in [
        ("ruby-wasm32-wasi/usr/local/bin/ruby", interpreter),
        (
            "ruby-wasm32-wasi/usr/local/lib/prelude.rb",
            b"# frozen_string_literal: true\n".as_slice(),
        ),
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
    writer
        .start_file(HarnessConfig::default().archive.entry, options)
        .unwrap();
    writer.write_all(&tarball).unwrap();

    Bytes::from(writer.finish().unwrap().into_inner())
}
