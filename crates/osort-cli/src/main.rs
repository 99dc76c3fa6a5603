//! Command-line driver for `osort` (spec.md §6): walks the given paths for
//! `.py` files, sorts each one in place (or just reports drift under
//! `--check`), and prints a per-file and summary report.

use std::cell::RefCell;
use std::fmt::Write as _;
use std::fs;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::rc::Rc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use osort::{Policy, Position, Source, SortOptions};

const VERSION: &str = env!("CARGO_PKG_VERSION");

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    run(&args, &mut std::io::stdout(), &mut std::io::stderr())
}

fn run(args: &[String], stdout: &mut dyn std::io::Write, stderr: &mut dyn std::io::Write) -> ExitCode {
    let mut check = false;
    let mut sort_fields = false;
    let mut paths: Vec<String> = Vec::new();

    for arg in args {
        match arg.as_str() {
            "--check" => check = true,
            "--sort-fields" => sort_fields = true,
            "--version" => {
                let _ = writeln!(stdout, "osort {VERSION}");
                return ExitCode::SUCCESS;
            }
            "--help" | "-h" => {
                let _ = writeln!(
                    stderr,
                    "usage: osort [--check] [--sort-fields] [--version] [--help] path [path ...]"
                );
                return ExitCode::SUCCESS;
            }
            other => paths.push(other.to_owned()),
        }
    }

    let files = discover(&paths);
    if files.is_empty() {
        let _ = writeln!(stderr, "No files are present to be sorted. Nothing to do.");
        return ExitCode::SUCCESS;
    }

    let mut resorted = 0usize;
    let mut unchanged = 0usize;
    let mut not_sortable = 0usize;

    let outcomes = process_all(&files, check, sort_fields);
    for (path, outcome) in files.iter().zip(outcomes) {
        match outcome {
            FileOutcome::Unchanged => unchanged += 1,
            FileOutcome::Resorted => {
                resorted += 1;
                if check {
                    let _ = writeln!(stderr, "ERROR: {} is incorrectly sorted", escape_path(path));
                } else {
                    let _ = writeln!(stderr, "Sorting {}", escape_path(path));
                }
            }
            FileOutcome::NotSortable { errors } => {
                not_sortable += 1;
                for line in errors {
                    let _ = writeln!(stderr, "ERROR: {line}");
                }
            }
        }
    }

    let _ = writeln!(stderr, "{}", summarize(resorted, unchanged, not_sortable, check));

    if not_sortable > 0 || (check && resorted > 0) {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

enum FileOutcome {
    Unchanged,
    Resorted,
    NotSortable { errors: Vec<String> },
}

/// Caps how many files sort concurrently; `osort::sort` takes no
/// process-wide state, so there's nothing to gain from unbounded
/// parallelism past the machine's actual core count.
const MAX_WORKERS: usize = 8;

/// Sorts `files` across a small pool of `std::thread` workers pulling
/// from a shared index, then hands results back in `files`' original
/// (alphabetical, per-directory) order so the report reads the same as
/// a sequential run would.
fn process_all(files: &[PathBuf], check: bool, sort_fields: bool) -> Vec<FileOutcome> {
    let worker_count = std::thread::available_parallelism()
        .map_or(1, std::num::NonZeroUsize::get)
        .min(MAX_WORKERS)
        .min(files.len())
        .max(1);

    let next = AtomicUsize::new(0);
    let results: Mutex<Vec<Option<FileOutcome>>> = Mutex::new((0..files.len()).map(|_| None).collect());

    std::thread::scope(|scope| {
        for _ in 0..worker_count {
            scope.spawn(|| loop {
                let index = next.fetch_add(1, Ordering::SeqCst);
                if index >= files.len() {
                    break;
                }
                let outcome = process_one(&files[index], check, sort_fields);
                results.lock().expect("worker thread panicked while holding the results lock")[index] = Some(outcome);
            });
        }
    });

    results
        .into_inner()
        .expect("no worker thread panicked while holding the results lock")
        .into_iter()
        .map(|outcome| outcome.expect("every index in 0..files.len() was claimed by a worker"))
        .collect()
}

fn process_one(path: &Path, check: bool, sort_fields: bool) -> FileOutcome {
    if !path.exists() {
        return FileOutcome::NotSortable {
            errors: vec![format!("{} does not exist", escape_path(path))],
        };
    }

    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(_) => {
            return FileOutcome::NotSortable {
                errors: vec![format!("{} is not readable", escape_path(path))],
            };
        }
    };

    let errors = Rc::new(RefCell::new(Vec::<String>::new()));
    let display = escape_path(path);

    let options = SortOptions {
        sort_fields,
        on_unknown_encoding: Policy::custom({
            let errors = Rc::clone(&errors);
            let display = display.clone();
            Box::new(move |err: &osort::UnknownEncodingError| {
                errors.borrow_mut().push(format!("unknown encoding, '{}', in {display}", err.encoding));
            }) as Box<dyn Fn(&osort::UnknownEncodingError)>
        }),
        on_decoding_error: Policy::custom({
            let errors = Rc::clone(&errors);
            let display = display.clone();
            Box::new(move |err: &osort::DecodingError| {
                errors.borrow_mut().push(format!("encoding error in {display}: {}", err.message));
            }) as Box<dyn Fn(&osort::DecodingError)>
        }),
        on_parse_error: Policy::custom({
            let errors = Rc::clone(&errors);
            let display = display.clone();
            Box::new(move |err: &osort::ParseError| {
                errors.borrow_mut().push(format!("syntax error in {display}: {}", describe_position(&err.position)));
            }) as Box<dyn Fn(&osort::ParseError)>
        }),
        on_unresolved: Policy::custom({
            let errors = Rc::clone(&errors);
            let display = display.clone();
            Box::new(move |err: &osort::ResolutionError| {
                errors.borrow_mut().push(format!(
                    "unresolved dependency '{}' in {display}: {}",
                    err.name,
                    describe_position(&err.position)
                ));
            }) as Box<dyn Fn(&osort::ResolutionError)>
        }),
        on_wildcard_import: Policy::custom({
            let errors = Rc::clone(&errors);
            let display = display.clone();
            Box::new(move |err: &osort::WildcardImportError| {
                errors
                    .borrow_mut()
                    .push(format!("can't sort past wildcard import in {display}: {}", describe_position(&err.position)));
            }) as Box<dyn Fn(&osort::WildcardImportError)>
        }),
    };

    let result = osort::sort(Source::Bytes(bytes.clone()), &options).expect("custom policies never raise");

    if !errors.borrow().is_empty() {
        return FileOutcome::NotSortable {
            errors: errors.borrow().clone(),
        };
    }

    let Source::Bytes(sorted_bytes) = result else {
        unreachable!("bytes in, bytes out");
    };

    if sorted_bytes == bytes {
        return FileOutcome::Unchanged;
    }

    if !check {
        if fs::write(path, &sorted_bytes).is_err() {
            return FileOutcome::NotSortable {
                errors: vec![format!("{display} is not readable")],
            };
        }
    }

    FileOutcome::Resorted
}

fn describe_position(position: &Position) -> String {
    format!("line {}, column {}", position.line, position.column)
}

/// Identity passthrough: the original tool's path-escaping helper isn't
/// available to mirror exactly, and every path this CLI reports on is
/// already a plain filesystem path with no embedded control characters.
fn escape_path(path: &Path) -> String {
    path.display().to_string()
}

fn discover(paths: &[String]) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for raw in paths {
        let path = PathBuf::from(raw);
        if path.is_dir() {
            let mut found: Vec<PathBuf> = walkdir::WalkDir::new(&path)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|entry| entry.file_type().is_file())
                .map(walkdir::DirEntry::into_path)
                .filter(|candidate| candidate.extension().is_some_and(|ext| ext == "py"))
                .collect();
            found.sort();
            out.extend(found);
        } else {
            out.push(path);
        }
    }
    out
}

fn summarize(resorted: usize, unchanged: usize, not_sortable: usize, check: bool) -> String {
    let mut clauses = Vec::new();
    if resorted > 0 {
        clauses.push(format!("{resorted} {} {} resorted", noun(resorted), was_were(resorted, check)));
    }
    if unchanged > 0 {
        clauses.push(format!("{unchanged} {} {} left unchanged", noun(unchanged), was_were(unchanged, check)));
    }
    if not_sortable > 0 {
        clauses.push(format!(
            "{not_sortable} {} {} not sortable",
            noun(not_sortable),
            was_were(not_sortable, check)
        ));
    }

    let mut out = String::new();
    for (index, clause) in clauses.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{clause}");
    }
    out
}

fn noun(count: usize) -> &'static str {
    if count == 1 { "file" } else { "files" }
}

fn was_were(count: usize, check: bool) -> &'static str {
    if check {
        "would be"
    } else if count == 1 {
        "was"
    } else {
        "were"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_pluralizes_counts() {
        assert_eq!(summarize(0, 3, 0, false), "3 files were left unchanged");
        assert_eq!(summarize(1, 0, 0, false), "1 file was resorted");
        assert_eq!(summarize(1, 2, 0, true), "1 file would be resorted, 2 files would be left unchanged");
        assert_eq!(summarize(0, 0, 1, false), "1 file was not sortable");
        assert_eq!(summarize(0, 0, 3, true), "3 files would not be sortable");
    }

    #[test]
    fn run_reports_already_sorted_file_unchanged() {
        let dir = tempfile_dir();
        let file = dir.join("good.py");
        fs::write(&file, b"def _private():\n    pass\n\n\ndef public():\n    return _private()\n").unwrap();

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let code = run(&[dir.display().to_string()], &mut stdout, &mut stderr);

        assert_eq!(code, ExitCode::SUCCESS);
        assert_eq!(String::from_utf8(stderr).unwrap(), "1 file was left unchanged\n");
        fs::remove_dir_all(&dir).ok();
    }

    fn tempfile_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("osort-cli-test-{:p}", &0u8));
        fs::create_dir_all(&dir).unwrap();
        dir
    }
}
