//! The build driver: turns emitted Zig source text into a standalone
//! executable by shelling out to `zig build-exe`.
//!
//! See spec §4.4 and the runtime-discovery rules in `SPEC_FULL.md`.
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::process::Command;

const RUNTIME_IMPORT_MARKER: &str = "@import(\"runtime\")";
const STD_IMPORT_LINE: &str = "const std = @import(\"std\");";

/// Error raised while locating the runtime source file or invoking `zig`.
#[derive(Debug)]
pub enum BuildError {
    RuntimeNotFound { searched: Vec<PathBuf> },
    CompilationFailed { stderr: String },
    BinaryMissing,
    Io(std::io::Error),
}

impl Display for BuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildError::RuntimeNotFound { searched } => {
                writeln!(f, "runtime library not found. searched:")?;
                for path in searched {
                    writeln!(f, "  - {}", path.display())?;
                }
                Ok(())
            }
            BuildError::CompilationFailed { stderr } => write!(f, "zig compilation failed:\n{stderr}"),
            BuildError::BinaryMissing => write!(f, "compilation succeeded but binary not found"),
            BuildError::Io(e) => write!(f, "i/o error during build: {e}"),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for BuildError {
    fn from(e: std::io::Error) -> Self {
        BuildError::Io(e)
    }
}

/// Candidate locations for the runtime source file, in search order.
/// `$PYZIG_RUNTIME` is checked first, ahead of the installed and
/// repo-relative layouts.
fn runtime_search_paths() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(path) = std::env::var("PYZIG_RUNTIME") {
        candidates.push(PathBuf::from(path));
    }

    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            candidates.push(exe_dir.join("../share/pyzig/runtime.zig"));
        }
    }

    candidates.push(PathBuf::from("./runtime/runtime.zig"));
    candidates
}

/// Finds the runtime source file without compiling anything. Used by both
/// [`compile`] and the `check-runtime` CLI subcommand.
pub fn find_runtime() -> Result<PathBuf, BuildError> {
    let candidates = runtime_search_paths();
    for candidate in &candidates {
        if candidate.exists() {
            log::info!("using runtime at {}", candidate.display());
            return Ok(candidate.clone());
        }
    }
    Err(BuildError::RuntimeNotFound { searched: candidates })
}

/// Inlines the runtime source ahead of `zig_code`, stripping the
/// generated code's own `@import("runtime")` and leading `std` import
/// lines (the runtime source already carries both) and removing the
/// `runtime.` qualifier from call sites, since everything now lives in
/// one compilation unit.
fn inline_runtime(zig_code: &str, runtime_source: &str) -> String {
    let mut kept_lines = Vec::new();
    let mut emitted_any = false;
    for line in zig_code.lines() {
        if line.contains(RUNTIME_IMPORT_MARKER) {
            continue;
        }
        if !emitted_any && line.trim_start().starts_with(STD_IMPORT_LINE) {
            continue;
        }
        emitted_any = true;
        kept_lines.push(line.replace("runtime.", ""));
    }
    format!("{runtime_source}\n\n{}\n", kept_lines.join("\n"))
}

/// Compiles `zig_code` to a standalone executable at `output_path`.
///
/// When `zig_code` references the runtime, its source is located via
/// [`find_runtime`] and inlined verbatim. The combined source is written
/// into a fresh `tempfile` directory, compiled with
/// `zig build-exe -O ReleaseFast`, and the resulting binary is copied to
/// `output_path` if given, or left at its temp-dir path otherwise. The
/// temp directory (and therefore the intermediate binary, if `output_path`
/// was `None`) is deleted when the returned guard equivalent — the
/// directory itself — goes out of scope, unless `keep_temp` is set.
pub fn compile(zig_code: &str, output_path: Option<&Path>, keep_temp: bool) -> Result<PathBuf, BuildError> {
    let final_source = if zig_code.contains(RUNTIME_IMPORT_MARKER) {
        let runtime_path = find_runtime()?;
        let runtime_source = std::fs::read_to_string(&runtime_path)?;
        inline_runtime(zig_code, &runtime_source)
    } else {
        zig_code.to_owned()
    };

    let tmp_dir = tempfile::Builder::new().prefix("pyzigc-").tempdir()?;
    let zig_file = tmp_dir.path().join("main.zig");
    std::fs::write(&zig_file, &final_source)?;

    let zig_file_str = zig_file.to_string_lossy();
    let argv = ["build-exe", zig_file_str.as_ref(), "-O", "ReleaseFast"];
    log::info!("running: zig {}", argv.join(" "));

    let output = Command::new("zig").args(argv).current_dir(tmp_dir.path()).output()?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        log::error!("{stderr}");
        return Err(BuildError::CompilationFailed { stderr });
    }

    let compiled_binary = tmp_dir.path().join("main");
    if !compiled_binary.exists() {
        return Err(BuildError::BinaryMissing);
    }

    let final_path = match output_path {
        Some(dest) => {
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::copy(&compiled_binary, dest)?;
            dest.to_path_buf()
        }
        None => {
            let persisted = std::env::temp_dir().join("pyzigc-output");
            std::fs::copy(&compiled_binary, &persisted)?;
            persisted
        }
    };

    if keep_temp {
        let kept = tmp_dir.keep();
        log::info!("kept temporary build directory at {}", kept.display());
    }

    Ok(final_path)
}
