use std::{
    error::Error,
    io,
    path::Path,
    process::{Command, Output},
    str,
};

const PYZIGC_PATH: &str = "./target/debug/pyzigc";
const OUTPUT_PATH: &str = "./target/tmp/pyzig-tests";

pub struct Expected<'a> {
    pub stdout: &'a str,
    pub stderr: &'a str,
}

impl<'a> Expected<'a> {
    fn assert_matches(self, output: &Output) -> Result<(), Box<dyn Error>> {
        assert_eq!(str::from_utf8(&output.stdout)?, self.stdout);
        assert_eq!(str::from_utf8(&output.stderr)?, self.stderr);
        Ok(())
    }
}

fn run_compiler(src_path: &Path, out_path: &Path) -> Result<Output, io::Error> {
    Command::new(PYZIGC_PATH).arg("build").arg(src_path).arg(out_path).output()
}

pub fn check_compilation(src_path: &Path, expected: Expected) -> Result<(), Box<dyn Error>> {
    std::fs::create_dir_all(OUTPUT_PATH)?;
    let out_path = Path::new(OUTPUT_PATH).join(src_path.file_stem().unwrap());

    let compile_output = run_compiler(src_path, &out_path)?;
    let compile_stderr = str::from_utf8(&compile_output.stderr)?;

    assert!(
        compile_output.status.success(),
        "pyzigc exited with status {:?}: {compile_stderr}",
        compile_output.status.code()
    );

    let output = Command::new(&out_path).output()?;

    expected.assert_matches(&output)?;
    assert!(
        output.status.success(),
        "compiled program exited with status {:?}",
        output.status.code()
    );

    Ok(())
}

/// Asserts that transpilation of `src_path` fails and that `pyzigc`'s
/// stderr mentions `expected_fragment` (e.g. the rejected node kind).
pub fn check_rejected(src_path: &Path, expected_fragment: &str) -> Result<(), Box<dyn Error>> {
    std::fs::create_dir_all(OUTPUT_PATH)?;
    let out_path = Path::new(OUTPUT_PATH).join(src_path.file_stem().unwrap());

    let compile_output = run_compiler(src_path, &out_path)?;
    let compile_stderr = str::from_utf8(&compile_output.stderr)?;

    assert!(!compile_output.status.success(), "expected pyzigc to reject {}", src_path.display());
    assert!(
        compile_stderr.contains(expected_fragment),
        "expected stderr to mention '{expected_fragment}', got: {compile_stderr}"
    );

    Ok(())
}
