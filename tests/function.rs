use std::{error::Error, path::Path};

mod common;
use common::{check_compilation, Expected};

const SRC_PATH: &str = "./tests/fixtures/function.py";
const EXPECTED: Expected = Expected { stdout: "5\n", stderr: "" };

#[test]
#[ignore = "requires the zig toolchain on PATH"]
fn compile_and_run_function() -> Result<(), Box<dyn Error>> {
    check_compilation(Path::new(SRC_PATH), EXPECTED)
}
