use std::{error::Error, path::Path};

mod common;
use common::check_rejected;

#[test]
fn for_loop_is_rejected_with_its_node_kind() -> Result<(), Box<dyn Error>> {
    check_rejected(Path::new("./tests/fixtures/unsupported_for_loop.py"), "For")
}
