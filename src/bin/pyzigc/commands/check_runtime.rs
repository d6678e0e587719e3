use log::info;
use pyzig::build;

pub fn check_runtime() -> Result<(), pyzig::TranspileError> {
    let path = build::find_runtime()?;
    info!("runtime library found at {}", path.display());
    println!("runtime library found at {}", path.display());
    Ok(())
}
