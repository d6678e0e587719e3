use std::fs;

use log::{error, info};
use pyzig::{analysis::Analysis, ast, build, codegen};

use crate::cli::BuildArgs;

pub fn build_executable(args: &BuildArgs) -> Result<(), pyzig::TranspileError> {
    let file = fs::canonicalize(&args.file).map_err(|e| ast::ParseError::Io {
        path: args.file.clone(),
        source: e,
    })?;

    let parsed = ast::parse_file(&file)?;

    if args.dump_ast {
        info!("lowered AST:\n{:#?}", parsed.ast);
    }

    let analysis = Analysis::run(&parsed.ast);

    if args.dump_analysis {
        info!("analysis:\n{:#?}", analysis);
    }

    let generated = codegen::generate(&parsed.ast, &analysis)?;

    match build::compile(&generated, Some(&args.output), args.keep_temp) {
        Ok(path) => {
            info!("compiled executable at {}", path.display());
            Ok(())
        }
        Err(e) => {
            error!("{e}");
            Err(e.into())
        }
    }
}
