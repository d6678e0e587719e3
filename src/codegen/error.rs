use std::fmt::Display;

/// Error raised while emitting target-language source text. This is
/// distinct from [`crate::ast::LowerError`]: by the time code generation
/// runs, the AST is already inside the accepted subset — these errors are
/// the emitter's own, narrower restrictions (spec §9 O-2, and the escape
/// table's rejection of embedded NUL bytes).
#[derive(Debug, Clone)]
pub enum CodegenError {
    /// A fallible expression (e.g. a string literal) was passed as an
    /// argument to a non-`print` call. Argument fallibility is not
    /// propagated through general calls; see spec §9 O-2.
    FallibleArgumentInCall,
    /// A string literal contains an embedded NUL byte, which cannot survive
    /// interpolation into a Zig string literal.
    NulByteInStringLiteral,
}

impl Display for CodegenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodegenError::FallibleArgumentInCall => {
                write!(f, "unsupported construct 'Call': fallible argument in general call")
            }
            CodegenError::NulByteInStringLiteral => {
                write!(f, "unsupported construct 'Constant': string literal contains a NUL byte")
            }
        }
    }
}

impl std::error::Error for CodegenError {}
