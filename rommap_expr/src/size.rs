use std::collections::HashMap;

use crate::{evaluate, SizeError};

/// The variable name bound to the byte at `position` in the enclosing run.
pub fn arg_name(position: usize) -> String {
    format!("ARG_{:02}", position)
}

/// Resolve a schema size string against the bytes consumed so far in the
/// enclosing run.
///
/// `run[n]` is bound as `ARG_NN`, which is how a field's size can depend on
/// bytes read earlier in the same run (length-prefixed text, variable-width
/// records). A `None` or blank size fails with [SizeError::Unresolved];
/// evaluation failures and negative results fail with the offending
/// expression attached.
pub fn resolve_size(size: Option<&str>, run: &[u8]) -> Result<usize, SizeError> {
    let expr = match size {
        Some(expr) if !expr.trim().is_empty() => expr,
        _ => return Err(SizeError::Unresolved),
    };

    let mut vars = HashMap::new();
    for (position, byte) in run.iter().enumerate() {
        vars.insert(arg_name(position), i64::from(*byte));
    }

    let value = evaluate(expr, &vars).map_err(|error| SizeError::InvalidExpression {
        expr: expr.to_string(),
        error,
    })?;

    if value < 0 {
        return Err(SizeError::NegativeSize {
            expr: expr.to_string(),
            value,
        });
    }

    Ok(value as usize)
}
