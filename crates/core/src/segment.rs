//! Expression tokenizer: `@`-macro expansion and field splitting.

use crate::error::CronError;

/// Macro expressions the tokenizer expands to plain field form before
/// splitting. Matching is case-insensitive.
const MACROS: [(&str, &str); 12] = [
    ("@yearly", "0 0 1 1 *"),
    ("@annually", "0 0 1 1 *"),
    ("@monthly", "0 0 1 * *"),
    ("@weekly", "0 0 * * 0"),
    ("@daily", "0 0 * * *"),
    ("@midnight", "0 0 * * *"),
    ("@hourly", "0 * * * *"),
    ("@always", "* * * * *"),
    ("@5minutes", "*/5 * * * *"),
    ("@10minutes", "*/10 * * * *"),
    ("@15minutes", "*/15 * * * *"),
    ("@30minutes", "*/30 * * * *"),
];

/// Tokenize `expr` into its 5 or 6 positional field strings.
///
/// Positions: `0=minute 1=hour 2=day-of-month 3=month 4=day-of-week`,
/// with an optional `5=year`.
pub fn segments(expr: &str) -> Result<Vec<String>, CronError> {
    let expr = expr.trim();
    let expanded = match MACROS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(expr))
    {
        Some((_, plain)) => plain,
        None => expr,
    };

    let fields: Vec<String> = expanded.split_whitespace().map(str::to_string).collect();
    if fields.len() != 5 && fields.len() != 6 {
        return Err(CronError::Segments(expanded.to_string(), fields.len()));
    }
    Ok(fields)
}
