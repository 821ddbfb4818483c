pub fn separated_by<T, F>(
    out: &mut String,
    values: impl IntoIterator<Item = T>,
    mut f: F,
    separator: &str,
) where
    F: FnMut(&mut String, T),
{
    let mut len = out.len();
    for v in values {
        if out.len() > len {
            out.push_str(separator);
        }
        len = out.len();
        f(out, v);
    }
}

/// Longest prefix of `value` not exceeding `max` bytes and ending on a char boundary.
pub fn truncate_at_char_boundary(value: &str, max: usize) -> &str {
    if value.len() <= max {
        return value;
    }
    let mut end = max;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    &value[..end]
}

/// Escape the `LIKE` wildcards `%` and `_` (and the escape character itself) with `\`.
pub fn escape_like_pattern(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 4);
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[macro_export]
macro_rules! possibly_parenthesized {
    ($buff:ident, $cond:expr, $v:expr) => {
        if $cond {
            $buff.push('(');
            $v;
            $buff.push(')');
        } else {
            $v;
        }
    };
}

#[macro_export]
macro_rules! truncate_long {
    ($query:expr) => {
        format_args!(
            "{}{}",
            $crate::truncate_at_char_boundary(&$query, 497).trim_end(),
            if $query.len() > 497 { "..." } else { "" },
        )
    };
}
