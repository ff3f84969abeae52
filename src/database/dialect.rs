use serde_json::Value;

/// SQL dialect collaborator: placeholders, identifier quoting and trace rendering
pub trait Dialector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Placeholder for the 1-based bind variable `index`
    fn bind_var(&self, index: usize) -> String;

    fn quote(&self, ident: &str) -> String;

    /// Render `sql` with `vars` inlined, for logs only
    fn explain(&self, sql: &str, vars: &[Value]) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    fn literal(value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            Value::String(s) => format!("'{}'", s.replace('\'', "''")),
            other => format!("'{}'", other.to_string().replace('\'', "''")),
        }
    }
}

impl Dialector for PostgresDialect {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn bind_var(&self, index: usize) -> String {
        format!("${}", index)
    }

    /// Quote SQL identifier to prevent injection
    fn quote(&self, ident: &str) -> String {
        format!("\"{}\"", ident.replace('"', "\"\""))
    }

    fn explain(&self, sql: &str, vars: &[Value]) -> String {
        let mut out = String::with_capacity(sql.len());
        let mut chars = sql.char_indices().peekable();

        while let Some((_, c)) = chars.next() {
            if c != '$' {
                out.push(c);
                continue;
            }

            let mut digits = String::new();
            while let Some(&(_, d)) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                digits.push(d);
                chars.next();
            }

            let var = digits
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| vars.get(i));
            match var {
                Some(value) => out.push_str(&Self::literal(value)),
                None => {
                    out.push('$');
                    out.push_str(&digits);
                }
            }
        }

        out
    }
}
