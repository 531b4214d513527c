use crate::model::Literal;
use crate::predicate::CompareOp;

/// Parameterised SQL text
///
/// `params[i]` binds placeholder `?{first_param + i}`.
#[derive(Debug, Clone, PartialEq)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<Literal>,
}

/// Double-quote an identifier, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

pub(crate) struct SqlWriter<'a> {
    sql: String,
    params: Vec<Literal>,
    first_param: usize,
    qualifier: Option<&'a str>,
}

impl<'a> SqlWriter<'a> {
    pub(crate) fn new(qualifier: Option<&'a str>, first_param: usize) -> Self {
        Self {
            sql: String::new(),
            params: Vec::new(),
            first_param,
            qualifier,
        }
    }

    /// `<qualifier>."field" <op> ?N`
    pub(crate) fn comparison(&mut self, field: &str, op: CompareOp, value: &Literal) {
        if let Some(q) = self.qualifier {
            self.sql.push_str(q);
            self.sql.push('.');
        }
        self.sql.push_str(&quote_ident(field));
        self.sql.push(' ');
        self.sql.push_str(op.sql());
        self.sql.push(' ');
        let n = self.first_param + self.params.len();
        self.sql.push_str(&format!("?{}", n));
        self.params.push(value.clone());
    }

    pub(crate) fn keyword(&mut self, word: &str) {
        self.sql.push(' ');
        self.sql.push_str(word);
        self.sql.push(' ');
    }

    pub(crate) fn open(&mut self) {
        self.sql.push('(');
    }

    pub(crate) fn close(&mut self) {
        self.sql.push(')');
    }

    pub(crate) fn finish(self) -> SqlFragment {
        SqlFragment {
            sql: self.sql,
            params: self.params,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_doubles_quotes() {
        assert_eq!(quote_ident("amount"), "\"amount\"");
        assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
    }

    #[test]
    fn test_placeholders_continue_from_first_param() {
        let mut w = SqlWriter::new(Some("t"), 3);
        w.comparison("a", CompareOp::Eq, &Literal::Integer(1));
        w.keyword("AND");
        w.comparison("b", CompareOp::Lt, &Literal::Text("x".into()));
        let frag = w.finish();
        assert_eq!(frag.sql, "t.\"a\" = ?3 AND t.\"b\" < ?4");
        assert_eq!(frag.params.len(), 2);
    }
}
