use crate::{
    Expression, OpPrecedence,
    writer::{Context, SqlWriter},
};

/// Pattern match, `expression [NOT] [I]LIKE pattern [ESCAPE escape]`.
#[derive(Debug)]
pub struct Like<E: Expression> {
    pub expression: E,
    pub pattern: String,
    pub escape: Option<char>,
    pub negated: bool,
    pub case_insensitive: bool,
}

impl<E: Expression> OpPrecedence for Like<E> {
    fn precedence(&self, writer: &dyn SqlWriter) -> i32 {
        writer.expression_like_precedence()
    }
}

impl<E: Expression> Expression for Like<E> {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_expression_like(
            context,
            out,
            &Like {
                expression: &self.expression as &dyn Expression,
                pattern: self.pattern.clone(),
                escape: self.escape,
                negated: self.negated,
                case_insensitive: self.case_insensitive,
            },
        )
    }
}
