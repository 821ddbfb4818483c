use crate::{
    Expression, OpPrecedence,
    writer::{Context, SqlWriter},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    ASC,
    DESC,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ordered<E: Expression> {
    pub order: Order,
    pub expression: E,
}

impl<E: Expression> OpPrecedence for Ordered<E> {
    fn precedence(&self, writer: &dyn SqlWriter) -> i32 {
        self.expression.precedence(writer)
    }
}

impl<E: Expression> Expression for Ordered<E> {
    fn write_query(&self, writer: &dyn SqlWriter, context: &mut Context, out: &mut String) {
        writer.write_expression_ordered(
            context,
            out,
            &Ordered {
                order: self.order,
                expression: &self.expression as &dyn Expression,
            },
        )
    }
}
