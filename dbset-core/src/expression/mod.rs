mod between;
mod binary_op;
mod expression;
mod like;
mod op_precedence;
mod operand;
mod ordered;

pub use between::*;
pub use binary_op::*;
pub use expression::*;
pub use like::*;
pub use op_precedence::*;
pub use operand::*;
pub use ordered::*;
