//! LDAP-style filter parsing and compilation
//!
//! This module turns a parenthesized filter expression into a [`Predicate`]
//! over a record type.
//!
//! # Syntax
//!
//! ```text
//! filter      := '(' group | comparison ')'
//! group       := ('&' | '|' | '!') filter+
//! comparison  := property operator value
//! operator    := '=' | '<=' | '>=' | '<' | '>' | '~='
//! value       := letters, digits, '*' and whitespace
//! ```
//!
//! Property names and values are matched ignoring case.
//!
//! # Examples
//!
//! ```text
//! (sn=doe)                                # equality, ignoring case
//! (sn=*)                                  # sn is not null
//! (!(sn=*))                               # sn is null
//! (job=dirige*)                           # wildcard, through the like strategy
//! (sn~=vandenbussche)                     # phonetic, through the approximate strategy
//! (!(version<=5))                         # version > 5
//! (&(whenchanged=*)(|(sn=doe)(givenname=john)))
//! ```

pub mod compiler;
pub mod error;
pub mod expr;
pub mod extract;
pub mod resolver;
pub mod validator;

pub use compiler::{FilterCompiler, Predicate, compile};
pub use error::{EvalError, FilterError};
pub use expr::{Expr, NumericOp, compile_comparison};
pub use extract::{AtomicComparison, Extracted, Extraction, Operator, extract};
pub use resolver::{GroupOperator, MAX_DEPTH, Node};
pub use validator::validate;
