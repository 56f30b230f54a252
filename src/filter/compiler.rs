use super::error::{EvalError, FilterError};
use super::expr::{Expr, compile_comparison};
use super::extract::extract;
use super::resolver::{assign_negation, parse_skeleton, resolve};
use super::validator::validate;
use crate::options::{self, Options};
use crate::record::{Record, RecordType, Schema};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Compiled filter over records of type `R`.
///
/// Holds the options snapshot it was compiled with, so reconfiguring the
/// process-wide options later does not change how it evaluates.
pub struct Predicate<R: ?Sized> {
    filter: String,
    expr: Expr,
    options: Arc<Options>,
    record: PhantomData<fn(&R) -> bool>,
}

impl<R: ?Sized> Clone for Predicate<R> {
    fn clone(&self) -> Self {
        Self {
            filter: self.filter.clone(),
            expr: self.expr.clone(),
            options: Arc::clone(&self.options),
            record: PhantomData,
        }
    }
}

impl<R: ?Sized> fmt::Debug for Predicate<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Predicate")
            .field("filter", &self.filter)
            .field("expr", &self.expr)
            .finish()
    }
}

impl<R: Record + ?Sized> Predicate<R> {
    pub fn evaluate(&self, record: &R) -> Result<bool, EvalError> {
        self.expr.evaluate(record, &self.options)
    }
}

impl<R: ?Sized> Predicate<R> {
    /// The filter text this predicate was compiled from
    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// The abstract tree, for providers that lower it themselves
    pub fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn into_expr(self) -> Expr {
        self.expr
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn render(&self) -> String {
        self.expr.render(&self.options)
    }
}

/// Turns filter text into predicates with one options snapshot
#[derive(Debug, Clone)]
pub struct FilterCompiler {
    options: Arc<Options>,
}

impl Default for FilterCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl FilterCompiler {
    /// Compiler bound to the current process-wide options
    pub fn new() -> Self {
        Self {
            options: options::current(),
        }
    }

    pub fn with_options(options: impl Into<Arc<Options>>) -> Self {
        Self {
            options: options.into(),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn compile<R: RecordType + ?Sized>(&self, filter: &str) -> Result<Predicate<R>, FilterError> {
        self.compile_with_schema(filter, &Schema::of::<R>())
    }

    /// Compile against an explicit schema, for records whose fields are only
    /// known at run time
    pub fn compile_with_schema<R: Record + ?Sized>(
        &self,
        filter: &str,
        schema: &Schema,
    ) -> Result<Predicate<R>, FilterError> {
        let expr = self.compile_expr(filter, schema)?;
        Ok(Predicate {
            filter: filter.to_string(),
            expr,
            options: Arc::clone(&self.options),
            record: PhantomData,
        })
    }

    /// validate → extract → group skeleton → leaf fragments → single root
    pub fn compile_expr(&self, filter: &str, schema: &Schema) -> Result<Expr, FilterError> {
        validate(filter)?;

        let mut extraction = extract(filter, schema)?;
        let skeleton = parse_skeleton(&extraction, filter)?;
        assign_negation(&skeleton, false, &mut extraction);

        let leaves = extraction
            .comparisons
            .iter()
            .map(|extracted| compile_comparison(&extracted.comparison, &self.options))
            .collect();
        let expr = resolve(&skeleton, leaves, filter)?;

        log::trace!("compiled {} into {}", filter, expr.render(&self.options));
        Ok(expr)
    }
}

/// Compile with the current process-wide options
pub fn compile<R: RecordType + ?Sized>(filter: &str) -> Result<Predicate<R>, FilterError> {
    FilterCompiler::new().compile(filter)
}
