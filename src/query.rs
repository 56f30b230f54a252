//! Filtering record sequences with a filter string.

use crate::filter::{EvalError, FilterCompiler, FilterError, Predicate};
use crate::record::RecordType;
use std::borrow::Borrow;

/// Iterator adaptor yielding the records a predicate selects.
///
/// Evaluation errors are yielded in place of the record that caused them.
pub struct Filtered<I, R: ?Sized> {
    source: I,
    predicate: Predicate<R>,
}

impl<I, R> Filtered<I, R>
where
    R: ?Sized,
{
    pub fn predicate(&self) -> &Predicate<R> {
        &self.predicate
    }
}

impl<I, R> Iterator for Filtered<I, R>
where
    I: Iterator,
    I::Item: Borrow<R>,
    R: RecordType + ?Sized,
{
    type Item = Result<I::Item, EvalError>;

    fn next(&mut self) -> Option<Self::Item> {
        for item in self.source.by_ref() {
            match self.predicate.evaluate(item.borrow()) {
                Ok(true) => return Some(Ok(item)),
                Ok(false) => continue,
                Err(err) => return Some(Err(err)),
            }
        }
        None
    }
}

/// Filter any iterator of records with an LDAP-style filter
pub trait FilterExt: Iterator + Sized {
    /// Keep the records matching `filter`, compiled with the current
    /// process-wide options
    fn by_ldap_filter<R>(self, filter: &str) -> Result<Filtered<Self, R>, FilterError>
    where
        R: RecordType + ?Sized,
        Self::Item: Borrow<R>,
    {
        let predicate = FilterCompiler::new().compile::<R>(filter)?;
        Ok(Filtered {
            source: self,
            predicate,
        })
    }

    /// Compile `filter` and hand the source and the predicate to `search`
    fn by_ldap_filter_with<R, T, F>(self, filter: &str, search: F) -> Result<T, FilterError>
    where
        R: RecordType + ?Sized,
        F: FnOnce(Self, Predicate<R>) -> T,
    {
        let predicate = FilterCompiler::new().compile::<R>(filter)?;
        Ok(search(self, predicate))
    }
}

impl<I: Iterator> FilterExt for I {}
