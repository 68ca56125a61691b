//! Readers for the coverage, code metrics, and findings formats
//!
//! Each input format has a parser that turns one document into a flat
//! [`ParsedMetricsDocument`]. Parsers never talk to each other and hold no
//! shared mutable state, so independent documents are parsed concurrently.
//!
//! # Implementation Model
//!
//! - [`CoverageParser`] reads OpenCover XML, deriving namespaces and types
//!   from CLR full names.
//! - [`StructureParser`] reads Roslyn code metrics XML, an explicit
//!   assembly/namespace/type/member tree.
//! - [`FindingsParser`] reads SARIF 2.1.0 JSON and counts analyzer results per
//!   symbol.
//!
//! All three implement [`MetricsParser`]: a synchronous `parse_content` over a
//! string plus a provided async `parse` that reads the file and observes a
//! [`Cancellation`] signal before and after the document.
//!
//! The [`Collector`] fans documents out with `join_all`, bounded by a
//! [`Throttler`]. A malformed document fails the whole collection with the
//! document path in the error.

mod cancellation;
mod collector;
mod coverage;
mod findings;
mod structure;
mod throttler;
mod xml;

pub use cancellation::Cancellation;
pub use collector::{Collector, InputDocument};
pub use coverage::CoverageParser;
pub use findings::{FindingsParser, RuleDescriptor, metric_for_rule};
pub use structure::StructureParser;
pub use throttler::Throttler;

use crate::Result;
use crate::model::{ParsedMetricsDocument, ParserFamily};
use camino::Utf8Path;
use core::future::Future;
use ohno::IntoAppError;

const LOG_TARGET: &str = "   parsers";

/// A reader for one input format.
pub trait MetricsParser: Sync {
    /// The family every document produced by this parser belongs to.
    const FAMILY: ParserFamily;

    /// Parse a document already held in memory.
    ///
    /// `source_path` identifies the document in diagnostics and is recorded in
    /// the result.
    fn parse_content(&self, content: &str, source_path: Option<&Utf8Path>) -> Result<ParsedMetricsDocument>;

    /// Read and parse the document at `path`.
    fn parse(&self, path: &Utf8Path, cancel: &Cancellation) -> impl Future<Output = Result<ParsedMetricsDocument>> + Send {
        async move {
            cancel.check()?;

            let content = tokio::fs::read_to_string(path)
                .await
                .into_app_err_with(|| format!("unable to read {} document '{path}'", Self::FAMILY))?;

            cancel.check()?;
            let document = self.parse_content(&content, Some(path))?;

            log::info!(target: LOG_TARGET, "Parsed {} document '{path}'", Self::FAMILY);
            Ok(document)
        }
    }
}
