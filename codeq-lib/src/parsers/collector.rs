use super::{Cancellation, CoverageParser, FindingsParser, MetricsParser, StructureParser, Throttler};
use crate::Result;
use crate::model::{ParsedMetricsDocument, ParserFamily};
use camino::Utf8PathBuf;
use futures_util::future::join_all;
use std::sync::Arc;

const LOG_TARGET: &str = " collector";

/// One document to parse, tagged with the family of its format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDocument {
    pub family: ParserFamily,
    pub path: Utf8PathBuf,
}

impl InputDocument {
    #[must_use]
    pub fn new(family: ParserFamily, path: impl Into<Utf8PathBuf>) -> Self {
        Self {
            family,
            path: path.into(),
        }
    }
}

/// Parses many documents concurrently.
#[derive(Debug)]
pub struct Collector {
    throttler: Arc<Throttler>,
    cancel: Arc<Cancellation>,
}

impl Collector {
    #[must_use]
    pub fn new(max_concurrency: usize, cancel: Arc<Cancellation>) -> Self {
        Self {
            throttler: Throttler::new(max_concurrency),
            cancel,
        }
    }

    /// Parse every input, returning documents in input order.
    ///
    /// Fails if any document fails to parse or if the run is cancelled.
    pub async fn collect(&self, inputs: &[InputDocument]) -> Result<Vec<ParsedMetricsDocument>> {
        log::info!(target: LOG_TARGET, "Parsing {} documents", inputs.len());

        let results = join_all(inputs.iter().map(|input| self.parse_one(input))).await;
        let documents = results.into_iter().collect::<Result<Vec<_>>>()?;

        self.cancel.check()?;
        Ok(documents)
    }

    async fn parse_one(&self, input: &InputDocument) -> Result<ParsedMetricsDocument> {
        let Some(_permit) = self.throttler.acquire(&self.cancel).await else {
            return Err(ohno::app_err!("operation cancelled before parsing '{}'", input.path));
        };

        match input.family {
            ParserFamily::Coverage => CoverageParser.parse(&input.path, &self.cancel).await,
            ParserFamily::Structure => StructureParser.parse(&input.path, &self.cancel).await,
            ParserFamily::Findings => FindingsParser.parse(&input.path, &self.cancel).await,
        }
    }
}
