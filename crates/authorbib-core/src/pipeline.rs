//! Run orchestration
//!
//! A run fetches the library once, then walks the registry in order. For
//! each author it matches, renders, resolves output paths and writes. A
//! failing author is recorded in the [`RunReport`] and the loop continues
//! with the next one; only a failed fetch aborts the run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AuthorError, RenderError, SourceError, WriteError};
use crate::matcher::{MatchSummary, Matcher};
use crate::model::{AuthorBibliography, BibliographicItem};
use crate::paths::{display_relative, PathResolver};
use crate::registry::AuthorConfig;
use crate::writer;

/// Parameters of the single collection fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchQuery<'a> {
    /// Collection to read; the whole library when `None`
    pub collection_key: Option<&'a str>,
    pub citation_style: &'a str,
    pub locale: &'a str,
    pub limit: u32,
}

impl<'a> FetchQuery<'a> {
    pub fn from_config(config: &'a Config) -> Self {
        Self {
            collection_key: config.source.collection_key.as_deref(),
            citation_style: &config.citation_style,
            locale: &config.locale,
            limit: config.source.limit,
        }
    }
}

/// Provider of bibliographic items
pub trait ItemSource {
    /// Fetch every item of the collection with citations in the given style
    fn fetch_all(&self, query: &FetchQuery<'_>) -> Result<Vec<BibliographicItem>, SourceError>;
}

/// Input of one render call
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    pub author: &'a AuthorConfig,
    pub bibliography: &'a AuthorBibliography<'a>,
    pub generated_at: DateTime<Utc>,
}

/// Turns an author's citations into PDF bytes
pub trait BibliographyRenderer {
    fn render(&self, request: &RenderRequest<'_>) -> Result<Vec<u8>, RenderError>;
}

/// What happened to an author's history copy
#[derive(Debug)]
pub enum HistoryStatus {
    /// History generation is switched off
    Disabled,
    /// Not attempted because an earlier step failed
    Skipped,
    Written(PathBuf),
    /// A file with the same timestamp already existed
    Collision(PathBuf),
}

/// Result of processing one author
#[derive(Debug)]
pub struct AuthorOutcome {
    pub slug: String,
    pub matched: usize,
    pub permalink: Option<PathBuf>,
    pub history: HistoryStatus,
    pub error: Option<AuthorError>,
}

impl AuthorOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a complete run
#[derive(Debug)]
pub struct RunReport {
    pub generated_at: DateTime<Utc>,
    pub fetched: usize,
    pub outcomes: Vec<AuthorOutcome>,
}

impl RunReport {
    /// True iff every author was rendered and written
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(AuthorOutcome::is_success)
    }

    pub fn failed(&self) -> impl Iterator<Item = &AuthorOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    pub fn outcome(&self, slug: &str) -> Option<&AuthorOutcome> {
        self.outcomes.iter().find(|o| o.slug == slug)
    }

    /// Emit one log line per author plus a total
    pub fn log_summary(&self) {
        for outcome in &self.outcomes {
            match &outcome.error {
                None => info!(
                    author = %outcome.slug,
                    matched = outcome.matched,
                    history = ?outcome.history,
                    "ok"
                ),
                Some(err) => error!(
                    author = %outcome.slug,
                    matched = outcome.matched,
                    stage = err.stage(),
                    "failed: {}",
                    err
                ),
            }
        }
        let failed = self.failed().count();
        info!(
            authors = self.outcomes.len(),
            failed,
            items = self.fetched,
            "run finished"
        );
    }
}

/// Sequential per-author generation
pub struct Pipeline<'a> {
    config: &'a Config,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    /// Fetch the collection once
    pub fn fetch(&self, source: &dyn ItemSource) -> Result<Vec<BibliographicItem>, SourceError> {
        let query = FetchQuery::from_config(self.config);
        info!(
            collection = query.collection_key.unwrap_or("<library>"),
            style = query.citation_style,
            "fetching items"
        );
        let items = source.fetch_all(&query)?;
        info!(count = items.len(), "fetched items");
        Ok(items)
    }

    /// Fetch and match without rendering
    pub fn preview(&self, source: &dyn ItemSource) -> Result<MatchSummary, SourceError> {
        let items = self.fetch(source)?;
        let bibliographies: Vec<_> = self
            .config
            .registry
            .iter()
            .map(|author| Matcher::new(author).bibliography(&items))
            .collect();
        Ok(MatchSummary::new(&items, &bibliographies))
    }

    /// Full run stamped with the current time
    pub fn run(
        &self,
        source: &dyn ItemSource,
        renderer: &dyn BibliographyRenderer,
    ) -> Result<RunReport, SourceError> {
        self.run_at(source, renderer, Utc::now())
    }

    /// Full run with an explicit generation time
    pub fn run_at(
        &self,
        source: &dyn ItemSource,
        renderer: &dyn BibliographyRenderer,
        now: DateTime<Utc>,
    ) -> Result<RunReport, SourceError> {
        let items = self.fetch(source)?;
        let outcomes = self.generate(&items, renderer, now);
        Ok(RunReport {
            generated_at: now,
            fetched: items.len(),
            outcomes,
        })
    }

    /// Render and write every author for an already fetched item set
    pub fn generate(
        &self,
        items: &[BibliographicItem],
        renderer: &dyn BibliographyRenderer,
        now: DateTime<Utc>,
    ) -> Vec<AuthorOutcome> {
        self.config
            .registry
            .iter()
            .map(|author| self.process_author(author, items, renderer, now))
            .collect()
    }

    fn process_author(
        &self,
        author: &AuthorConfig,
        items: &[BibliographicItem],
        renderer: &dyn BibliographyRenderer,
        now: DateTime<Utc>,
    ) -> AuthorOutcome {
        let bibliography = Matcher::new(author).bibliography(items);
        info!(author = %author.slug, matched = bibliography.len(), "matched");

        let mut outcome = AuthorOutcome {
            slug: author.slug.clone(),
            matched: bibliography.len(),
            permalink: None,
            history: HistoryStatus::Skipped,
            error: None,
        };

        let request = RenderRequest {
            author,
            bibliography: &bibliography,
            generated_at: now,
        };
        let pdf = match renderer.render(&request) {
            Ok(pdf) => pdf,
            Err(err) => {
                error!(author = %author.slug, "{}", err);
                outcome.error = Some(err.into());
                return outcome;
            }
        };

        let layout = &self.config.layout;
        let target = PathResolver::new(layout).resolve(&author.slug, Some(&now));

        if let Err(err) = writer::write_permalink(&target.permalink_path, &pdf) {
            error!(author = %author.slug, "{}", err);
            outcome.error = Some(err.into());
            return outcome;
        }
        info!(
            author = %author.slug,
            bytes = pdf.len(),
            "wrote {}",
            display_relative(layout, &target.permalink_path)
        );
        outcome.permalink = Some(target.permalink_path);

        outcome.history = match target.history_path {
            None => HistoryStatus::Disabled,
            Some(path) => match writer::write_history(&path, &pdf) {
                Ok(()) => {
                    info!(author = %author.slug, "wrote {}", display_relative(layout, &path));
                    HistoryStatus::Written(path)
                }
                Err(WriteError::HistoryCollision(path)) => {
                    warn!(
                        author = %author.slug,
                        "history file {} already exists, skipped",
                        path.display()
                    );
                    HistoryStatus::Collision(path)
                }
                Err(err) => {
                    error!(author = %author.slug, "{}", err);
                    outcome.error = Some(err.into());
                    HistoryStatus::Skipped
                }
            },
        };

        outcome
    }
}
