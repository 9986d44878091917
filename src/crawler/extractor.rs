//! Article body extraction
//!
//! Article templates changed many times over the years an archive covers, so
//! extraction tries a primary container selector and then an ordered list of
//! fallbacks. The first container that yields any text wins.

use crate::config::SourceConfig;
use crate::crawler::parser::{compile_selector, element_text};
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};

/// Which selector produced the body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionOutcome {
    /// The primary content selector
    Primary,

    /// The fallback selector at this index
    Fallback(usize),

    /// Nothing matched; the body is empty
    Failed,
}

/// Result of extracting one article page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub body: String,
    pub outcome: ExtractionOutcome,
}

impl Extraction {
    pub fn is_failed(&self) -> bool {
        self.outcome == ExtractionOutcome::Failed
    }
}

/// Extracts plain-text article bodies
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    primary: Selector,
    fallbacks: Vec<Selector>,
    paragraph: Selector,
    lead: Option<Selector>,
}

impl ContentExtractor {
    /// Compiles the content selectors of a source configuration
    pub fn new(source: &SourceConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            primary: compile_selector(&source.content_selector)?,
            fallbacks: source
                .fallback_selectors
                .iter()
                .map(|s| compile_selector(s))
                .collect::<Result<_, _>>()?,
            paragraph: compile_selector(&source.paragraph_selector)?,
            lead: source.lead_selector.as_deref().map(compile_selector).transpose()?,
        })
    }

    /// Extracts the body of an article page
    ///
    /// Paragraph texts of the first matching container are trimmed, have their
    /// whitespace collapsed and are joined with newlines. If a lead is found
    /// and is not already the first paragraph, it becomes the first line.
    ///
    /// Never fails: markup without any known container gives an empty body
    /// with [`ExtractionOutcome::Failed`].
    pub fn extract(&self, markup: &str) -> Extraction {
        let document = Html::parse_document(markup);

        let candidates = std::iter::once((ExtractionOutcome::Primary, &self.primary)).chain(
            self.fallbacks
                .iter()
                .enumerate()
                .map(|(i, selector)| (ExtractionOutcome::Fallback(i), selector)),
        );

        for (outcome, selector) in candidates {
            let paragraphs = self.container_text(&document, selector);
            if paragraphs.is_empty() {
                continue;
            }

            let body = self.with_lead(&document, paragraphs).join("\n");
            return Extraction { body, outcome };
        }

        Extraction {
            body: String::new(),
            outcome: ExtractionOutcome::Failed,
        }
    }

    /// Paragraph texts of the first container matching `selector` that has any
    fn container_text(&self, document: &Html, selector: &Selector) -> Vec<String> {
        for container in document.select(selector) {
            let paragraphs = self.paragraphs(container);
            if !paragraphs.is_empty() {
                return paragraphs;
            }
        }
        Vec::new()
    }

    fn paragraphs(&self, container: ElementRef<'_>) -> Vec<String> {
        let mut paragraphs: Vec<String> = container
            .select(&self.paragraph)
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect();

        if paragraphs.is_empty() {
            // container without paragraph markup
            let own = element_text(container);
            if !own.is_empty() {
                paragraphs.push(own);
            }
        }

        paragraphs
    }

    fn with_lead(&self, document: &Html, mut paragraphs: Vec<String>) -> Vec<String> {
        let Some(lead_selector) = &self.lead else {
            return paragraphs;
        };

        let lead = document
            .select(lead_selector)
            .map(element_text)
            .find(|text| !text.is_empty());

        if let Some(lead) = lead {
            if paragraphs.first() != Some(&lead) {
                paragraphs.insert(0, lead);
            }
        }

        paragraphs
    }
}
