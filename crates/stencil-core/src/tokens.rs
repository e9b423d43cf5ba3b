//! Token definitions and the parsers that substitute them.
//!
//! A token is a symbolic placeholder embedded in template text, e.g.
//! `{termid:HR:Offices:EMEA}`, resolved to a concrete value when the
//! template is applied. Each definition owns its matching pattern and a
//! run-scoped cache of the resolved value; the parser scans text and
//! substitutes matches in a single left-to-right pass.

use std::sync::Arc;

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::RwLock;

use crate::{
    error::{Result, TokenError},
    model::{LookupError, ObjectModel},
};

/// The remote query behind a token kind.
///
/// Token kinds differ only in the literal pattern they match and the query
/// they perform; the caching and matching contract is uniform and lives in
/// [`TokenDefinition`]. Implement this to register kinds beyond the ones
/// shipped here.
#[async_trait]
pub trait ValueSource: Send + Sync + std::fmt::Debug {
    /// Computes the token's value by querying the remote object model.
    async fn fetch(&self, model: &dyn ObjectModel) -> std::result::Result<String, LookupError>;
}

#[derive(Debug)]
enum Source {
    Literal(String),
    Remote(Box<dyn ValueSource>),
}

/// A single resolvable placeholder.
///
/// Owns the compiled matching pattern and a cached resolved value. The
/// cache is scoped to the provisioning run the definition was created for;
/// definitions are discarded with the run and never persisted.
#[derive(Debug)]
pub struct TokenDefinition {
    token: String,
    pattern: Regex,
    cache: RwLock<Option<String>>,
    source: Source,
}

impl TokenDefinition {
    fn with_source(token: String, source: Source) -> Result<Self> {
        // The whole literal is escaped here, at registration time, so
        // colons, braces, or regex metacharacters inside a parameter can
        // never corrupt the match boundary.
        let pattern = Regex::new(&format!("(?i){}", regex::escape(&token)))
            .map_err(|e| TokenError::pattern(token.clone(), e))?;
        Ok(Self { token, pattern, cache: RwLock::new(None), source })
    }

    /// A token carrying a fixed value, no remote query.
    ///
    /// Matches `{<keyword>}`. Used for webhook-local parameters and
    /// run-scoped constants.
    pub fn literal(keyword: &str, value: impl Into<String>) -> Result<Self> {
        Self::with_source(format!("{{{keyword}}}"), Source::Literal(value.into()))
    }

    /// `{sitetitle}` — the title of the site being provisioned.
    pub fn site_title() -> Result<Self> {
        Self::with_source("{sitetitle}".to_string(), Source::Remote(Box::new(SiteTitleSource)))
    }

    /// `{listid:<title>}` — the id of the list with the given title.
    pub fn list_id(title: &str) -> Result<Self> {
        Self::with_source(
            format!("{{listid:{title}}}"),
            Source::Remote(Box::new(ListIdSource { title: title.to_string() })),
        )
    }

    /// `{termsetid:<group>:<term_set>}` — the id of a term set.
    pub fn term_set_id(group: &str, term_set: &str) -> Result<Self> {
        Self::with_source(
            format!("{{termsetid:{group}:{term_set}}}"),
            Source::Remote(Box::new(TermSetIdSource {
                group: group.to_string(),
                term_set: term_set.to_string(),
            })),
        )
    }

    /// `{termid:<group>:<term_set>:<path>}` — the id of a term.
    pub fn term_id(group: &str, term_set: &str, path: &str) -> Result<Self> {
        Self::with_source(
            format!("{{termid:{group}:{term_set}:{path}}}"),
            Source::Remote(Box::new(TermIdSource {
                group: group.to_string(),
                term_set: term_set.to_string(),
                path: path.to_string(),
            })),
        )
    }

    /// A token backed by a caller-supplied remote query.
    ///
    /// `token` is the full literal syntax, e.g. `{fieldid:Title}`; it is
    /// escaped for matching the same way the shipped kinds are.
    pub fn remote(token: impl Into<String>, source: impl ValueSource + 'static) -> Result<Self> {
        Self::with_source(token.into(), Source::Remote(Box::new(source)))
    }

    /// The literal syntax this definition matches.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Resolves the token's value, querying the remote model on first use.
    ///
    /// Later calls return the cached value without re-querying. Concurrent
    /// first resolutions may each query; the last writer wins, which is
    /// safe because remote lookups are idempotent.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Lookup` when the remote query fails and
    /// `TokenError::NoScope` when a remote-backed token is resolved without
    /// an object model attached.
    pub async fn resolve(&self, model: Option<&dyn ObjectModel>) -> Result<String> {
        if let Some(value) = self.cache.read().await.as_ref() {
            return Ok(value.clone());
        }

        let value = match &self.source {
            Source::Literal(value) => value.clone(),
            Source::Remote(source) => {
                let model = model.ok_or_else(|| TokenError::no_scope(self.token.clone()))?;
                source
                    .fetch(model)
                    .await
                    .map_err(|e| TokenError::lookup(self.token.clone(), e))?
            },
        };

        *self.cache.write().await = Some(value.clone());
        Ok(value)
    }
}

#[derive(Debug)]
struct SiteTitleSource;

#[async_trait]
impl ValueSource for SiteTitleSource {
    async fn fetch(&self, model: &dyn ObjectModel) -> std::result::Result<String, LookupError> {
        model.site_title().await
    }
}

#[derive(Debug)]
struct ListIdSource {
    title: String,
}

#[async_trait]
impl ValueSource for ListIdSource {
    async fn fetch(&self, model: &dyn ObjectModel) -> std::result::Result<String, LookupError> {
        model.list_id(&self.title).await
    }
}

#[derive(Debug)]
struct TermSetIdSource {
    group: String,
    term_set: String,
}

#[async_trait]
impl ValueSource for TermSetIdSource {
    async fn fetch(&self, model: &dyn ObjectModel) -> std::result::Result<String, LookupError> {
        model.term_set_id(&self.group, &self.term_set).await
    }
}

#[derive(Debug)]
struct TermIdSource {
    group: String,
    term_set: String,
    path: String,
}

#[async_trait]
impl ValueSource for TermIdSource {
    async fn fetch(&self, model: &dyn ObjectModel) -> std::result::Result<String, LookupError> {
        model.term_id(&self.group, &self.term_set, &self.path).await
    }
}

/// Parser for template strings scoped to one provisioning run.
///
/// Holds the run's token definitions in insertion order and the object
/// model they resolve against. One instance may be shared by concurrent
/// callers; `parse` takes `&self` and each definition's cache tolerates
/// first-resolution races.
pub struct TokenParser {
    tokens: Vec<TokenDefinition>,
    model: Arc<dyn ObjectModel>,
}

impl TokenParser {
    /// Creates an empty parser resolving against the given object model.
    pub fn new(model: Arc<dyn ObjectModel>) -> Self {
        Self { tokens: Vec::new(), model }
    }

    /// Registers a token definition.
    ///
    /// Insertion order breaks ties between patterns that match the same
    /// span: the earliest registration wins.
    pub fn add_token(&mut self, token: TokenDefinition) {
        self.tokens.push(token);
    }

    /// Substitutes every registered token found in `text`.
    ///
    /// Single left-to-right pass over non-overlapping matches; at each
    /// position the earliest match wins, ties broken by longest pattern.
    /// Substituted output is never re-scanned, and unknown token syntax is
    /// left verbatim.
    ///
    /// # Errors
    ///
    /// Returns the first remote lookup failure; the run decides whether
    /// that is fatal.
    pub async fn parse(&self, text: &str) -> Result<String> {
        parse_with(&self.tokens, Some(self.model.as_ref()), text).await
    }
}

/// Throwaway parser for webhook-local parameters.
///
/// Holds only literal tokens, so parsing can never reach the remote system.
#[derive(Debug, Default)]
pub struct SimpleTokenParser {
    tokens: Vec<TokenDefinition>,
}

impl SimpleTokenParser {
    /// Creates an empty parser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `{<name>}` resolving to the given fixed value.
    pub fn add_parameter(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        self.tokens.push(TokenDefinition::literal(name, value)?);
        Ok(())
    }

    /// Substitutes every registered parameter found in `text`.
    pub async fn parse(&self, text: &str) -> Result<String> {
        parse_with(&self.tokens, None, text).await
    }
}

async fn parse_with(
    tokens: &[TokenDefinition],
    model: Option<&dyn ObjectModel>,
    text: &str,
) -> Result<String> {
    let mut output = String::with_capacity(text.len());
    let mut cursor = 0;

    while cursor < text.len() {
        let Some((start, end, token)) = earliest_match(tokens, &text[cursor..]) else {
            break;
        };
        output.push_str(&text[cursor..cursor + start]);
        let value = token.resolve(model).await?;
        output.push_str(&value);
        cursor += end;
    }

    output.push_str(&text[cursor..]);
    Ok(output)
}

fn earliest_match<'a>(
    tokens: &'a [TokenDefinition],
    haystack: &str,
) -> Option<(usize, usize, &'a TokenDefinition)> {
    let mut best: Option<(usize, usize, &TokenDefinition)> = None;

    for token in tokens {
        let Some(found) = token.pattern.find(haystack) else {
            continue;
        };
        let candidate = (found.start(), found.end(), token);
        best = Some(match best {
            None => candidate,
            Some(current) => {
                // Earliest match wins; on a shared start the longest
                // pattern takes the span. Equal spans keep the earliest
                // registration.
                if candidate.0 < current.0 || (candidate.0 == current.0 && candidate.1 > current.1)
                {
                    candidate
                } else {
                    current
                }
            },
        });
    }

    best
}
