//! Property-based tests for the token parser.
//!
//! Validates the parsing invariants over generated template texts:
//! idempotence once tokens are resolved, and identity for text the parser
//! has no definitions for.

use std::sync::Arc;

use async_trait::async_trait;
use proptest::prelude::*;
use stencil_core::{
    LookupError, ObjectModel, SimpleTokenParser, TokenDefinition, TokenParser,
};

#[derive(Debug)]
struct FixedModel;

#[async_trait]
impl ObjectModel for FixedModel {
    async fn site_title(&self) -> Result<String, LookupError> {
        Ok("Contoso".to_string())
    }

    async fn list_id(&self, _title: &str) -> Result<String, LookupError> {
        Ok("b5a46a18-9a6c-4b35-a3f5-5d3c1b6d1a0e".to_string())
    }

    async fn term_set_id(&self, _group: &str, _term_set: &str) -> Result<String, LookupError> {
        Ok("9188a794-cfcf-48b6-9ac5-df2048e8aa5d".to_string())
    }

    async fn term_id(
        &self,
        _group: &str,
        _term_set: &str,
        _path: &str,
    ) -> Result<String, LookupError> {
        Ok("0d1f3b52-4f3d-4d2a-8a89-2f6f3c2e9b11".to_string())
    }
}

fn run_parser() -> TokenParser {
    let mut parser = TokenParser::new(Arc::new(FixedModel));
    parser.add_token(TokenDefinition::site_title().expect("pattern should compile"));
    parser.add_token(TokenDefinition::list_id("Documents").expect("pattern should compile"));
    parser.add_token(
        TokenDefinition::term_id("HR", "Offices", "EMEA").expect("pattern should compile"),
    );
    parser
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread().build().expect("runtime should build")
}

proptest! {
    /// Substituted values contain no further token syntax, so a second
    /// parse over the output must be a no-op.
    #[test]
    fn parse_is_idempotent_over_generated_templates(
        prefix in "[a-zA-Z0-9 ./_-]{0,24}",
        middle in "[a-zA-Z0-9 ./_-]{0,24}",
        suffix in "[a-zA-Z0-9 ./_-]{0,24}",
    ) {
        runtime().block_on(async {
            let parser = run_parser();
            let text = format!(
                "{prefix}{{sitetitle}}{middle}{{termid:HR:Offices:EMEA}}{suffix}"
            );

            let once = parser.parse(&text).await.unwrap();
            let twice = parser.parse(&once).await.unwrap();

            prop_assert_eq!(&once, &twice);
            let site_title_token = "{sitetitle}";
            prop_assert!(!once.contains(site_title_token));
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// A parser with no registered tokens is the identity function, token
    /// syntax included.
    #[test]
    fn empty_parser_is_identity(text in "[a-zA-Z0-9 :{}./_-]{0,64}") {
        runtime().block_on(async {
            let parser = SimpleTokenParser::new();
            prop_assert_eq!(parser.parse(&text).await.unwrap(), text);
            Ok::<(), TestCaseError>(())
        })?;
    }

    /// Webhook-local parameter substitution is idempotent for values free
    /// of token syntax.
    #[test]
    fn simple_parser_idempotent(
        value in "[a-zA-Z0-9 ]{0,16}",
        prefix in "[a-zA-Z0-9 ]{0,16}",
        suffix in "[a-zA-Z0-9 ]{0,16}",
    ) {
        runtime().block_on(async {
            let mut parser = SimpleTokenParser::new();
            parser.add_parameter("env", value).unwrap();

            let text = format!("{prefix}{{env}}{suffix}");
            let once = parser.parse(&text).await.unwrap();
            let twice = parser.parse(&once).await.unwrap();

            prop_assert_eq!(once, twice);
            Ok::<(), TestCaseError>(())
        })?;
    }
}
