use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::json;

use locus_core::{
    ClassifyMode, Family, Locator, Query, QueryBackend, QueryError, ResolutionEngine,
    ResolveError, ScopeError, SearchScope,
};

/// Table-driven driver stand-in: maps query sources to canned element ids
/// and records every execution with the root it ran under.
#[derive(Default)]
struct MockBackend {
    responses: HashMap<String, Vec<u32>>,
    failures: HashMap<String, QueryError>,
    executed: Vec<(String, Query)>,
}

impl MockBackend {
    fn new() -> Self {
        Self::default()
    }

    fn respond(mut self, query: &Query, ids: &[u32]) -> Self {
        self.responses.insert(query.source.clone(), ids.to_vec());
        self
    }

    fn fail(mut self, query: &Query, error: QueryError) -> Self {
        self.failures.insert(query.source.clone(), error);
        self
    }

    fn executed_sources(&self) -> Vec<&str> {
        self.executed.iter().map(|(_, q)| q.source.as_str()).collect()
    }
}

#[async_trait]
impl QueryBackend for MockBackend {
    type Element = u32;
    type Root = String;

    async fn execute(&mut self, query: &Query, root: &String) -> Result<Vec<u32>, QueryError> {
        self.executed.push((root.clone(), query.clone()));
        if let Some(error) = self.failures.get(&query.source) {
            return Err(error.clone());
        }
        Ok(self.responses.get(&query.source).cloned().unwrap_or_default())
    }

    async fn scope_to(&mut self, element: &u32) -> Result<String, QueryError> {
        Ok(format!("element:{element}"))
    }

    async fn frame_scope(&mut self, frames: &[Locator], root: &String) -> Result<String, QueryError> {
        let chain: Vec<String> = frames.iter().map(|f| f.to_string()).collect();
        Ok(format!("{root}/frame:{}", chain.join(">")))
    }
}

fn doc() -> String {
    "document".to_string()
}

fn plan(family: Family, text: &str) -> Vec<locus_core::QueryAttempt> {
    locus_core::plan_for(family, text)
}

// ============================================================
// Strict locators: single query, no fallback
// ============================================================

#[tokio::test]
async fn strict_css_executes_exactly_once() {
    let locator = Locator::parse("#submit");
    let mut backend = MockBackend::new().respond(&Query::css("#submit"), &[3]);

    let found = ResolutionEngine::resolve(&locator, Family::Clickable, &doc(), &mut backend)
        .await
        .unwrap();

    assert_eq!(found, vec![3]);
    assert_eq!(backend.executed_sources(), vec!["#submit"]);
}

#[tokio::test]
async fn strict_locator_empty_result_has_no_fallback() {
    let locator = Locator::parse("//div[@id='x']");
    let mut backend = MockBackend::new();

    let found = ResolutionEngine::resolve(&locator, Family::Clickable, &doc(), &mut backend)
        .await
        .unwrap();

    assert!(found.is_empty());
    assert_eq!(backend.executed.len(), 1);
}

#[tokio::test]
async fn name_object_queries_attribute_selector() {
    let locator = Locator::from_value(&json!({"name": "email"}), ClassifyMode::Strict).unwrap();
    let mut backend = MockBackend::new().respond(&Query::css("[name=\"email\"]"), &[9]);

    let found = ResolutionEngine::resolve(&locator, Family::Field, &doc(), &mut backend)
        .await
        .unwrap();

    assert_eq!(found, vec![9]);
}

#[tokio::test]
async fn unrecognized_object_fails_at_resolution() {
    let locator = Locator::from_value(&json!({}), ClassifyMode::Lenient).unwrap();
    let mut backend = MockBackend::new();

    let result = ResolutionEngine::resolve(&locator, Family::Clickable, &doc(), &mut backend).await;

    assert!(matches!(result, Err(ResolveError::InvalidLocator(_))));
    assert!(backend.executed.is_empty());
}

#[tokio::test]
async fn frame_locator_cannot_resolve_to_elements() {
    let locator = Locator::frame(vec![Locator::css("#outer")]);
    let mut backend = MockBackend::new();

    let result = ResolutionEngine::resolve(&locator, Family::Element, &doc(), &mut backend).await;

    assert!(matches!(result, Err(ResolveError::InvalidLocator(_))));
}

// ============================================================
// Fuzzy fallback: first non-empty tier wins
// ============================================================

#[tokio::test]
async fn narrow_tier_match_suppresses_wide_tier() {
    // A button whose exact text is "Submit" (tier 1) and an unrelated
    // button whose title is "Submit" (tier 2): only the former comes back.
    let attempts = plan(Family::Clickable, "Submit");
    let mut backend = MockBackend::new()
        .respond(&attempts[0].query, &[1])
        .respond(&attempts[1].query, &[1, 2]);

    let found =
        ResolutionEngine::resolve(&Locator::parse("Submit"), Family::Clickable, &doc(), &mut backend)
            .await
            .unwrap();

    assert_eq!(found, vec![1]);
    assert_eq!(backend.executed.len(), 1);
}

#[tokio::test]
async fn empty_tiers_fall_through_to_wide() {
    let attempts = plan(Family::Clickable, "Save");
    let mut backend = MockBackend::new().respond(&attempts[1].query, &[5, 6]);

    let found =
        ResolutionEngine::resolve(&Locator::parse("Save"), Family::Clickable, &doc(), &mut backend)
            .await
            .unwrap();

    // All matches within the winning tier are returned; ranking is the
    // caller's business.
    assert_eq!(found, vec![5, 6]);
    assert_eq!(backend.executed.len(), 2);
}

#[tokio::test]
async fn raw_tier_uses_the_unmodified_value() {
    // No structural tier matches "XYZ"; the raw tier passes the text
    // verbatim as CSS. A page element ".XYZ" is only reachable if the
    // author's text itself was the selector, so "XYZ" finds nothing under
    // that key while the literal source "XYZ" does.
    let mut backend = MockBackend::new().respond(&Query::css("XYZ"), &[7]);

    let found =
        ResolutionEngine::resolve(&Locator::parse("XYZ"), Family::Clickable, &doc(), &mut backend)
            .await
            .unwrap();

    assert_eq!(found, vec![7]);
    let sources = backend.executed_sources();
    assert_eq!(sources.last(), Some(&"XYZ"));
    assert!(!sources.contains(&".XYZ"));
}

#[tokio::test]
async fn exhausted_tiers_return_empty_not_error() {
    let mut backend = MockBackend::new();

    let found = ResolutionEngine::resolve(
        &Locator::parse("Nothing Here"),
        Family::Clickable,
        &doc(),
        &mut backend,
    )
    .await
    .unwrap();

    assert!(found.is_empty());
    // narrow, wide, self, raw css, raw xpath — all attempted.
    assert_eq!(backend.executed.len(), 5);
}

#[tokio::test]
async fn self_tier_failure_is_swallowed() {
    let attempts = plan(Family::Clickable, "Menu");
    let self_tier = attempts.iter().find(|a| a.label == "self").unwrap();
    let mut backend = MockBackend::new()
        .fail(&self_tier.query, QueryError::Unsupported("aria lookup".into()))
        .respond(&Query::css("Menu"), &[4]);

    let found =
        ResolutionEngine::resolve(&Locator::parse("Menu"), Family::Clickable, &doc(), &mut backend)
            .await
            .unwrap();

    assert_eq!(found, vec![4]);
}

#[tokio::test]
async fn structural_tier_failure_propagates() {
    let attempts = plan(Family::Clickable, "Menu");
    let mut backend = MockBackend::new().fail(
        &attempts[0].query,
        QueryError::InvalidQuery("bad xpath".into()),
    );

    let result =
        ResolutionEngine::resolve(&Locator::parse("Menu"), Family::Clickable, &doc(), &mut backend)
            .await;

    assert!(matches!(
        result,
        Err(ResolveError::Query(QueryError::InvalidQuery(_)))
    ));
    assert_eq!(backend.executed.len(), 1);
}

#[tokio::test]
async fn field_family_resolves_label_contains_on_tier_two() {
    // <label for="e">Your Email Address</label><input name="email">:
    // "Email" is contained in, but not equal to, the label text, so tier 1
    // misses and tier 2 matches.
    let attempts = plan(Family::Field, "Email");
    let mut backend = MockBackend::new().respond(&attempts[1].query, &[11]);

    let found =
        ResolutionEngine::resolve(&Locator::parse("Email"), Family::Field, &doc(), &mut backend)
            .await
            .unwrap();

    assert_eq!(found, vec![11]);
    assert_eq!(backend.executed.len(), 2);
    assert_eq!(backend.executed[1].1, attempts[1].query);
}

#[tokio::test]
async fn resolution_is_idempotent() {
    let attempts = plan(Family::Checkable, "Terms");
    let locator = Locator::parse("Terms");

    let mut first = MockBackend::new().respond(&attempts[1].query, &[8]);
    let mut second = MockBackend::new().respond(&attempts[1].query, &[8]);

    let a = ResolutionEngine::resolve(&locator, Family::Checkable, &doc(), &mut first)
        .await
        .unwrap();
    let b = ResolutionEngine::resolve(&locator, Family::Checkable, &doc(), &mut second)
        .await
        .unwrap();

    assert_eq!(a, b);
    assert_eq!(first.executed_sources(), second.executed_sources());
}

// ============================================================
// Select-option union
// ============================================================

#[tokio::test]
async fn option_matches_are_unioned_and_deduped() {
    let [by_text, by_value] = locus_core::option_queries("Red");
    let mut backend = MockBackend::new()
        .respond(&by_text, &[1, 2])
        .respond(&by_value, &[2, 3]);

    let select_root = "element:40".to_string();
    let found = ResolutionEngine::resolve_options(&["Red"], &select_root, &mut backend)
        .await
        .unwrap();

    assert_eq!(found, vec![1, 2, 3]);
}

#[tokio::test]
async fn every_option_literal_is_attempted() {
    let [red_text, _] = locus_core::option_queries("Red");
    let [_, blue_value] = locus_core::option_queries("Blue");
    let mut backend = MockBackend::new()
        .respond(&red_text, &[1])
        .respond(&blue_value, &[2]);

    let select_root = "element:40".to_string();
    let found = ResolutionEngine::resolve_options(&["Red", "Blue"], &select_root, &mut backend)
        .await
        .unwrap();

    assert_eq!(found, vec![1, 2]);
    assert_eq!(backend.executed.len(), 4);
}

// ============================================================
// Context narrowing
// ============================================================

#[tokio::test]
async fn narrowing_scopes_subsequent_resolutions() {
    let mut backend = MockBackend::new()
        .respond(&Query::css("#signup"), &[7])
        .respond(&Query::css("[name=\"email\"]"), &[12]);
    let mut scope = SearchScope::new(doc());

    scope.narrow(&Locator::parse("#signup"), &mut backend).await.unwrap();
    assert_eq!(scope.current(), "element:7");
    assert_eq!(scope.depth(), 1);

    let field = Locator::from_value(&json!({"name": "email"}), ClassifyMode::Strict).unwrap();
    let found = ResolutionEngine::resolve(&field, Family::Field, scope.current(), &mut backend)
        .await
        .unwrap();
    assert_eq!(found, vec![12]);

    // The scoped execution ran under the narrowed root.
    assert_eq!(backend.executed.last().unwrap().0, "element:7");

    assert!(scope.pop());
    assert_eq!(scope.current(), "document");
    assert!(!scope.pop());
}

#[tokio::test]
async fn fuzzy_context_degrades_to_raw_lookup() {
    let mut backend = MockBackend::new();
    let mut scope = SearchScope::new(doc());

    let result = scope.narrow(&Locator::parse("sidebar panel"), &mut backend).await;

    assert!(matches!(result, Err(ScopeError::ContextNotFound(_))));
    // Generic element narrowing tries the text as CSS, then as XPath.
    assert_eq!(backend.executed_sources(), vec!["sidebar panel", "sidebar panel"]);
}

#[tokio::test]
async fn frame_narrowing_delegates_to_the_driver() {
    let mut backend = MockBackend::new();
    let mut scope = SearchScope::new(doc());
    let frame =
        Locator::from_value(&json!({"frame": ["#outer", "#inner"]}), ClassifyMode::Strict).unwrap();

    scope.narrow(&frame, &mut backend).await.unwrap();

    assert!(scope.in_frame());
    assert_eq!(scope.current(), "document/frame:#outer>#inner");
    // The chain went to the driver wholesale; no element queries ran.
    assert!(backend.executed.is_empty());
}

#[tokio::test]
async fn frame_inside_active_narrowing_is_rejected() {
    let mut backend = MockBackend::new().respond(&Query::css("#signup"), &[7]);
    let mut scope = SearchScope::new(doc());
    scope.narrow(&Locator::parse("#signup"), &mut backend).await.unwrap();

    let frame = Locator::frame(vec![Locator::css("#chat")]);
    let result = scope.narrow(&frame, &mut backend).await;

    assert!(matches!(result, Err(ScopeError::NestedWithin(_))));
    // Unwinding the element narrowing re-enables frame scopes.
    scope.pop();
    assert!(scope.narrow(&frame, &mut backend).await.is_ok());
}

#[tokio::test]
async fn element_narrowing_inside_a_frame_is_allowed() {
    let mut backend = MockBackend::new().respond(&Query::css("#panel"), &[3]);
    let mut scope = SearchScope::new(doc());

    let frame = Locator::frame(vec![Locator::css("#app")]);
    scope.narrow(&frame, &mut backend).await.unwrap();
    scope.narrow(&Locator::parse("#panel"), &mut backend).await.unwrap();

    assert_eq!(scope.depth(), 2);
    assert_eq!(scope.current(), "element:3");
    assert!(scope.in_frame());

    scope.pop();
    assert!(scope.in_frame());
    scope.pop();
    assert!(!scope.in_frame());
}
