//! Fuzzy fallback plans.
//!
//! Each element family compiles a fuzzy text into an ordered list of query
//! templates, most specific first. Alternates inside one tier are unioned
//! into a single XPath, so the engine's first-non-empty-wins loop operates
//! on whole tiers. The final `raw` tier reuses the author's text unescaped,
//! first as CSS and then as XPath, which is what lets a fuzzy value that
//! happens to be a selector still match.

use crate::escape::xpath_literal;
use crate::locator::Query;

/// Which element category the call site is resolving. The engine never
/// guesses: `click` resolves `Clickable`, `fill_field` resolves `Field`,
/// and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Family {
    Clickable,
    Checkable,
    Field,
    /// Generic lookup used by context narrowing: raw tier only.
    Element,
}

/// One fallback tier's compiled query.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryAttempt {
    pub query: Query,
    /// Position in the fallback order; lower tiers run first.
    pub tier: u8,
    /// Short name used in trace events.
    pub label: &'static str,
    /// Failures on a best-effort attempt are swallowed, not propagated.
    pub best_effort: bool,
}

impl QueryAttempt {
    fn new(query: Query, tier: u8, label: &'static str) -> Self {
        Self {
            query,
            tier,
            label,
            best_effort: false,
        }
    }

    fn best_effort(query: Query, tier: u8, label: &'static str) -> Self {
        Self {
            query,
            tier,
            label,
            best_effort: true,
        }
    }
}

/// Build the fallback plan for `family` from a fuzzy text.
pub fn plan_for(family: Family, text: &str) -> Vec<QueryAttempt> {
    match family {
        Family::Clickable => clickable_plan(text),
        Family::Checkable => checkable_plan(text),
        Family::Field => field_plan(text),
        Family::Element => element_plan(text),
    }
}

const BUTTONISH_INPUT: &str = "@type='submit' or @type='image' or @type='button'";
const CHECKABLE_INPUT: &str = "@type='checkbox' or @type='radio'";
const FIELD_TAGS: &str = "self::input | self::textarea | self::select";
// submit/image/hidden inputs are not addressable as fields, in any tier.
const FIELD_TYPE_GUARD: &str = "not(@type='submit' or @type='image' or @type='hidden')";

/// Clickable lookup: anchors, buttons, button-like inputs.
pub fn clickable_plan(text: &str) -> Vec<QueryAttempt> {
    let lit = xpath_literal(text);
    let narrow = format!(
        ".//a[normalize-space(.)={lit}] | \
         .//button[normalize-space(.)={lit}] | \
         .//a/img[normalize-space(@alt)={lit}]/ancestor::a | \
         .//input[{BUTTONISH_INPUT}][normalize-space(@value)={lit}]"
    );
    let wide = format!(
        ".//a[@href][contains(normalize-space(string(.)), {lit}) or .//img[contains(@alt, {lit})]] | \
         .//input[{BUTTONISH_INPUT}][contains(@value, {lit})] | \
         .//button[contains(normalize-space(string(.)), {lit})] | \
         .//label[contains(normalize-space(string(.)), {lit})] | \
         .//input[{BUTTONISH_INPUT}][@name={lit}] | \
         .//button[@name={lit} or @title={lit}]"
    );
    // Accessible-name lookup. Not every driver can answer it, so the
    // engine treats this tier as best-effort.
    let self_ref = format!(
        ".//*[@role='button' or @role='link']\
         [@aria-label={lit} or contains(normalize-space(string(.)), {lit})]"
    );
    vec![
        QueryAttempt::new(Query::xpath(narrow), 1, "narrow"),
        QueryAttempt::new(Query::xpath(wide), 2, "wide"),
        QueryAttempt::best_effort(Query::xpath(self_ref), 3, "self"),
        QueryAttempt::new(Query::css(text), 4, "raw"),
        QueryAttempt::new(Query::xpath(text), 4, "raw"),
    ]
}

/// Checkbox/radio lookup by label text or control name.
pub fn checkable_plan(text: &str) -> Vec<QueryAttempt> {
    let lit = xpath_literal(text);
    let by_text = format!(
        ".//input[{CHECKABLE_INPUT}]\
         [@id=//label[contains(normalize-space(string(.)), {lit})]/@for or @placeholder={lit}] | \
         .//label[contains(normalize-space(string(.)), {lit})]//input[{CHECKABLE_INPUT}]"
    );
    let by_name = format!(".//input[{CHECKABLE_INPUT}][@name={lit}]");
    vec![
        QueryAttempt::new(Query::xpath(by_text), 1, "by_text"),
        QueryAttempt::new(Query::xpath(by_name), 2, "by_name"),
        QueryAttempt::new(Query::css(text), 3, "raw"),
        QueryAttempt::new(Query::xpath(text), 3, "raw"),
    ]
}

/// Form field lookup (input/textarea/select) by label, placeholder, or
/// name. Exact label text first, then contains, then name only.
pub fn field_plan(text: &str) -> Vec<QueryAttempt> {
    let lit = xpath_literal(text);
    let label_equals = format!(
        ".//*[{FIELD_TAGS}][{FIELD_TYPE_GUARD}]\
         [@name={lit} or @id=//label[normalize-space(string(.))={lit}]/@for or @placeholder={lit}] | \
         .//label[normalize-space(string(.))={lit}]//*[{FIELD_TAGS}][{FIELD_TYPE_GUARD}]"
    );
    let label_contains = format!(
        ".//*[{FIELD_TAGS}][{FIELD_TYPE_GUARD}]\
         [@id=//label[contains(normalize-space(string(.)), {lit})]/@for or contains(@placeholder, {lit})] | \
         .//label[contains(normalize-space(string(.)), {lit})]//*[{FIELD_TAGS}][{FIELD_TYPE_GUARD}]"
    );
    let by_name = format!(".//*[{FIELD_TAGS}][{FIELD_TYPE_GUARD}][@name={lit}]");
    vec![
        QueryAttempt::new(Query::xpath(label_equals), 1, "label_equals"),
        QueryAttempt::new(Query::xpath(label_contains), 2, "label_contains"),
        QueryAttempt::new(Query::xpath(by_name), 3, "by_name"),
        QueryAttempt::new(Query::css(text), 4, "raw"),
    ]
}

/// Generic element lookup used by context narrowing: the author's text as a
/// selector, nothing else.
pub fn element_plan(text: &str) -> Vec<QueryAttempt> {
    vec![
        QueryAttempt::new(Query::css(text), 1, "raw"),
        QueryAttempt::new(Query::xpath(text), 1, "raw"),
    ]
}

/// The two per-option lookups for `<select>` option matching: visible text
/// equals, then `@value` equals. Unlike the fallback families these are
/// unioned, not first-match-wins — multi-select steps must select every
/// matching option.
pub fn option_queries(text: &str) -> [Query; 2] {
    let lit = xpath_literal(text);
    [
        Query::xpath(format!(".//option[normalize-space(.)={lit}]")),
        Query::xpath(format!(".//option[@value={lit}]")),
    ]
}
