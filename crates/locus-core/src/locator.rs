//! Locator model and classification.
//!
//! A [`Locator`] is the test author's way of addressing a page element: a
//! raw CSS or XPath string, a strict single-key object (`{"css": "a.nav"}`,
//! `{"id": "submit"}`), or free text to match fuzzily ("Log In").
//! Classification is total — every input receives exactly one kind — and a
//! locator is immutable once constructed. The original input is kept
//! verbatim so diagnostics render what the author actually wrote.

use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use thiserror::Error;

/// Engine name assigned to `~accessibility-id` locators.
pub const ACCESSIBILITY_ENGINE: &str = "accessibility";

/// Errors raised while classifying or simplifying a locator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LocatorError {
    /// A strict-mode object had no single recognized key.
    #[error("invalid locator object: {0}")]
    InvalidKind(String),

    /// A frame locator was used where a direct element query is required.
    #[error("frame locator {0} cannot be queried directly")]
    FrameNotQueryable(String),

    /// A lenient-mode object that no strategy recognized reached
    /// resolution.
    #[error("unrecognized locator object: {0}")]
    Unrecognized(String),
}

/// How strictly object locators are classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassifyMode {
    /// Unrecognized objects become [`LocatorKind::StrictUnknown`]; the
    /// error surfaces at resolution time instead.
    #[default]
    Lenient,
    /// Unrecognized objects are rejected immediately.
    Strict,
}

/// The classified shape of a locator.
#[derive(Debug, Clone, PartialEq)]
pub enum LocatorKind {
    Css(String),
    XPath(String),
    Id(String),
    Name(String),
    /// A named locator engine: `accessibility`, `android`, `ios`, or any
    /// custom engine a driver registers.
    Custom { engine: String, query: String },
    /// A frame chain, outermost frame first.
    Frame(Vec<Locator>),
    /// React component name, resolved by a component-aware driver.
    React(String),
    /// Vue component name, resolved by a component-aware driver.
    Vue(String),
    /// Free text resolved through the fuzzy fallback tiers.
    Fuzzy(String),
    /// An object no strategy recognized (lenient mode only).
    StrictUnknown(Value),
}

/// A classified, immutable locator.
#[derive(Debug, Clone, PartialEq)]
pub struct Locator {
    kind: LocatorKind,
    raw: String,
}

lazy_static! {
    /// `#id` / `.class` prefixed selectors.
    static ref PREFIXED_CSS: Regex = Regex::new(r"^[#.]-?[_a-zA-Z][\w-]*").unwrap();
    /// A tag carrying at least one qualifier (`input[name=q]`, `div.row`,
    /// `a#top`, `li:first-child`), optionally continued by combinators.
    static ref QUALIFIED_CSS: Regex =
        Regex::new(r"^[a-zA-Z][\w-]*([.#\[:]\S+|\s*[>+~]\s*\S+)+$").unwrap();
}

fn looks_like_css(input: &str) -> bool {
    PREFIXED_CSS.is_match(input) || QUALIFIED_CSS.is_match(input)
}

fn classify_str(input: &str) -> LocatorKind {
    // XPath before CSS: ".//span" must not be read as a class selector.
    if input.starts_with("//") || input.starts_with(".//") {
        return LocatorKind::XPath(input.to_string());
    }
    if let Some(id) = input.strip_prefix('~') {
        return LocatorKind::Custom {
            engine: ACCESSIBILITY_ENGINE.to_string(),
            query: id.to_string(),
        };
    }
    if looks_like_css(input) {
        return LocatorKind::Css(input.to_string());
    }
    LocatorKind::Fuzzy(input.to_string())
}

fn frame_chain_from(value: &Value, mode: ClassifyMode) -> Result<Vec<Locator>, LocatorError> {
    match value {
        Value::Array(items) => items.iter().map(|i| Locator::from_value(i, mode)).collect(),
        other => Ok(vec![Locator::from_value(other, mode)?]),
    }
}

fn classify_object(
    map: &serde_json::Map<String, Value>,
    mode: ClassifyMode,
    raw: &str,
) -> Result<LocatorKind, LocatorError> {
    if map.len() == 1
        && let Some((key, value)) = map.iter().next()
    {
        match (key.as_str(), value) {
            ("css", Value::String(s)) => return Ok(LocatorKind::Css(s.clone())),
            ("xpath", Value::String(s)) => return Ok(LocatorKind::XPath(s.clone())),
            ("id", Value::String(s)) => return Ok(LocatorKind::Id(s.clone())),
            ("name", Value::String(s)) => return Ok(LocatorKind::Name(s.clone())),
            ("react", Value::String(s)) => return Ok(LocatorKind::React(s.clone())),
            ("vue", Value::String(s)) => return Ok(LocatorKind::Vue(s.clone())),
            ("frame", v) => return frame_chain_from(v, mode).map(LocatorKind::Frame),
            // Any other key names a custom locator engine.
            (engine, Value::String(s)) => {
                return Ok(LocatorKind::Custom {
                    engine: engine.to_string(),
                    query: s.clone(),
                });
            }
            _ => {}
        }
    }
    match mode {
        ClassifyMode::Strict => Err(LocatorError::InvalidKind(raw.to_string())),
        ClassifyMode::Lenient => Ok(LocatorKind::StrictUnknown(Value::Object(map.clone()))),
    }
}

impl Locator {
    /// Classify a raw string. Total: every string maps to some kind.
    pub fn parse(input: &str) -> Self {
        Self {
            kind: classify_str(input),
            raw: input.to_string(),
        }
    }

    /// Classify a JSON value: strings go through [`Locator::parse`], objects
    /// through their single recognized key.
    pub fn from_value(value: &Value, mode: ClassifyMode) -> Result<Self, LocatorError> {
        match value {
            Value::String(s) => Ok(Self::parse(s)),
            Value::Object(map) => {
                let raw = value.to_string();
                let kind = classify_object(map, mode, &raw)?;
                Ok(Self { kind, raw })
            }
            other => match mode {
                ClassifyMode::Strict => Err(LocatorError::InvalidKind(other.to_string())),
                ClassifyMode::Lenient => Ok(Self {
                    kind: LocatorKind::StrictUnknown(other.clone()),
                    raw: other.to_string(),
                }),
            },
        }
    }

    pub fn css(selector: impl Into<String>) -> Self {
        let selector = selector.into();
        Self {
            raw: selector.clone(),
            kind: LocatorKind::Css(selector),
        }
    }

    pub fn xpath(expression: impl Into<String>) -> Self {
        let expression = expression.into();
        Self {
            raw: expression.clone(),
            kind: LocatorKind::XPath(expression),
        }
    }

    pub fn fuzzy(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            raw: text.clone(),
            kind: LocatorKind::Fuzzy(text),
        }
    }

    pub fn frame(chain: Vec<Locator>) -> Self {
        let raw = format!(
            "frame[{}]",
            chain
                .iter()
                .map(|l| l.raw.as_str())
                .collect::<Vec<_>>()
                .join(" > ")
        );
        Self {
            kind: LocatorKind::Frame(chain),
            raw,
        }
    }

    pub fn kind(&self) -> &LocatorKind {
        &self.kind
    }

    pub fn is_fuzzy(&self) -> bool {
        matches!(self.kind, LocatorKind::Fuzzy(_))
    }

    pub fn is_css(&self) -> bool {
        matches!(self.kind, LocatorKind::Css(_))
    }

    pub fn is_xpath(&self) -> bool {
        matches!(self.kind, LocatorKind::XPath(_))
    }

    pub fn is_custom(&self) -> bool {
        matches!(self.kind, LocatorKind::Custom { .. })
    }

    pub fn is_frame(&self) -> bool {
        matches!(self.kind, LocatorKind::Frame(_))
    }

    /// The extracted matcher text, for kinds that carry one.
    pub fn value(&self) -> Option<&str> {
        match &self.kind {
            LocatorKind::Css(s)
            | LocatorKind::XPath(s)
            | LocatorKind::Id(s)
            | LocatorKind::Name(s)
            | LocatorKind::React(s)
            | LocatorKind::Vue(s)
            | LocatorKind::Fuzzy(s) => Some(s),
            LocatorKind::Custom { query, .. } => Some(query),
            LocatorKind::Frame(_) | LocatorKind::StrictUnknown(_) => None,
        }
    }

    /// The text to feed the fuzzy fallback tiers, if this locator is fuzzy.
    pub fn fuzzy_text(&self) -> Option<&str> {
        match &self.kind {
            LocatorKind::Fuzzy(s) => Some(s),
            _ => None,
        }
    }

    /// The nested frame chain, if this is a frame locator.
    pub fn frame_chain(&self) -> Option<&[Locator]> {
        match &self.kind {
            LocatorKind::Frame(chain) => Some(chain),
            _ => None,
        }
    }

    /// Collapse a non-fuzzy locator into the single query it stands for,
    /// bypassing every fallback tier.
    ///
    /// Fuzzy locators collapse to their text as a raw CSS query, matching
    /// the final `raw` fallback tier. Frame locators and unrecognized
    /// objects have no direct query and error.
    pub fn simplify(&self) -> Result<Query, LocatorError> {
        match &self.kind {
            LocatorKind::Css(s) => Ok(Query::css(s.clone())),
            LocatorKind::XPath(s) => Ok(Query::xpath(s.clone())),
            LocatorKind::Id(s) => Ok(Query::css(format!("#{s}"))),
            LocatorKind::Name(s) => {
                Ok(Query::css(format!("[name=\"{}\"]", s.replace('"', "\\\""))))
            }
            LocatorKind::Custom { engine, query } => Ok(Query {
                kind: QueryKind::Custom(engine.clone()),
                source: query.clone(),
            }),
            LocatorKind::React(component) => Ok(Query {
                kind: QueryKind::Custom("react".to_string()),
                source: component.clone(),
            }),
            LocatorKind::Vue(component) => Ok(Query {
                kind: QueryKind::Custom("vue".to_string()),
                source: component.clone(),
            }),
            LocatorKind::Fuzzy(s) => Ok(Query::css(s.clone())),
            LocatorKind::Frame(_) => Err(LocatorError::FrameNotQueryable(self.raw.clone())),
            LocatorKind::StrictUnknown(v) => Err(LocatorError::Unrecognized(v.to_string())),
        }
    }
}

impl fmt::Display for Locator {
    /// Renders the original input, whatever the locator classified as.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for Locator {
    fn from(input: &str) -> Self {
        Locator::parse(input)
    }
}

impl Serialize for Locator {
    /// Locators serialize back to the wire shape they were built from: a
    /// bare string, or a single-key object.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if let Ok(value) = serde_json::from_str::<Value>(&self.raw)
            && value.is_object()
        {
            return value.serialize(serializer);
        }
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Locator {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Locator::from_value(&value, ClassifyMode::Lenient).map_err(D::Error::custom)
    }
}

/// A concrete engine query, ready for a driver to execute.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub kind: QueryKind,
    pub source: String,
}

/// Which query engine a [`Query`] targets. Fuzzy fallback tiers compile
/// only to `Css` or `XPath`; strict custom-engine locators carry their
/// engine tag through to the driver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    Css,
    #[serde(rename = "xpath")]
    XPath,
    Custom(String),
}

impl Query {
    pub fn css(source: impl Into<String>) -> Self {
        Self {
            kind: QueryKind::Css,
            source: source.into(),
        }
    }

    pub fn xpath(source: impl Into<String>) -> Self {
        Self {
            kind: QueryKind::XPath,
            source: source.into(),
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKind::Css => f.write_str("css"),
            QueryKind::XPath => f.write_str("xpath"),
            QueryKind::Custom(engine) => f.write_str(engine),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.source)
    }
}
