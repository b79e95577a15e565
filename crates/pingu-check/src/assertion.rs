//! Assertions evaluated against a fetched response.
//!
//! The set of assertion kinds is closed ([`Assertion`]); an [`AssertionSet`]
//! holds them in evaluation order and stops at the first failure.

use regex::Regex;

use crate::error::{CheckError, CheckResult};
use crate::fetch::Response;

/// Outcome of one assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionResult {
    pub passed: bool,
    pub message: String,
}

impl AssertionResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            message: String::new(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

/// Capability shared by every assertion kind.
pub trait Assert {
    fn name(&self) -> &'static str;
    fn assert(&self, response: &Response) -> AssertionResult;
}

/// Passes when the response status equals the expected one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusCodeAssertion {
    pub expected: u16,
}

impl Assert for StatusCodeAssertion {
    fn name(&self) -> &'static str {
        "Status Code Assertion"
    }

    fn assert(&self, response: &Response) -> AssertionResult {
        if response.status_code == self.expected {
            AssertionResult::pass()
        } else {
            AssertionResult::fail(format!(
                "expecting status of {}, but received {}",
                self.expected, response.status_code
            ))
        }
    }
}

/// Passes when the pattern matches anywhere in the body.
#[derive(Debug, Clone)]
pub struct ContentAssertion {
    pattern: Regex,
}

impl ContentAssertion {
    pub fn new(pattern: &str) -> CheckResult<Self> {
        let pattern = Regex::new(pattern).map_err(|e| CheckError::Pattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { pattern })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl Assert for ContentAssertion {
    fn name(&self) -> &'static str {
        "Content Assertion"
    }

    fn assert(&self, response: &Response) -> AssertionResult {
        if self.pattern.is_match(&response.body) {
            AssertionResult::pass()
        } else {
            AssertionResult::fail("does not contain the expected text")
        }
    }
}

#[derive(Debug, Clone)]
pub enum Assertion {
    StatusCode(StatusCodeAssertion),
    Content(ContentAssertion),
}

impl Assert for Assertion {
    fn name(&self) -> &'static str {
        match self {
            Assertion::StatusCode(a) => a.name(),
            Assertion::Content(a) => a.name(),
        }
    }

    fn assert(&self, response: &Response) -> AssertionResult {
        match self {
            Assertion::StatusCode(a) => a.assert(response),
            Assertion::Content(a) => a.assert(response),
        }
    }
}

/// Ordered registry of assertions for one check.
#[derive(Debug, Clone, Default)]
pub struct AssertionSet {
    assertions: Vec<Assertion>,
}

impl AssertionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard set: status code first, then content if a pattern is given.
    pub fn build(expected_status: u16, expected_content: Option<&str>) -> CheckResult<Self> {
        let mut set = Self::new().with(Assertion::StatusCode(StatusCodeAssertion {
            expected: expected_status,
        }));
        if let Some(pattern) = expected_content.filter(|p| !p.is_empty()) {
            set = set.with(Assertion::Content(ContentAssertion::new(pattern)?));
        }
        Ok(set)
    }

    pub fn with(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assertion> {
        self.assertions.iter()
    }

    pub fn len(&self) -> usize {
        self.assertions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assertions.is_empty()
    }

    /// Evaluate in order, calling `observe` for each evaluated assertion.
    /// Returns the first failure; later assertions are not evaluated.
    pub fn evaluate(
        &self,
        response: &Response,
        mut observe: impl FnMut(&Assertion, &AssertionResult),
    ) -> Option<AssertionResult> {
        for assertion in &self.assertions {
            let result = assertion.assert(response);
            observe(assertion, &result);
            if !result.passed {
                return Some(result);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status_code: u16, body: &str) -> Response {
        Response {
            status_code,
            body: body.to_string(),
        }
    }

    #[test]
    fn status_code_assertion() {
        let a = StatusCodeAssertion { expected: 200 };
        assert!(a.assert(&response(200, "")).passed);

        let result = a.assert(&response(404, ""));
        assert!(!result.passed);
        assert_eq!(result.message, "expecting status of 200, but received 404");
    }

    #[test]
    fn content_assertion_searches_anywhere() {
        let a = ContentAssertion::new(r"status:\s*ok").unwrap();
        assert!(a.assert(&response(200, "<html>status: ok</html>")).passed);

        let result = a.assert(&response(200, "status: degraded"));
        assert!(!result.passed);
        assert_eq!(result.message, "does not contain the expected text");
    }

    #[test]
    fn content_assertion_respects_caller_anchors() {
        let a = ContentAssertion::new("^ok$").unwrap();
        assert!(a.assert(&response(200, "ok")).passed);
        assert!(!a.assert(&response(200, "not ok")).passed);
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let err = ContentAssertion::new("(unclosed").unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("(unclosed"));
    }

    #[test]
    fn build_orders_status_before_content() {
        let set = AssertionSet::build(200, Some("ok")).unwrap();
        let names: Vec<_> = set.iter().map(|a| a.name()).collect();
        assert_eq!(names, ["Status Code Assertion", "Content Assertion"]);

        assert_eq!(AssertionSet::build(200, None).unwrap().len(), 1);
        assert_eq!(AssertionSet::build(200, Some("")).unwrap().len(), 1);
    }

    #[test]
    fn evaluate_short_circuits() {
        let set = AssertionSet::build(200, Some("healthy")).unwrap();
        let mut evaluated = Vec::new();

        let failure = set
            .evaluate(&response(500, "broken"), |a, _| evaluated.push(a.name()))
            .unwrap();

        assert_eq!(failure.message, "expecting status of 200, but received 500");
        assert_eq!(evaluated, ["Status Code Assertion"]);
    }

    #[test]
    fn evaluate_all_passing() {
        let set = AssertionSet::build(200, Some("healthy")).unwrap();
        assert!(set.evaluate(&response(200, "all healthy"), |_, _| {}).is_none());
    }
}
