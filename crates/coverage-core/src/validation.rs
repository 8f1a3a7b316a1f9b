//! Per-type schema validation with diagnostics.
//!
//! Validation runs over the raw JSON document before it is decoded into the
//! typed model, collecting every issue in a single pass instead of stopping
//! at the first one.

use std::fmt;
use std::sync::LazyLock;

use serde_json::{Map, Value, json};

use crate::fhir::ResourceType;
use crate::time::FhirDate;

static ID_PATTERN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"^[A-Za-z0-9\-\.]{1,64}$").expect("Invalid id regex"));

const COVERAGE_STATUS: &[&str] = &["active", "cancelled", "draft", "entered-in-error"];
const ELIGIBILITY_PURPOSE: &[&str] = &["auth-requirements", "benefits", "discovery", "validation"];
const ELIGIBILITY_OUTCOME: &[&str] = &["queued", "complete", "error", "partial"];
const ADMINISTRATIVE_GENDER: &[&str] = &["male", "female", "other", "unknown"];

/// Single validation issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub severity: IssueSeverity,
    /// FHIR issue type code (`required`, `value`, `structure`, `code-invalid`)
    pub code: &'static str,
    pub diagnostics: String,
    /// Location in the resource (FHIRPath-like expression)
    pub location: String,
}

impl ValidationIssue {
    fn error(code: &'static str, location: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self {
            severity: IssueSeverity::Error,
            code,
            diagnostics: diagnostics.into(),
            location: location.into(),
        }
    }

    pub fn required(location: impl Into<String>) -> Self {
        let location = location.into();
        let diagnostics = format!("missing required element '{location}'");
        Self::error("required", location, diagnostics)
    }

    pub fn invalid_value(location: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self::error("value", location, diagnostics)
    }

    pub fn structure(location: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self::error("structure", location, diagnostics)
    }

    pub fn code_invalid(location: impl Into<String>, value: &str, allowed: &[&str]) -> Self {
        Self::error(
            "code-invalid",
            location,
            format!("'{value}' is not one of {}", allowed.join(", ")),
        )
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.location, self.diagnostics)
    }
}

/// Issue severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueSeverity {
    Error,
}

impl IssueSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueSeverity::Error => "error",
        }
    }
}

/// Render issues as a FHIR OperationOutcome.
pub fn operation_outcome(issues: &[ValidationIssue]) -> Value {
    json!({
        "resourceType": "OperationOutcome",
        "issue": issues.iter().map(|i| json!({
            "severity": i.severity.as_str(),
            "code": i.code,
            "diagnostics": i.diagnostics,
            "location": [i.location],
        })).collect::<Vec<_>>()
    })
}

/// Validate a raw document against the schema of `resource_type`.
///
/// Returns an empty list when the document is valid.
pub fn validate(resource_type: ResourceType, value: &Value) -> Vec<ValidationIssue> {
    let root = resource_type.as_str();
    let mut issues = Vec::new();

    let Some(obj) = value.as_object() else {
        issues.push(ValidationIssue::structure(root, "resource must be a JSON object"));
        return issues;
    };

    reject_nulls(value, root, &mut issues);

    match obj.get("resourceType") {
        Some(Value::String(declared)) if declared == root => {}
        Some(Value::String(declared)) => issues.push(ValidationIssue::invalid_value(
            format!("{root}.resourceType"),
            format!("declared resourceType '{declared}' does not match '{root}'"),
        )),
        Some(_) => issues.push(ValidationIssue::structure(
            format!("{root}.resourceType"),
            "resourceType must be a string",
        )),
        None => issues.push(ValidationIssue::required(format!("{root}.resourceType"))),
    }

    let mut checker = Checker {
        obj,
        path: root.to_string(),
        issues,
    };

    if let Some(id) = checker.string("id", true)
        && !ID_PATTERN.is_match(id)
    {
        checker.issues.push(ValidationIssue::invalid_value(
            format!("{root}.id"),
            format!("'{id}' is not a valid FHIR id"),
        ));
    }

    match resource_type {
        ResourceType::Patient => {
            checker.boolean("active");
            checker.code("gender", ADMINISTRATIVE_GENDER, false);
            checker.date("birthDate", false, false);
            checker.object_array("name", false, |_| {});
        }
        ResourceType::Organization => {
            checker.boolean("active");
            checker.string("name", false);
        }
        ResourceType::Coverage => {
            checker.code("status", COVERAGE_STATUS, true);
            checker.reference("beneficiary", true);
            checker.object_array("payor", true, |payor| payor.reference_fields());
            checker.reference("subscriber", false);
            checker.object("period", false, |period| {
                period.date("start", false, false);
                period.date("end", false, false);
            });
        }
        ResourceType::CoverageEligibilityRequest => {
            checker.code("status", COVERAGE_STATUS, true);
            checker.code_array("purpose", ELIGIBILITY_PURPOSE);
            checker.reference("patient", true);
            checker.date("created", true, true);
            checker.reference("insurer", true);
            checker.object_array("insurance", true, |insurance| {
                insurance.reference("coverage", true);
                insurance.boolean("focal");
            });
        }
        ResourceType::CoverageEligibilityResponse => {
            checker.code("status", COVERAGE_STATUS, true);
            checker.code_array("purpose", ELIGIBILITY_PURPOSE);
            checker.reference("patient", true);
            checker.date("created", true, true);
            checker.reference("request", true);
            checker.code("outcome", ELIGIBILITY_OUTCOME, true);
            checker.reference("insurer", true);
            checker.string("disposition", false);
            checker.object_array("insurance", false, |insurance| {
                insurance.reference("coverage", true);
                insurance.boolean("inforce");
            });
        }
    }

    checker.issues
}

fn reject_nulls(value: &Value, path: &str, issues: &mut Vec<ValidationIssue>) {
    match value {
        Value::Null => issues.push(ValidationIssue::structure(path, "null is not allowed")),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                reject_nulls(item, &format!("{path}[{i}]"), issues);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                reject_nulls(item, &format!("{path}.{key}"), issues);
            }
        }
        _ => {}
    }
}

/// Field checks scoped to one JSON object at `path`.
struct Checker<'a> {
    obj: &'a Map<String, Value>,
    path: String,
    issues: Vec<ValidationIssue>,
}

impl<'a> Checker<'a> {
    fn location(&self, field: &str) -> String {
        format!("{}.{field}", self.path)
    }

    /// Nulls are reported by `reject_nulls`, so they count as present here.
    fn field(&mut self, field: &str, required: bool) -> Option<&'a Value> {
        match self.obj.get(field) {
            Some(Value::Null) => None,
            Some(v) => Some(v),
            None => {
                if required {
                    self.issues.push(ValidationIssue::required(self.location(field)));
                }
                None
            }
        }
    }

    fn string(&mut self, field: &str, required: bool) -> Option<&'a str> {
        let value = self.field(field, required)?;
        let location = self.location(field);
        match value.as_str() {
            Some(s) if !s.trim().is_empty() => Some(s),
            Some(_) => {
                self.issues.push(ValidationIssue::invalid_value(
                    location,
                    "string must not be empty",
                ));
                None
            }
            None => {
                self.issues
                    .push(ValidationIssue::structure(location, "expected a string"));
                None
            }
        }
    }

    fn boolean(&mut self, field: &str) {
        if let Some(value) = self.field(field, false)
            && !value.is_boolean()
        {
            let location = self.location(field);
            self.issues
                .push(ValidationIssue::structure(location, "expected a boolean"));
        }
    }

    fn code(&mut self, field: &str, allowed: &[&str], required: bool) {
        if let Some(code) = self.string(field, required)
            && !allowed.contains(&code)
        {
            let location = self.location(field);
            self.issues
                .push(ValidationIssue::code_invalid(location, code, allowed));
        }
    }

    fn code_array(&mut self, field: &str, allowed: &[&str]) {
        let Some(value) = self.field(field, true) else {
            return;
        };
        let location = self.location(field);
        match value.as_array() {
            Some(items) if items.is_empty() => self.issues.push(ValidationIssue::invalid_value(
                location,
                "at least one element is required",
            )),
            Some(items) => {
                for (i, item) in items.iter().enumerate() {
                    match item.as_str() {
                        Some(code) if allowed.contains(&code) => {}
                        Some(code) => self.issues.push(ValidationIssue::code_invalid(
                            format!("{location}[{i}]"),
                            code,
                            allowed,
                        )),
                        None if item.is_null() => {}
                        None => self.issues.push(ValidationIssue::structure(
                            format!("{location}[{i}]"),
                            "expected a code string",
                        )),
                    }
                }
            }
            None => self
                .issues
                .push(ValidationIssue::structure(location, "expected an array")),
        }
    }

    fn date(&mut self, field: &str, allow_datetime: bool, required: bool) {
        let Some(raw) = self.string(field, required) else {
            return;
        };
        let parsed = if allow_datetime {
            FhirDate::parse_date_or_datetime(raw)
        } else {
            FhirDate::parse_date(raw)
        };
        if parsed.is_err() {
            let expected = if allow_datetime {
                "YYYY-MM-DD or an RFC 3339 date-time"
            } else {
                "YYYY-MM-DD"
            };
            let location = self.location(field);
            self.issues.push(ValidationIssue::invalid_value(
                location,
                format!("'{raw}' is not a valid date (expected {expected})"),
            ));
        }
    }

    /// Runs `check` against a nested object.
    fn nested(&mut self, obj: &'a Map<String, Value>, path: String, check: impl FnOnce(&mut Checker<'a>)) {
        let mut child = Checker {
            obj,
            path,
            issues: std::mem::take(&mut self.issues),
        };
        check(&mut child);
        self.issues = child.issues;
    }

    fn object(&mut self, field: &str, required: bool, check: impl FnOnce(&mut Checker<'a>)) {
        let Some(value) = self.field(field, required) else {
            return;
        };
        let location = self.location(field);
        match value.as_object() {
            Some(obj) => self.nested(obj, location, check),
            None => self
                .issues
                .push(ValidationIssue::structure(location, "expected an object")),
        }
    }

    fn reference(&mut self, field: &str, required: bool) {
        self.object(field, required, |reference| reference.reference_fields());
    }

    fn reference_fields(&mut self) {
        self.string("reference", false);
    }

    /// An array of objects; `required` also demands at least one element.
    fn object_array(&mut self, field: &str, required: bool, check: impl Fn(&mut Checker<'a>)) {
        let Some(value) = self.field(field, required) else {
            return;
        };
        let location = self.location(field);
        let Some(items) = value.as_array() else {
            self.issues
                .push(ValidationIssue::structure(location, "expected an array"));
            return;
        };
        if required && items.is_empty() {
            self.issues.push(ValidationIssue::invalid_value(
                location.clone(),
                "at least one element is required",
            ));
        }
        for (i, item) in items.iter().enumerate() {
            let item_location = format!("{location}[{i}]");
            match item.as_object() {
                Some(obj) => self.nested(obj, item_location, &check),
                None if item.is_null() => {}
                None => self.issues.push(ValidationIssue::structure(
                    item_location,
                    "expected an object",
                )),
            }
        }
    }
}
