use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ─── Size bucket ──────────────────────────────────────────────

/// Employee-count bracket offered by the company size selector.
///
/// Variants are declared in ascending headcount order so the derived
/// `Ord` matches the order presented to the user.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SizeBucket {
    #[serde(rename = "1-10")]
    Micro,
    #[serde(rename = "11-50")]
    Small,
    #[serde(rename = "51-200")]
    Medium,
    #[serde(rename = "201-1000")]
    Large,
    #[serde(rename = "1000+")]
    Enterprise,
}

impl SizeBucket {
    pub const ALL: [SizeBucket; 5] = [
        SizeBucket::Micro,
        SizeBucket::Small,
        SizeBucket::Medium,
        SizeBucket::Large,
        SizeBucket::Enterprise,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeBucket::Micro => "1-10",
            SizeBucket::Small => "11-50",
            SizeBucket::Medium => "51-200",
            SizeBucket::Large => "201-1000",
            SizeBucket::Enterprise => "1000+",
        }
    }
}

impl fmt::Display for SizeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown size bucket: {0:?}")]
pub struct UnknownBucket(pub String);

impl FromStr for SizeBucket {
    type Err = UnknownBucket;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SizeBucket::ALL
            .into_iter()
            .find(|b| b.as_str() == s.trim())
            .ok_or_else(|| UnknownBucket(s.to_string()))
    }
}

// ─── Lookup result ────────────────────────────────────────────

/// A company record as held by the directory (`company_lookup` row shape).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    #[serde(default)]
    pub name: String,
    pub min_size: i64,
    pub max_size: i64,
}

/// Outcome of one directory lookup. Transient, produced once per email
/// submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupResult {
    pub found: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<Company>,
}

impl LookupResult {
    pub fn not_found() -> Self {
        Self {
            found: false,
            company: None,
        }
    }

    pub fn found(company: Company) -> Self {
        Self {
            found: true,
            company: Some(company),
        }
    }

    /// The matched company, only when `found` is set and a record is present.
    pub fn company(&self) -> Option<&Company> {
        if self.found {
            self.company.as_ref()
        } else {
            None
        }
    }
}

// ─── Contact draft ────────────────────────────────────────────

/// Form state owned by a single intake session.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactDraft {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub company_name: String,
    /// `None` renders as the empty "Select size..." option.
    pub company_size_bucket: Option<SizeBucket>,
    pub message: String,
}

impl ContactDraft {
    /// Names of required detail fields that are still empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.first_name.trim().is_empty() {
            missing.push("firstName");
        }
        if self.last_name.trim().is_empty() {
            missing.push("lastName");
        }
        if self.company_name.trim().is_empty() {
            missing.push("companyName");
        }
        if self.company_size_bucket.is_none() {
            missing.push("companySizeBucket");
        }
        missing
    }
}

// ─── Step ─────────────────────────────────────────────────────

/// Form step. Strictly linear, no back-transitions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Step {
    #[default]
    Email,
    Checking,
    Details,
    Success,
}

impl Step {
    pub fn next(self) -> Option<Step> {
        match self {
            Step::Email => Some(Step::Checking),
            Step::Checking => Some(Step::Details),
            Step::Details => Some(Step::Success),
            Step::Success => None,
        }
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Step::Email => "EMAIL",
            Step::Checking => "CHECKING",
            Step::Details => "DETAILS",
            Step::Success => "SUCCESS",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bucket_serializes_as_range_label() {
        let json = serde_json::to_string(&SizeBucket::Enterprise).unwrap();
        assert_eq!(json, "\"1000+\"");
        let back: SizeBucket = serde_json::from_str("\"51-200\"").unwrap();
        assert_eq!(back, SizeBucket::Medium);
    }

    #[test]
    fn bucket_order_is_ascending_headcount() {
        let mut sorted = SizeBucket::ALL;
        sorted.sort();
        assert_eq!(sorted, SizeBucket::ALL);
        assert!(SizeBucket::Micro < SizeBucket::Enterprise);
    }

    #[test]
    fn bucket_from_str_rejects_unknown() {
        assert_eq!("201-1000".parse::<SizeBucket>(), Ok(SizeBucket::Large));
        assert!("huge".parse::<SizeBucket>().is_err());
        assert!("".parse::<SizeBucket>().is_err());
    }

    #[test]
    fn company_accessor_requires_found_flag() {
        let inconsistent = LookupResult {
            found: false,
            company: Some(Company {
                name: "Acme".into(),
                min_size: 1,
                max_size: 5,
            }),
        };
        assert!(inconsistent.company().is_none());

        let missing = LookupResult {
            found: true,
            company: None,
        };
        assert!(missing.company().is_none());
    }

    #[test]
    fn not_found_omits_company_on_the_wire() {
        let json = serde_json::to_value(LookupResult::not_found()).unwrap();
        assert_eq!(json, serde_json::json!({ "found": false }));
    }

    #[test]
    fn draft_reports_missing_required_fields() {
        let draft = ContactDraft {
            email: "a@b.com".into(),
            first_name: "Ada".into(),
            last_name: "  ".into(),
            ..Default::default()
        };
        assert_eq!(
            draft.missing_fields(),
            vec!["lastName", "companyName", "companySizeBucket"]
        );
    }

    #[test]
    fn step_is_linear() {
        assert_eq!(Step::default(), Step::Email);
        assert_eq!(Step::Email.next(), Some(Step::Checking));
        assert_eq!(Step::Checking.next(), Some(Step::Details));
        assert_eq!(Step::Details.next(), Some(Step::Success));
        assert!(Step::Success.is_terminal());
        assert_eq!(Step::Checking.to_string(), "CHECKING");
    }
}
