use serde::Serialize;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub field: &'static str,
    pub message: &'static str,
}

struct Rule {
    field: &'static str,
    message: &'static str,
    check: fn(&str) -> bool,
}

// Declared in evaluation order. The non-empty and length rules on the same
// field are independent, so an empty name reports both violations.
const RULES: [Rule; 5] = [
    Rule {
        field: "country",
        message: "Country name is required",
        check: |v| !v.is_empty(),
    },
    Rule {
        field: "name",
        message: "User name is required",
        check: |v| !v.is_empty(),
    },
    Rule {
        field: "name",
        message: "Name must be between 2 and 50 characters",
        check: |v| (2..=50).contains(&v.chars().count()),
    },
    Rule {
        field: "content",
        message: "Content is required",
        check: |v| !v.is_empty(),
    },
    Rule {
        field: "content",
        message: "Content must be between 10 and 1000 characters",
        check: |v| (10..=1000).contains(&v.chars().count()),
    },
];

/// Runs every rule against the trimmed inputs and collects all violations;
/// an empty result means the request is valid.
pub fn validate_experience(country: &str, name: &str, content: &str) -> Vec<Violation> {
    let country = country.trim();
    let name = name.trim();
    let content = content.trim();

    RULES
        .iter()
        .filter(|rule| {
            let value = match rule.field {
                "country" => country,
                "name" => name,
                _ => content,
            };
            !(rule.check)(value)
        })
        .map(|rule| Violation {
            field: rule.field,
            message: rule.message,
        })
        .collect()
}
