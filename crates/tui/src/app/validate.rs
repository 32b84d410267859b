//! Field validators.
//!
//! Every rule is a pure check from the raw input to an optional message.
//! Rules other than [`Rule::Required`] accept an empty value, so optional
//! fields can still carry shape rules.

use api_types::Amount;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Required,
    Email,
    Numeric,
    PositiveNumber,
    MinLength(usize),
    MaxLength(usize),
}

impl Rule {
    pub fn check(self, value: &str) -> Option<String> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return (self == Self::Required).then(|| "required".to_string());
        }

        match self {
            Self::Required => None,
            Self::Email => (!looks_like_email(trimmed)).then(|| "invalid email".to_string()),
            Self::Numeric => trimmed
                .parse::<Amount>()
                .err()
                .map(|_| "must be a number".to_string()),
            Self::PositiveNumber => match trimmed.parse::<Amount>() {
                Ok(amount) if amount.is_positive() => None,
                Ok(_) => Some("must be greater than zero".to_string()),
                Err(_) => Some("must be a number".to_string()),
            },
            Self::MinLength(min) => (trimmed.chars().count() < min)
                .then(|| format!("at least {min} characters")),
            Self::MaxLength(max) => {
                (trimmed.chars().count() > max).then(|| format!("at most {max} characters"))
            }
        }
    }
}

/// Runs `rules` in order and returns the first message.
pub fn first_error(rules: &[Rule], value: &str) -> Option<String> {
    rules.iter().find_map(|rule| rule.check(value))
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain
            .split_once('.')
            .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty() && !tld.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_blank() {
        assert_eq!(Rule::Required.check("   "), Some("required".to_string()));
        assert_eq!(Rule::Required.check("x"), None);
    }

    #[test]
    fn non_required_rules_skip_empty() {
        for rule in [
            Rule::Email,
            Rule::Numeric,
            Rule::PositiveNumber,
            Rule::MinLength(3),
        ] {
            assert_eq!(rule.check(""), None, "{rule:?}");
        }
    }

    #[test]
    fn email_shape() {
        assert_eq!(Rule::Email.check("ann@example.com"), None);
        assert!(Rule::Email.check("ann@example").is_some());
        assert!(Rule::Email.check("@example.com").is_some());
        assert!(Rule::Email.check("ann@@example.com").is_some());
        assert!(Rule::Email.check("ann smith@example.com").is_some());
    }

    #[test]
    fn numbers() {
        assert_eq!(Rule::Numeric.check("-5"), None);
        assert_eq!(Rule::Numeric.check("12,50"), None);
        assert!(Rule::Numeric.check("12a").is_some());
        assert_eq!(Rule::PositiveNumber.check("0.01"), None);
        assert!(Rule::PositiveNumber.check("-5").is_some());
        assert!(Rule::PositiveNumber.check("0").is_some());
    }

    #[test]
    fn lengths_count_chars() {
        assert_eq!(Rule::MinLength(3).check("été"), None);
        assert!(Rule::MinLength(4).check("été").is_some());
        assert!(Rule::MaxLength(2).check("abc").is_some());
    }

    #[test]
    fn composition_returns_first_message() {
        let rules = [Rule::Required, Rule::Numeric, Rule::PositiveNumber];
        assert_eq!(first_error(&rules, ""), Some("required".to_string()));
        assert_eq!(first_error(&rules, "x"), Some("must be a number".to_string()));
        assert_eq!(
            first_error(&rules, "-5"),
            Some("must be greater than zero".to_string())
        );
        assert_eq!(first_error(&rules, "5"), None);
    }
}
