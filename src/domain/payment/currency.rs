//! Supported settlement currencies.

use serde::{Deserialize, Serialize};

/// Currencies accepted for payments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Currency {
    Usd,
    Eur,
    Mxn,
}

impl Currency {
    /// ISO 4217 code in lower case, as used on the wire.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "usd",
            Currency::Eur => "eur",
            Currency::Mxn => "mxn",
        }
    }

    /// Parses a currency code, case-insensitively.
    pub fn parse(code: &str) -> Option<Self> {
        match code.to_ascii_lowercase().as_str() {
            "usd" => Some(Currency::Usd),
            "eur" => Some(Currency::Eur),
            "mxn" => Some(Currency::Mxn),
            _ => None,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Currency::parse("USD"), Some(Currency::Usd));
        assert_eq!(Currency::parse("mxn"), Some(Currency::Mxn));
        assert_eq!(Currency::parse("gbp"), None);
    }

    #[test]
    fn wire_codes_are_lower_case() {
        assert_eq!(Currency::Eur.code(), "eur");
        assert_eq!(serde_json::to_string(&Currency::Usd).unwrap(), "\"usd\"");
    }
}
