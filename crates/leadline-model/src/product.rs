// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductLine {
    Auto,
    Home,
    Life,
    Health,
    Disability,
}

impl ProductLine {
    pub const ALL: [ProductLine; 5] = [
        ProductLine::Auto,
        ProductLine::Home,
        ProductLine::Life,
        ProductLine::Health,
        ProductLine::Disability,
    ];

    /// Accepts the canonical slug plus the `-insurance` suffixed form the
    /// marketing pages use in their URLs.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_ascii_lowercase();
        let slug = normalized
            .strip_suffix("-insurance")
            .unwrap_or(normalized.as_str());
        match slug {
            "auto" => Some(Self::Auto),
            "home" => Some(Self::Home),
            "life" => Some(Self::Life),
            "health" => Some(Self::Health),
            "disability" => Some(Self::Disability),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Home => "home",
            Self::Life => "life",
            Self::Health => "health",
            Self::Disability => "disability",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Auto => "Auto Insurance",
            Self::Home => "Home Insurance",
            Self::Life => "Life Insurance",
            Self::Health => "Health Insurance",
            Self::Disability => "Disability Insurance",
        }
    }

    /// Life quotes are priced on age, so the birth date is mandatory.
    #[must_use]
    pub const fn requires_date_of_birth(self) -> bool {
        matches!(self, Self::Life)
    }
}

impl Display for ProductLine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_slugs_and_page_paths() {
        assert_eq!(ProductLine::parse("auto"), Some(ProductLine::Auto));
        assert_eq!(ProductLine::parse(" Life "), Some(ProductLine::Life));
        assert_eq!(
            ProductLine::parse("disability-insurance"),
            Some(ProductLine::Disability)
        );
        assert_eq!(ProductLine::parse("pet"), None);
        assert_eq!(ProductLine::parse(""), None);
    }

    #[test]
    fn as_str_roundtrips_through_parse() {
        for product in ProductLine::ALL {
            assert_eq!(ProductLine::parse(product.as_str()), Some(product));
        }
    }
}
