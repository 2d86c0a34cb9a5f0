use serde::{Deserialize, Serialize};

/// A spending classification. Declaration order is display and chart order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub(crate) enum Category {
    Groceries,
    Rent,
    Gas,
    Entertainment,
    #[serde(rename = "Flex-Spending")]
    FlexSpending,
}

impl Category {
    pub(crate) fn as_str(&self) -> &'static str {
        match self {
            Self::Groceries => "Groceries",
            Self::Rent => "Rent",
            Self::Gas => "Gas",
            Self::Entertainment => "Entertainment",
            Self::FlexSpending => "Flex-Spending",
        }
    }

    /// Case-insensitive lookup by display name. Unknown names yield `None`.
    pub(crate) fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "groceries" => Some(Self::Groceries),
            "rent" => Some(Self::Rent),
            "gas" => Some(Self::Gas),
            "entertainment" => Some(Self::Entertainment),
            "flex-spending" | "flex spending" | "flexspending" => Some(Self::FlexSpending),
            _ => None,
        }
    }

    pub(crate) fn all() -> &'static [Category] {
        &[
            Self::Groceries,
            Self::Rent,
            Self::Gas,
            Self::Entertainment,
            Self::FlexSpending,
        ]
    }

    /// Chart color as RGB.
    pub(crate) fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Self::Groceries => (0x4E, 0xCD, 0xC4),
            Self::Rent => (0x96, 0xCE, 0xB4),
            Self::Gas => (0x45, 0xB7, 0xD1),
            Self::Entertainment => (0xFF, 0xEE, 0xAD),
            Self::FlexSpending => (0xFF, 0x6B, 0x6B),
        }
    }

    /// Position in [`Category::all`], used by forms that cycle through categories.
    pub(crate) fn index(&self) -> usize {
        Self::all().iter().position(|c| c == self).unwrap_or(0)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
