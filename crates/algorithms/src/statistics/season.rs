//! Climatological seasons of Bangladesh

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Season of the year.
///
/// Ordering follows the listing order: Winter, Pre-monsoon, Monsoon,
/// Post-monsoon. Winter keeps its calendar year: December 2000 and
/// January 2000 both fall in the 2000 Winter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    #[serde(rename = "Winter")]
    Winter,
    #[serde(rename = "Pre-monsoon")]
    PreMonsoon,
    #[serde(rename = "Monsoon")]
    Monsoon,
    #[serde(rename = "Post-monsoon")]
    PostMonsoon,
}

impl Season {
    pub const ALL: [Season; 4] = [
        Season::Winter,
        Season::PreMonsoon,
        Season::Monsoon,
        Season::PostMonsoon,
    ];

    /// Season of a calendar month (1-12)
    pub fn from_month(month: u32) -> Option<Self> {
        match month {
            12 | 1 | 2 => Some(Season::Winter),
            3..=5 => Some(Season::PreMonsoon),
            6..=9 => Some(Season::Monsoon),
            10 | 11 => Some(Season::PostMonsoon),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Season::Winter => "Winter",
            Season::PreMonsoon => "Pre-monsoon",
            Season::Monsoon => "Monsoon",
            Season::PostMonsoon => "Post-monsoon",
        }
    }

    /// Month span, used in map titles
    pub fn months_label(&self) -> &'static str {
        match self {
            Season::Winter => "Dec-Feb",
            Season::PreMonsoon => "Mar-May",
            Season::Monsoon => "Jun-Sep",
            Season::PostMonsoon => "Oct-Nov",
        }
    }

    pub fn months(&self) -> &'static [u32] {
        match self {
            Season::Winter => &[12, 1, 2],
            Season::PreMonsoon => &[3, 4, 5],
            Season::Monsoon => &[6, 7, 8, 9],
            Season::PostMonsoon => &[10, 11],
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Season {
    type Err = String;

    /// Case-insensitive; accepts "Pre-monsoon", "premonsoon", "pre_monsoon"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "winter" => Ok(Season::Winter),
            "premonsoon" => Ok(Season::PreMonsoon),
            "monsoon" => Ok(Season::Monsoon),
            "postmonsoon" => Ok(Season::PostMonsoon),
            _ => Err(format!("unknown season '{s}'")),
        }
    }
}
