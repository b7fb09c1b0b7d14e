// SPDX-License-Identifier: Apache-2.0

//! Risk classification of model replies.
//!
//! The model is asked to start its reply with one of three category words.
//! [`interpret`] scans the reply for the first line mentioning a category and
//! splits it into the category and the comment that follows.
//!
//! Line matching keeps the historical rules: `BLUE` and `RED` must appear in
//! upper case, while `BLACK` matches in any case. A matched line does not have
//! to consist of the token alone (`"RED - needs review"` resolves to
//! [`Category::Red`]); when a line mentions several tokens the leftmost wins.

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Risk category attached to a pull request as a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// Simple and straightforward.
    Blue,
    /// Complex; needs more review time.
    Red,
    /// Critical; must be reviewed by a senior engineer.
    Black,
}

impl Category {
    /// All categories, in label-creation order.
    pub const ALL: [Category; 3] = [Category::Blue, Category::Red, Category::Black];

    /// Label name, which is also the token the model emits.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Blue => "BLUE",
            Category::Red => "RED",
            Category::Black => "BLACK",
        }
    }

    /// Label color (hex, no `#`).
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Category::Blue => "2A3EDD",
            Category::Red => "DD2A2A",
            Category::Black => "000000",
        }
    }

    /// Label description shown on GitHub.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Category::Blue => "This PR is simple and straightforward.",
            Category::Red => "This PR is complex and may require more time to review.",
            Category::Black => {
                "This PR has critical implications and must be reviewed by a senior engineer."
            }
        }
    }

    /// Byte offset of this category's token in `line`, if the line mentions it.
    fn find_in(self, line: &str) -> Option<usize> {
        match self {
            Category::Blue | Category::Red => line.find(self.as_str()),
            Category::Black => line.to_ascii_uppercase().find(self.as_str()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Error returned when a string is not exactly one category token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCategory(pub String);

impl fmt::Display for UnknownCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown category '{}'", self.0)
    }
}

impl std::error::Error for UnknownCategory {}

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Strict, case-insensitive lookup of a whole token.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "BLUE" => Ok(Category::Blue),
            "RED" => Ok(Category::Red),
            "BLACK" => Ok(Category::Black),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

/// Result of interpreting a model reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Interpretation {
    /// Category found in the reply, if any.
    pub category: Option<Category>,
    /// Text to post: the lines after the category line, or the whole reply.
    pub comment: String,
}

/// Resolves the category a single line mentions.
///
/// A line that is exactly one token (any case) resolves directly; otherwise
/// the leftmost mentioned token wins.
#[must_use]
pub fn category_in_line(line: &str) -> Option<Category> {
    let mentioned: Vec<(usize, Category)> = Category::ALL
        .iter()
        .filter_map(|c| c.find_in(line).map(|pos| (pos, *c)))
        .collect();
    if mentioned.is_empty() {
        return None;
    }
    if let Ok(exact) = line.parse::<Category>() {
        return Some(exact);
    }
    mentioned
        .into_iter()
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, c)| c)
}

/// Splits a model reply into an optional category and the comment to post.
///
/// The reply is split on `\n`. The first line mentioning a category decides
/// it, and every line after it (rejoined with `\n`) becomes the comment.
/// Without a match, the reply is returned unchanged as the comment.
#[must_use]
pub fn interpret(reply: &str) -> Interpretation {
    let lines: Vec<&str> = reply.split('\n').collect();
    for (i, line) in lines.iter().enumerate() {
        if let Some(category) = category_in_line(line) {
            return Interpretation {
                category: Some(category),
                comment: lines[i + 1..].join("\n"),
            };
        }
    }
    Interpretation {
        category: None,
        comment: reply.to_string(),
    }
}
