//! Upgrade-note changelogs.
//!
//! A changelog is a plain-text document split into sections, one per release:
//!
//! ```text
//! Upgrade from Yii 2.0.13
//! -----------------------
//!
//! Notes for leaving 2.0.13.
//! ```
//!
//! A section heading is a line naming a release number, directly followed by
//! an underline of `-` or `=` of the same length. Sections are listed newest
//! first.

mod select;
mod source;

use crate::package::VersionToken;

pub use select::{find_upgrade_notes, select_notes};
pub use source::{ChangelogSource, FileChangelogSource, UPGRADE_FILE};

#[cfg(test)]
pub use source::MockChangelogSource;

/// One heading-delimited block of a changelog.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangelogSection {
    /// Release number named by the heading, e.g. `2.0.13.1`.
    pub version_label: String,
    pub heading: String,
    pub underline: String,
    /// Everything after the underline up to the next heading.
    pub body: String,
    /// Position in the document, starting at 0.
    pub order: usize,
}

impl ChangelogSection {
    pub fn version(&self) -> VersionToken {
        VersionToken::parse(&self.version_label)
    }

    /// The section as it appeared in the document.
    pub fn render(&self) -> String {
        format!("{}\n{}\n{}", self.heading, self.underline, self.body)
    }
}

/// Split a changelog into its sections, in document order.
///
/// Text before the first section heading is not part of any section.
pub fn parse(document: &str) -> Vec<ChangelogSection> {
    let lines: Vec<&str> = document
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();

    let mut sections = Vec::new();
    let mut current: Option<(String, String, String)> = None;
    let mut body: Vec<&str> = Vec::new();

    let mut i = 0;
    while i < lines.len() {
        let heading = lines[i];
        if let Some(label) = lines
            .get(i + 1)
            .filter(|underline| is_underline_of(underline, heading))
            .and_then(|_| heading_version(heading))
        {
            if let Some((label, heading, underline)) = current.take() {
                sections.push(ChangelogSection {
                    version_label: label,
                    heading,
                    underline,
                    body: body.join("\n"),
                    order: sections.len(),
                });
            }
            body.clear();
            current = Some((label, heading.to_string(), lines[i + 1].to_string()));
            i += 2;
            continue;
        }

        if current.is_some() {
            body.push(heading);
        }
        i += 1;
    }

    if let Some((label, heading, underline)) = current {
        sections.push(ChangelogSection {
            version_label: label,
            heading,
            underline,
            body: body.join("\n"),
            order: sections.len(),
        });
    }

    sections
}

fn is_underline_of(underline: &str, heading: &str) -> bool {
    let Some(first) = underline.chars().next() else {
        return false;
    };
    (first == '-' || first == '=')
        && underline.chars().all(|c| c == first)
        && underline.chars().count() == heading.chars().count()
}

/// The last release number mentioned in a heading line.
fn heading_version(heading: &str) -> Option<String> {
    heading
        .split_whitespace()
        .rev()
        .map(|word| word.trim_end_matches([',', ':', ';', ')']))
        .find(|word| VersionToken::parse(word).is_numeric())
        .map(String::from)
}
