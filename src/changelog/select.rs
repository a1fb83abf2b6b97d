//! Selection of the changelog sections relevant to one version change.

use log::debug;

use super::{ChangelogSection, ChangelogSource, parse};
use crate::package::VersionToken;

/// Pick the sections that matter when moving between `from` and `to`.
///
/// Headings read "Upgrade from X": a section is relevant when X lies between
/// the lower and the higher of the two versions, both ends included. When
/// the lower version has no section of its own (e.g. `2.0.12.1`), the
/// section of its major.minor.patch floor (`2.0.12`) is included as well.
/// If neither version is a release number, only the newest section is
/// returned.
///
/// Returns `None` if there are no sections to choose from.
pub fn select_notes(
    sections: &[ChangelogSection],
    from: &VersionToken,
    to: &VersionToken,
) -> Option<Vec<String>> {
    let newest = sections.first()?;

    let (low, high) = if from <= to { (from, to) } else { (to, from) };

    if !low.is_numeric() && !high.is_numeric() {
        return Some(vec![newest.render()]);
    }

    let has_exact_section = sections.iter().any(|s| s.version() == *low);
    let floor = if has_exact_section {
        low.clone()
    } else {
        std::cmp::min(low.clone(), low.patch_floor())
    };

    let notes = sections
        .iter()
        .filter(|section| {
            let version = section.version();
            version <= *high && version >= floor
        })
        .map(ChangelogSection::render)
        .collect();

    Some(notes)
}

/// Fetch the changelog of `package` and select the notes for `from` → `to`.
///
/// `None` means the notes could not be determined: the changelog is missing
/// or has no version sections. `Some(vec![])` means nothing applies.
#[tracing::instrument(skip(source))]
pub fn find_upgrade_notes<S: ChangelogSource + ?Sized>(
    source: &S,
    package: &str,
    from: &VersionToken,
    to: &VersionToken,
) -> Option<Vec<String>> {
    let Some(document) = source.changelog(package) else {
        debug!("No changelog available for {}", package);
        return None;
    };

    let sections = parse(&document);
    if sections.is_empty() {
        debug!("Changelog of {} has no version sections", package);
        return None;
    }

    select_notes(&sections, from, to)
}
