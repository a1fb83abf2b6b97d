//! Upgrade notifications.
//!
//! The host reports every package update of a resolution run; once the run
//! is over, each watched package that changed version gets one notification
//! with the upgrade notes that apply to the change.

use log::{debug, info};
use std::collections::BTreeMap;

use crate::changelog::{ChangelogSource, find_upgrade_notes};
use crate::config::WatchedPackage;
use crate::package::{PackageInfo, VersionToken};

/// Notes longer than this are replaced by a pointer to the online notes.
pub const MAX_NOTE_LINES: usize = 250;

/// Receives user-facing messages.
#[cfg_attr(test, mockall::automock)]
pub trait OutputSink {
    fn write(&mut self, message: &str);
}

/// Writes messages to standard output.
pub struct ConsoleSink;

impl OutputSink for ConsoleSink {
    fn write(&mut self, message: &str) {
        println!("{}", message);
    }
}

impl OutputSink for Vec<String> {
    fn write(&mut self, message: &str) {
        self.push(message.to_string());
    }
}

/// Host-supplied answer to "is this an upgrade?".
///
/// The host's resolution policy is authoritative; the direction of an update
/// is never derived from the version strings here.
pub trait VersionPolicy {
    fn is_upgrade(&self, initial: &PackageInfo, target: &PackageInfo) -> bool;
}

impl<F> VersionPolicy for F
where
    F: Fn(&PackageInfo, &PackageInfo) -> bool,
{
    fn is_upgrade(&self, initial: &PackageInfo, target: &PackageInfo) -> bool {
        self(initial, target)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn verb(self) -> &'static str {
        match self {
            Direction::Up => "upgraded",
            Direction::Down => "downgraded",
        }
    }
}

/// One package update observed during a resolution run.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageUpdateRecord {
    pub package_name: String,
    pub from: VersionToken,
    pub to: VersionToken,
    pub from_pretty: String,
    pub to_pretty: String,
    pub direction: Direction,
}

impl PackageUpdateRecord {
    /// The later of the two versions, as the user wrote it.
    pub fn newest_pretty(&self) -> &str {
        match self.direction {
            Direction::Up => &self.to_pretty,
            Direction::Down => &self.from_pretty,
        }
    }
}

#[derive(Debug, Default)]
enum NotifierState {
    #[default]
    Idle,
    TrackingUpdates(BTreeMap<String, PackageUpdateRecord>),
}

/// Buffers package updates for one run and reports on them at its end.
pub struct UpgradeNotifier<S: OutputSink, C: ChangelogSource> {
    sink: S,
    source: C,
    watch: Vec<WatchedPackage>,
    state: NotifierState,
}

impl<S: OutputSink, C: ChangelogSource> UpgradeNotifier<S, C> {
    pub fn new(sink: S, source: C, watch: Vec<WatchedPackage>) -> Self {
        Self {
            sink,
            source,
            watch,
            state: NotifierState::Idle,
        }
    }

    pub fn is_tracking(&self) -> bool {
        matches!(self.state, NotifierState::TrackingUpdates(_))
    }

    pub fn tracked(&self, package: &str) -> Option<&PackageUpdateRecord> {
        match &self.state {
            NotifierState::TrackingUpdates(updates) => updates.get(package),
            NotifierState::Idle => None,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Record that `initial` is being replaced by `target`.
    ///
    /// A second update of the same package replaces the first.
    pub fn on_package_update_noted<P: VersionPolicy + ?Sized>(
        &mut self,
        initial: &PackageInfo,
        target: &PackageInfo,
        policy: &P,
    ) {
        let direction = if policy.is_upgrade(initial, target) {
            Direction::Up
        } else {
            Direction::Down
        };

        let record = PackageUpdateRecord {
            package_name: initial.name.clone(),
            from: VersionToken::parse(initial.display_version()),
            to: VersionToken::parse(target.display_version()),
            from_pretty: initial.display_version().to_string(),
            to_pretty: target.display_version().to_string(),
            direction,
        };
        debug!(
            "Noted {} {} -> {} ({:?})",
            record.package_name, record.from_pretty, record.to_pretty, direction
        );

        if let NotifierState::Idle = self.state {
            self.state = NotifierState::TrackingUpdates(BTreeMap::new());
        }
        if let NotifierState::TrackingUpdates(updates) = &mut self.state {
            updates.insert(initial.name.clone(), record);
        }
    }

    /// Report on every watched package updated during the run, then forget
    /// the run. Returns the number of notifications written.
    #[tracing::instrument(skip(self))]
    pub fn on_resolution_run_completed(&mut self) -> usize {
        let updates = match std::mem::take(&mut self.state) {
            NotifierState::TrackingUpdates(updates) => updates,
            NotifierState::Idle => return 0,
        };

        let mut written = 0;
        for record in updates.values() {
            let Some(watched) = self.watch.iter().find(|w| w.name == record.package_name) else {
                continue;
            };
            if let Some(message) = self.compose(watched, record) {
                self.sink.write(&message);
                written += 1;
            }
        }

        info!("Wrote {} upgrade notification(s)", written);
        written
    }

    fn compose(&self, watched: &WatchedPackage, record: &PackageUpdateRecord) -> Option<String> {
        if record.from_pretty == record.to_pretty {
            debug!("{} stayed at {}", record.package_name, record.from_pretty);
            return None;
        }

        let notes = find_upgrade_notes(&self.source, &record.package_name, &record.from, &record.to);
        if notes.as_ref().is_some_and(Vec::is_empty) {
            debug!("No upgrade notes apply to {}", record.package_name);
            return None;
        }

        let mut message = format!(
            "\n  Seems you have {} {} from version {} to {}.\n\
             \n  Please check the upgrade notes for possible incompatible changes\
             \n  and adjust your application code accordingly.",
            record.direction.verb(),
            watched.display_name,
            record.from_pretty,
            record.to_pretty
        );

        if let Some(notes) = notes {
            let text = notes.join("\n");
            let text = text.trim_end();
            if text.lines().count() > MAX_NOTE_LINES {
                message.push_str(
                    "\n\n  The relevant notes for your upgrade are too long to be displayed here.",
                );
            } else {
                message.push('\n');
                for line in text.lines() {
                    message.push('\n');
                    if !line.is_empty() {
                        message.push_str("  ");
                        message.push_str(line);
                    }
                }
            }
        }

        if let Some(link) = watched.notes_link(record.newest_pretty()) {
            message.push_str("\n\n  You can find the upgrade notes for all versions online at:");
            message.push_str(&format!("\n  {}\n", link));
        }

        Some(message)
    }
}
