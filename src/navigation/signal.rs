use serde::{Deserialize, Serialize};
use url::Url;

/// Placeholder origin used to resolve relative paths and hrefs
const LOCAL_ORIGIN: &str = "http://player.local/";

/// The kind of signal that made a session leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaveTrigger {
    /// Browser back/forward
    HistoryPop,
    /// In-app route change that pushes a history entry
    HistoryPush,
    /// In-app route change that replaces the current entry
    HistoryReplace,
    /// Click on a hyperlink that isn't a same-page fragment
    LinkClick,
    /// Tab or window close, refresh
    BeforeUnload,
    PageHide,
    /// The host tore the player down
    Unmount,
}

impl LeaveTrigger {
    /// Unload-type triggers fire while the page is going away, so the
    /// current path may already be gone and is not compared.
    pub fn checks_path(&self) -> bool {
        !matches!(
            self,
            LeaveTrigger::BeforeUnload | LeaveTrigger::PageHide | LeaveTrigger::Unmount
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaveTrigger::HistoryPop => "history_pop",
            LeaveTrigger::HistoryPush => "history_push",
            LeaveTrigger::HistoryReplace => "history_replace",
            LeaveTrigger::LinkClick => "link_click",
            LeaveTrigger::BeforeUnload => "before_unload",
            LeaveTrigger::PageHide => "page_hide",
            LeaveTrigger::Unmount => "unmount",
        }
    }
}

/// A navigation-related signal published by the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum NavigationSignal {
    HistoryPop { path: String },
    HistoryPush { path: String },
    HistoryReplace { path: String },
    LinkClick { href: String },
    BeforeUnload,
    PageHide,
}

impl NavigationSignal {
    pub fn trigger(&self) -> LeaveTrigger {
        match self {
            NavigationSignal::HistoryPop { .. } => LeaveTrigger::HistoryPop,
            NavigationSignal::HistoryPush { .. } => LeaveTrigger::HistoryPush,
            NavigationSignal::HistoryReplace { .. } => LeaveTrigger::HistoryReplace,
            NavigationSignal::LinkClick { .. } => LeaveTrigger::LinkClick,
            NavigationSignal::BeforeUnload => LeaveTrigger::BeforeUnload,
            NavigationSignal::PageHide => LeaveTrigger::PageHide,
        }
    }

    /// Whether this signal takes the user away from a player mounted on
    /// `mount_path`.
    pub fn leaves(&self, mount_path: &str) -> bool {
        if !self.trigger().checks_path() {
            return true;
        }

        let target = match self {
            NavigationSignal::BeforeUnload | NavigationSignal::PageHide => return true,
            NavigationSignal::LinkClick { href } if href.starts_with('#') => return false,
            NavigationSignal::LinkClick { href } => href,
            NavigationSignal::HistoryPop { path }
            | NavigationSignal::HistoryPush { path }
            | NavigationSignal::HistoryReplace { path } => path,
        };

        match (resolve(mount_path, mount_path), resolve(mount_path, target)) {
            (Some(current), Some(destination)) => {
                current.host_str() != destination.host_str()
                    || current.port_or_known_default() != destination.port_or_known_default()
                    || normalize(current.path()) != normalize(destination.path())
            }
            // Anything we can't make sense of is treated as leaving
            _ => true,
        }
    }
}

fn resolve(mount_path: &str, target: &str) -> Option<Url> {
    let origin = Url::parse(LOCAL_ORIGIN).ok()?;
    let base = origin.join(mount_path).ok()?;
    base.join(target).ok()
}

fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}
