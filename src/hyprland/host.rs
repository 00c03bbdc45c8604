//! [`DesktopHost`] implementation backed by Hyprland IPC.
//!
//! Desktops are the regular (positive id) workspaces in ascending id
//! order.  Hyprland destroys a workspace as soon as it is empty and not
//! shown, so desktops created here are kept alive with a `persistent`
//! workspace rule, and removing the last desktop drops that rule again.

use super::ipc::{self, HyprlandError};
use crate::model::{Desktop, Window, WindowId};
use crate::traits::DesktopHost;
use log::{debug, warn};
use serde::Deserialize;

/// Hyprland-backed desktop host.
///
/// No connection is held; each method call opens a short-lived IPC
/// request, so every read is a fresh snapshot.
pub struct HyprlandHost;

impl Default for HyprlandHost {
    fn default() -> Self {
        Self
    }
}

impl HyprlandHost {
    /// Create a new handle.
    pub fn new() -> Self {
        Self
    }
}

//  Minimal serde structs for the JSON we care about

/// Subset of an object returned by `j/workspaces` and `j/activeworkspace`.
#[derive(Debug, Deserialize)]
struct WorkspaceJson {
    id: i64,
}

/// Subset of an object returned by `j/clients`.
#[derive(Debug, Deserialize)]
struct ClientJson {
    address: String,
    #[serde(default = "mapped_default")]
    mapped: bool,
    workspace: WorkspaceJson,
    #[serde(default)]
    pinned: bool,
    #[serde(default)]
    title: String,
}

fn mapped_default() -> bool {
    true
}

/// Regular workspaces in pager order.  Special and named workspaces carry
/// negative ids and are not desktops.
fn desktops_from(workspaces: Vec<WorkspaceJson>) -> Vec<Desktop> {
    let mut ids: Vec<i64> = workspaces.into_iter().map(|w| w.id).filter(|&id| id > 0).collect();
    ids.sort_unstable();
    ids.dedup();
    ids.into_iter().map(Desktop).collect()
}

/// Convert a client into a [`Window`], or `None` when its address cannot
/// be parsed.
fn window_from(client: ClientJson) -> Option<Window> {
    let id = match client.address.parse::<WindowId>() {
        Ok(id) => id,
        Err(e) => {
            warn!("skipping client with bad address {:?}: {}", client.address, e);
            return None;
        }
    };
    let ws = client.workspace.id;
    Some(Window {
        id,
        label: client.title,
        desktops: if ws > 0 { vec![Desktop(ws)] } else { Vec::new() },
        skip_pager: ws <= 0 || !client.mapped,
        on_all_desktops: client.pinned,
    })
}

/// Workspace rule that pins (or unpins) workspace `id` in existence.
fn persistent_rule(id: i64, persistent: bool, label: &str) -> String {
    let mut rule = format!("workspace {},persistent:{}", id, persistent);
    if persistent && !label.is_empty() {
        rule.push_str(&format!(",defaultName:{}", label));
    }
    rule
}

impl HyprlandHost {
    fn clients(&self) -> Result<Vec<Window>, HyprlandError> {
        let clients: Vec<ClientJson> = ipc::query("clients")?;
        Ok(clients.into_iter().filter_map(window_from).collect())
    }
}

//  DesktopHost implementation

impl DesktopHost for HyprlandHost {
    type Error = HyprlandError;

    fn desktops(&self) -> Result<Vec<Desktop>, Self::Error> {
        Ok(desktops_from(ipc::query("workspaces")?))
    }

    fn current_desktop(&self) -> Result<Desktop, Self::Error> {
        let ws: WorkspaceJson = ipc::query("activeworkspace")?;
        Ok(Desktop(ws.id))
    }

    fn append_desktop(&self, label: &str) -> Result<(), Self::Error> {
        let next = self.desktops()?.last().map_or(1, |d| d.0 + 1);
        debug!("creating persistent workspace {}", next);
        ipc::keyword(&persistent_rule(next, true, label))
    }

    fn remove_last_desktop(&self) -> Result<(), Self::Error> {
        let last = self
            .desktops()?
            .last()
            .copied()
            .ok_or_else(|| HyprlandError("no workspace to remove".into()))?;
        debug!("releasing workspace {}", last.0);
        ipc::keyword(&persistent_rule(last.0, false, ""))
    }

    fn windows(&self) -> Result<Vec<Window>, Self::Error> {
        self.clients()
    }

    fn window(&self, id: WindowId) -> Result<Option<Window>, Self::Error> {
        Ok(self.clients()?.into_iter().find(|w| w.id == id))
    }

    fn set_window_desktops(&self, id: WindowId, desktops: &[Desktop]) -> Result<(), Self::Error> {
        // Hyprland windows live on exactly one workspace.
        let Some(target) = desktops.first() else {
            return Ok(());
        };
        ipc::dispatch(&format!("movetoworkspacesilent {},address:{}", target.0, id))
    }
}
