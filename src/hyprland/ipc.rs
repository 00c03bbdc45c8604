//! Direct Hyprland IPC helpers.
//!
//! Talks to Hyprland through its Unix sockets under
//! `$XDG_RUNTIME_DIR/hypr/$HYPRLAND_INSTANCE_SIGNATURE/`, avoiding any shell
//! command invocation or third-party crate for socket discovery.

use serde::de::DeserializeOwned;
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

/// Errors that can occur when talking to Hyprland.
#[derive(Debug, thiserror::Error)]
#[error("hyprland IPC error: {0}")]
pub struct HyprlandError(pub(crate) String);

/// Resolve the directory holding the sockets of the running instance.
fn instance_dir() -> Result<PathBuf, HyprlandError> {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR")
        .map_err(|_| HyprlandError("XDG_RUNTIME_DIR not set".into()))?;
    let his = std::env::var("HYPRLAND_INSTANCE_SIGNATURE")
        .map_err(|_| HyprlandError("HYPRLAND_INSTANCE_SIGNATURE not set".into()))?;
    Ok(PathBuf::from(format!("{}/hypr/{}", runtime_dir, his)))
}

/// The command socket (`.socket.sock`).
pub(crate) fn socket_path() -> Result<PathBuf, HyprlandError> {
    Ok(instance_dir()?.join(".socket.sock"))
}

/// The event socket (`.socket2.sock`).
pub(crate) fn socket2_path() -> Result<PathBuf, HyprlandError> {
    Ok(instance_dir()?.join(".socket2.sock"))
}

/// Send a raw command to the Hyprland command socket and return the
/// response as a string.
pub(crate) fn request(command: &str) -> Result<String, HyprlandError> {
    let path = socket_path()?;
    let mut stream = UnixStream::connect(&path)
        .map_err(|e| HyprlandError(format!("connect to {}: {}", path.display(), e)))?;

    stream
        .write_all(command.as_bytes())
        .map_err(|e| HyprlandError(format!("write: {}", e)))?;

    let mut response = Vec::new();
    stream
        .read_to_end(&mut response)
        .map_err(|e| HyprlandError(format!("read: {}", e)))?;

    String::from_utf8(response).map_err(|e| HyprlandError(format!("utf-8: {}", e)))
}

/// Send a JSON data query (`j/<command>`) and decode the reply.
pub(crate) fn query<T: DeserializeOwned>(data_command: &str) -> Result<T, HyprlandError> {
    let json = request(&format!("j/{}", data_command))?;
    serde_json::from_str(&json).map_err(|e| HyprlandError(format!("parse {}: {}", data_command, e)))
}

/// Check that a command was acknowledged with `ok`.
fn expect_ok(kind: &str, response: String) -> Result<(), HyprlandError> {
    if response.trim() == "ok" {
        Ok(())
    } else {
        Err(HyprlandError(format!("{} error: {}", kind, response.trim())))
    }
}

/// Send a dispatch command and check for `"ok"`.
pub(crate) fn dispatch(args: &str) -> Result<(), HyprlandError> {
    expect_ok("dispatch", request(&format!("/dispatch {}", args))?)
}

/// Set a config keyword at runtime and check for `"ok"`.
pub(crate) fn keyword(args: &str) -> Result<(), HyprlandError> {
    expect_ok("keyword", request(&format!("/keyword {}", args))?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_response_is_accepted() {
        assert!(expect_ok("dispatch", "ok\n".into()).is_ok());
    }

    #[test]
    fn other_response_is_an_error() {
        let err = expect_ok("keyword", "invalid field".into()).unwrap_err();
        assert_eq!(err.to_string(), "hyprland IPC error: keyword error: invalid field");
    }
}
