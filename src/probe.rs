//! Runtime capability probe.
//!
//! Decides once, at startup, which host backend drives the controller.
//! The probe only inspects the environment; connecting to the chosen
//! backend happens afterwards in `main`.

use crate::config::BackendChoice;
use std::fmt;

/// A concrete, usable backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Hyprland IPC sockets.
    Hyprland,
    /// EWMH root window properties on an X11 display.
    Ewmh,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Hyprland => write!(f, "hyprland"),
            Backend::Ewmh => write!(f, "ewmh"),
        }
    }
}

/// Why no backend could be selected.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("no supported window manager found (need HYPRLAND_INSTANCE_SIGNATURE or DISPLAY)")]
    NoBackend,
    #[error("backend {0} requested but {1} is not set")]
    MissingEnv(BackendChoice, &'static str),
    #[error("backend ewmh requested but this build lacks the `backend-ewmh` feature")]
    NotCompiled,
}

/// Whether the EWMH backend was compiled in.
pub const EWMH_AVAILABLE: bool = cfg!(feature = "backend-ewmh");

/// Pick a backend for `choice`, reading environment variables via `env`.
///
/// `Auto` prefers Hyprland, since XWayland also exports `DISPLAY` inside a
/// Hyprland session.
pub fn detect(
    choice: BackendChoice,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Backend, ProbeError> {
    let has = |name: &str| env(name).is_some_and(|v| !v.is_empty());
    match choice {
        BackendChoice::Hyprland => {
            if has("HYPRLAND_INSTANCE_SIGNATURE") {
                Ok(Backend::Hyprland)
            } else {
                Err(ProbeError::MissingEnv(choice, "HYPRLAND_INSTANCE_SIGNATURE"))
            }
        }
        BackendChoice::Ewmh => {
            if !EWMH_AVAILABLE {
                Err(ProbeError::NotCompiled)
            } else if has("DISPLAY") {
                Ok(Backend::Ewmh)
            } else {
                Err(ProbeError::MissingEnv(choice, "DISPLAY"))
            }
        }
        BackendChoice::Auto => {
            if has("HYPRLAND_INSTANCE_SIGNATURE") {
                Ok(Backend::Hyprland)
            } else if EWMH_AVAILABLE && has("DISPLAY") {
                Ok(Backend::Ewmh)
            } else {
                Err(ProbeError::NoBackend)
            }
        }
    }
}

/// [`detect`] against the process environment.
pub fn detect_from_env(choice: BackendChoice) -> Result<Backend, ProbeError> {
    detect(choice, |name| std::env::var(name).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn auto_prefers_hyprland() {
        let e = env(&[("HYPRLAND_INSTANCE_SIGNATURE", "abc"), ("DISPLAY", ":0")]);
        assert_eq!(detect(BackendChoice::Auto, e), Ok(Backend::Hyprland));
    }

    #[test]
    fn auto_falls_back_to_ewmh() {
        let result = detect(BackendChoice::Auto, env(&[("DISPLAY", ":0")]));
        if EWMH_AVAILABLE {
            assert_eq!(result, Ok(Backend::Ewmh));
        } else {
            assert_eq!(result, Err(ProbeError::NoBackend));
        }
    }

    #[test]
    fn auto_without_session_fails() {
        assert_eq!(detect(BackendChoice::Auto, env(&[])), Err(ProbeError::NoBackend));
        assert_eq!(
            detect(BackendChoice::Auto, env(&[("DISPLAY", "")])),
            Err(ProbeError::NoBackend)
        );
    }

    #[test]
    fn explicit_choice_needs_its_environment() {
        assert_eq!(
            detect(BackendChoice::Hyprland, env(&[("DISPLAY", ":0")])),
            Err(ProbeError::MissingEnv(
                BackendChoice::Hyprland,
                "HYPRLAND_INSTANCE_SIGNATURE"
            ))
        );
        assert_eq!(
            detect(BackendChoice::Hyprland, env(&[("HYPRLAND_INSTANCE_SIGNATURE", "x")])),
            Ok(Backend::Hyprland)
        );
    }

    #[test]
    fn explicit_ewmh_inside_hyprland_is_honoured() {
        let e = env(&[("HYPRLAND_INSTANCE_SIGNATURE", "abc"), ("DISPLAY", ":0")]);
        let result = detect(BackendChoice::Ewmh, e);
        if EWMH_AVAILABLE {
            assert_eq!(result, Ok(Backend::Ewmh));
        } else {
            assert_eq!(result, Err(ProbeError::NotCompiled));
        }
    }
}
