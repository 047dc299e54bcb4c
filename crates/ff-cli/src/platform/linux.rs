//! X11 focus and idle sampling.
//!
//! Focus comes from the EWMH `_NET_ACTIVE_WINDOW` property on the root
//! window; idle time comes from the MIT-SCREEN-SAVER extension.

use std::fmt;

use ff_core::{ActiveWindow, FocusSampler, IdleSampler, SamplerError};
use x11rb::connection::Connection;
use x11rb::protocol::screensaver;
use x11rb::protocol::xproto::{self, Atom, AtomEnum, Window};
use x11rb::rust_connection::RustConnection;

/// Application name used when a window carries no `WM_CLASS`.
const UNKNOWN_APPLICATION: &str = "Unknown";

/// Longest property read, in 32-bit units.
const MAX_PROPERTY_LENGTH: u32 = 1024;

/// Pre-interned X11 atoms for property queries.
struct Atoms {
    net_active_window: Atom,
    net_wm_name: Atom,
    utf8_string: Atom,
}

/// Connection to the X display shared by focus and idle queries.
pub struct X11Sampler {
    conn: RustConnection,
    root: Window,
    atoms: Atoms,
}

impl fmt::Debug for X11Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("X11Sampler")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl X11Sampler {
    /// Connect to the display named by `$DISPLAY` and intern required atoms.
    pub fn connect() -> Result<Self, SamplerError> {
        let (conn, screen_num) = RustConnection::connect(None)
            .map_err(|e| SamplerError::Unavailable(format!("connect failed: {e}")))?;

        let root = conn
            .setup()
            .roots
            .get(screen_num)
            .map(|screen| screen.root)
            .ok_or_else(|| SamplerError::Unavailable(format!("no screen {screen_num}")))?;

        let atoms = Atoms {
            net_active_window: intern(&conn, b"_NET_ACTIVE_WINDOW")?,
            net_wm_name: intern(&conn, b"_NET_WM_NAME")?,
            utf8_string: intern(&conn, b"UTF8_STRING")?,
        };

        tracing::debug!(screen = screen_num, root, "connected to X11 display");
        Ok(Self { conn, root, atoms })
    }

    fn active_window_id(&self) -> Result<Option<Window>, SamplerError> {
        let reply = xproto::get_property(
            &self.conn,
            false,
            self.root,
            self.atoms.net_active_window,
            AtomEnum::WINDOW,
            0,
            1,
        )
        .map_err(|e| query("get_property _NET_ACTIVE_WINDOW", e))?
        .reply()
        .map_err(|e| query("get_property reply", e))?;

        Ok(reply
            .value32()
            .and_then(|mut values| values.next())
            .filter(|&window| window != 0))
    }

    fn text_property(
        &self,
        window: Window,
        property: Atom,
        kind: Atom,
    ) -> Result<Option<String>, SamplerError> {
        let reply = xproto::get_property(
            &self.conn,
            false,
            window,
            property,
            kind,
            0,
            MAX_PROPERTY_LENGTH,
        )
        .map_err(|e| query("get_property", e))?
        .reply()
        .map_err(|e| query("get_property reply", e))?;

        if reply.value.is_empty() {
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&reply.value).into_owned()))
    }

    fn window_title(&self, window: Window) -> Result<String, SamplerError> {
        if let Some(title) =
            self.text_property(window, self.atoms.net_wm_name, self.atoms.utf8_string)?
        {
            return Ok(title);
        }
        Ok(self
            .text_property(window, AtomEnum::WM_NAME.into(), AtomEnum::STRING.into())?
            .unwrap_or_default())
    }
}

impl FocusSampler for X11Sampler {
    fn active_window(&self) -> Result<Option<ActiveWindow>, SamplerError> {
        let Some(window) = self.active_window_id()? else {
            return Ok(None);
        };

        let window_title = self.window_title(window)?;
        let app_name = self
            .text_property(window, AtomEnum::WM_CLASS.into(), AtomEnum::STRING.into())?
            .map_or_else(|| UNKNOWN_APPLICATION.to_string(), |raw| wm_class_name(&raw));

        Ok(Some(ActiveWindow {
            app_name,
            window_title,
        }))
    }
}

impl IdleSampler for X11Sampler {
    fn idle_seconds(&self) -> Result<u64, SamplerError> {
        let info = screensaver::query_info(&self.conn, self.root)
            .map_err(|e| query("screensaver query_info", e))?
            .reply()
            .map_err(|e| query("screensaver query_info reply", e))?;
        Ok(u64::from(info.ms_since_user_input / 1000))
    }
}

fn intern(conn: &RustConnection, name: &[u8]) -> Result<Atom, SamplerError> {
    let atom = xproto::intern_atom(conn, false, name)
        .map_err(|e| SamplerError::Unavailable(format!("intern_atom: {e}")))?
        .reply()
        .map_err(|e| SamplerError::Unavailable(format!("intern_atom reply: {e}")))?
        .atom;
    Ok(atom)
}

fn query(what: &str, err: impl fmt::Display) -> SamplerError {
    SamplerError::Query(format!("{what}: {err}"))
}

/// `WM_CLASS` holds `instance\0class\0`. The class names the application.
fn wm_class_name(raw: &str) -> String {
    let mut parts = raw.split('\0').filter(|part| !part.is_empty());
    let instance = parts.next();
    parts
        .next()
        .or(instance)
        .unwrap_or(UNKNOWN_APPLICATION)
        .to_string()
}
