//! Atoms interned once per connection.

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        _NET_SUPPORTED,
        _NET_NUMBER_OF_DESKTOPS,
        _NET_CURRENT_DESKTOP,
        _NET_DESKTOP_NAMES,
        _NET_CLIENT_LIST,
        _NET_WM_DESKTOP,
        _NET_WM_STATE,
        _NET_WM_STATE_SKIP_PAGER,
        _NET_WM_STATE_STICKY,
        _NET_WM_NAME,
        UTF8_STRING,
    }
}
