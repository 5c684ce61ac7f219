use x11rb::{atom_manager, protocol::xproto};

atom_manager! {
    /// A collection of Atoms.
    pub AtomCollection:

    /// A handle to a response from the X11 server.
    AtomCollectionCookie {
        WMProtocols: b"WM_PROTOCOLS" as &[u8],
        WMDelete: b"WM_DELETE_WINDOW",
        WMState: b"WM_STATE",
        WMClass: b"WM_CLASS",
        WMName: b"WM_NAME",
        WMTransientFor: b"WM_TRANSIENT_FOR",

        NetActiveWindow: b"_NET_ACTIVE_WINDOW",
        NetSupported: b"_NET_SUPPORTED",
        NetSupportingWmCheck: b"_NET_SUPPORTING_WM_CHECK",
        NetWMName: b"_NET_WM_NAME",
        NetWMPid: b"_NET_WM_PID",

        NetWMState: b"_NET_WM_STATE",
        NetWMStateFullscreen: b"_NET_WM_STATE_FULLSCREEN",

        NetWMWindowType: b"_NET_WM_WINDOW_TYPE",
        NetWMWindowTypeDock: b"_NET_WM_WINDOW_TYPE_DOCK",
        NetWMWindowTypeDialog: b"_NET_WM_WINDOW_TYPE_DIALOG",
        NetWMWindowTypeSplash: b"_NET_WM_WINDOW_TYPE_SPLASH",
        NetWMWindowTypeUtility: b"_NET_WM_WINDOW_TYPE_UTILITY",

        NetClientList: b"_NET_CLIENT_LIST",
        NetNumberOfDesktops: b"_NET_NUMBER_OF_DESKTOPS",
        NetCurrentDesktop: b"_NET_CURRENT_DESKTOP",
        NetDesktopNames: b"_NET_DESKTOP_NAMES",
        NetWMStrutPartial: b"_NET_WM_STRUT_PARTIAL",
        NetWMStrut: b"_NET_WM_STRUT",

        UTF8String: b"UTF8_STRING",
    }
}

impl AtomCollection {
    pub fn net_supported(&self) -> Vec<xproto::Atom> {
        vec![
            self.NetActiveWindow,
            self.NetSupported,
            self.NetSupportingWmCheck,
            self.NetWMName,
            self.NetWMPid,
            self.NetWMState,
            self.NetWMStateFullscreen,
            self.NetWMWindowType,
            self.NetWMWindowTypeDock,
            self.NetWMWindowTypeDialog,
            self.NetClientList,
            self.NetNumberOfDesktops,
            self.NetCurrentDesktop,
            self.NetDesktopNames,
            self.NetWMStrutPartial,
            self.NetWMStrut,
        ]
    }
}
