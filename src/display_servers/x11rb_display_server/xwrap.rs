//! Thin wrapper around the x11rb connection: window surgery, grabs,
//! properties, and the readability notifier the reactor selects on.
use std::collections::{HashMap, HashSet};
use std::os::fd::AsRawFd;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Notify};
use x11rb::connection::Connection;
use x11rb::properties::WmClass;
use x11rb::protocol::randr::ConnectionExt as _;
use x11rb::protocol::xproto::{self, ConnectionExt as _};
use x11rb::protocol::Event;
use x11rb::rust_connection::RustConnection;
use x11rb::wrapper::ConnectionExt as _;

use super::xatom::AtomCollection;
use crate::errors::Result;
use crate::models::{hex_color_pixel, FrameAppearance, Strut, Xyhw};
use crate::utils::modmask_lookup::{to_x_mask, ModMask};

#[inline]
pub fn root_event_mask() -> xproto::EventMask {
    xproto::EventMask::SUBSTRUCTURE_REDIRECT
        | xproto::EventMask::SUBSTRUCTURE_NOTIFY
        | xproto::EventMask::STRUCTURE_NOTIFY
        | xproto::EventMask::PROPERTY_CHANGE
}

#[inline]
fn frame_event_mask() -> xproto::EventMask {
    xproto::EventMask::ENTER_WINDOW
        | xproto::EventMask::SUBSTRUCTURE_NOTIFY
        | xproto::EventMask::EXPOSURE
}

const MAX_PROPERTY_VALUE_LEN: u32 = 4096;

/// Grab variants so bindings fire regardless of num/caps lock.
const LOCK_VARIANTS: [u16; 4] = [0, 1 << 1, 1 << 4, (1 << 1) | (1 << 4)];

/// Contains Xserver information and origins.
pub(crate) struct XWrap {
    conn: RustConnection,
    root: xproto::Window,
    pub atoms: AtomCollection,
    screen_rect: Xyhw,

    min_keycode: u8,
    keysyms_per_keycode: u8,
    keysyms: Vec<u32>,

    appearance: FrameAppearance,
    /// client -> frame
    frames: HashMap<u32, u32>,
    /// frame -> client
    clients: HashMap<u32, u32>,
    pub docks: HashSet<u32>,
    check_window: xproto::Window,
    pub alive: bool,

    _task_guard: oneshot::Receiver<()>,
    pub task_notify: Arc<Notify>,
}

impl XWrap {
    /// Connect and start the readability notifier. Must run inside the
    /// tokio runtime (the notifier is a blocking task).
    pub fn new() -> Result<Self> {
        const X_SOCKET: mio::Token = mio::Token(0);
        let (conn, display) = x11rb::connect(None)?;

        // Bridge the X socket's readability into a Notify the reactor can
        // select on. The blocking task holds the sender half of a oneshot;
        // it stops once XWrap (owning the receiver) is gone.
        let fd = conn.stream().as_raw_fd();
        let (guard, _task_guard) = oneshot::channel::<()>();
        let notify = Arc::new(Notify::new());
        let task_notify = notify.clone();
        let mut poll = mio::Poll::new()?;
        poll.registry()
            .register(&mut mio::unix::SourceFd(&fd), X_SOCKET, mio::Interest::READABLE)?;
        tokio::task::spawn_blocking(move || {
            let tick = Duration::from_millis(100);
            let mut events = mio::Events::with_capacity(1);
            while !guard.is_closed() {
                match poll.poll(&mut events, Some(tick)) {
                    Ok(()) => {
                        // One wake-up per poll is enough; the reactor drains
                        // every pending event when it runs.
                        if events.iter().any(|event| event.token() == X_SOCKET) {
                            notify.notify_one();
                        }
                    }
                    Err(err) => tracing::warn!("polling the X socket failed: {err}"),
                }
            }
            tracing::debug!("X readability notifier stopped");
        });

        let atoms = AtomCollection::new(&conn)?.reply()?;
        let setup = conn.setup();
        let min_keycode = setup.min_keycode;
        let max_keycode = setup.max_keycode;
        let screen = &setup.roots[display];
        let root = screen.root;
        let screen_rect = Xyhw::new(0, 0, screen.width_in_pixels.into(), screen.height_in_pixels.into());

        let mapping = conn
            .get_keyboard_mapping(min_keycode, max_keycode - min_keycode + 1)?
            .reply()?;

        Ok(Self {
            conn,
            root,
            atoms,
            screen_rect,
            min_keycode,
            keysyms_per_keycode: mapping.keysyms_per_keycode,
            keysyms: mapping.keysyms,
            appearance: FrameAppearance::default(),
            frames: HashMap::new(),
            clients: HashMap::new(),
            docks: HashSet::new(),
            check_window: 0,
            alive: true,
            _task_guard,
            task_notify,
        })
    }

    /// Claim substructure redirect on the root and publish EWMH hints.
    /// Fails when another window manager already owns the root.
    pub fn init(&mut self) -> Result<()> {
        xproto::change_window_attributes(
            &self.conn,
            self.root,
            &xproto::ChangeWindowAttributesAux::new().event_mask(root_event_mask()),
        )?
        .check()?;

        let check = self.conn.generate_id()?;
        xproto::create_window(
            &self.conn,
            x11rb::COPY_DEPTH_FROM_PARENT,
            check,
            self.root,
            -1,
            -1,
            1,
            1,
            0,
            xproto::WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &xproto::CreateWindowAux::new(),
        )?;
        self.check_window = check;
        for window in [self.root, check] {
            self.conn.change_property32(
                xproto::PropMode::REPLACE,
                window,
                self.atoms.NetSupportingWmCheck,
                xproto::AtomEnum::WINDOW,
                &[check],
            )?;
        }
        self.conn.change_property8(
            xproto::PropMode::REPLACE,
            check,
            self.atoms.NetWMName,
            self.atoms.UTF8String,
            b"mywm",
        )?;
        self.conn.change_property32(
            xproto::PropMode::REPLACE,
            self.root,
            self.atoms.NetSupported,
            xproto::AtomEnum::ATOM,
            &self.atoms.net_supported(),
        )?;
        xproto::delete_property(&self.conn, self.root, self.atoms.NetClientList)?;
        self.sync()?;
        Ok(())
    }

    /// Monitor rectangles from randr; the whole screen when randr has none.
    pub fn monitors(&self) -> Vec<Xyhw> {
        let from_randr = || -> Result<Vec<Xyhw>> {
            let reply = self.conn.randr_get_monitors(self.root, true)?.reply()?;
            Ok(reply
                .monitors
                .iter()
                .map(|m| Xyhw::new(m.x.into(), m.y.into(), m.width.into(), m.height.into()))
                .collect())
        };
        match from_randr() {
            Ok(monitors) if !monitors.is_empty() => monitors,
            _ => vec![self.screen_rect],
        }
    }

    // ---- frames ---------------------------------------------------------

    /// Allocate the decoration window and reparent the client into it.
    pub fn create_frame(&mut self, client: u32, geometry: Xyhw) -> Result<u32> {
        let frame = self.conn.generate_id()?;
        let inset = self.appearance.inset();
        xproto::create_window(
            &self.conn,
            x11rb::COPY_DEPTH_FROM_PARENT,
            frame,
            self.root,
            geometry.x as i16,
            geometry.y as i16,
            geometry.w.max(1) as u16,
            geometry.h.max(1) as u16,
            0,
            xproto::WindowClass::INPUT_OUTPUT,
            x11rb::COPY_FROM_PARENT,
            &xproto::CreateWindowAux::new()
                .event_mask(frame_event_mask())
                .background_pixel(hex_color_pixel(&self.appearance.outer_color)),
        )?;
        // Keep the client alive if we die before handing it back.
        xproto::change_save_set(&self.conn, xproto::SetMode::INSERT, client)?;
        xproto::reparent_window(&self.conn, client, frame, inset as i16, inset as i16)?;
        xproto::change_window_attributes(
            &self.conn,
            client,
            &xproto::ChangeWindowAttributesAux::new()
                .event_mask(xproto::EventMask::PROPERTY_CHANGE),
        )?;
        xproto::map_window(&self.conn, client)?;

        self.frames.insert(client, frame);
        self.clients.insert(frame, client);
        let managed: Vec<u32> = self.frames.keys().copied().collect();
        self.conn.change_property32(
            xproto::PropMode::REPLACE,
            self.root,
            self.atoms.NetClientList,
            xproto::AtomEnum::WINDOW,
            &managed,
        )?;
        self.move_resize_frame(client, geometry, false)?;
        Ok(frame)
    }

    /// Hand the client back to the root and destroy its frame.
    pub fn teardown_frame(&mut self, client: u32) -> Result<()> {
        let Some(frame) = self.frames.remove(&client) else {
            return Ok(());
        };
        self.clients.remove(&frame);
        let geometry = self.conn.get_geometry(frame)?.reply()?;
        xproto::reparent_window(&self.conn, client, self.root, geometry.x, geometry.y)?;
        xproto::change_save_set(&self.conn, xproto::SetMode::DELETE, client)?;
        xproto::destroy_window(&self.conn, frame)?;
        let managed: Vec<u32> = self.frames.keys().copied().collect();
        self.conn.change_property32(
            xproto::PropMode::REPLACE,
            self.root,
            self.atoms.NetClientList,
            xproto::AtomEnum::WINDOW,
            &managed,
        )?;
        Ok(())
    }

    /// Configure the frame to `geometry`, the client to the inset rect,
    /// then redraw the borders.
    pub fn move_resize_frame(&mut self, client: u32, geometry: Xyhw, borderless: bool) -> Result<()> {
        let Some(&frame) = self.frames.get(&client) else {
            return Ok(());
        };
        let inset = if borderless { 0 } else { self.appearance.inset() };
        xproto::configure_window(
            &self.conn,
            frame,
            &xproto::ConfigureWindowAux::new()
                .x(geometry.x)
                .y(geometry.y)
                .width(geometry.w.max(1) as u32)
                .height(geometry.h.max(1) as u32),
        )?;
        xproto::configure_window(
            &self.conn,
            client,
            &xproto::ConfigureWindowAux::new()
                .x(inset)
                .y(inset)
                .width((geometry.w - 2 * inset).max(1) as u32)
                .height((geometry.h - 2 * inset).max(1) as u32),
        )?;
        if !borderless {
            self.draw_borders(frame, geometry)?;
        }
        Ok(())
    }

    /// Fill the outer border band, then the inner band; the client covers
    /// the middle.
    pub fn draw_borders(&self, frame: u32, geometry: Xyhw) -> Result<()> {
        let gc = self.conn.generate_id()?;
        let outer = hex_color_pixel(&self.appearance.outer_color);
        let inner = hex_color_pixel(&self.appearance.inner_color);
        let outer_w = self.appearance.outer_width;

        xproto::create_gc(&self.conn, gc, frame, &xproto::CreateGCAux::new().foreground(outer))?;
        xproto::poly_fill_rectangle(&self.conn, frame, gc, &[xproto::Rectangle {
            x: 0,
            y: 0,
            width: geometry.w.max(1) as u16,
            height: geometry.h.max(1) as u16,
        }])?;
        xproto::change_gc(&self.conn, gc, &xproto::ChangeGCAux::new().foreground(inner))?;
        xproto::poly_fill_rectangle(&self.conn, frame, gc, &[xproto::Rectangle {
            x: outer_w as i16,
            y: outer_w as i16,
            width: (geometry.w - 2 * outer_w).max(1) as u16,
            height: (geometry.h - 2 * outer_w).max(1) as u16,
        }])?;
        xproto::free_gc(&self.conn, gc)?;
        Ok(())
    }

    pub fn map_frame(&self, client: u32) -> Result<()> {
        if let Some(&frame) = self.frames.get(&client) {
            xproto::map_window(&self.conn, frame)?;
        }
        Ok(())
    }

    pub fn unmap_frame(&self, client: u32) -> Result<()> {
        if let Some(&frame) = self.frames.get(&client) {
            xproto::unmap_window(&self.conn, frame)?;
        }
        Ok(())
    }

    pub fn raise_frame(&self, client: u32) -> Result<()> {
        if let Some(&frame) = self.frames.get(&client) {
            xproto::configure_window(
                &self.conn,
                frame,
                &xproto::ConfigureWindowAux::new().stack_mode(xproto::StackMode::ABOVE),
            )?;
        }
        Ok(())
    }

    /// New widths/colors: reconfigure every client inset and redraw.
    pub fn set_appearance(&mut self, appearance: FrameAppearance) -> Result<()> {
        self.appearance = appearance;
        let clients: Vec<(u32, u32)> = self.frames.iter().map(|(c, f)| (*c, *f)).collect();
        for (client, frame) in clients {
            let geometry = self.conn.get_geometry(frame)?.reply()?;
            let rect = Xyhw::new(
                geometry.x.into(),
                geometry.y.into(),
                geometry.width.into(),
                geometry.height.into(),
            );
            self.move_resize_frame(client, rect, false)?;
        }
        Ok(())
    }

    // ---- focus / close --------------------------------------------------

    pub fn focus(&self, client: u32) -> Result<()> {
        xproto::set_input_focus(
            &self.conn,
            xproto::InputFocus::PARENT,
            client,
            x11rb::CURRENT_TIME,
        )?;
        self.conn.change_property32(
            xproto::PropMode::REPLACE,
            self.root,
            self.atoms.NetActiveWindow,
            xproto::AtomEnum::WINDOW,
            &[client],
        )?;
        Ok(())
    }

    /// Ask politely via `WM_DELETE_WINDOW`; fall back to a kill.
    pub fn close(&self, client: u32) -> Result<()> {
        if self.supports_protocol(client, self.atoms.WMDelete)? {
            let data: [u32; 5] = [self.atoms.WMDelete, x11rb::CURRENT_TIME, 0, 0, 0];
            let event =
                xproto::ClientMessageEvent::new(32, client, self.atoms.WMProtocols, data);
            xproto::send_event(
                &self.conn,
                false,
                client,
                xproto::EventMask::NO_EVENT,
                event,
            )?;
        } else {
            xproto::kill_client(&self.conn, client)?;
        }
        Ok(())
    }

    fn supports_protocol(&self, window: u32, atom: xproto::Atom) -> Result<bool> {
        let reply = xproto::get_property(
            &self.conn,
            false,
            window,
            self.atoms.WMProtocols,
            xproto::AtomEnum::ATOM,
            0,
            MAX_PROPERTY_VALUE_LEN / 4,
        )?
        .reply()?;
        Ok(reply
            .value32()
            .map(|v| v.collect::<Vec<xproto::Atom>>().contains(&atom))
            .unwrap_or(false))
    }

    // ---- grabs ----------------------------------------------------------

    pub fn grab_key(&self, mods: ModMask, keysym: u32) -> Result<()> {
        let Some(keycode) = self.keysym_to_keycode(keysym) else {
            return Ok(());
        };
        let base = to_x_mask(mods);
        for lock in LOCK_VARIANTS {
            xproto::grab_key(
                &self.conn,
                false,
                self.root,
                xproto::ModMask::from(base | lock),
                keycode,
                xproto::GrabMode::ASYNC,
                xproto::GrabMode::ASYNC,
            )?;
        }
        Ok(())
    }

    pub fn grab_button(&self, mods: ModMask, button: u8) -> Result<()> {
        let base = to_x_mask(mods);
        for lock in LOCK_VARIANTS {
            xproto::grab_button(
                &self.conn,
                false,
                self.root,
                xproto::EventMask::BUTTON_PRESS,
                xproto::GrabMode::ASYNC,
                xproto::GrabMode::ASYNC,
                x11rb::NONE,
                x11rb::NONE,
                xproto::ButtonIndex::from(button),
                xproto::ModMask::from(base | lock),
            )?;
        }
        Ok(())
    }

    pub fn ungrab_all(&self) -> Result<()> {
        xproto::ungrab_key(&self.conn, 0, self.root, xproto::ModMask::ANY)?;
        xproto::ungrab_button(&self.conn, xproto::ButtonIndex::ANY, self.root, xproto::ModMask::ANY)?;
        Ok(())
    }

    // ---- keyboard mapping -----------------------------------------------

    pub fn keysym_to_keycode(&self, keysym: u32) -> Option<u8> {
        self.keysyms
            .iter()
            .position(|&s| s == keysym)
            .map(|i| (i / self.keysyms_per_keycode as usize) as u8 + self.min_keycode)
    }

    /// The unshifted keysym of a keycode (column 0 of the mapping).
    pub fn keycode_to_keysym(&self, keycode: u8) -> u32 {
        let index = (keycode.saturating_sub(self.min_keycode)) as usize
            * self.keysyms_per_keycode as usize;
        self.keysyms.get(index).copied().unwrap_or(0)
    }

    // ---- desktops -------------------------------------------------------

    pub fn set_current_desktop(&self, desktop: usize) -> Result<()> {
        self.conn.change_property32(
            xproto::PropMode::REPLACE,
            self.root,
            self.atoms.NetCurrentDesktop,
            xproto::AtomEnum::CARDINAL,
            &[desktop as u32],
        )?;
        Ok(())
    }

    pub fn set_desktop_names(&self, names: &[String]) -> Result<()> {
        self.conn.change_property32(
            xproto::PropMode::REPLACE,
            self.root,
            self.atoms.NetNumberOfDesktops,
            xproto::AtomEnum::CARDINAL,
            &[names.len() as u32],
        )?;
        let mut bytes = Vec::new();
        for name in names {
            bytes.extend_from_slice(name.as_bytes());
            bytes.push(0);
        }
        self.conn.change_property8(
            xproto::PropMode::REPLACE,
            self.root,
            self.atoms.NetDesktopNames,
            self.atoms.UTF8String,
            &bytes,
        )?;
        Ok(())
    }

    // ---- queries used during adoption -----------------------------------

    pub fn attributes(&self, window: u32) -> Result<xproto::GetWindowAttributesReply> {
        Ok(xproto::get_window_attributes(&self.conn, window)?.reply()?)
    }

    pub fn window_class(&self, window: u32) -> Option<String> {
        let reply = WmClass::get(&self.conn, window).ok()?.reply_unchecked().ok()??;
        String::from_utf8(reply.class().to_vec()).ok()
    }

    pub fn window_title(&self, window: u32) -> Option<String> {
        self.utf8_property(window, self.atoms.NetWMName)
            .or_else(|| self.utf8_property(window, self.atoms.WMName))
    }

    fn utf8_property(&self, window: u32, atom: xproto::Atom) -> Option<String> {
        let reply = xproto::get_property(
            &self.conn,
            false,
            window,
            atom,
            xproto::AtomEnum::ANY,
            0,
            MAX_PROPERTY_VALUE_LEN,
        )
        .ok()?
        .reply()
        .ok()?;
        let value = String::from_utf8(reply.value).ok()?;
        (!value.is_empty()).then_some(value)
    }

    pub fn window_pid(&self, window: u32) -> Option<u32> {
        self.cardinal_property(window, self.atoms.NetWMPid)
    }

    fn cardinal_property(&self, window: u32, atom: xproto::Atom) -> Option<u32> {
        xproto::get_property(
            &self.conn,
            false,
            window,
            atom,
            xproto::AtomEnum::CARDINAL,
            0,
            1,
        )
        .ok()?
        .reply()
        .ok()?
        .value32()?
        .next()
    }

    pub fn window_types(&self, window: u32) -> Vec<xproto::Atom> {
        xproto::get_property(
            &self.conn,
            false,
            window,
            self.atoms.NetWMWindowType,
            xproto::AtomEnum::ATOM,
            0,
            MAX_PROPERTY_VALUE_LEN / 4,
        )
        .ok()
        .and_then(|c| c.reply().ok())
        .and_then(|r| r.value32().map(Iterator::collect))
        .unwrap_or_default()
    }

    pub fn is_transient(&self, window: u32) -> bool {
        xproto::get_property(
            &self.conn,
            false,
            window,
            self.atoms.WMTransientFor,
            xproto::AtomEnum::WINDOW,
            0,
            1,
        )
        .ok()
        .and_then(|c| c.reply().ok())
        .and_then(|r| r.value32().and_then(|mut v| v.next()))
        .is_some()
    }

    pub fn geometry(&self, window: u32) -> Option<Xyhw> {
        let g = xproto::get_geometry(&self.conn, window).ok()?.reply().ok()?;
        Some(Xyhw::new(g.x.into(), g.y.into(), g.width.into(), g.height.into()))
    }

    /// `_NET_WM_STRUT_PARTIAL` (first four values) or `_NET_WM_STRUT`.
    pub fn strut(&self, window: u32) -> Option<Strut> {
        for atom in [self.atoms.NetWMStrutPartial, self.atoms.NetWMStrut] {
            let values: Vec<u32> = match xproto::get_property(
                &self.conn,
                false,
                window,
                atom,
                xproto::AtomEnum::CARDINAL,
                0,
                12,
            )
            .ok()
            .and_then(|c| c.reply().ok())
            .and_then(|r| r.value32().map(Iterator::collect))
            {
                Some(v) => v,
                None => continue,
            };
            if values.len() >= 4 {
                return Some(Strut {
                    left: values[0] as i32,
                    right: values[1] as i32,
                    top: values[2] as i32,
                    bottom: values[3] as i32,
                });
            }
        }
        None
    }

    pub fn map_window(&self, window: u32) -> Result<()> {
        xproto::map_window(&self.conn, window)?;
        Ok(())
    }

    pub fn configure_unmanaged(
        &self,
        window: u32,
        event: &xproto::ConfigureRequestEvent,
    ) -> Result<()> {
        xproto::configure_window(
            &self.conn,
            window,
            &xproto::ConfigureWindowAux::from_configure_request(event),
        )?;
        Ok(())
    }

    // ---- bookkeeping for event translation ------------------------------

    pub fn is_managed_client(&self, window: u32) -> bool {
        self.frames.contains_key(&window)
    }

    pub fn client_of_frame(&self, frame: u32) -> Option<u32> {
        self.clients.get(&frame).copied()
    }

    /// Does an X error's bad resource belong to a managed client?
    pub fn client_of_resource(&self, resource: u32) -> Option<u32> {
        if self.frames.contains_key(&resource) {
            return Some(resource);
        }
        self.client_of_frame(resource)
    }

    // ---- event plumbing --------------------------------------------------

    pub fn poll_event(&mut self) -> Option<Event> {
        match self.conn.poll_for_event() {
            Ok(event) => event,
            Err(err) => {
                tracing::error!("X connection lost: {err}");
                self.alive = false;
                None
            }
        }
    }

    pub fn flush(&self) {
        if self.conn.flush().is_err() {
            tracing::warn!("flush failed");
        }
    }

    pub fn sync(&self) -> Result<()> {
        self.conn.sync()?;
        Ok(())
    }
}
