//! Translate x11rb events into the engine's `DisplayEvent`s.
use x11rb::protocol::{xproto, Event};

use super::xwrap::XWrap;
use crate::display_event::WindowSpec;
use crate::utils::modmask_lookup::from_x_state;
use crate::DisplayEvent;

pub(crate) fn translate(event: Event, xw: &mut XWrap) -> Option<DisplayEvent> {
    match event {
        Event::MapRequest(e) => from_map_request(e, xw),
        Event::UnmapNotify(e) => from_unmap_notify(e, xw),
        Event::DestroyNotify(e) => from_destroy_notify(e, xw),
        Event::ConfigureRequest(e) => from_configure_request(e, xw),
        Event::PropertyNotify(e) => from_property_notify(e, xw),
        Event::KeyPress(e) => Some(DisplayEvent::KeyCombo(
            from_x_state(e.state.into()),
            xw.keycode_to_keysym(e.detail),
        )),
        Event::ButtonPress(e) => Some(DisplayEvent::ButtonCombo(
            from_x_state(e.state.into()),
            e.detail,
        )),
        Event::EnterNotify(e) => xw.client_of_frame(e.event).map(DisplayEvent::EnterWindow),
        Event::Expose(e) if e.count == 0 => {
            if xw.client_of_frame(e.window).is_some() {
                if let Some(geometry) = xw.geometry(e.window) {
                    let _ = xw.draw_borders(e.window, geometry);
                }
            }
            None
        }
        Event::Error(e) => {
            // A request aimed at a window that died mid-flight: drop it.
            let client = xw.client_of_resource(e.bad_value)?;
            tracing::debug!("X error {:?} for managed window {client}", e.error_kind);
            Some(DisplayEvent::WindowDestroy(client))
        }
        _ => None,
    }
}

fn from_map_request(event: xproto::MapRequestEvent, xw: &mut XWrap) -> Option<DisplayEvent> {
    let window = event.window;
    let attrs = xw.attributes(window).ok()?;
    if attrs.override_redirect || xw.is_managed_client(window) {
        return None;
    }

    // Docks are never framed; their strut carves the usable rect.
    let types = xw.window_types(window);
    if types.contains(&xw.atoms.NetWMWindowTypeDock) {
        xw.docks.insert(window);
        xw.map_window(window).ok()?;
        let strut = xw.strut(window).unwrap_or_default();
        return Some(DisplayEvent::StrutUpdate(window, strut));
    }

    let hint_floating = xw.is_transient(window)
        || types.contains(&xw.atoms.NetWMWindowTypeDialog)
        || types.contains(&xw.atoms.NetWMWindowTypeSplash)
        || types.contains(&xw.atoms.NetWMWindowTypeUtility);

    Some(DisplayEvent::WindowCreate(WindowSpec {
        id: window,
        class: xw.window_class(window),
        title: xw.window_title(window),
        pid: xw.window_pid(window),
        hint_floating,
        requested: xw.geometry(window),
    }))
}

fn from_unmap_notify(event: xproto::UnmapNotifyEvent, xw: &mut XWrap) -> Option<DisplayEvent> {
    // A client withdrawing unmaps inside its frame; frames we unmap
    // ourselves are not in the client table and fall through.
    if xw.is_managed_client(event.window) {
        let _ = xw.teardown_frame(event.window);
        return Some(DisplayEvent::WindowDestroy(event.window));
    }
    if xw.docks.remove(&event.window) {
        return Some(DisplayEvent::StrutRemove(event.window));
    }
    None
}

fn from_destroy_notify(event: xproto::DestroyNotifyEvent, xw: &mut XWrap) -> Option<DisplayEvent> {
    if xw.is_managed_client(event.window) {
        let _ = xw.teardown_frame(event.window);
        return Some(DisplayEvent::WindowDestroy(event.window));
    }
    if xw.docks.remove(&event.window) {
        return Some(DisplayEvent::StrutRemove(event.window));
    }
    None
}

fn from_configure_request(
    event: xproto::ConfigureRequestEvent,
    xw: &mut XWrap,
) -> Option<DisplayEvent> {
    // The layout owns managed geometry; unmanaged windows get what they ask.
    if !xw.is_managed_client(event.window) {
        let _ = xw.configure_unmanaged(event.window, &event);
    }
    None
}

fn from_property_notify(event: xproto::PropertyNotifyEvent, xw: &mut XWrap) -> Option<DisplayEvent> {
    if xw.docks.contains(&event.window)
        && (event.atom == xw.atoms.NetWMStrut || event.atom == xw.atoms.NetWMStrutPartial)
    {
        let strut = xw.strut(event.window).unwrap_or_default();
        return Some(DisplayEvent::StrutUpdate(event.window, strut));
    }
    None
}
