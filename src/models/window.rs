use serde::{Deserialize, Serialize};

use crate::layouts::LeafSlot;
use crate::models::{Frame, Xyhw};

/// The X window id of a client. Opaque outside the display server.
pub type WindowId = u32;

/// A managed client window.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Window {
    pub id: WindowId,
    pub class: Option<String>,
    pub title: Option<String>,
    pub pid: Option<u32>,
    pub workspace: usize,
    pub floating: bool,
    pub scratch: bool,
    pub fullscreen: bool,
    pub mapped: bool,
    /// Geometry assigned by the layout engine.
    pub tiled: Xyhw,
    /// Geometry remembered across float toggles.
    pub geom_floating: Option<Xyhw>,
    /// Where the window sat in the BSP tree before it started floating.
    pub tiled_slot: Option<LeafSlot>,
    pub frame: Frame,
}

impl Window {
    #[must_use]
    pub fn new(id: WindowId, class: Option<String>, title: Option<String>) -> Self {
        Self {
            id,
            class,
            title,
            pid: None,
            workspace: 1,
            floating: false,
            scratch: false,
            fullscreen: false,
            mapped: false,
            tiled: Xyhw::default(),
            geom_floating: None,
            tiled_slot: None,
            frame: Frame::default(),
        }
    }

    /// The geometry the frame should currently occupy.
    #[must_use]
    pub fn visible_geometry(&self) -> Xyhw {
        if self.floating {
            self.geom_floating.unwrap_or(self.tiled)
        } else {
            self.tiled
        }
    }

    /// The point directional focus reasons about.
    #[must_use]
    pub fn center(&self) -> (i32, i32) {
        self.visible_geometry().center()
    }
}
