use egui::{Pos2, Rect, Vec2};

use super::NodeId;

/// Identifies a floating [`DockWindow`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct WindowId(pub(crate) u64);

impl WindowId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// The platform side of a floating window (an OS window, or a contained floating area).
///
/// Implemented by the host application; the factory only drives it.
pub trait WindowHost {
    fn present(&mut self, is_dialog: bool);

    fn exit(&mut self);

    fn set_position(&mut self, position: Pos2);

    fn position(&self) -> Pos2;

    fn set_size(&mut self, size: Vec2);

    fn size(&self) -> Vec2;

    fn set_title(&mut self, title: &str);

    fn set_layout(&mut self, layout: NodeId);
}

/// Produces a host for a freshly created window. Returning `None` leaves the window untracked.
pub type HostWindowLocator = Box<dyn FnMut(&DockWindow) -> Option<Box<dyn WindowHost>>>;

/// A floating top-level surface hosting its own root dock.
pub struct DockWindow {
    pub(crate) id: WindowId,
    pub title: String,
    pub rect: Rect,
    /// The root dock laid out by this window.
    pub(crate) layout: NodeId,
    /// The root dock that spawned this window.
    pub(crate) owner_root: NodeId,
    pub(crate) is_tracked: bool,
    pub(crate) host: Option<Box<dyn WindowHost>>,
}

impl std::fmt::Debug for DockWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DockWindow")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("rect", &self.rect)
            .field("layout", &self.layout)
            .field("owner_root", &self.owner_root)
            .field("is_tracked", &self.is_tracked)
            .field("has_host", &self.host.is_some())
            .finish()
    }
}

impl DockWindow {
    pub(crate) fn new(
        id: WindowId,
        title: String,
        rect: Rect,
        layout: NodeId,
        owner_root: NodeId,
    ) -> Self {
        Self {
            id,
            title,
            rect,
            layout,
            owner_root,
            is_tracked: false,
            host: None,
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn layout(&self) -> NodeId {
        self.layout
    }

    pub fn owner_root(&self) -> NodeId {
        self.owner_root
    }

    pub fn is_tracked(&self) -> bool {
        self.is_tracked
    }

    pub(crate) fn attach_host(&mut self, mut host: Box<dyn WindowHost>) {
        host.set_layout(self.layout);
        host.set_title(&self.title);
        host.set_position(self.rect.min);
        host.set_size(self.rect.size());
        self.host = Some(host);
        self.is_tracked = true;
    }

    pub(crate) fn present(&mut self) {
        if let Some(host) = &mut self.host {
            host.present(false);
        }
    }

    /// Persist the host's last geometry, then tear the host down.
    pub(crate) fn exit(&mut self) {
        if let Some(mut host) = self.host.take() {
            self.rect = Rect::from_min_size(host.position(), host.size());
            host.exit();
        }
        self.is_tracked = false;
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
        if let Some(host) = &mut self.host {
            host.set_title(&self.title);
        }
    }

    pub fn set_position(&mut self, position: Pos2) {
        self.rect = Rect::from_min_size(position, self.rect.size());
        if let Some(host) = &mut self.host {
            host.set_position(position);
        }
    }

    pub fn set_size(&mut self, size: Vec2) {
        self.rect = Rect::from_min_size(self.rect.min, size);
        if let Some(host) = &mut self.host {
            host.set_size(size);
        }
    }
}
