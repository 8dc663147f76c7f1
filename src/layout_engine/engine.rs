use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::common::collections::BTreeMap;
use crate::common::config::{LayoutSettings, TilingConfig};
use crate::layout_engine::container::Container;
use crate::layout_engine::error::LayoutError;
use crate::layout_engine::graph::{LayoutMode, Rotation, SplitMode};
use crate::layout_engine::navigate::LeafRef;
use crate::layout_engine::shape::{TreeShape, read_ron, write_ron};
use crate::layout_engine::tree::{LayoutTree, LeafKind};
use crate::model::geometry::Rect;
use crate::model::tree::NodeId;
use crate::model::window::WindowId;

/// Identifies one screen (or desktop) with a tree of its own.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct ScreenId(pub u32);

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Reports the windows currently visible on a screen, in order and without
/// duplicates.
pub trait WindowSnapshot {
    fn windows_on(&self, screen: ScreenId) -> Vec<WindowId>;
}

/// Moves and resizes a window. Best effort; nothing is reported back.
pub trait ApplyContainer {
    fn apply(&mut self, window: WindowId, container: &Container);
}

impl<F: FnMut(WindowId, &Container)> ApplyContainer for F {
    fn apply(&mut self, window: WindowId, container: &Container) { self(window, container) }
}

/// Read-only facts about a screen.
pub trait ScreenContext {
    /// The full screen rectangle; outer gaps are taken off by the engine.
    fn frame(&self, screen: ScreenId) -> Option<Rect>;

    /// Name used to look up per-display gap overrides.
    fn display_name(&self, _screen: ScreenId) -> Option<String> { None }

    /// Mode override for this screen. The configured mode applies otherwise.
    fn mode(&self, _screen: ScreenId) -> Option<LayoutMode> { None }
}

/// Everything the engine needs from the window manager around it.
pub trait LayoutHost: ScreenContext + WindowSnapshot + ApplyContainer {}

impl<T: ScreenContext + WindowSnapshot + ApplyContainer + ?Sized> LayoutHost for T {}

#[derive(Clone, Debug, Default)]
pub struct ScreenInfo {
    pub frame: Rect,
    pub display: Option<String>,
    pub mode: Option<LayoutMode>,
    pub windows: Vec<WindowId>,
}

/// A host that keeps everything in memory and records what was applied.
#[derive(Clone, Debug, Default)]
pub struct MemoryHost {
    pub screens: BTreeMap<ScreenId, ScreenInfo>,
    pub applied: Vec<(WindowId, Container)>,
}

impl MemoryHost {
    pub fn new() -> Self { Self::default() }

    pub fn add_screen(&mut self, screen: ScreenId, frame: Rect) -> &mut ScreenInfo {
        self.screens.entry(screen).or_insert_with(|| ScreenInfo { frame, ..Default::default() })
    }

    pub fn set_windows(&mut self, screen: ScreenId, windows: Vec<WindowId>) {
        if let Some(info) = self.screens.get_mut(&screen) {
            info.windows = windows;
        }
    }

    /// The most recent container applied to `window`.
    pub fn last_applied(&self, window: WindowId) -> Option<Container> {
        self.applied.iter().rev().find(|(w, _)| *w == window).map(|(_, c)| *c)
    }

    pub fn take_applied(&mut self) -> Vec<(WindowId, Container)> { std::mem::take(&mut self.applied) }
}

impl ScreenContext for MemoryHost {
    fn frame(&self, screen: ScreenId) -> Option<Rect> { self.screens.get(&screen).map(|s| s.frame) }

    fn display_name(&self, screen: ScreenId) -> Option<String> {
        self.screens.get(&screen)?.display.clone()
    }

    fn mode(&self, screen: ScreenId) -> Option<LayoutMode> { self.screens.get(&screen)?.mode }
}

impl WindowSnapshot for MemoryHost {
    fn windows_on(&self, screen: ScreenId) -> Vec<WindowId> {
        self.screens.get(&screen).map(|s| s.windows.clone()).unwrap_or_default()
    }
}

impl ApplyContainer for MemoryHost {
    fn apply(&mut self, window: WindowId, container: &Container) {
        self.applied.push((window, *container));
    }
}

#[non_exhaustive]
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum LayoutCommand {
    SwapWithNeighbour,
    Rotate(u32),
    InsertPseudo,
    RemovePseudo,
    ToggleLeafKind,
    SetLeafKind(LeafKind),
    ToggleSplitOrientation,
    SetSplitRatio(f64),
    SetSplitMode(SplitMode),
    Relayout { optimal: bool },
}

#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutEvent {
    /// The screen appeared, or its frame, display or mode changed.
    ScreenUpdated(ScreenId),
    ScreenRemoved(ScreenId),
    WindowAdded(ScreenId, WindowId),
    WindowRemoved(ScreenId, WindowId),
    WindowFocused(ScreenId, WindowId),
    /// The window list changed in some way; reread it from the snapshot.
    WindowsOnScreenUpdated(ScreenId),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventResponse {
    pub focus_window: Option<WindowId>,
}

struct ScreenLayout {
    tree: LayoutTree,
    mode: LayoutMode,
    display: Option<String>,
    focus: Option<WindowId>,
}

/// Keeps one [`LayoutTree`] per screen in step with the host.
pub struct LayoutEngine {
    settings: LayoutSettings,
    screens: BTreeMap<ScreenId, ScreenLayout>,
}

impl LayoutEngine {
    pub fn new(settings: &LayoutSettings) -> Self {
        LayoutEngine {
            settings: settings.clone(),
            screens: BTreeMap::new(),
        }
    }

    pub fn settings(&self) -> &LayoutSettings { &self.settings }

    /// Takes new settings. Existing splits keep their ratios and orientations
    /// until the next relayout.
    pub fn set_layout_settings(&mut self, settings: &LayoutSettings) {
        self.settings = settings.clone();
    }

    pub fn tree(&self, screen: ScreenId) -> Option<&LayoutTree> {
        self.screens.get(&screen).map(|s| &s.tree)
    }

    pub fn mode(&self, screen: ScreenId) -> Option<LayoutMode> {
        self.screens.get(&screen).map(|s| s.mode)
    }

    pub fn focused_window(&self, screen: ScreenId) -> Option<WindowId> {
        self.screens.get(&screen)?.focus
    }

    pub fn screens(&self) -> impl Iterator<Item = ScreenId> + '_ { self.screens.keys().copied() }

    pub fn draw_tree(&self, screen: ScreenId) -> String {
        match self.screens.get(&screen) {
            Some(layout) => layout.tree.draw_tree(),
            None => format!("<no layout for screen {screen}>"),
        }
    }

    pub fn debug_tree(&self, screen: ScreenId) {
        debug!("Tree on screen {screen}\n{}", self.draw_tree(screen).trim());
    }

    fn tiling(&self, screen: ScreenId) -> TilingConfig {
        let display = self.screens.get(&screen).and_then(|s| s.display.as_deref());
        self.settings.tiling(display)
    }

    fn response(&self, screen: ScreenId) -> EventResponse {
        EventResponse { focus_window: self.focused_window(screen) }
    }

    #[instrument(skip(self, host))]
    pub fn handle_event<H: LayoutHost + ?Sized>(
        &mut self,
        host: &mut H,
        event: LayoutEvent,
    ) -> EventResponse {
        match event {
            LayoutEvent::ScreenUpdated(screen) => {
                self.update_screen(host, screen);
                self.apply(host, screen);
                self.response(screen)
            }
            LayoutEvent::ScreenRemoved(screen) => {
                if let Some(mut layout) = self.screens.remove(&screen) {
                    layout.tree.destroy();
                    debug!(%screen, "dropped screen layout");
                }
                EventResponse::default()
            }
            LayoutEvent::WindowAdded(screen, window) => {
                if !self.screens.contains_key(&screen) {
                    self.update_screen(host, screen);
                }
                let cfg = self.tiling(screen);
                let Some(layout) = self.screens.get_mut(&screen) else {
                    return EventResponse::default();
                };
                let added = match layout.mode {
                    LayoutMode::Bsp => layout.tree.insert_window(window, &cfg).is_some(),
                    LayoutMode::Monocle => layout.tree.insert_stacked(window),
                    LayoutMode::Float => false,
                };
                if added || layout.tree.contains_window(window) {
                    layout.focus = Some(window);
                }
                self.apply(host, screen);
                self.response(screen)
            }
            LayoutEvent::WindowRemoved(screen, window) => {
                let cfg = self.tiling(screen);
                let Some(layout) = self.screens.get_mut(&screen) else {
                    return EventResponse::default();
                };
                let fallback = neighbour_window(&layout.tree, window);
                if layout.tree.remove_window(window, &cfg) && layout.focus == Some(window) {
                    layout.focus = fallback;
                }
                self.apply(host, screen);
                self.response(screen)
            }
            LayoutEvent::WindowFocused(screen, window) => {
                if let Some(layout) = self.screens.get_mut(&screen)
                    && layout.tree.contains_window(window)
                {
                    layout.focus = Some(window);
                }
                self.response(screen)
            }
            LayoutEvent::WindowsOnScreenUpdated(screen) => {
                if !self.screens.contains_key(&screen) {
                    self.update_screen(host, screen);
                } else {
                    self.sync_windows(&*host, screen);
                }
                self.apply(host, screen);
                self.response(screen)
            }
        }
    }

    /// Creates or re-roots the layout for `screen`. A new layout, or one whose
    /// mode changed, is built from the current snapshot.
    fn update_screen<H: LayoutHost + ?Sized>(&mut self, host: &H, screen: ScreenId) {
        let Some(frame) = host.frame(screen) else {
            warn!(%screen, "no frame for screen; layout not updated");
            return;
        };
        let mode = host.mode(screen).unwrap_or(self.settings.mode);
        let display = host.display_name(screen);
        let cfg = self.settings.tiling(display.as_deref());
        let area = cfg.usable_area(frame);

        if let Some(layout) = self.screens.get_mut(&screen)
            && layout.mode == mode
        {
            layout.display = display;
            layout.tree.set_area(area, &cfg);
            return;
        }

        let windows = host.windows_on(screen);
        let tree = LayoutTree::build(mode, area, &windows, &cfg);
        let focus = windows.last().copied().filter(|&w| tree.contains_window(w));
        if let Some(mut old) = self.screens.insert(screen, ScreenLayout { tree, mode, display, focus }) {
            old.tree.destroy();
        }
        info!(%screen, %mode, windows = windows.len(), "built screen layout");
    }

    /// Inserts windows the tree has not seen and prunes the ones that are
    /// gone.
    fn sync_windows<H: LayoutHost + ?Sized>(&mut self, host: &H, screen: ScreenId) {
        let live = host.windows_on(screen);
        let cfg = self.tiling(screen);
        let Some(layout) = self.screens.get_mut(&screen) else { return };
        if layout.mode == LayoutMode::Float {
            return;
        }
        let pruned = layout.tree.prune_stale(&live, &cfg);
        let mut inserted = 0;
        for &window in &live {
            if layout.tree.contains_window(window) {
                continue;
            }
            let added = match layout.mode {
                LayoutMode::Monocle => layout.tree.insert_stacked(window),
                _ => layout.tree.insert_window(window, &cfg).is_some(),
            };
            if added {
                inserted += 1;
            }
        }
        if layout.focus.is_some_and(|w| !layout.tree.contains_window(w)) {
            layout.focus = live.last().copied().filter(|&w| layout.tree.contains_window(w));
        }
        debug!(%screen, pruned, inserted, "synced window list");
    }

    #[instrument(skip(self, host))]
    pub fn handle_command<H: LayoutHost + ?Sized>(
        &mut self,
        host: &mut H,
        screen: ScreenId,
        command: LayoutCommand,
    ) -> EventResponse {
        self.debug_tree(screen);
        match command {
            LayoutCommand::SetSplitRatio(ratio) => {
                if !self.settings.set_split_ratio(ratio) {
                    debug!(ratio, "ignoring out-of-range split ratio");
                }
                return self.response(screen);
            }
            LayoutCommand::SetSplitMode(mode) => {
                self.settings.split_mode = mode;
                return self.response(screen);
            }
            _ => {}
        }

        let cfg = self.tiling(screen);
        let Some(layout) = self.screens.get_mut(&screen) else {
            warn!(%screen, "no layout for screen; command ignored");
            return EventResponse::default();
        };
        let tree = &mut layout.tree;
        let focused = layout.focus.and_then(|w| tree.find_node_or_owner(w));

        let changed = match command {
            LayoutCommand::Relayout { optimal } => {
                tree.recompute(&cfg, optimal);
                true
            }
            LayoutCommand::Rotate(degrees) => match Rotation::try_from(degrees) {
                Ok(rotation) => {
                    tree.rotate(rotation, &cfg);
                    true
                }
                Err(err) => {
                    warn!("{err}");
                    false
                }
            },
            LayoutCommand::SwapWithNeighbour => match layout.focus {
                Some(window) => swap_with_neighbour(tree, window),
                None => false,
            },
            LayoutCommand::InsertPseudo => {
                focused.is_some_and(|node| tree.insert_pseudo(node, &cfg).is_some())
            }
            LayoutCommand::RemovePseudo => {
                focused.is_some_and(|node| tree.remove_pseudo(node, &cfg))
            }
            LayoutCommand::ToggleLeafKind => {
                focused.is_some_and(|node| tree.toggle_leaf_kind(node, &cfg))
            }
            LayoutCommand::SetLeafKind(kind) => {
                focused.is_some_and(|node| tree.set_leaf_kind(node, kind, &cfg))
            }
            LayoutCommand::ToggleSplitOrientation => {
                focused.is_some_and(|node| tree.toggle_split_orientation(node, &cfg))
            }
            LayoutCommand::SetSplitRatio(_) | LayoutCommand::SetSplitMode(_) => false,
        };

        if changed {
            tree.recompute(&cfg, false);
            self.apply(host, screen);
        } else {
            debug!("command left the layout unchanged");
        }
        self.response(screen)
    }

    fn apply<H: LayoutHost + ?Sized>(&self, host: &mut H, screen: ScreenId) {
        if let Some(layout) = self.screens.get(&screen) {
            layout.tree.apply(host);
        }
    }

    /// Writes the shape of every non-empty layout to `path` as RON.
    pub fn save(&self, path: &Path) -> Result<(), LayoutError> {
        let shapes: BTreeMap<ScreenId, TreeShape> = self
            .screens
            .iter()
            .filter_map(|(&screen, layout)| Some((screen, layout.tree.shape()?)))
            .collect();
        write_ron(path, &shapes)?;
        info!(screens = shapes.len(), path = %path.display(), "saved layouts");
        Ok(())
    }

    /// Rebuilds layouts from shapes saved with [`LayoutEngine::save`] and
    /// fills them with the host's current windows. Screens the host does not
    /// know, or that have no windows, are skipped. Returns the number of
    /// screens restored.
    pub fn restore<H: LayoutHost + ?Sized>(
        &mut self,
        host: &mut H,
        path: &Path,
    ) -> Result<usize, LayoutError> {
        let shapes: BTreeMap<ScreenId, TreeShape> = read_ron(path)?;
        let mut restored = 0;
        for (screen, shape) in shapes {
            let Some(frame) = host.frame(screen) else {
                debug!(%screen, "skipping saved layout for unknown screen");
                continue;
            };
            let windows = host.windows_on(screen);
            if windows.is_empty() {
                debug!(%screen, "skipping saved layout for empty screen");
                continue;
            }
            let mode = host.mode(screen).unwrap_or(self.settings.mode);
            if mode == LayoutMode::Float {
                continue;
            }
            let display = host.display_name(screen);
            let cfg = self.settings.tiling(display.as_deref());
            let mut tree = LayoutTree::from_shape(&shape, cfg.usable_area(frame), &cfg)?;
            tree.fill(&windows, &cfg);
            tree.prune_stale(&windows, &cfg);
            let focus = windows.last().copied().filter(|&w| tree.contains_window(w));
            if let Some(mut old) =
                self.screens.insert(screen, ScreenLayout { tree, mode, display, focus })
            {
                old.tree.destroy();
            }
            self.apply(host, screen);
            restored += 1;
        }
        info!(restored, path = %path.display(), "restored layouts");
        Ok(restored)
    }
}

/// Swaps `window` with the leaf next to it, or with the next entry (the
/// previous one at the tail) when it sits in a stack.
fn swap_with_neighbour(tree: &mut LayoutTree, window: WindowId) -> bool {
    if let Some(node) = tree.find_node(window) {
        return match tree.nearest_leaf_neighbour(node) {
            Some(other) => tree.swap_nodes(node, other),
            None => false,
        };
    }
    let Some(entry) = tree.find_entry(window) else { return false };
    let Some(other) = tree.stacks().entry(entry).and_then(|e| e.next().or(e.prev())) else {
        return false;
    };
    tree.swap_entries(entry, other)
}

/// The window that should take focus once `window` is gone.
fn neighbour_window(tree: &LayoutTree, window: WindowId) -> Option<WindowId> {
    if let Some(node) = tree.find_node(window) {
        return window_of(tree, tree.nearest_leaf_neighbour(node)?);
    }
    let entry = tree.stacks().entry(tree.find_entry(window)?)?;
    let other = entry.prev().or(entry.next())?;
    tree.stacks().entry(other).map(|e| e.window)
}

fn window_of(tree: &LayoutTree, node: NodeId) -> Option<WindowId> {
    match tree.window(node) {
        Some(window) => Some(window),
        None => match tree.first_leaf(node)? {
            LeafRef::Node(leaf) => tree.window(leaf),
            LeafRef::Entry(entry) => tree.stacks().entry(entry).map(|e| e.window),
        },
    }
}
