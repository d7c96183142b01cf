use crate::game::annotation::Limb;
use glam::Vec2;
use std::fmt;

/// Draw order, back to front.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Holds,
    Arrows,
    Overlays,
}

impl Layer {
    pub const ALL: [Self; 3] = [Self::Holds, Self::Arrows, Self::Overlays];

    #[inline(always)]
    const fn index(self) -> usize {
        match self {
            Self::Holds => 0,
            Self::Arrows => 1,
            Self::Overlays => 2,
        }
    }
}

/// Arrow direction drawn for a panel; doubles repeat the five glyphs.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PanelGlyph {
    DownLeft,
    UpLeft,
    Center,
    UpRight,
    DownRight,
}

impl PanelGlyph {
    #[inline(always)]
    pub const fn for_panel(panel: u8) -> Self {
        match panel % 5 {
            0 => Self::DownLeft,
            1 => Self::UpLeft,
            2 => Self::Center,
            3 => Self::UpRight,
            _ => Self::DownRight,
        }
    }

    const fn as_str(self) -> &'static str {
        match self {
            Self::DownLeft => "downleft",
            Self::UpLeft => "upleft",
            Self::Center => "center",
            Self::UpRight => "upright",
            Self::DownRight => "downright",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum NotePart {
    Tap,
    HoldHead,
    HoldTrail,
    HoldCap,
}

impl NotePart {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Tap => "tap",
            Self::HoldHead => "head",
            Self::HoldTrail => "trail",
            Self::HoldCap => "cap",
        }
    }
}

/// Texture lookup key for one note sprite, e.g. `upleft_r_tap`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SpriteAsset {
    pub glyph: PanelGlyph,
    pub limb: Limb,
    pub part: NotePart,
}

impl fmt::Display for SpriteAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.glyph.as_str(), self.limb.code(), self.part.as_str())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Sprite {
        asset: SpriteAsset,
        pos: Vec2,
        size: Vec2,
        alpha: f32,
    },
    Rect {
        pos: Vec2,
        size: Vec2,
        color: [f32; 4],
    },
}

impl NodeKind {
    #[inline(always)]
    fn vertical_span(&self) -> (f32, f32) {
        match self {
            Self::Sprite { pos, size, .. } | Self::Rect { pos, size, .. } => (pos.y, pos.y + size.y),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub layer: Layer,
    pub kind: NodeKind,
}

/// Generation-checked handle; a released id never aliases a later node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    refs: u32,
    node: Option<Node>,
}

/// Output of a scene pass, in viewport space.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawObject {
    Sprite {
        asset: SpriteAsset,
        pos: Vec2,
        size: Vec2,
        alpha: f32,
    },
    Rect {
        pos: Vec2,
        size: Vec2,
        color: [f32; 4],
    },
}

/// Retained node arena split into draw layers.
#[derive(Debug, Default)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    dirty: [bool; 3],
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, layer: Layer, kind: NodeKind) -> NodeId {
        let node = Node { layer, kind };
        self.dirty[layer.index()] = true;
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.refs = 1;
            slot.node = Some(node);
            return NodeId {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            refs: 1,
            node: Some(node),
        });
        NodeId {
            index,
            generation: 0,
        }
    }

    #[inline(always)]
    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation && s.node.is_some())
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    /// Adds an owner to a live node.
    pub fn retain(&mut self, id: NodeId) -> bool {
        match self.slot_mut(id) {
            Some(slot) => {
                slot.refs += 1;
                true
            }
            None => false,
        }
    }

    /// Drops one owner; the node is destroyed when the last owner lets go.
    /// Stale ids are ignored.
    pub fn release(&mut self, id: NodeId) -> bool {
        let Some(slot) = self.slot_mut(id) else {
            return false;
        };
        slot.refs -= 1;
        if slot.refs > 0 {
            return true;
        }
        let layer = slot.node.take().map(|n| n.layer);
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.live -= 1;
        if let Some(layer) = layer {
            self.dirty[layer.index()] = true;
        }
        true
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.live
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn layer_len(&self, layer: Layer) -> usize {
        self.slots
            .iter()
            .filter(|s| s.node.as_ref().is_some_and(|n| n.layer == layer))
            .count()
    }

    /// Destroys every node regardless of owners. Outstanding ids go stale.
    pub fn clear(&mut self) {
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.refs = 0;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
            }
        }
        self.live = 0;
        self.dirty = [true; 3];
    }

    #[inline(always)]
    pub fn is_dirty(&self) -> bool {
        self.dirty.iter().any(|&d| d)
    }

    /// Returns and resets per-layer dirty flags, in `Layer::ALL` order.
    pub fn take_dirty(&mut self) -> [bool; 3] {
        std::mem::take(&mut self.dirty)
    }

    /// Nodes intersecting `[top, top + height)`, back to front, shifted so
    /// `top` lands at viewport y = 0.
    pub fn draw_list(&self, top: f32, height: f32) -> Vec<DrawObject> {
        let bottom = top + height;
        let shift = Vec2::new(0.0, top);
        let mut out = Vec::new();
        for layer in Layer::ALL {
            for node in self.slots.iter().filter_map(|s| s.node.as_ref()) {
                if node.layer != layer {
                    continue;
                }
                let (y0, y1) = node.kind.vertical_span();
                if y1 < top || y0 >= bottom {
                    continue;
                }
                out.push(match &node.kind {
                    NodeKind::Sprite {
                        asset,
                        pos,
                        size,
                        alpha,
                    } => DrawObject::Sprite {
                        asset: *asset,
                        pos: *pos - shift,
                        size: *size,
                        alpha: *alpha,
                    },
                    NodeKind::Rect { pos, size, color } => DrawObject::Rect {
                        pos: *pos - shift,
                        size: *size,
                        color: *color,
                    },
                });
            }
        }
        out
    }
}
