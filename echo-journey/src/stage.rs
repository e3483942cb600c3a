//! Menu selection and modal state
//!
//! The menu is a ring of five items. Items 0, 1, 2 and 4 open a
//! configuration modal; item 3 is the message wall.

use serde::{Deserialize, Serialize};

/// Number of items on the selection wheel
pub const MENU_ITEMS: usize = 5;

/// Menu index of the message wall
pub const WALL_INDEX: usize = 3;

/// Front-facing menu item, always in `0..MENU_ITEMS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionIndex(usize);

impl SelectionIndex {
    pub fn new(index: usize) -> Self {
        Self(index % MENU_ITEMS)
    }

    pub fn get(self) -> usize {
        self.0
    }

    pub fn next(self) -> Self {
        Self((self.0 + 1) % MENU_ITEMS)
    }

    pub fn previous(self) -> Self {
        Self((self.0 + MENU_ITEMS - 1) % MENU_ITEMS)
    }

    /// One wheel step: positive delta moves forward, anything else back
    pub fn step(self, delta: f64) -> Self {
        if delta > 0.0 {
            self.next()
        } else {
            self.previous()
        }
    }
}

/// Which configuration dialog is open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModalKind {
    Chart,
    Mood,
    Weather,
    Ai,
}

impl ModalKind {
    /// Modal opened by a menu item; the wall index has none
    pub fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(ModalKind::Chart),
            1 => Some(ModalKind::Mood),
            2 => Some(ModalKind::Weather),
            4 => Some(ModalKind::Ai),
            _ => None,
        }
    }

    pub fn index(self) -> usize {
        match self {
            ModalKind::Chart => 0,
            ModalKind::Mood => 1,
            ModalKind::Weather => 2,
            ModalKind::Ai => 4,
        }
    }
}

/// What clicking a menu item leads to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuTarget {
    Modal(ModalKind),
    Wall,
}

impl MenuTarget {
    pub fn for_index(index: usize) -> Option<Self> {
        if index == WALL_INDEX {
            return Some(MenuTarget::Wall);
        }
        ModalKind::from_index(index).map(MenuTarget::Modal)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModalState {
    pub visible: bool,
    pub kind: Option<ModalKind>,
}

impl ModalState {
    pub fn open(kind: ModalKind) -> Self {
        Self {
            visible: true,
            kind: Some(kind),
        }
    }

    /// Hidden after a submission; the kind is kept for display
    pub fn hidden(self) -> Self {
        Self {
            visible: false,
            kind: self.kind,
        }
    }

    pub fn closed() -> Self {
        Self::default()
    }
}
