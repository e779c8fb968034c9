//! Declaration lifecycle shared by every declared entity

use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::{RelayError, Result};

/// `Declaring -> Active -> Undeclared`, never backwards
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EntityState {
    Declaring = 0,
    Active = 1,
    Undeclared = 2,
}

impl From<u8> for EntityState {
    fn from(v: u8) -> Self {
        match v {
            0 => Self::Declaring,
            1 => Self::Active,
            _ => Self::Undeclared,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Lifecycle {
    object: &'static str,
    state: AtomicU8,
}

impl Lifecycle {
    pub fn new(object: &'static str) -> Self {
        Self {
            object,
            state: AtomicU8::new(EntityState::Declaring as u8),
        }
    }

    pub fn activate(&self) {
        let _ = self.state.compare_exchange(
            EntityState::Declaring as u8,
            EntityState::Active as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }

    pub fn state(&self) -> EntityState {
        EntityState::from(self.state.load(Ordering::Acquire))
    }

    /// Move to `Undeclared`; `true` only when leaving `Active`, so the
    /// registration is released exactly once
    pub fn undeclare(&self) -> bool {
        self.state.swap(EntityState::Undeclared as u8, Ordering::AcqRel)
            == EntityState::Active as u8
    }

    pub fn ensure_active(&self) -> Result<()> {
        match self.state() {
            EntityState::Active => Ok(()),
            _ => Err(RelayError::disposed(self.object)),
        }
    }
}
