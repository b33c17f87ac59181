use tokio::sync::broadcast;

use crate::model::Id;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// An entity changed in the store. Published after the write committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    DefaultSaved {
        period_type_id: Id,
        side_id: Option<Id>,
    },
    SchedulesMigrated {
        period_type_id: Id,
        schedule_ids: Vec<Id>,
    },
    OverrideCreated {
        id: Id,
        booking_id: Option<Id>,
    },
    OverrideUpdated {
        id: Id,
        booking_id: Option<Id>,
    },
    OverrideDeleted {
        id: Id,
        booking_id: Option<Id>,
    },
    BookingInstancesUpdated {
        booking_id: Id,
        instance_ids: Vec<Id>,
    },
    BookingInstancesDeleted {
        booking_id: Id,
        instance_ids: Vec<Id>,
    },
    BookingDeleted {
        booking_id: Id,
    },
}

/// Broadcast hub for entity changes. Cache layers and UI subscriptions
/// listen here instead of being invalidated from call sites.
pub struct ChangeHub {
    sender: broadcast::Sender<Change>,
}

impl Default for ChangeHub {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeHub {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Change> {
        self.sender.subscribe()
    }

    /// Send a change. No-op if nobody is listening.
    pub fn publish(&self, change: Change) {
        let _ = self.sender.send(change);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}
