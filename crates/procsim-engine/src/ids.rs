//! # procsim-engine::ids
//!
//! A generator for the unique, monotonic IDs used throughout one `Model`.
//! Every simulation owns exactly one `IdGen`; ids are never drawn from a
//! process-wide global, so two independently-constructed models never
//! collide and a replayed replication gets identical ids every run.
//!
//! Event ids and the insertion sequence used for event-queue tie-breaking are
//! not minted here -- `Executive` keeps its own counters for those, since it
//! owns scheduling end to end and nothing outside it needs to hand out an
//! event id. Allocation ids are likewise minted by each `Resource` from its
//! own local counter (see `resource::Resource::next_allocation_id`), since an
//! allocation is only ever meaningful within the resource that issued it.

use procsim_types::id::{ElementId, EntityId, EntityTypeId, QueueId, RequestId, ResourceId, StreamId};

#[derive(Debug, Default)]
pub struct IdGen {
    element_id: ElementId,
    entity_id: EntityId,
    entity_type_id: EntityTypeId,
    resource_id: ResourceId,
    request_id: RequestId,
    queue_id: QueueId,
    stream_id: StreamId,
}

macro_rules! next_id {
    ($name:ident, $field:ident, $ty:ty) => {
        pub fn $name(&mut self) -> $ty {
            let id = self.$field;
            self.$field = self
                .$field
                .checked_add(1)
                .unwrap_or_else(|| panic!("{} overflow", stringify!($field)));
            id
        }
    };
}

impl IdGen {
    pub fn new() -> Self {
        Self::default()
    }

    next_id!(next_element_id, element_id, ElementId);
    next_id!(next_entity_id, entity_id, EntityId);
    next_id!(next_entity_type_id, entity_type_id, EntityTypeId);
    next_id!(next_resource_id, resource_id, ResourceId);
    next_id!(next_request_id, request_id, RequestId);
    next_id!(next_queue_id, queue_id, QueueId);
    next_id!(next_stream_id, stream_id, StreamId);
}
