//! In-memory store.
//!
//! All tables sit behind one `RwLock`. Multi-row writes run inside a
//! `Transaction` that holds the write guard for its whole duration and
//! records an undo log; dropping it without `commit` reverts every change,
//! so readers never see half of a unit.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::auth::{NewUser, User, UserId};
use crate::shipments::{EventId, Shipment, ShipmentId, ShipmentStatus, TrackingEvent};
use crate::store::{
    EventDraft, ShipmentDraft, ShipmentStore, StatusChange, StoreError, StoreResult, UserStore,
};

#[derive(Debug, Default)]
struct Tables {
    shipments: HashMap<ShipmentId, Shipment>,
    tracking_index: HashMap<String, ShipmentId>,
    events: HashMap<ShipmentId, Vec<TrackingEvent>>,
    users: HashMap<UserId, User>,
    email_index: HashMap<String, UserId>,
    last_shipment_id: ShipmentId,
    last_event_id: EventId,
    last_user_id: UserId,
}

/// Inverse of one write performed inside a transaction.
#[derive(Debug)]
enum Undo {
    InsertShipment { id: ShipmentId, tracking_number: String },
    InsertEvent { shipment_id: ShipmentId },
    UpdateShipment(Shipment),
}

/// Exclusive access to the tables with rollback on drop.
struct Transaction<'a> {
    tables: RwLockWriteGuard<'a, Tables>,
    undo: Vec<Undo>,
}

impl<'a> Transaction<'a> {
    fn insert_shipment(&mut self, draft: ShipmentDraft) -> StoreResult<Shipment> {
        if self.tables.tracking_index.contains_key(&draft.tracking_number) {
            return Err(StoreError::Conflict(format!(
                "tracking number {} already exists",
                draft.tracking_number
            )));
        }

        self.tables.last_shipment_id += 1;
        let shipment = Shipment {
            id: self.tables.last_shipment_id,
            tracking_number: draft.tracking_number,
            owner_id: draft.owner_id,
            recipient_name: draft.recipient_name,
            recipient_address: draft.recipient_address,
            recipient_city: draft.recipient_city,
            recipient_state: draft.recipient_state,
            recipient_zip_code: draft.recipient_zip_code,
            status: draft.status,
            created_at: draft.created_at,
            updated_at: draft.updated_at,
            delivered_at: None,
        };

        self.tables
            .tracking_index
            .insert(shipment.tracking_number.clone(), shipment.id);
        self.tables.shipments.insert(shipment.id, shipment.clone());
        self.undo.push(Undo::InsertShipment {
            id: shipment.id,
            tracking_number: shipment.tracking_number.clone(),
        });
        Ok(shipment)
    }

    /// Applies the transition to the stored row under the write guard.
    fn transition_shipment(
        &mut self,
        id: ShipmentId,
        status: ShipmentStatus,
        at: DateTime<Utc>,
    ) -> StoreResult<(ShipmentStatus, Shipment)> {
        let row = self
            .tables
            .shipments
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("shipment {id}")))?;

        let previous = row.clone();
        row.transition(status, at);
        let updated = row.clone();

        let from = previous.status;
        self.undo.push(Undo::UpdateShipment(previous));
        Ok((from, updated))
    }

    fn insert_event(&mut self, shipment_id: ShipmentId, draft: EventDraft) -> StoreResult<TrackingEvent> {
        // Mirrors the NOT NULL / foreign key constraints of a relational table
        if draft.location.trim().is_empty() {
            return Err(StoreError::Unavailable("tracking_events.location must not be empty".into()));
        }
        if draft.description.trim().is_empty() {
            return Err(StoreError::Unavailable(
                "tracking_events.description must not be empty".into(),
            ));
        }
        if !self.tables.shipments.contains_key(&shipment_id) {
            return Err(StoreError::NotFound(format!("shipment {shipment_id}")));
        }

        self.tables.last_event_id += 1;
        let event = TrackingEvent {
            id: self.tables.last_event_id,
            shipment_id,
            location: draft.location,
            description: draft.description,
            event_time: draft.event_time,
            created_at: draft.created_at,
        };

        self.tables
            .events
            .entry(shipment_id)
            .or_default()
            .push(event.clone());
        self.undo.push(Undo::InsertEvent { shipment_id });
        Ok(event)
    }

    fn commit(mut self) {
        self.undo.clear();
    }
}

impl Drop for Transaction<'_> {
    fn drop(&mut self) {
        if self.undo.is_empty() {
            return;
        }

        tracing::warn!(operations = self.undo.len(), "Rolling back store transaction");
        let tables = &mut *self.tables;
        for op in self.undo.drain(..).rev() {
            match op {
                Undo::InsertShipment { id, tracking_number } => {
                    tables.shipments.remove(&id);
                    tables.tracking_index.remove(&tracking_number);
                    tables.events.remove(&id);
                }
                Undo::InsertEvent { shipment_id } => {
                    if let Some(events) = tables.events.get_mut(&shipment_id) {
                        events.pop();
                    }
                }
                Undo::UpdateShipment(previous) => {
                    tables.shipments.insert(previous.id, previous);
                }
            }
        }
    }
}

/// Process-local store backing both shipments and users.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))
    }

    fn begin(&self) -> StoreResult<Transaction<'_>> {
        let tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;
        Ok(Transaction {
            tables,
            undo: Vec::new(),
        })
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl ShipmentStore for MemoryStore {
    async fn insert_shipment_with_event(
        &self,
        shipment: ShipmentDraft,
        event: EventDraft,
    ) -> StoreResult<(Shipment, TrackingEvent)> {
        let mut tx = self.begin()?;
        let shipment = tx.insert_shipment(shipment)?;
        let event = tx.insert_event(shipment.id, event)?;
        tx.commit();
        Ok((shipment, event))
    }

    async fn transition_with_event(
        &self,
        shipment_id: ShipmentId,
        status: ShipmentStatus,
        at: DateTime<Utc>,
        event: EventDraft,
    ) -> StoreResult<StatusChange> {
        let mut tx = self.begin()?;
        let (previous, shipment) = tx.transition_shipment(shipment_id, status, at)?;
        let event = tx.insert_event(shipment.id, event)?;
        tx.commit();
        Ok(StatusChange {
            previous,
            shipment,
            event,
        })
    }

    async fn find_by_tracking_number(&self, tracking_number: &str) -> StoreResult<Option<Shipment>> {
        let tables = self.read()?;
        Ok(tables
            .tracking_index
            .get(tracking_number)
            .and_then(|id| tables.shipments.get(id))
            .cloned())
    }

    async fn find_by_owner(&self, owner: UserId) -> StoreResult<Vec<Shipment>> {
        let tables = self.read()?;
        let mut shipments: Vec<Shipment> = tables
            .shipments
            .values()
            .filter(|s| s.owner_id == owner)
            .cloned()
            .collect();
        shipments.sort_by_key(|s| s.id);
        Ok(shipments)
    }

    async fn find_by_owner_between(
        &self,
        owner: UserId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<Shipment>> {
        let tables = self.read()?;
        let mut shipments: Vec<Shipment> = tables
            .shipments
            .values()
            .filter(|s| s.owner_id == owner && s.created_at >= start && s.created_at <= end)
            .cloned()
            .collect();
        shipments.sort_by_key(|s| s.id);
        Ok(shipments)
    }

    async fn events_for(&self, shipment_id: ShipmentId) -> StoreResult<Vec<TrackingEvent>> {
        let tables = self.read()?;
        let mut events = tables.events.get(&shipment_id).cloned().unwrap_or_default();
        events.sort_by(|a, b| b.event_time.cmp(&a.event_time).then(b.id.cmp(&a.id)));
        Ok(events)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self
            .tables
            .write()
            .map_err(|_| StoreError::Unavailable("store lock poisoned".into()))?;

        let email = normalize_email(&user.email);
        if tables.email_index.contains_key(&email) {
            return Err(StoreError::Conflict(format!("email {email} already exists")));
        }

        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            email: email.clone(),
            first_name: user.first_name,
            last_name: user.last_name,
            password_hash: user.password_hash,
            role: user.role,
        };
        tables.email_index.insert(email, user.id);
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.read()?;
        Ok(tables
            .email_index
            .get(&normalize_email(email))
            .and_then(|id| tables.users.get(id))
            .cloned())
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }
}
