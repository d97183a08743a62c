use super::{AppStore, StoreError, EVENTS_KEY};
use crate::model::{CalendarEvent, EntityId, EventPatch, NewEvent};
use chrono::Utc;

impl AppStore {
    pub fn load_events(&mut self) {
        if let Some(events) = self.load_blob::<Vec<CalendarEvent>>(EVENTS_KEY) {
            for event in &events {
                self.ids.observe(event.id);
            }
            self.events = events;
        }
    }

    pub fn events(&self) -> Vec<CalendarEvent> {
        self.events.clone()
    }

    /// Events ordered by start time. Unparseable start times sort last, and
    /// ties keep insertion order.
    pub fn events_sorted(&self) -> Vec<CalendarEvent> {
        let mut events = self.events.clone();
        events.sort_by_key(|e| match e.starts_at() {
            Some(start) => (false, Some(start)),
            None => (true, None),
        });
        events
    }

    pub fn add_event(&mut self, draft: NewEvent) -> Result<CalendarEvent, StoreError> {
        let event = CalendarEvent::from_draft(self.ids.next_id(), draft, Utc::now());
        let mut events = self.events.clone();
        events.push(event.clone());
        self.persist(EVENTS_KEY, &events)?;
        self.events = events;
        tracing::debug!(id = event.id, "event added");
        Ok(event)
    }

    pub fn update_event(
        &mut self,
        id: EntityId,
        patch: EventPatch,
    ) -> Result<Option<CalendarEvent>, StoreError> {
        let Some(index) = self.events.iter().position(|e| e.id == id) else {
            return Ok(None);
        };
        let mut events = self.events.clone();
        events[index].apply(patch, Utc::now());
        let updated = events[index].clone();
        self.persist(EVENTS_KEY, &events)?;
        self.events = events;
        Ok(Some(updated))
    }

    pub fn delete_event(&mut self, id: EntityId) -> Result<(), StoreError> {
        if !self.events.iter().any(|e| e.id == id) {
            return Ok(());
        }
        let events: Vec<CalendarEvent> =
            self.events.iter().filter(|e| e.id != id).cloned().collect();
        self.persist(EVENTS_KEY, &events)?;
        self.events = events;
        if self.selected_event == Some(id) {
            self.selected_event = None;
        }
        Ok(())
    }

    pub fn select_event(&mut self, id: Option<EntityId>) {
        self.selected_event = id.filter(|id| self.events.iter().any(|e| e.id == *id));
    }

    pub fn selected_event(&self) -> Option<CalendarEvent> {
        let id = self.selected_event?;
        self.events.iter().find(|e| e.id == id).cloned()
    }
}
