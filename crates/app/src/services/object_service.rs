//! Object service — use-cases for managing objects.

use serde_json::json;

use domo_domain::error::{DomoError, NotFoundError, ProtectedError, ValidationError};
use domo_domain::event::{Event, EventType};
use domo_domain::id::{ObjectId, WidgetId};
use domo_domain::object::{NewObject, Object, ObjectFilter};

use crate::ports::{EventPublisher, ObjectRepository, WidgetRepository};

/// Application service for object CRUD, widget assignment, and the
/// driver-facing value update path.
pub struct ObjectService<OR, WR, EP> {
    objects: OR,
    widgets: WR,
    events: EP,
}

impl<OR, WR, EP> ObjectService<OR, WR, EP>
where
    OR: ObjectRepository,
    WR: WidgetRepository,
    EP: EventPublisher,
{
    /// Create a new service backed by the given repositories and publisher.
    pub fn new(objects: OR, widgets: WR, events: EP) -> Self {
        Self {
            objects,
            widgets,
            events,
        }
    }

    /// Create a new object after validating domain invariants and the
    /// widget assignment.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] if invariants fail or the assigned
    /// widget does not exist, or a storage error from the repository.
    #[tracing::instrument(skip(self, object), fields(object_name = %object.name))]
    pub async fn create_object(&self, object: NewObject) -> Result<Object, DomoError> {
        object.validate()?;
        self.check_widget_assignment(object.widget_id).await?;
        let object = self.objects.create(object).await?;
        self.announce(Event::new(
            EventType::ObjectCreated,
            Some(object.id),
            json!({"name": object.name, "technology": object.technology}),
        ))
        .await;
        Ok(object)
    }

    /// Look up an object by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::NotFound`] when no object with `id` exists, or
    /// a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_object(&self, id: ObjectId) -> Result<Object, DomoError> {
        self.objects.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Object",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all objects.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_objects(&self) -> Result<Vec<Object>, DomoError> {
        self.objects.get_all().await
    }

    /// List objects matching every set field of `filter`.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn find_objects(&self, filter: ObjectFilter) -> Result<Vec<Object>, DomoError> {
        self.objects.find(filter).await
    }

    /// Update an existing object.
    ///
    /// A `StateChanged` event is published when the update changes the
    /// object's `value` or `status`.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] if invariants fail,
    /// [`DomoError::NotFound`] if the object does not exist,
    /// [`DomoError::Protected`] if the row is protected and
    /// `override_protection` is not set, or a storage error from the
    /// repository.
    #[tracing::instrument(skip(self, object), fields(object_id = %object.id))]
    pub async fn update_object(
        &self,
        object: Object,
        override_protection: bool,
    ) -> Result<Object, DomoError> {
        object.validate()?;
        self.check_widget_assignment(object.widget_id).await?;
        let existing = self.get_object(object.id).await?;
        if existing.protected && !override_protection {
            return Err(ProtectedError {
                entity: "Object",
                id: object.id.to_string(),
            }
            .into());
        }
        let changed = existing.value != object.value || existing.status != object.status;
        let object = self.objects.update(object).await?;
        if changed {
            self.announce(state_changed(&object, &existing.value)).await;
        }
        Ok(object)
    }

    /// Record a driver-reported value for the object addressed by
    /// `technology` + `technology_id`.
    ///
    /// Protection does not apply here: this is the state-report path, not
    /// an operator mutation. When the reported value and status equal the
    /// stored ones the row is left untouched and no event is published.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::NotFound`] when no object carries that
    /// technology key, or a storage error from the repository.
    #[tracing::instrument(skip(self, value))]
    pub async fn update_object_value(
        &self,
        technology: &str,
        technology_id: &str,
        value: String,
        status: i64,
    ) -> Result<Object, DomoError> {
        let filter = ObjectFilter {
            technology: Some(technology.to_owned()),
            technology_id: Some(technology_id.to_owned()),
            ..ObjectFilter::default()
        };
        let Some(mut object) = self.objects.find(filter).await?.into_iter().next() else {
            return Err(NotFoundError {
                entity: "Object",
                id: format!("{technology}/{technology_id}"),
            }
            .into());
        };
        if object.value == value && object.status == status {
            return Ok(object);
        }
        let previous = object.value.clone();
        object.value = value;
        object.status = status;
        let object = self.objects.update(object).await?;
        self.announce(state_changed(&object, &previous)).await;
        Ok(object)
    }

    /// Create or update an object by its `(technology, technology_id)` pair.
    ///
    /// On update, the store id and the operator-owned fields (widget
    /// assignment, enabled/visible/protected flags) are preserved; the
    /// driver-owned fields are refreshed from the draft. Drafts without a
    /// technology id always create.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] if invariants fail, or a storage
    /// error propagated from the repository.
    #[tracing::instrument(skip(self, object), fields(object_name = %object.name, technology = %object.technology))]
    pub async fn upsert_object(&self, object: NewObject) -> Result<Object, DomoError> {
        let Some(technology_id) = object.technology_id.clone() else {
            return self.create_object(object).await;
        };
        let filter = ObjectFilter {
            technology: Some(object.technology.clone()),
            technology_id: Some(technology_id),
            ..ObjectFilter::default()
        };
        let Some(existing) = self.objects.find(filter).await?.into_iter().next() else {
            return self.create_object(object).await;
        };
        object.validate()?;
        let updated = Object {
            id: existing.id,
            name: object.name,
            description: object.description,
            kind: object.kind,
            status: object.status,
            value: object.value,
            widget_id: existing.widget_id,
            options: object.options,
            technology: object.technology,
            technology_id: object.technology_id,
            enabled: existing.enabled,
            visible: existing.visible,
            protected: existing.protected,
        };
        self.objects.update(updated).await
    }

    /// Delete an object by id.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::NotFound`] if the object does not exist,
    /// [`DomoError::Protected`] if the row is protected and
    /// `override_protection` is not set, or a storage error from the
    /// repository.
    #[tracing::instrument(skip(self))]
    pub async fn remove_object(
        &self,
        id: ObjectId,
        override_protection: bool,
    ) -> Result<(), DomoError> {
        let object = self.get_object(id).await?;
        if object.protected && !override_protection {
            return Err(ProtectedError {
                entity: "Object",
                id: id.to_string(),
            }
            .into());
        }
        self.objects.delete(id).await?;
        self.announce(Event::new(
            EventType::ObjectRemoved,
            Some(id),
            json!({"name": object.name, "technology": object.technology}),
        ))
        .await;
        Ok(())
    }

    async fn check_widget_assignment(&self, widget_id: WidgetId) -> Result<(), DomoError> {
        if widget_id == WidgetId::UNASSIGNED {
            return Ok(());
        }
        if self.widgets.get_by_id(widget_id).await?.is_none() {
            return Err(ValidationError::UnknownWidget(widget_id).into());
        }
        Ok(())
    }

    async fn announce(&self, event: Event) {
        if let Err(error) = self.events.publish(event).await {
            tracing::warn!(error = %error, "failed to publish object event");
        }
    }
}

fn state_changed(object: &Object, previous: &str) -> Event {
    Event::new(
        EventType::StateChanged,
        Some(object.id),
        json!({
            "value": object.value,
            "status": object.status,
            "previous": previous,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI64, Ordering};

    use domo_domain::widget::{NewWidget, Widget, WidgetFilter};

    #[derive(Default)]
    struct InMemoryObjectRepo {
        store: Mutex<HashMap<ObjectId, Object>>,
        seq: AtomicI64,
    }

    impl ObjectRepository for InMemoryObjectRepo {
        fn create(
            &self,
            object: NewObject,
        ) -> impl Future<Output = Result<Object, DomoError>> + Send {
            let id = ObjectId::new(self.seq.fetch_add(1, Ordering::SeqCst) + 1);
            let object = object.into_object(id);
            self.store.lock().unwrap().insert(id, object.clone());
            async { Ok(object) }
        }

        fn get_by_id(
            &self,
            id: ObjectId,
        ) -> impl Future<Output = Result<Option<Object>, DomoError>> + Send {
            let result = self.store.lock().unwrap().get(&id).cloned();
            async { Ok(result) }
        }

        fn get_all(&self) -> impl Future<Output = Result<Vec<Object>, DomoError>> + Send {
            let result = self.store.lock().unwrap().values().cloned().collect();
            async { Ok(result) }
        }

        fn find(
            &self,
            filter: ObjectFilter,
        ) -> impl Future<Output = Result<Vec<Object>, DomoError>> + Send {
            let result: Vec<Object> = self
                .store
                .lock()
                .unwrap()
                .values()
                .filter(|o| filter.matches(o))
                .cloned()
                .collect();
            async { Ok(result) }
        }

        fn update(&self, object: Object) -> impl Future<Output = Result<Object, DomoError>> + Send {
            self.store
                .lock()
                .unwrap()
                .insert(object.id, object.clone());
            async { Ok(object) }
        }

        fn delete(&self, id: ObjectId) -> impl Future<Output = Result<(), DomoError>> + Send {
            self.store.lock().unwrap().remove(&id);
            async { Ok(()) }
        }
    }

    #[derive(Default)]
    struct InMemoryWidgetRepo {
        store: Mutex<HashMap<WidgetId, Widget>>,
        seq: AtomicI64,
    }

    impl WidgetRepository for InMemoryWidgetRepo {
        fn create(
            &self,
            widget: NewWidget,
        ) -> impl Future<Output = Result<Widget, DomoError>> + Send {
            let id = WidgetId::new(self.seq.fetch_add(1, Ordering::SeqCst) + 1);
            let widget = widget.into_widget(id);
            self.store.lock().unwrap().insert(id, widget.clone());
            async { Ok(widget) }
        }

        fn get_by_id(
            &self,
            id: WidgetId,
        ) -> impl Future<Output = Result<Option<Widget>, DomoError>> + Send {
            let result = self.store.lock().unwrap().get(&id).cloned();
            async { Ok(result) }
        }

        fn get_all(&self) -> impl Future<Output = Result<Vec<Widget>, DomoError>> + Send {
            let result = self.store.lock().unwrap().values().cloned().collect();
            async { Ok(result) }
        }

        fn find(
            &self,
            filter: WidgetFilter,
        ) -> impl Future<Output = Result<Vec<Widget>, DomoError>> + Send {
            let result: Vec<Widget> = self
                .store
                .lock()
                .unwrap()
                .values()
                .filter(|w| filter.matches(w))
                .cloned()
                .collect();
            async { Ok(result) }
        }

        fn update(&self, widget: Widget) -> impl Future<Output = Result<Widget, DomoError>> + Send {
            self.store
                .lock()
                .unwrap()
                .insert(widget.id, widget.clone());
            async { Ok(widget) }
        }

        fn delete(&self, id: WidgetId) -> impl Future<Output = Result<(), DomoError>> + Send {
            self.store.lock().unwrap().remove(&id);
            async { Ok(()) }
        }
    }

    #[derive(Default, Clone)]
    struct SpyPublisher {
        events: std::sync::Arc<Mutex<Vec<Event>>>,
    }

    impl EventPublisher for SpyPublisher {
        fn publish(&self, event: Event) -> impl Future<Output = Result<(), DomoError>> + Send {
            self.events.lock().unwrap().push(event);
            async { Ok(()) }
        }
    }

    fn make_service() -> (
        ObjectService<InMemoryObjectRepo, InMemoryWidgetRepo, SpyPublisher>,
        SpyPublisher,
    ) {
        let spy = SpyPublisher::default();
        let service = ObjectService::new(
            InMemoryObjectRepo::default(),
            InMemoryWidgetRepo::default(),
            spy.clone(),
        );
        (service, spy)
    }

    fn published_types(spy: &SpyPublisher) -> Vec<EventType> {
        spy.events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.event_type)
            .collect()
    }

    #[tokio::test]
    async fn should_create_object_and_publish_event() {
        let (svc, spy) = make_service();
        let object = svc
            .create_object(Object::builder().name("Kitchen plug").build().unwrap())
            .await
            .unwrap();
        assert_eq!(object.name, "Kitchen plug");
        assert_eq!(published_types(&spy), vec![EventType::ObjectCreated]);
    }

    #[tokio::test]
    async fn should_reject_create_when_widget_is_unknown() {
        let (svc, spy) = make_service();
        let draft = Object::builder()
            .name("Orphan")
            .widget_id(WidgetId::new(42))
            .build()
            .unwrap();
        let result = svc.create_object(draft).await;
        assert!(matches!(
            result,
            Err(DomoError::Validation(ValidationError::UnknownWidget(id))) if id == WidgetId::new(42)
        ));
        assert!(published_types(&spy).is_empty());
    }

    #[tokio::test]
    async fn should_accept_create_when_widget_exists() {
        let spy = SpyPublisher::default();
        let widgets = InMemoryWidgetRepo::default();
        let widget = widgets
            .create(Widget::builder().name("Panel").build().unwrap())
            .await
            .unwrap();
        let svc = ObjectService::new(InMemoryObjectRepo::default(), widgets, spy);

        let draft = Object::builder()
            .name("Switch")
            .widget_id(widget.id)
            .build()
            .unwrap();
        let object = svc.create_object(draft).await.unwrap();
        assert_eq!(object.widget_id, widget.id);
    }

    #[tokio::test]
    async fn should_return_not_found_when_object_missing() {
        let (svc, _) = make_service();
        let result = svc.get_object(ObjectId::new(99)).await;
        assert!(matches!(result, Err(DomoError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_publish_state_change_on_value_update() {
        let (svc, spy) = make_service();
        let object = svc
            .create_object(
                Object::builder()
                    .name("Lamp")
                    .technology("zwave")
                    .technology_id("2-37-1-0")
                    .value("Off")
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let updated = svc
            .update_object_value("zwave", "2-37-1-0", "On".to_owned(), 1)
            .await
            .unwrap();
        assert_eq!(updated.id, object.id);
        assert_eq!(updated.value, "On");
        assert_eq!(
            published_types(&spy),
            vec![EventType::ObjectCreated, EventType::StateChanged]
        );
        let events = spy.events.lock().unwrap();
        assert_eq!(events[1].data["previous"], "Off");
    }

    #[tokio::test]
    async fn should_not_publish_when_reported_value_is_unchanged() {
        let (svc, spy) = make_service();
        svc.create_object(
            Object::builder()
                .name("Lamp")
                .technology("zwave")
                .technology_id("2-37-1-0")
                .value("Off")
                .build()
                .unwrap(),
        )
        .await
        .unwrap();

        svc.update_object_value("zwave", "2-37-1-0", "Off".to_owned(), 0)
            .await
            .unwrap();
        assert_eq!(published_types(&spy), vec![EventType::ObjectCreated]);
    }

    #[tokio::test]
    async fn should_return_not_found_for_unknown_technology_key() {
        let (svc, _) = make_service();
        let result = svc
            .update_object_value("zwave", "9-9-9-9", "On".to_owned(), 1)
            .await;
        assert!(matches!(result, Err(DomoError::NotFound(_))));
    }

    #[tokio::test]
    async fn should_refuse_update_of_protected_object_without_override() {
        let (svc, _) = make_service();
        let object = svc
            .create_object(
                Object::builder()
                    .name("Alarm")
                    .protected(true)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let mut renamed = object.clone();
        renamed.name = "Disarmed".to_owned();
        let result = svc.update_object(renamed.clone(), false).await;
        assert!(matches!(result, Err(DomoError::Protected(_))));

        let saved = svc.update_object(renamed, true).await.unwrap();
        assert_eq!(saved.name, "Disarmed");
    }

    #[tokio::test]
    async fn should_remove_object_and_publish_event() {
        let (svc, spy) = make_service();
        let object = svc
            .create_object(Object::builder().name("Old sensor").build().unwrap())
            .await
            .unwrap();

        svc.remove_object(object.id, false).await.unwrap();
        assert!(matches!(
            svc.get_object(object.id).await,
            Err(DomoError::NotFound(_))
        ));
        assert_eq!(
            published_types(&spy),
            vec![EventType::ObjectCreated, EventType::ObjectRemoved]
        );
    }

    #[tokio::test]
    async fn should_refuse_removal_of_protected_object_without_override() {
        let (svc, _) = make_service();
        let object = svc
            .create_object(
                Object::builder()
                    .name("Siren")
                    .protected(true)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let result = svc.remove_object(object.id, false).await;
        assert!(matches!(result, Err(DomoError::Protected(_))));

        svc.remove_object(object.id, true).await.unwrap();
    }

    #[tokio::test]
    async fn should_upsert_create_then_update_preserving_operator_fields() {
        let (svc, _) = make_service();
        let first = svc
            .upsert_object(
                Object::builder()
                    .name("Multisensor temp")
                    .technology("zwave")
                    .technology_id("5-49-1-1")
                    .value("20.1")
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        // Operator pins the object before the next discovery pass.
        let mut pinned = first.clone();
        pinned.protected = true;
        svc.update_object(pinned, true).await.unwrap();

        let second = svc
            .upsert_object(
                Object::builder()
                    .name("Multisensor temperature")
                    .technology("zwave")
                    .technology_id("5-49-1-1")
                    .value("20.4")
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.name, "Multisensor temperature");
        assert_eq!(second.value, "20.4");
        assert!(second.protected);
        assert_eq!(svc.list_objects().await.unwrap().len(), 1);
    }
}
