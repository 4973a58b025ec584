//! Widget service — use-cases for managing widgets.

use domo_domain::error::{DomoError, NotFoundError, ProtectedError};
use domo_domain::id::WidgetId;
use domo_domain::object::ObjectFilter;
use domo_domain::widget::{NewWidget, Widget, WidgetFilter};

use crate::ports::{ObjectRepository, WidgetRepository};

/// Application service for widget CRUD operations.
///
/// Widgets group objects for presentation; deleting one never cascades to
/// its member objects, they are unassigned instead.
pub struct WidgetService<WR, OR> {
    widgets: WR,
    objects: OR,
}

impl<WR, OR> WidgetService<WR, OR>
where
    WR: WidgetRepository,
    OR: ObjectRepository,
{
    /// Create a new service backed by the given repositories.
    pub fn new(widgets: WR, objects: OR) -> Self {
        Self { widgets, objects }
    }

    /// Create a new widget after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] if invariants fail, or a storage
    /// error propagated from the repository.
    #[tracing::instrument(skip(self, widget), fields(widget_name = %widget.name))]
    pub async fn create_widget(&self, widget: NewWidget) -> Result<Widget, DomoError> {
        widget.validate()?;
        self.widgets.create(widget).await
    }

    /// Look up a widget by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::NotFound`] when no widget with `id` exists, or
    /// a storage error from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn get_widget(&self, id: WidgetId) -> Result<Widget, DomoError> {
        self.widgets.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Widget",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all widgets.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_widgets(&self) -> Result<Vec<Widget>, DomoError> {
        self.widgets.get_all().await
    }

    /// List widgets matching every set field of `filter`.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn find_widgets(&self, filter: WidgetFilter) -> Result<Vec<Widget>, DomoError> {
        self.widgets.find(filter).await
    }

    /// Update an existing widget.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::Validation`] if invariants fail,
    /// [`DomoError::NotFound`] if the widget does not exist,
    /// [`DomoError::Protected`] if the row is protected and
    /// `override_protection` is not set, or a storage error from the
    /// repository.
    #[tracing::instrument(skip(self, widget), fields(widget_id = %widget.id))]
    pub async fn update_widget(
        &self,
        widget: Widget,
        override_protection: bool,
    ) -> Result<Widget, DomoError> {
        widget.validate()?;
        let existing = self.get_widget(widget.id).await?;
        if existing.protected && !override_protection {
            return Err(ProtectedError {
                entity: "Widget",
                id: widget.id.to_string(),
            }
            .into());
        }
        self.widgets.update(widget).await
    }

    /// Delete a widget by id, unassigning its member objects first.
    ///
    /// # Errors
    ///
    /// Returns [`DomoError::NotFound`] if the widget does not exist,
    /// [`DomoError::Protected`] if the row is protected and
    /// `override_protection` is not set, or a storage error from the
    /// repository.
    #[tracing::instrument(skip(self))]
    pub async fn remove_widget(
        &self,
        id: WidgetId,
        override_protection: bool,
    ) -> Result<(), DomoError> {
        let widget = self.get_widget(id).await?;
        if widget.protected && !override_protection {
            return Err(ProtectedError {
                entity: "Widget",
                id: id.to_string(),
            }
            .into());
        }
        let members = self
            .objects
            .find(ObjectFilter {
                widget_id: Some(id),
                ..ObjectFilter::default()
            })
            .await?;
        for mut object in members {
            object.widget_id = WidgetId::UNASSIGNED;
            self.objects.update(object).await?;
        }
        self.widgets.delete(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::future::Future;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicI64, Ordering};

    use domo_domain::error::ValidationError;
    use domo_domain::id::ObjectId;
    use domo_domain::object::{NewObject, Object};

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

    fn make_service() -> WidgetService<InMemoryWidgetRepo, InMemoryObjectRepo> {
        WidgetService::new(InMemoryWidgetRepo::default(), InMemoryObjectRepo::default())
    }

    #[tokio::test]
    async fn should_create_and_fetch_widget() {
        let svc = make_service();
        let widget = svc
            .create_widget(Widget::builder().name("Room panel").build().unwrap())
            .await
            .unwrap();
        let fetched = svc.get_widget(widget.id).await.unwrap();
        assert_eq!(fetched.name, "Room panel");
    }

    #[tokio::test]
    async fn should_reject_create_when_name_is_empty() {
        let svc = make_service();
        let mut draft = Widget::builder().name("Panel").build().unwrap();
        draft.name = String::new();
        let result = svc.create_widget(draft).await;
        assert!(matches!(
            result,
            Err(DomoError::Validation(ValidationError::EmptyName))
        ));
    }

    #[tokio::test]
    async fn should_refuse_update_of_protected_widget_without_override() {
        let svc = make_service();
        let widget = svc
            .create_widget(
                Widget::builder()
                    .name("Locked panel")
                    .protected(true)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let mut renamed = widget.clone();
        renamed.name = "Renamed".to_owned();
        let result = svc.update_widget(renamed.clone(), false).await;
        assert!(matches!(result, Err(DomoError::Protected(_))));

        let saved = svc.update_widget(renamed, true).await.unwrap();
        assert_eq!(saved.name, "Renamed");
    }

    #[tokio::test]
    async fn should_unassign_member_objects_when_widget_is_removed() {
        let widgets = InMemoryWidgetRepo::default();
        let objects = InMemoryObjectRepo::default();
        let widget = widgets
            .create(Widget::builder().name("Panel").build().unwrap())
            .await
            .unwrap();
        let member = objects
            .create(
                Object::builder()
                    .name("Member")
                    .widget_id(widget.id)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();
        let svc = WidgetService::new(widgets, objects);

        svc.remove_widget(widget.id, false).await.unwrap();

        assert!(matches!(
            svc.get_widget(widget.id).await,
            Err(DomoError::NotFound(_))
        ));
        let orphan = svc.objects.get_by_id(member.id).await.unwrap().unwrap();
        assert_eq!(orphan.widget_id, WidgetId::UNASSIGNED);
    }

    #[tokio::test]
    async fn should_refuse_removal_of_protected_widget_without_override() {
        let svc = make_service();
        let widget = svc
            .create_widget(
                Widget::builder()
                    .name("Locked")
                    .protected(true)
                    .build()
                    .unwrap(),
            )
            .await
            .unwrap();

        let result = svc.remove_widget(widget.id, false).await;
        assert!(matches!(result, Err(DomoError::Protected(_))));

        svc.remove_widget(widget.id, true).await.unwrap();
        assert!(matches!(
            svc.get_widget(widget.id).await,
            Err(DomoError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn should_return_not_found_when_removing_missing_widget() {
        let svc = make_service();
        let result = svc.remove_widget(WidgetId::new(77), false).await;
        assert!(matches!(result, Err(DomoError::NotFound(_))));
    }
}
