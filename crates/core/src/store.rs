//! Annotation store
//!
//! Single flat, insertion-ordered list of annotations across all pages, plus
//! the current selection. Insertion order doubles as paint order when baking.
//! Observers are notified synchronously after every mutation.

use crate::annotation::{Annotation, AnnotationId, AnnotationKind, PageCoordinate, PageRect};

/// Change notification delivered to store observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    Created(AnnotationId),
    Updated(AnnotationId),
    Deleted(AnnotationId),
    Cleared,
    SelectionChanged(Option<AnnotationId>),
}

/// Handle returned by [`AnnotationStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&StoreEvent)>;

/// Ordered annotation collection with selection and change notification
#[derive(Default)]
pub struct AnnotationStore {
    annotations: Vec<Annotation>,
    selected: Option<AnnotationId>,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl std::fmt::Debug for AnnotationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationStore")
            .field("annotations", &self.annotations)
            .field("selected", &self.selected)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an observer for store changes
    pub fn subscribe<F>(&mut self, observer: F) -> SubscriptionId
    where
        F: FnMut(&StoreEvent) + 'static,
    {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sid, _)| *sid != id);
        self.observers.len() != before
    }

    fn notify(&mut self, event: StoreEvent) {
        for (_, observer) in &mut self.observers {
            observer(&event);
        }
    }

    /// Append a new annotation with a fresh id
    pub fn create(&mut self, page: u32, rect: PageRect, kind: AnnotationKind) -> &Annotation {
        let annotation = Annotation::new(page, rect, kind);
        self.insert(annotation)
    }

    /// Append an already-built annotation (e.g. restored from a host payload)
    pub fn insert(&mut self, annotation: Annotation) -> &Annotation {
        let id = annotation.id();
        log::debug!(
            "created {} annotation {id} on page {}",
            annotation.annotation_type(),
            annotation.page()
        );
        self.annotations.push(annotation);
        self.notify(StoreEvent::Created(id));
        &self.annotations[self.annotations.len() - 1]
    }

    /// Flip a checkbox's state. No-op on unknown ids and other types.
    pub fn toggle_checked(&mut self, id: AnnotationId) -> bool {
        let Some(annotation) = self.get_mut(id) else {
            return false;
        };
        let AnnotationKind::Checkbox { checked } = annotation.kind_mut() else {
            return false;
        };
        *checked = !*checked;
        self.notify(StoreEvent::Updated(id));
        true
    }

    /// Overwrite a text field's content. No-op on unknown ids and other types.
    pub fn update_content(&mut self, id: AnnotationId, text: impl Into<String>) -> bool {
        let Some(annotation) = self.get_mut(id) else {
            return false;
        };
        let AnnotationKind::Text { content } = annotation.kind_mut() else {
            return false;
        };
        *content = Some(text.into());
        self.notify(StoreEvent::Updated(id));
        true
    }

    /// Remove exactly one annotation, clearing the selection if it pointed at it
    pub fn delete(&mut self, id: AnnotationId) -> Option<Annotation> {
        let index = self.annotations.iter().position(|a| a.id() == id)?;
        let removed = self.annotations.remove(index);
        self.notify(StoreEvent::Deleted(id));

        if self.selected == Some(id) {
            self.selected = None;
            self.notify(StoreEvent::SelectionChanged(None));
        }

        Some(removed)
    }

    /// Remove every annotation and the selection
    pub fn clear(&mut self) {
        self.annotations.clear();
        self.selected = None;
        self.notify(StoreEvent::Cleared);
    }

    /// Mark an annotation as selected. Unknown ids are ignored.
    pub fn select(&mut self, id: AnnotationId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        if self.selected != Some(id) {
            self.selected = Some(id);
            self.notify(StoreEvent::SelectionChanged(Some(id)));
        }
        true
    }

    pub fn selected(&self) -> Option<AnnotationId> {
        self.selected
    }

    pub fn get(&self, id: AnnotationId) -> Option<&Annotation> {
        self.annotations.iter().find(|a| a.id() == id)
    }

    fn get_mut(&mut self, id: AnnotationId) -> Option<&mut Annotation> {
        self.annotations.iter_mut().find(|a| a.id() == id)
    }

    /// Annotations on one page, in insertion order
    pub fn filter_by_page(&self, page: u32) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter().filter(move |a| a.page() == page)
    }

    /// Topmost annotation on `page` containing `point`
    pub fn hit_test(&self, page: u32, point: &PageCoordinate) -> Option<&Annotation> {
        self.annotations.iter().rev().find(|a| a.page() == page && a.hit_test(point))
    }

    /// All annotations in insertion order
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn iter(&self) -> impl Iterator<Item = &Annotation> {
        self.annotations.iter()
    }

    /// Owned copy of the current list, e.g. for a save callback
    pub fn snapshot(&self) -> Vec<Annotation> {
        self.annotations.clone()
    }

    pub fn len(&self) -> usize {
        self.annotations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.annotations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::AnnotationType;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn rect() -> PageRect {
        PageRect::new(10.0, 10.0, 50.0, 20.0)
    }

    #[test]
    fn test_create_assigns_unique_ids_in_order() {
        let mut store = AnnotationStore::new();
        let a = store.create(1, rect(), AnnotationKind::Rectangle).id();
        let b = store.create(1, rect(), AnnotationKind::Rectangle).id();
        assert_ne!(a, b);
        let ids: Vec<_> = store.iter().map(|x| x.id()).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn test_toggle_checked_only_applies_to_checkboxes() {
        let mut store = AnnotationStore::new();
        let checkbox = store.create(1, rect(), AnnotationKind::Checkbox { checked: false }).id();
        let text = store.create(1, rect(), AnnotationKind::Text { content: None }).id();

        assert!(store.toggle_checked(checkbox));
        assert_eq!(store.get(checkbox).unwrap().checked(), Some(true));

        assert!(!store.toggle_checked(text));
        assert_eq!(store.get(text).unwrap().kind(), &AnnotationKind::Text { content: None });

        assert!(!store.toggle_checked(AnnotationId::new_v4()));
    }

    #[test]
    fn test_update_content_only_applies_to_text() {
        let mut store = AnnotationStore::new();
        let text = store.create(1, rect(), AnnotationKind::for_drag(AnnotationType::Text)).id();
        let signature = store.create(1, rect(), AnnotationKind::Signature).id();

        assert!(store.update_content(text, "Jane Doe"));
        assert_eq!(store.get(text).unwrap().content(), Some("Jane Doe"));
        assert!(!store.update_content(signature, "ignored"));
        assert_eq!(store.get(signature).unwrap().kind(), &AnnotationKind::Signature);
    }

    #[test]
    fn test_delete_clears_matching_selection() {
        let mut store = AnnotationStore::new();
        let a = store.create(1, rect(), AnnotationKind::Rectangle).id();
        let b = store.create(1, rect(), AnnotationKind::Rectangle).id();

        store.select(b);
        store.delete(a);
        assert_eq!(store.selected(), Some(b));

        store.delete(b);
        assert_eq!(store.selected(), None);
        assert!(store.is_empty());
        assert!(store.delete(b).is_none());
    }

    #[test]
    fn test_select_unknown_id_is_ignored() {
        let mut store = AnnotationStore::new();
        assert!(!store.select(AnnotationId::new_v4()));
        assert_eq!(store.selected(), None);
    }

    #[test]
    fn test_filter_by_page_keeps_order() {
        let mut store = AnnotationStore::new();
        let a = store.create(1, rect(), AnnotationKind::Rectangle).id();
        store.create(2, rect(), AnnotationKind::Signature);
        let c = store.create(1, rect(), AnnotationKind::Signature).id();

        let ids: Vec<_> = store.filter_by_page(1).map(|x| x.id()).collect();
        assert_eq!(ids, vec![a, c]);
        assert_eq!(store.filter_by_page(3).count(), 0);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_hit_test_returns_topmost() {
        let mut store = AnnotationStore::new();
        store.create(1, PageRect::new(0.0, 0.0, 100.0, 100.0), AnnotationKind::Rectangle);
        let top = store
            .create(1, PageRect::new(40.0, 40.0, 20.0, 20.0), AnnotationKind::Checkbox { checked: false })
            .id();

        let hit = store.hit_test(1, &PageCoordinate::new(50.0, 50.0)).unwrap();
        assert_eq!(hit.id(), top);
        assert!(store.hit_test(2, &PageCoordinate::new(50.0, 50.0)).is_none());
        assert!(store.hit_test(1, &PageCoordinate::new(150.0, 50.0)).is_none());
    }

    #[test]
    fn test_observers_receive_events() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let mut store = AnnotationStore::new();
        let sink = Rc::clone(&events);
        let subscription = store.subscribe(move |event| sink.borrow_mut().push(*event));

        let id = store.create(1, rect(), AnnotationKind::Checkbox { checked: false }).id();
        store.toggle_checked(id);
        store.select(id);
        store.delete(id);
        store.clear();

        assert_eq!(
            *events.borrow(),
            vec![
                StoreEvent::Created(id),
                StoreEvent::Updated(id),
                StoreEvent::SelectionChanged(Some(id)),
                StoreEvent::Deleted(id),
                StoreEvent::SelectionChanged(None),
                StoreEvent::Cleared,
            ]
        );

        assert!(store.unsubscribe(subscription));
        store.create(1, rect(), AnnotationKind::Rectangle);
        assert_eq!(events.borrow().len(), 6);
        assert!(!store.unsubscribe(subscription));
    }

    #[test]
    fn test_clear_is_total() {
        let mut store = AnnotationStore::new();
        let id = store.create(1, rect(), AnnotationKind::Rectangle).id();
        store.create(3, rect(), AnnotationKind::Signature);
        store.select(id);

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.selected(), None);
    }
}
