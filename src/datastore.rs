// src/datastore.rs

use crate::entity::Entity;
use crate::error::AggregateError;
use crate::form::Form;
use crate::submission::Submission;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// A lazily decoded, finite run of submissions in retrieval order.
pub type SubmissionIter<'a> = Box<dyn Iterator<Item = Result<Submission, AggregateError>> + 'a>;

/// Where submissions of a form are read from.
pub trait SubmissionSource {
    /// At most `limit` submissions of `form`, in a stable retrieval order.
    ///
    /// The cap applies to what is retrieved, before any caller-side filtering.
    fn submissions<'a>(&'a self, form: &'a Form, limit: usize)
        -> Result<SubmissionIter<'a>, AggregateError>;
}

/// Entity store kept in memory, one insertion-ordered list per form.
#[derive(Debug, Default)]
pub struct MemoryDatastore {
    entities: RwLock<HashMap<String, Vec<Entity>>>,
}

impl MemoryDatastore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a fresh submission key.
    pub fn new_key() -> String {
        format!("uuid:{}", Uuid::new_v4())
    }

    /// Stores an entity, replacing one with the same kind and key in place.
    pub fn put(&self, entity: Entity) -> Result<(), AggregateError> {
        let mut entities = self.entities.write().map_err(|_| {
            AggregateError::IncompleteSubmissionData("datastore lock poisoned".to_string())
        })?;
        let kind = entities.entry(entity.kind.clone()).or_default();
        match kind.iter_mut().find(|e| e.key == entity.key) {
            Some(existing) => *existing = entity,
            None => kind.push(entity),
        }
        Ok(())
    }

    pub fn put_submission(&self, submission: &Submission) -> Result<(), AggregateError> {
        log::debug!(
            "Storing submission {} of form {}",
            submission.key(),
            submission.form_id()
        );
        self.put(submission.to_entity())
    }

    pub fn count(&self, form_id: &str) -> Result<usize, AggregateError> {
        let entities = self.entities.read().map_err(|_| {
            AggregateError::IncompleteSubmissionData("datastore lock poisoned".to_string())
        })?;
        Ok(entities.get(form_id).map_or(0, Vec::len))
    }
}

impl SubmissionSource for MemoryDatastore {
    fn submissions<'a>(
        &'a self,
        form: &'a Form,
        limit: usize,
    ) -> Result<SubmissionIter<'a>, AggregateError> {
        let entities = self.entities.read().map_err(|_| {
            AggregateError::IncompleteSubmissionData("datastore lock poisoned".to_string())
        })?;
        // Snapshot the capped run so no lock is held while the caller streams.
        let batch: Vec<Entity> = entities
            .get(form.form_id())
            .map(|list| list.iter().take(limit).cloned().collect())
            .unwrap_or_default();
        drop(entities);

        log::debug!(
            "Retrieved {} submissions of form {} (limit {})",
            batch.len(),
            form.form_id(),
            limit
        );
        Ok(Box::new(
            batch
                .into_iter()
                .map(move |entity| Submission::from_entity(form, &entity)),
        ))
    }
}
