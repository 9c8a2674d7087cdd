use tracing::{debug, info};
use uuid::Uuid;

use super::data::{Sketch, SketchType};
use crate::error::TransformError;

/// The owned UI session record
///
/// Holds the current sketch, the saved sketch history and the busy flag.
/// Only the application's `update` writes to it, one field per action.
#[derive(Debug, Default)]
pub struct Session {
    pub sketch_type: SketchType,
    current: Option<Sketch>,
    history: Vec<Sketch>,
    /// Sketch whose transform is in flight
    in_flight: Option<Uuid>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<&Sketch> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &[Sketch] {
        &self.history
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Start a transform of `image`, which becomes the current sketch
    ///
    /// Overlapping submissions are rejected while one is in flight.
    pub fn begin_transform(&mut self, image: String) -> Result<Uuid, TransformError> {
        if self.is_busy() {
            return Err(TransformError::Busy);
        }

        let sketch = Sketch::new(image);
        let id = sketch.id;
        info!(%id, sketch_type = %self.sketch_type, "starting transform");

        self.current = Some(sketch);
        self.in_flight = Some(id);
        Ok(id)
    }

    /// Start a transform of the saved sketch `id`
    ///
    /// Returns the image to submit, or `None` when `id` is not in the history.
    pub fn begin_saved_transform(&mut self, id: Uuid) -> Result<Option<String>, TransformError> {
        if self.is_busy() {
            return Err(TransformError::Busy);
        }

        let Some(image) = self.select(id).map(|sketch| sketch.image.clone()) else {
            return Ok(None);
        };
        info!(%id, sketch_type = %self.sketch_type, "starting transform of saved sketch");

        self.in_flight = Some(id);
        Ok(Some(image))
    }

    /// Record the outcome of the transform started for `id`
    ///
    /// The busy flag is cleared whatever the outcome. A success overwrites
    /// the previous result of that sketch, current or saved.
    pub fn finish_transform(&mut self, id: Uuid, result: &Result<String, TransformError>) {
        if self.in_flight == Some(id) {
            self.in_flight = None;
        }

        let Ok(image) = result else {
            return;
        };

        match self.sketch_mut(id) {
            Some(sketch) => sketch.transformed = Some(image.clone()),
            None => debug!(%id, "transform finished for a sketch that is gone"),
        }
    }

    /// Look up a sketch by id, current one first
    pub fn sketch(&self, id: Uuid) -> Option<&Sketch> {
        self.current
            .iter()
            .chain(self.history.iter())
            .find(|sketch| sketch.id == id)
    }

    fn sketch_mut(&mut self, id: Uuid) -> Option<&mut Sketch> {
        self.current
            .iter_mut()
            .chain(self.history.iter_mut())
            .find(|sketch| sketch.id == id)
    }

    /// Drop the transform result, keeping the sketch itself
    pub fn clear_result(&mut self) {
        if let Some(sketch) = self.current.as_mut() {
            sketch.transformed = None;
        }
    }

    /// Replace the current sketch with an uploaded image
    pub fn upload(&mut self, image: String) -> &Sketch {
        self.current.insert(Sketch::new(image))
    }

    /// Save a canvas export to the history
    pub fn save(&mut self, image: String) -> &Sketch {
        self.history.push(Sketch::new(image));
        let saved = &self.history[self.history.len() - 1];
        info!(id = %saved.id, total = self.history.len(), "saved sketch to history");
        saved
    }

    pub fn select(&self, id: Uuid) -> Option<&Sketch> {
        self.history.iter().find(|sketch| sketch.id == id)
    }

    /// Remove a saved sketch; returns whether it existed
    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.history.len();
        self.history.retain(|sketch| sketch.id != id);
        before != self.history.len()
    }
}
