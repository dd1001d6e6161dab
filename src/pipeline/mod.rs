//! The transform operation model.
//!
//! An [`OperationPipeline`] is the ordered list of operations for one source
//! image. Operations apply strictly left to right, and order matters: a crop
//! before a percentage resize changes what the percentage is of, and a
//! rotation before a crop changes which region the rectangle selects.
//!
//! Each operation is validated against the dimensions of the image it will
//! actually receive, i.e. the source dimensions carried through every earlier
//! step. Every mutation re-validates the whole resulting chain before it is
//! committed, so a rejected edit leaves the pipeline exactly as it was and an
//! invalid list is never handed to a backend.
//!
//! Pixels are never touched here; applying the list is the backend's job
//! (see [`crate::imaging::operations`]).

mod history;
mod operation;

pub use history::{History, PipelineEdit};
pub use operation::{
    BLOCK_SIZE_RANGE, CollageOp, ImageWatermark, MAX_RESIZE_PERCENTAGE, MAX_RESIZE_SIDE,
    MosaicOp, MosaicPoint, MosaicRegion, Operation, OperationError, OperationKind,
    ResizeAlgorithm, ResizeOp, TextWatermark, WatermarkKind, WatermarkOp, WatermarkPosition,
};

use crate::types::Dimensions;

/// Validate `ops` in order starting from `source`, returning the final
/// output dimensions.
pub fn validate_chain(source: Dimensions, ops: &[Operation]) -> Result<Dimensions, OperationError> {
    ops.iter().try_fold(source, |dims, op| {
        op.validate(dims)?;
        Ok(op.output_dimensions(dims))
    })
}

/// Ordered, validated operations for one image, with undo/redo.
#[derive(Debug, Clone)]
pub struct OperationPipeline {
    source: Dimensions,
    operations: Vec<Operation>,
    history: History,
}

impl OperationPipeline {
    pub fn new(source: Dimensions) -> Self {
        Self {
            source,
            operations: Vec::new(),
            history: History::new(),
        }
    }

    /// Build a pipeline from an existing list, rejecting it if any step is
    /// invalid. The list itself is not undoable.
    pub fn from_operations(
        source: Dimensions,
        operations: Vec<Operation>,
    ) -> Result<Self, OperationError> {
        validate_chain(source, &operations)?;
        Ok(Self {
            source,
            operations,
            history: History::new(),
        })
    }

    pub fn source_dimensions(&self) -> Dimensions {
        self.source
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Dimensions of the image entering step `index` (`len()` gives the
    /// final output).
    pub fn dimensions_at(&self, index: usize) -> Dimensions {
        self.operations
            .iter()
            .take(index)
            .fold(self.source, |dims, op| op.output_dimensions(dims))
    }

    pub fn output_dimensions(&self) -> Dimensions {
        self.dimensions_at(self.operations.len())
    }

    pub fn push(&mut self, operation: Operation) -> Result<(), OperationError> {
        let index = self.operations.len();
        self.insert(index, operation)
    }

    pub fn insert(&mut self, index: usize, operation: Operation) -> Result<(), OperationError> {
        self.check_index(index, self.operations.len() + 1)?;
        self.commit(PipelineEdit::Insert { index, operation })
    }

    /// Swap the operation at `index` for a new instance.
    pub fn replace(&mut self, index: usize, operation: Operation) -> Result<(), OperationError> {
        self.check_index(index, self.operations.len())?;
        let before = self.operations[index].clone();
        self.commit(PipelineEdit::Replace {
            index,
            before,
            after: operation,
        })
    }

    pub fn remove(&mut self, index: usize) -> Result<Operation, OperationError> {
        self.check_index(index, self.operations.len())?;
        let operation = self.operations[index].clone();
        self.commit(PipelineEdit::Remove {
            index,
            operation: operation.clone(),
        })?;
        Ok(operation)
    }

    /// Move the operation at `from` so that it ends up at `to`.
    pub fn move_to(&mut self, from: usize, to: usize) -> Result<(), OperationError> {
        let len = self.operations.len();
        self.check_index(from, len)?;
        self.check_index(to, len)?;
        if from == to {
            return Ok(());
        }
        self.commit(PipelineEdit::Move { from, to })
    }

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.operations).is_some()
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.operations).is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Discard every operation and all history.
    pub fn reset(&mut self) {
        self.operations.clear();
        self.history.clear();
    }

    fn check_index(&self, index: usize, len: usize) -> Result<(), OperationError> {
        if index < len {
            Ok(())
        } else {
            Err(OperationError::IndexOutOfRange {
                index,
                len: self.operations.len(),
            })
        }
    }

    /// Apply `edit` to a scratch copy, validate it, and only then commit.
    fn commit(&mut self, edit: PipelineEdit) -> Result<(), OperationError> {
        let mut candidate = self.operations.clone();
        edit.apply(&mut candidate);
        validate_chain(self.source, &candidate)?;
        tracing::debug!(?edit, "pipeline edit");
        self.operations = candidate;
        self.history.record(edit);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crop::Rectangle;

    const HD: Dimensions = Dimensions {
        width: 1920,
        height: 1080,
    };

    fn crop(x: f64, y: f64, w: f64, h: f64) -> Operation {
        Operation::Crop(Rectangle::new(x, y, w, h))
    }

    fn percent(p: f64) -> Operation {
        Operation::Resize(ResizeOp {
            width: None,
            height: None,
            percentage: Some(p),
            maintain_aspect: true,
            algorithm: ResizeAlgorithm::Lanczos3,
        })
    }

    #[test]
    fn invalid_push_leaves_pipeline_unchanged() {
        let mut pipeline = OperationPipeline::new(HD);
        pipeline.push(Operation::Rotate { angle: 90 }).unwrap();
        let err = pipeline.push(Operation::Rotate { angle: 45 }).unwrap_err();
        assert!(matches!(
            err,
            OperationError::InvalidParameters {
                operation: OperationKind::Rotate,
                ..
            }
        ));
        assert_eq!(pipeline.operations(), &[Operation::Rotate { angle: 90 }]);
    }

    #[test]
    fn order_changes_output_dimensions() {
        let mut a = OperationPipeline::new(HD);
        a.push(crop(0.0, 0.0, 800.0, 600.0)).unwrap();
        a.push(percent(50.0)).unwrap();
        assert_eq!(a.output_dimensions(), Dimensions::new(400, 300));

        let mut b = OperationPipeline::new(HD);
        b.push(percent(50.0)).unwrap();
        b.push(crop(0.0, 0.0, 800.0, 500.0)).unwrap();
        assert_eq!(b.output_dimensions(), Dimensions::new(800, 500));
    }

    #[test]
    fn crop_validated_against_rotated_dimensions() {
        let mut pipeline = OperationPipeline::new(HD);
        pipeline.push(Operation::Rotate { angle: 90 }).unwrap();
        // 1500 tall fits the rotated 1080x1920 image but not the source.
        assert!(pipeline.push(crop(0.0, 0.0, 1000.0, 1500.0)).is_ok());
        assert_eq!(pipeline.dimensions_at(1), Dimensions::new(1080, 1920));
    }

    #[test]
    fn edit_that_breaks_a_later_step_is_rejected() {
        let mut pipeline = OperationPipeline::new(HD);
        pipeline.push(Operation::Rotate { angle: 90 }).unwrap();
        pipeline.push(crop(0.0, 0.0, 1000.0, 1500.0)).unwrap();
        // Turning the rotation off would make the crop exceed the image.
        let err = pipeline.replace(0, Operation::Rotate { angle: 0 });
        assert!(err.is_err());
        assert_eq!(pipeline.operations()[0], Operation::Rotate { angle: 90 });
    }

    #[test]
    fn undo_redo_restores_parameter_snapshots() {
        let mut pipeline = OperationPipeline::new(HD);
        pipeline.push(Operation::Rotate { angle: 90 }).unwrap();
        pipeline.replace(0, Operation::Rotate { angle: 180 }).unwrap();
        pipeline.push(percent(25.0)).unwrap();

        assert!(pipeline.undo());
        assert_eq!(pipeline.len(), 1);
        assert!(pipeline.undo());
        assert_eq!(pipeline.operations(), &[Operation::Rotate { angle: 90 }]);
        assert!(pipeline.redo());
        assert_eq!(pipeline.operations(), &[Operation::Rotate { angle: 180 }]);
        assert!(pipeline.can_redo());
    }

    #[test]
    fn remove_and_move() {
        let mut pipeline = OperationPipeline::new(HD);
        pipeline.push(Operation::Rotate { angle: 90 }).unwrap();
        pipeline
            .push(Operation::Flip {
                horizontal: true,
                vertical: false,
            })
            .unwrap();
        pipeline.move_to(1, 0).unwrap();
        assert_eq!(pipeline.operations()[1], Operation::Rotate { angle: 90 });

        let removed = pipeline.remove(0).unwrap();
        assert!(matches!(removed, Operation::Flip { .. }));
        assert_eq!(pipeline.len(), 1);

        assert!(pipeline.undo());
        assert!(pipeline.undo());
        assert_eq!(pipeline.operations()[0], Operation::Rotate { angle: 90 });
    }

    #[test]
    fn out_of_range_index() {
        let mut pipeline = OperationPipeline::new(HD);
        assert_eq!(
            pipeline.remove(0).unwrap_err(),
            OperationError::IndexOutOfRange { index: 0, len: 0 }
        );
        assert!(pipeline.insert(1, Operation::Rotate { angle: 0 }).is_err());
    }

    #[test]
    fn reset_discards_everything() {
        let mut pipeline = OperationPipeline::new(HD);
        pipeline.push(Operation::Rotate { angle: 90 }).unwrap();
        pipeline.reset();
        assert!(pipeline.is_empty());
        assert!(!pipeline.undo());
        assert_eq!(pipeline.output_dimensions(), HD);
    }

    #[test]
    fn from_operations_validates() {
        let ops = vec![Operation::Rotate { angle: 90 }, crop(0.0, 0.0, 1000.0, 1500.0)];
        let pipeline = OperationPipeline::from_operations(HD, ops).unwrap();
        assert_eq!(pipeline.output_dimensions(), Dimensions::new(1000, 1500));
        assert!(!pipeline.can_undo());

        let bad = vec![crop(0.0, 0.0, 1000.0, 1500.0)];
        assert!(OperationPipeline::from_operations(HD, bad).is_err());
    }
}
