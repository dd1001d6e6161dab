//! Per-image editing session.
//!
//! An [`EditSession`] owns everything the editor needs for one open image:
//! the viewport, the crop overlay, and the operation pipeline. Nothing is
//! shared between sessions. Callers drive it with [`SessionCommand`]
//! messages and get a [`SessionUpdate`] back describing what changed.
//!
//! Pointer commands carry screen coordinates; the session maps them into
//! image space through the current viewport before they reach the crop
//! overlay. The overlay always lives on the pipeline's *output* image, so
//! after a crop is committed the next crop selects from the cropped result.

use crate::batch::BatchSpec;
use crate::crop::{
    CropDrag, HandleKind, Point, Rectangle, ViewportError, ViewportTransform,
};
use crate::imaging::{ExportFormat, Quality};
use crate::pipeline::{Operation, OperationError, OperationPipeline};
use crate::types::{Dimensions, ImageInfo};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    Operation(#[from] OperationError),
    #[error(transparent)]
    Viewport(#[from] ViewportError),
}

/// Interaction limits, normally taken from the `[viewport]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InteractionSettings {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Grab distance around handles, in screen pixels.
    pub handle_radius: f64,
}

impl Default for InteractionSettings {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 10.0,
            handle_radius: 6.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SessionCommand {
    SetViewport { viewport: ViewportTransform },
    /// Fit the output image into a container of this size.
    FitViewport { width: f64, height: f64 },
    /// Zoom by `factor` around a screen point.
    Zoom { anchor: Point, factor: f64 },
    Pan { dx: f64, dy: f64 },
    PointerDown { at: Point },
    PointerMove { at: Point },
    PointerUp,
    /// Set the crop rectangle directly (image space).
    SetCrop { rect: Rectangle },
    /// Append the current crop rectangle to the pipeline.
    CommitCrop,
    Push { operation: Operation },
    Insert { index: usize, operation: Operation },
    Replace { index: usize, operation: Operation },
    Remove { index: usize },
    Move { from: usize, to: usize },
    Undo,
    Redo,
    /// Drop every operation and the undo history.
    Reset,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "update", rename_all = "snake_case")]
pub enum SessionUpdate {
    Viewport { viewport: ViewportTransform },
    DragStarted { handle: HandleKind },
    Crop { rect: Rectangle, dragging: bool },
    Pipeline { len: usize, output: Dimensions },
    /// The command was valid but had nothing to act on.
    Unchanged,
}

#[derive(Debug, Clone)]
pub struct EditSession {
    info: ImageInfo,
    settings: InteractionSettings,
    viewport: ViewportTransform,
    crop: CropDrag,
    pipeline: OperationPipeline,
}

impl EditSession {
    pub fn new(info: ImageInfo, settings: InteractionSettings) -> Self {
        let dims = info.dimensions();
        Self {
            info,
            settings,
            viewport: ViewportTransform::identity(),
            crop: CropDrag::new(dims),
            pipeline: OperationPipeline::new(dims),
        }
    }

    pub fn info(&self) -> &ImageInfo {
        &self.info
    }

    pub fn viewport(&self) -> &ViewportTransform {
        &self.viewport
    }

    pub fn crop(&self) -> &CropDrag {
        &self.crop
    }

    pub fn pipeline(&self) -> &OperationPipeline {
        &self.pipeline
    }

    /// Handle under a screen point, for cursor feedback.
    pub fn handle_at(&self, screen: Point) -> Option<HandleKind> {
        self.crop
            .handle_at(screen, &self.viewport, self.settings.handle_radius)
    }

    pub fn handle(&mut self, command: SessionCommand) -> Result<SessionUpdate, SessionError> {
        match command {
            SessionCommand::SetViewport { viewport } => Ok(self.set_viewport(viewport)),
            SessionCommand::FitViewport { width, height } => {
                let fitted = ViewportTransform::fit(self.pipeline.output_dimensions(), width, height)?;
                Ok(self.set_viewport(fitted))
            }
            SessionCommand::Zoom { anchor, factor } => {
                let zoomed = self.viewport.zoom_at(
                    anchor,
                    factor,
                    self.settings.min_zoom,
                    self.settings.max_zoom,
                )?;
                Ok(self.set_viewport(zoomed))
            }
            SessionCommand::Pan { dx, dy } => {
                let panned = self.viewport.pan(dx, dy)?;
                Ok(self.set_viewport(panned))
            }
            SessionCommand::PointerDown { at } => {
                let Some(handle) = self.handle_at(at) else {
                    return Ok(SessionUpdate::Unchanged);
                };
                if self
                    .crop
                    .pointer_down(handle, self.viewport.to_image_space(at))
                {
                    Ok(SessionUpdate::DragStarted { handle })
                } else {
                    Ok(SessionUpdate::Unchanged)
                }
            }
            SessionCommand::PointerMove { at } => {
                Ok(match self.crop.pointer_move(self.viewport.to_image_space(at)) {
                    Some(rect) => SessionUpdate::Crop {
                        rect,
                        dragging: true,
                    },
                    None => SessionUpdate::Unchanged,
                })
            }
            SessionCommand::PointerUp => Ok(match self.crop.pointer_up() {
                Some(rect) => SessionUpdate::Crop {
                    rect,
                    dragging: false,
                },
                None => SessionUpdate::Unchanged,
            }),
            SessionCommand::SetCrop { rect } => Ok(SessionUpdate::Crop {
                rect: self.crop.set_rect(rect),
                dragging: self.crop.is_dragging(),
            }),
            SessionCommand::CommitCrop => {
                self.crop.abandon();
                let rect = self.crop.rect();
                self.pipeline.push(Operation::Crop(rect))?;
                Ok(self.pipeline_changed())
            }
            SessionCommand::Push { operation } => {
                self.pipeline.push(operation)?;
                Ok(self.pipeline_changed())
            }
            SessionCommand::Insert { index, operation } => {
                self.pipeline.insert(index, operation)?;
                Ok(self.pipeline_changed())
            }
            SessionCommand::Replace { index, operation } => {
                self.pipeline.replace(index, operation)?;
                Ok(self.pipeline_changed())
            }
            SessionCommand::Remove { index } => {
                self.pipeline.remove(index)?;
                Ok(self.pipeline_changed())
            }
            SessionCommand::Move { from, to } => {
                self.pipeline.move_to(from, to)?;
                Ok(self.pipeline_changed())
            }
            SessionCommand::Undo => Ok(if self.pipeline.undo() {
                self.pipeline_changed()
            } else {
                SessionUpdate::Unchanged
            }),
            SessionCommand::Redo => Ok(if self.pipeline.redo() {
                self.pipeline_changed()
            } else {
                SessionUpdate::Unchanged
            }),
            SessionCommand::Reset => {
                self.pipeline.reset();
                Ok(self.pipeline_changed())
            }
        }
    }

    /// Batch spec that applies this session's pipeline.
    pub fn to_batch_spec(&self, format: Option<ExportFormat>, quality: Quality) -> BatchSpec {
        BatchSpec::Pipeline {
            operations: self.pipeline.operations().to_vec(),
            format,
            quality,
        }
    }

    fn set_viewport(&mut self, viewport: ViewportTransform) -> SessionUpdate {
        self.viewport = viewport;
        SessionUpdate::Viewport { viewport }
    }

    /// Re-seat the crop overlay when the output image changed size.
    fn pipeline_changed(&mut self) -> SessionUpdate {
        let output = self.pipeline.output_dimensions();
        if output != self.crop.bounds() {
            tracing::debug!(
                width = output.width,
                height = output.height,
                "output size changed, resetting crop"
            );
            self.crop = CropDrag::new(output);
        }
        SessionUpdate::Pipeline {
            len: self.pipeline.len(),
            output,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::info;

    fn session(width: u32, height: u32) -> EditSession {
        EditSession::new(info("/in/photo.png", width, height), InteractionSettings::default())
    }

    // =========================================================================
    // Crop interaction
    // =========================================================================

    #[test]
    fn drag_through_viewport_maps_to_image_space() {
        let mut s = session(1920, 1080);
        s.handle(SessionCommand::SetViewport {
            viewport: ViewportTransform::new(0.5, 10.0, 20.0).unwrap(),
        })
        .unwrap();
        s.handle(SessionCommand::SetCrop {
            rect: Rectangle::new(100.0, 100.0, 400.0, 300.0),
        })
        .unwrap();

        // se corner in screen space: (500 * 0.5 + 10, 400 * 0.5 + 20)
        let se = Point::new(260.0, 220.0);
        assert_eq!(
            s.handle(SessionCommand::PointerDown { at: se }).unwrap(),
            SessionUpdate::DragStarted {
                handle: HandleKind::Se
            }
        );
        // (-600, -50) in image space is (-300, -25) on screen.
        let update = s
            .handle(SessionCommand::PointerMove {
                at: Point::new(se.x - 300.0, se.y - 25.0),
            })
            .unwrap();
        assert_eq!(
            update,
            SessionUpdate::Crop {
                rect: Rectangle::new(100.0, 100.0, 10.0, 250.0),
                dragging: true
            }
        );
        assert_eq!(
            s.handle(SessionCommand::PointerUp).unwrap(),
            SessionUpdate::Crop {
                rect: Rectangle::new(100.0, 100.0, 10.0, 250.0),
                dragging: false
            }
        );
    }

    #[test]
    fn pointer_down_outside_crop_is_ignored() {
        let mut s = session(100, 100);
        s.handle(SessionCommand::SetCrop {
            rect: Rectangle::new(10.0, 10.0, 20.0, 20.0),
        })
        .unwrap();
        assert_eq!(
            s.handle(SessionCommand::PointerDown {
                at: Point::new(90.0, 90.0)
            })
            .unwrap(),
            SessionUpdate::Unchanged
        );
        assert!(!s.crop().is_dragging());
    }

    #[test]
    fn second_pointer_down_during_drag_is_ignored() {
        let mut s = session(100, 100);
        s.handle(SessionCommand::PointerDown {
            at: Point::new(50.0, 50.0),
        })
        .unwrap();
        assert_eq!(
            s.handle(SessionCommand::PointerDown {
                at: Point::new(0.0, 0.0)
            })
            .unwrap(),
            SessionUpdate::Unchanged
        );
    }

    #[test]
    fn committed_crop_rebounds_the_overlay() {
        let mut s = session(800, 600);
        s.handle(SessionCommand::SetCrop {
            rect: Rectangle::new(100.0, 50.0, 300.0, 200.0),
        })
        .unwrap();
        let update = s.handle(SessionCommand::CommitCrop).unwrap();
        assert_eq!(
            update,
            SessionUpdate::Pipeline {
                len: 1,
                output: Dimensions::new(300, 200)
            }
        );
        assert_eq!(s.crop().bounds(), Dimensions::new(300, 200));
        assert_eq!(s.crop().rect(), Rectangle::new(0.0, 0.0, 300.0, 200.0));
    }

    // =========================================================================
    // Viewport
    // =========================================================================

    #[test]
    fn fit_uses_output_dimensions() {
        let mut s = session(400, 200);
        s.handle(SessionCommand::Push {
            operation: Operation::Rotate { angle: 90 },
        })
        .unwrap();
        let update = s
            .handle(SessionCommand::FitViewport {
                width: 100.0,
                height: 100.0,
            })
            .unwrap();
        let SessionUpdate::Viewport { viewport } = update else {
            panic!("expected viewport update");
        };
        assert_eq!(viewport.scale(), 0.25);
        assert_eq!(viewport.offset(), Point::new(25.0, 0.0));
    }

    #[test]
    fn zoom_is_clamped_by_settings() {
        let mut s = session(100, 100);
        s.handle(SessionCommand::Zoom {
            anchor: Point::new(0.0, 0.0),
            factor: 1000.0,
        })
        .unwrap();
        assert_eq!(s.viewport().scale(), 10.0);
    }

    #[test]
    fn inverted_zoom_bounds_are_an_error() {
        let settings: InteractionSettings =
            serde_json::from_str(r#"{"min_zoom":5.0,"max_zoom":1.0,"handle_radius":6.0}"#)
                .unwrap();
        let mut s = EditSession::new(info("/in/photo.png", 100, 100), settings);
        let before = *s.viewport();

        let err = s
            .handle(SessionCommand::Zoom {
                anchor: Point::new(10.0, 10.0),
                factor: 2.0,
            })
            .unwrap_err();

        assert!(matches!(err, SessionError::Viewport(_)));
        assert_eq!(*s.viewport(), before);
    }

    #[test]
    fn invalid_fit_container_is_an_error() {
        let mut s = session(100, 100);
        let err = s
            .handle(SessionCommand::FitViewport {
                width: 0.0,
                height: 100.0,
            })
            .unwrap_err();
        assert!(matches!(err, SessionError::Viewport(_)));
    }

    // =========================================================================
    // Pipeline commands
    // =========================================================================

    #[test]
    fn rejected_operation_leaves_pipeline_unchanged() {
        let mut s = session(100, 100);
        let err = s
            .handle(SessionCommand::Push {
                operation: Operation::Rotate { angle: 45 },
            })
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::Operation(OperationError::InvalidParameters { .. })
        ));
        assert!(s.pipeline().is_empty());
    }

    #[test]
    fn undo_restores_crop_bounds() {
        let mut s = session(800, 600);
        s.handle(SessionCommand::Push {
            operation: Operation::Rotate { angle: 90 },
        })
        .unwrap();
        assert_eq!(s.crop().bounds(), Dimensions::new(600, 800));

        s.handle(SessionCommand::Undo).unwrap();
        assert_eq!(s.crop().bounds(), Dimensions::new(800, 600));
        assert_eq!(s.handle(SessionCommand::Undo).unwrap(), SessionUpdate::Unchanged);

        s.handle(SessionCommand::Redo).unwrap();
        assert_eq!(s.pipeline().len(), 1);
    }

    #[test]
    fn reset_clears_operations_and_history() {
        let mut s = session(800, 600);
        s.handle(SessionCommand::Push {
            operation: Operation::Rotate { angle: 180 },
        })
        .unwrap();
        s.handle(SessionCommand::Reset).unwrap();
        assert!(s.pipeline().is_empty());
        assert!(!s.pipeline().can_undo());
    }

    #[test]
    fn commands_parse_from_json() {
        let cmd: SessionCommand =
            serde_json::from_str(r#"{"command": "pointer_down", "at": {"x": 1.0, "y": 2.0}}"#)
                .unwrap();
        assert_eq!(
            cmd,
            SessionCommand::PointerDown {
                at: Point::new(1.0, 2.0)
            }
        );
    }

    #[test]
    fn batch_spec_carries_pipeline() {
        let mut s = session(800, 600);
        s.handle(SessionCommand::Push {
            operation: Operation::Rotate { angle: 90 },
        })
        .unwrap();
        assert_eq!(
            s.to_batch_spec(Some(ExportFormat::Png), Quality::default()),
            BatchSpec::Pipeline {
                operations: vec![Operation::Rotate { angle: 90 }],
                format: Some(ExportFormat::Png),
                quality: Quality::default(),
            }
        );
    }
}
