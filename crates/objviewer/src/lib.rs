//! Synthetic image sequence generation for OBJ models.
//!
//! A batch script names, per line, a model, a background image, a camera
//! calibration, a pose list, blur and noise strengths and an output
//! directory. The [`SequenceGenerator`] renders the model once per pose over
//! the background, degrades each frame and writes `000000.png`,
//! `000001.png`, ... into the output directory.
//!
//! ```no_run
//! use objviewer::{init_logging, GeneratorOptions, Scene, SequenceGenerator, SoftwareRenderer};
//!
//! fn main() -> objviewer::Result<()> {
//!     init_logging();
//!     let mut scene = Scene::default();
//!     let options = GeneratorOptions::default();
//!     let mut generator = SequenceGenerator::new(SoftwareRenderer::new(), options);
//!     let report = generator.run("jobs/batch.txt".as_ref(), &mut scene)?;
//!     println!("{} frames written", report.frames_written());
//!     Ok(())
//! }
//! ```

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
// Builder-style constructors return Self which doesn't need must_use
#![allow(clippy::return_self_not_must_use)]

pub mod batch;
pub mod error;
pub mod generator;
pub mod init;
pub mod progress;
pub mod snapshot;

pub use batch::BatchJobLine;
pub use error::{GeneratorError, Result};
pub use generator::{BatchReport, GeneratorState, LineOutcome, LineStatus, SequenceGenerator};
pub use init::init_logging;
pub use progress::{LogProgress, ProgressReport, ProgressSink};
pub use snapshot::render_to_file;

// Re-export the pieces needed to drive a batch
pub use objviewer_core::{GeneratorOptions, ViewerOptions};
pub use objviewer_render::{Renderer, Scene, SoftwareRenderer};
