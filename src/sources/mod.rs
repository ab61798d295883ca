//! External lookup services blended into chat answers.
//!
//! Three collaborators, all treated as black boxes returning JSON:
//! - NASA Image and Video Library (no credential required)
//! - NASA TechPort project search (skipped without an api.nasa.gov key)
//! - Wikipedia summaries (last-resort fallback only)
//!
//! Every client returns `Result<Vec<SourceRecord>, AppError>`; the
//! aggregator absorbs failures into empty lists so no source can block
//! or fail the others.

pub mod images;
pub mod techport;
pub mod wikipedia;

pub use images::NasaImagesClient;
pub use techport::TechportClient;
pub use wikipedia::WikipediaClient;
