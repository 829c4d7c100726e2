pub mod artifact;
pub mod html;
pub mod layout;
pub mod templates;

pub use artifact::{Artifact, ArtifactError, ArtifactKind, ArtifactRenderer, ExternalToolRenderer};
pub use layout::{build_layout, LayoutDocument, Photo};
