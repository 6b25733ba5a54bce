//! # Domain Layer
//!
//! - `material` - Material entity, type and review status
//! - `vocab` - Subjects, difficulties, category slugs
//! - `filter` - Listing filters, search, category browsing
//! - `youtube` - Video id extraction and thumbnails
//! - `submission` - Drafts, validation, storage paths
//! - `favorites` - Favorites page assembly
//! - `errors` - CatalogError

pub mod errors;
pub mod favorites;
pub mod filter;
pub mod material;
pub mod submission;
pub mod vocab;
pub mod youtube;

pub use errors::*;
pub use favorites::*;
pub use filter::*;
pub use material::*;
pub use submission::*;
pub use vocab::*;
pub use youtube::*;
