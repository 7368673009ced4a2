//! Persistence of trained models and preprocessed data.
//!
//! Both kinds of file share one tagged container format ([`artifact`]):
//!
//! ```text
//! magic "EMOG" | major u16 | minor u16 | section count u32
//! section*: tag [u8; 4] | length u64 | crc32 u32 | payload
//! ```
//!
//! Integers are little-endian and payloads are bincode-encoded serde
//! values. Files are replaced atomically, so readers see either the old
//! or the new content.
//!
//! # Sections
//!
//! | File               | Tags                                 |
//! |--------------------|--------------------------------------|
//! | trained model      | `META` `NORM` `VECT` `CLSF` `LENC`   |
//! | preprocessed cache | `TRAN` `TEST` `LENC`                 |

pub mod artifact;
pub mod cache;
pub mod lock;
pub mod model_store;

pub use cache::PreprocessedData;
pub use lock::TrainingLock;
pub use model_store::{load_model, save_model};
