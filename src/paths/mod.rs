/*!
 * Destination paths.
 *
 * - `template`: `{token}` path templates
 * - `version`: `vNNN` folder allocation
 * - `resolver`: per-sequence destination sets and plate rename maps
 */

pub mod resolver;
pub mod template;
pub mod version;

pub use resolver::{DestinationSet, PathResolver, PlateTarget, ResolvedShot};
