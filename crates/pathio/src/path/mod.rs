/* 📖 # How are the path operations split up?

`lexical` holds the string algorithms (tidy, normalize, split, dirname) that
never touch the filesystem. `quirk` holds the per-host segment correction.
`utils` ties both together in `PathUtils` and adds the two operations that do
ask the filesystem: `resolve_real_path` and `resolve_path_unverified`.
*/

mod lexical;
mod quirk;
mod utils;

pub use quirk::{LeadingSlashQuirk, NoQuirk, PathQuirk};
pub use utils::{PathParts, PathUtils};
