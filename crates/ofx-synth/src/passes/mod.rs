//! Special-case synthesizers run after population.
//!
//! Each pass only appends records or uses the registry's permitted edits;
//! none of them removes anything.

mod dummy;
mod hinges;
mod local_axes;
mod rotation;
mod subsoil;

pub use dummy::add_dummy_section;
pub use hinges::release_hinges;
pub use local_axes::apply_local_axes;
pub use rotation::{fix_drilling_rotations, shared_axis};
pub use subsoil::add_subsoil_elements;
