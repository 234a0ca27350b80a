pub mod compat;
pub mod split;
pub mod system;

pub use compat::{
    are_compatible, are_weakly_compatible, is_compatible_with_all, system_is_compatible,
    system_is_weakly_compatible,
};
pub use split::Split;
pub use system::SplitSystem;
