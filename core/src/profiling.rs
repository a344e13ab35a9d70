//! Profiling support via Tracy.
//!
//! Instrumentation is enabled with the `profiling` Cargo feature. Without it
//! every macro in this module expands to nothing.
//!
//! ```ignore
//! use ragl_core::profiling::{profile_function, profile_scope};
//!
//! fn link() {
//!     profile_function!();
//!     {
//!         profile_scope!("resolve_offsets");
//!         // ...
//!     }
//! }
//! ```
//!
//! Connect the Tracy UI to the running process to see the spans. A Tracy
//! client must be running (`tracy_client::Client::start()`) before the first
//! span is opened.

#[cfg(feature = "profiling")]
pub use tracy_client::{self, plot as tracy_plot, span, Client};

/// Open a named span that lasts until the end of the enclosing scope.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_scope {
    ($name:expr) => {
        let _profile_span = $crate::profiling::span!($name);
    };
}

/// Open a named span (no-op when profiling is disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_scope {
    ($name:expr) => {};
}

/// Open a span named after the enclosing function.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_function {
    () => {
        let _profile_span = $crate::profiling::span!();
    };
}

/// Open a function span (no-op when profiling is disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_function {
    () => {};
}

/// Plot a value over time, e.g. the number of cached uber programs.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_plot {
    ($name:expr, $value:expr) => {
        $crate::profiling::tracy_plot!($name, $value as f64)
    };
}

/// Plot a value (no-op when profiling is disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_plot {
    ($name:expr, $value:expr) => {
        let _ = $value;
    };
}

pub use crate::{profile_function, profile_plot, profile_scope};

#[cfg(test)]
mod tests {
    #[test]
    fn macros_expand_without_feature() {
        profile_function!();
        profile_scope!("scope");
        profile_plot!("value", 3_u32);
    }
}
