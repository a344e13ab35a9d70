//! Opaque GPU object handles.
//!
//! Handles are plain integer names handed out by a GPU context, mirroring the
//! object model of OpenGL. A handle carries no lifetime of its own: whoever
//! asked the context to create the object is responsible for destroying it.
//!
//! Keeping the handles here lets CPU-side descriptions ([`Mesh`](crate::mesh::Mesh),
//! [`Material`](crate::material::Material)) reference GPU objects without
//! depending on the graphics crate.

macro_rules! define_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(u32);

        impl $name {
            /// Wrap a raw object name.
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            /// Get the raw object name.
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

define_handle!(
    /// A compiled shader object.
    ShaderHandle
);

define_handle!(
    /// A linked shader program.
    ProgramHandle
);

define_handle!(
    /// A GPU buffer (vertex, index, uniform or indirect data).
    BufferHandle
);

define_handle!(
    /// A texture view that can be sampled or rendered to.
    TextureHandle
);

define_handle!(
    /// A texture sampler.
    SamplerHandle
);

define_handle!(
    /// A baked graphics state (rasterizer setup plus vertex attribute layout).
    GraphicsStateHandle
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_roundtrip_and_display() {
        let handle = ProgramHandle::from_raw(7);
        assert_eq!(handle.raw(), 7);
        assert_eq!(handle.to_string(), "ProgramHandle(7)");
        assert_ne!(handle, ProgramHandle::from_raw(8));
    }
}
