//! Resource types: named bindings to one WMS endpoint segment.
//!
//! # Design
//! A resource type is a zero-sized marker implementing [`Resource`]. It only
//! names the segment; all mutable per-type state lives in a
//! [`ResourceState`](crate::ResourceState) held by a
//! [`Registry`](crate::Registry). Declaring a new type takes one line with
//! the [`resource!`](crate::resource) macro.

/// A named binding to one service endpoint segment.
pub trait Resource: 'static {
    /// Type name. The service URL uses it lowercased.
    const NAME: &'static str;
}

/// Declare a resource type bound to the endpoint segment named after it.
///
/// ```
/// use wms_resource::{GlobalConfig, Registry, Resource};
///
/// wms_resource::resource!(pub Inventory);
///
/// let mut registry = Registry::new(GlobalConfig::new("http://wms.local"));
/// let (config, state) = registry.parts::<Inventory>();
/// assert_eq!(Inventory::NAME, "Inventory");
/// assert_eq!(state.service_url(config), "http://wms.local/inventory");
/// ```
#[macro_export]
macro_rules! resource {
    ($(#[$meta:meta])* $vis:vis $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        $vis struct $name;

        impl $crate::Resource for $name {
            const NAME: &'static str = stringify!($name);
        }
    };
}

resource!(
    /// Branding endpoint (`{base_url}/branding`).
    pub Branding
);

resource!(
    /// Listing endpoint (`{base_url}/listing`).
    pub Listing
);
