//! Component definitions and capability casting.
//!
//! A component definition is a plain data record attached to an
//! [`Entity`](crate::entity::Entity). Entities own an open-ended list of them
//! as `Box<dyn ComponentDefinition>`, so lookups come in two flavours:
//!
//! - **Exact type**: downcast through [`ComponentDefinition::as_any`].
//! - **Capability**: a component advertises the trait-object types it can be
//!   viewed as (`dyn Visual`, `dyn EntityReference`, ...) through
//!   [`ComponentDefinition::caster`]. This is how "any component implementing
//!   an abstraction" queries are answered without runtime reflection.
//!
//! Implementations are normally generated with [`component_definition!`]:
//!
//! ```
//! use cms_core::component_definition;
//!
//! pub trait Damage {
//!     fn amount(&self) -> u32;
//! }
//!
//! #[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
//! pub struct Sword {
//!     pub damage: u32,
//! }
//!
//! impl Damage for Sword {
//!     fn amount(&self) -> u32 {
//!         self.damage
//!     }
//! }
//!
//! component_definition!(Sword => Damage);
//!
//! let mut entity = cms_core::entity::Entity::new("Items/Sword");
//! entity.define::<Sword>().damage = 7;
//! assert_eq!(entity.get_abstract::<dyn Damage>().map(|d| d.amount()), Some(7));
//! ```

use std::any::{Any, TypeId};
use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// ComponentDefinition
// ---------------------------------------------------------------------------

/// A data-only facet of an entity.
///
/// The trait is object safe; entities store `Box<dyn ComponentDefinition>`.
pub trait ComponentDefinition: Any + fmt::Debug + Send + Sync {
    /// View as `&dyn Any` for exact-type downcasts.
    fn as_any(&self) -> &dyn Any;

    /// View as `&mut dyn Any` for exact-type downcasts.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Convert the box into `Box<dyn Any>` so ownership can be downcast.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Fully-qualified name of the concrete type.
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Return a caster for the capability identified by `capability`, which is
    /// the `TypeId` of a trait-object type such as `dyn Visual`.
    ///
    /// The default advertises no capabilities.
    fn caster(&self, capability: TypeId) -> Option<Caster> {
        let _ = capability;
        None
    }
}

/// `TypeId` of the concrete type behind a component trait object.
pub fn concrete_type_id(component: &dyn ComponentDefinition) -> TypeId {
    component.as_any().type_id()
}

// ---------------------------------------------------------------------------
// Caster
// ---------------------------------------------------------------------------

/// Function that views a component as the capability `C`.
pub type CastFn<C> = for<'a> fn(&'a dyn ComponentDefinition) -> Option<&'a C>;

/// Type-erased [`CastFn`] for one capability.
pub struct Caster {
    target: TypeId,
    cast: Box<dyn Any + Send + Sync>,
}

impl Caster {
    /// Wrap a cast function for capability `C`.
    pub fn new<C: ?Sized + 'static>(cast: CastFn<C>) -> Self {
        Self {
            target: TypeId::of::<C>(),
            cast: Box::new(cast),
        }
    }

    /// `TypeId` of the capability this caster produces.
    pub fn target(&self) -> TypeId {
        self.target
    }

    /// Apply the cast. Returns `None` if `C` is not the capability this caster
    /// was built for or `component` is not the type it was built from.
    pub fn apply<'a, C: ?Sized + 'static>(
        &self,
        component: &'a dyn ComponentDefinition,
    ) -> Option<&'a C> {
        let cast = self.cast.downcast_ref::<CastFn<C>>()?;
        cast(component)
    }
}

impl fmt::Debug for Caster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Caster").field("target", &self.target).finish()
    }
}

/// View `component` as capability `C`, if it advertises one.
pub fn cast_capability<C: ?Sized + 'static>(component: &dyn ComponentDefinition) -> Option<&C> {
    component.caster(TypeId::of::<C>())?.apply::<C>(component)
}

// ---------------------------------------------------------------------------
// SerializedComponent
// ---------------------------------------------------------------------------

/// Tagged JSON form of a component, as stored in entity files and templates.
///
/// `data` may be omitted, in which case the registered default is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SerializedComponent {
    /// Tag the component type was registered under.
    #[serde(rename = "type")]
    pub tag: String,
    /// Field values. `None` means "default instance".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl SerializedComponent {
    /// Build from a tag and raw JSON data.
    pub fn new(tag: &str, data: serde_json::Value) -> Self {
        Self {
            tag: tag.to_owned(),
            data: Some(data),
        }
    }

    /// Build a default-instance entry for `tag`.
    pub fn default_of(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            data: None,
        }
    }
}

// ---------------------------------------------------------------------------
// component_definition!
// ---------------------------------------------------------------------------

/// Implement [`ComponentDefinition`] for a type, optionally advertising
/// capabilities.
///
/// Capabilities are trait paths; the type must implement each of them.
///
/// ```ignore
/// component_definition!(TagSprite);
/// component_definition!(TagSprite => Visual);
/// component_definition!(TagCmsEntity => EntityReference, Visual);
/// ```
#[macro_export]
macro_rules! component_definition {
    ($ty:ty) => {
        impl $crate::component::ComponentDefinition for $ty {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
        }
    };
    ($ty:ty => $($cap:path),+ $(,)?) => {
        impl $crate::component::ComponentDefinition for $ty {
            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }

            fn caster(
                &self,
                capability: ::std::any::TypeId,
            ) -> ::std::option::Option<$crate::component::Caster> {
                $(
                    if capability == ::std::any::TypeId::of::<dyn $cap + 'static>() {
                        fn cast<'a>(
                            component: &'a dyn $crate::component::ComponentDefinition,
                        ) -> ::std::option::Option<&'a (dyn $cap + 'static)> {
                            let concrete: &'a $ty =
                                $crate::component::ComponentDefinition::as_any(component)
                                    .downcast_ref::<$ty>()?;
                            ::std::option::Option::Some(concrete)
                        }
                        return ::std::option::Option::Some(
                            $crate::component::Caster::new::<dyn $cap + 'static>(cast),
                        );
                    }
                )+
                ::std::option::Option::None
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
