use alloc::sync::Arc;
use core::{
    any::{Any, TypeId},
    fmt::{self, Debug, Formatter},
};

use crate::any::TypeInfo;

pub(crate) type RcAny = Arc<dyn Any + Send + Sync>;

/// Type-erased, reference counted value built or stored by the resolver.
///
/// Clones share the same allocation, so two instances compare equal with [`Instance::ptr_eq`]
/// only if they come from the same build.
#[derive(Clone)]
pub struct Instance {
    value: RcAny,
    type_info: TypeInfo,
}

impl Instance {
    #[inline]
    #[must_use]
    pub fn new<T: Send + Sync + 'static>(value: T) -> Self {
        Self::from_rc(Arc::new(value))
    }

    #[inline]
    #[must_use]
    pub fn from_rc<T: Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self {
            value,
            type_info: TypeInfo::of::<T>(),
        }
    }

    /// Wraps an interface view, so it can be read back with [`Instance::downcast_dyn`]
    #[inline]
    #[must_use]
    pub fn from_dyn<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self::new(value)
    }

    #[inline]
    #[must_use]
    pub fn type_info(&self) -> TypeInfo {
        self.type_info
    }

    #[inline]
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_info.id
    }

    #[inline]
    #[must_use]
    pub fn is<T: 'static>(&self) -> bool {
        self.value.is::<T>()
    }

    #[inline]
    #[must_use]
    pub fn downcast<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.clone().downcast().ok()
    }

    #[inline]
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref()
    }

    /// Reads back an interface view stored by [`Instance::from_dyn`]
    #[inline]
    #[must_use]
    pub fn downcast_dyn<T: ?Sized + Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.value.downcast_ref::<Arc<T>>().cloned()
    }

    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl Debug for Instance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance").field("type", &self.type_info.name).finish_non_exhaustive()
    }
}
