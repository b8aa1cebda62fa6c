use alloc::{collections::BTreeMap, string::String, sync::Arc};
use core::{
    any::TypeId,
    fmt::{self, Debug, Formatter},
    marker::PhantomData,
};
use tracing::debug;

use crate::{
    any::TypeInfo,
    arguments::Arguments,
    errors::{InstantiateErrorKind, IntrospectErrorKind},
    instance::Instance,
    instantiator::{Callable, Instantiator},
    service::{service_fn, BoxCloneService, Service as _},
    signature::Signature,
};

/// Source of type metadata the resolver builds from.
///
/// [`Catalog`] is the in-memory implementation, other implementations can read
/// the same information from generated code or a plugin system.
pub trait SignatureProvider: Send + Sync {
    /// Whether a type or interface with this name is known, constructible or not
    fn exists(&self, name: &str) -> bool;

    /// Describes a type by its name. Returns `Ok(None)` for unknown names.
    ///
    /// # Errors
    /// Returns an error if the metadata of a known name can't be read
    fn describe(&self, name: &str) -> Result<Option<Arc<TypeDescriptor>>, IntrospectErrorKind>;

    /// Describes the concrete type of a built value
    fn describe_instance(&self, instance: &Instance) -> Option<Arc<TypeDescriptor>>;

    fn is_constructible(&self, name: &str) -> bool {
        matches!(self.describe(name), Ok(Some(descriptor)) if descriptor.is_constructible())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Concrete,
    Abstract,
    Interface,
}

pub(crate) type BoxedCloneMethod = BoxCloneService<(Instance, Arguments), (), InstantiateErrorKind>;

/// Method that can be called on a built value during setter injection
#[derive(Clone)]
pub struct Method {
    signature: Signature,
    body: BoxedCloneMethod,
}

impl Method {
    #[inline]
    #[must_use]
    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    #[inline]
    pub(crate) fn call(&self, instance: Instance, arguments: Arguments) -> Result<(), InstantiateErrorKind> {
        self.body.clone().call((instance, arguments))
    }
}

type Upcast = Arc<dyn Fn(&Instance) -> Option<Instance> + Send + Sync>;

/// Everything the resolver needs to know about one named type
pub struct TypeDescriptor {
    name: String,
    kind: TypeKind,
    type_info: Option<TypeInfo>,
    constructor: Option<Callable>,
    is_constructor_accessible: bool,
    interfaces: BTreeMap<String, Upcast>,
    methods: BTreeMap<String, Method>,
}

impl TypeDescriptor {
    #[inline]
    #[must_use]
    fn without_constructor(name: String, kind: TypeKind) -> Self {
        Self {
            name,
            kind,
            type_info: None,
            constructor: None,
            is_constructor_accessible: false,
            interfaces: BTreeMap::new(),
            methods: BTreeMap::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    #[inline]
    #[must_use]
    pub fn type_info(&self) -> Option<TypeInfo> {
        self.type_info
    }

    /// Concrete type with an accessible constructor
    #[inline]
    #[must_use]
    pub fn is_constructible(&self) -> bool {
        self.kind == TypeKind::Concrete && self.is_constructor_accessible && self.constructor.is_some()
    }

    /// Constructor of the type, `None` if the type can't be constructed directly
    #[inline]
    #[must_use]
    pub fn constructor(&self) -> Option<&Callable> {
        if self.is_constructible() {
            self.constructor.as_ref()
        } else {
            None
        }
    }

    #[inline]
    #[must_use]
    pub fn implements(&self, interface: &str) -> bool {
        self.interfaces.contains_key(interface)
    }

    #[inline]
    pub fn interfaces(&self) -> impl Iterator<Item = &str> {
        self.interfaces.keys().map(String::as_str)
    }

    #[inline]
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    /// Converts a value of this type to the view of `interface`.
    /// Returns `None` if the type doesn't implement it or the value has another type.
    #[must_use]
    pub fn upcast(&self, instance: &Instance, interface: &str) -> Option<Instance> {
        self.interfaces.get(interface).and_then(|upcast| upcast(instance))
    }
}

impl Debug for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("constructor", &self.constructor)
            .field("is_constructor_accessible", &self.is_constructor_accessible)
            .field("interfaces", &self.interfaces.keys())
            .field("methods", &self.methods.keys())
            .finish_non_exhaustive()
    }
}

/// Declaration of a concrete type `T` under a name
pub struct TypeDef<T> {
    descriptor: TypeDescriptor,
    _type: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> TypeDef<T> {
    #[inline]
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        let mut descriptor = TypeDescriptor::without_constructor(name.into(), TypeKind::Concrete);
        descriptor.type_info = Some(TypeInfo::of::<T>());
        descriptor.is_constructor_accessible = true;

        Self {
            descriptor,
            _type: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub fn constructor<Inst>(mut self, signature: Signature, instantiator: Inst) -> Self
    where
        Inst: Instantiator<Provides = T> + Send + Sync,
    {
        self.descriptor.constructor = Some(Callable::new(signature, instantiator));
        self
    }

    /// Declares the constructor private, the type is known but can't be built by the resolver
    #[inline]
    #[must_use]
    pub fn private_constructor(mut self) -> Self {
        self.descriptor.is_constructor_accessible = false;
        self
    }

    /// Declares that `T` implements `interface`, `upcast` converts it to the interface view
    #[inline]
    #[must_use]
    pub fn implements<I>(mut self, interface: impl Into<String>, upcast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.descriptor.interfaces.insert(
            interface.into(),
            Arc::new(move |instance: &Instance| instance.downcast::<T>().map(|value| Instance::from_dyn(upcast(value)))),
        );
        self
    }

    /// Declares a method that can be called by name during setter injection
    #[inline]
    #[must_use]
    pub fn method<F, Err>(mut self, name: impl Into<String>, signature: Signature, mut body: F) -> Self
    where
        F: FnMut(&T, Arguments) -> Result<(), Err> + Clone + Send + Sync + 'static,
        Err: Into<InstantiateErrorKind>,
    {
        let type_name = TypeInfo::of::<T>().name;
        let body = BoxCloneService::new(service_fn(
            move |(instance, arguments): (Instance, Arguments)| -> Result<(), InstantiateErrorKind> {
                let Some(value) = instance.downcast_ref::<T>() else {
                    return Err(InstantiateErrorKind::IncorrectArgumentType {
                        position: 0,
                        expected: type_name,
                        actual: instance.type_info().name,
                    });
                };
                match body(value, arguments) {
                    Ok(()) => Ok(()),
                    Err(err) => Err(err.into()),
                }
            },
        ));

        self.descriptor.methods.insert(name.into(), Method { signature, body });
        self
    }
}

impl<T: Default + Send + Sync + 'static> TypeDef<T> {
    /// Uses [`Default`] as a constructor without parameters
    #[inline]
    #[must_use]
    pub fn default_constructor(self) -> Self {
        self.constructor(Signature::empty(), |_: Arguments| Ok::<_, InstantiateErrorKind>(T::default()))
    }
}

/// In-memory [`SignatureProvider`]
#[derive(Default, Clone)]
pub struct Catalog {
    types: BTreeMap<String, Arc<TypeDescriptor>>,
    names_by_type: BTreeMap<TypeId, String>,
}

impl Catalog {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            types: BTreeMap::new(),
            names_by_type: BTreeMap::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn provide<T>(mut self, type_def: TypeDef<T>) -> Self {
        self.add(type_def.descriptor);
        self
    }

    #[inline]
    #[must_use]
    pub fn interface(mut self, name: impl Into<String>) -> Self {
        self.add(TypeDescriptor::without_constructor(name.into(), TypeKind::Interface));
        self
    }

    #[inline]
    #[must_use]
    pub fn abstract_type(mut self, name: impl Into<String>) -> Self {
        self.add(TypeDescriptor::without_constructor(name.into(), TypeKind::Abstract));
        self
    }

    fn add(&mut self, descriptor: TypeDescriptor) {
        debug!(name = %descriptor.name, kind = ?descriptor.kind, "Type declared");

        if let Some(type_info) = descriptor.type_info {
            self.names_by_type.insert(type_info.id, descriptor.name.clone());
        }
        self.types.insert(descriptor.name.clone(), Arc::new(descriptor));
    }
}

impl SignatureProvider for Catalog {
    #[inline]
    fn exists(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    #[inline]
    fn describe(&self, name: &str) -> Result<Option<Arc<TypeDescriptor>>, IntrospectErrorKind> {
        Ok(self.types.get(name).cloned())
    }

    fn describe_instance(&self, instance: &Instance) -> Option<Arc<TypeDescriptor>> {
        self.names_by_type
            .get(&instance.type_id())
            .and_then(|name| self.types.get(name))
            .cloned()
    }
}
